// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::type_name;
use std::fmt;

use parking_lot::{Mutex, MutexGuard};
use tracing::{Level, event};

use crate::builder::Options;
use crate::{Error, ReadOutcome, Result, SharedBufferBuilder};

/// A growable byte buffer that many threads can append to and drain from concurrently.
///
/// The buffer owns one contiguous store together with two cursors:
///
/// * The logical length, which marks the end of the written bytes. Writes append at this position.
/// * The read offset, which marks the end of the consumed bytes. Reads drain from this position.
///
/// There is exactly one read offset, shared by every reader. Each byte is therefore delivered to
/// only one reader unless the cursor is rewound via [`reset()`].
///
/// All operations take `&self` and lock the whole buffer for their full duration. Share the buffer
/// between threads by reference (e.g. via scoped threads) or wrap it in an `Arc`.
///
/// # Growth
///
/// No memory is allocated until the first write. The first allocation is twice the size of the
/// first write or [`SMALL_ALLOCATION`] bytes, whichever is larger. When a later write does not fit
/// into the remaining capacity, the store is reallocated to `length + n + capacity` bytes, where
/// `n` is the size of the write. Written bytes are preserved across reallocation and capacity is
/// never released, not even by [`clear()`].
///
/// A buffer cannot grow beyond its maximum length (by default [`MAX_LEN`], configurable via
/// [`SharedBufferBuilder::max_len()`]). A write that would exceed it fails without modifying
/// the buffer.
///
/// # Example
///
/// ```
/// use sharedbuf::SharedBuffer;
///
/// let buffer = SharedBuffer::new();
///
/// std::thread::scope(|s| {
///     for i in 0..4 {
///         let buffer = &buffer;
///         s.spawn(move || buffer.write_text(&format!("[worker {i}]")));
///     }
/// });
///
/// assert_eq!(buffer.len(), 4 * "[worker 0]".len());
/// let drained = buffer.read_remaining_text();
/// assert!(drained.contains("[worker 3]"));
/// assert!(buffer.is_empty());
/// ```
///
/// [`reset()`]: Self::reset
/// [`clear()`]: Self::clear
/// [`SMALL_ALLOCATION`]: crate::SMALL_ALLOCATION
/// [`MAX_LEN`]: crate::MAX_LEN
pub struct SharedBuffer {
    state: Mutex<State>,
    options: Options,
}

/// The mutable part of the buffer, guarded as one unit.
#[derive(Debug, Default)]
pub(crate) struct State {
    /// `len()` is the logical length, `capacity()` the allocated store.
    data: Vec<u8>,

    /// Bytes in `data[..offset]` have been consumed. Never greater than `data.len()`.
    offset: usize,
}

impl State {
    /// The bytes that have been written but not yet consumed.
    pub(crate) fn unread(&self) -> &[u8] {
        &self.data[self.offset..]
    }

    /// Marks `count` unread bytes as consumed.
    pub(crate) fn consume(&mut self, count: usize) {
        debug_assert!(count <= self.unread().len(), "cannot consume more bytes than are unread");
        self.offset += count;
    }

    fn consume_all(&mut self) {
        self.offset = self.data.len();
    }

    /// Ensures there is room for `additional` more bytes at the end of the written region.
    ///
    /// Returns the offset at which the new bytes will be written. On failure the state is unchanged.
    fn grow(&mut self, additional: usize, options: &Options) -> Result<usize> {
        let len = self.data.len();
        let capacity = self.data.capacity();

        let required = match len.checked_add(additional) {
            Some(required) if required <= options.max_len => required,
            _ => return Err(Error::capacity_exceeded(len, additional, options.max_len)),
        };

        if capacity == 0 {
            let initial = additional.saturating_mul(2).max(options.min_allocation).min(options.max_len);
            self.reserve_total(initial)?;

            event!(
                Level::TRACE,
                message = "allocated buffer storage",
                capacity = self.data.capacity(),
            );
        } else if additional > capacity - len {
            let target = required.saturating_add(capacity).min(options.max_len);
            self.reserve_total(target)?;

            event!(
                Level::TRACE,
                message = "reallocated buffer storage",
                len,
                old_capacity = capacity,
                new_capacity = self.data.capacity(),
            );
        }

        Ok(len)
    }

    fn reserve_total(&mut self, capacity: usize) -> Result<()> {
        // The reservation is counted from the current length, not the current capacity.
        let additional = capacity - self.data.len();

        self.data
            .try_reserve_exact(additional)
            .map_err(|source| Error::Allocation { requested: capacity, source })
    }

    fn append(&mut self, bytes: &[u8], options: &Options) -> Result<usize> {
        let at = self.grow(bytes.len(), options)?;
        self.data.extend_from_slice(bytes);

        Ok(self.data.len() - at)
    }
}

impl SharedBuffer {
    /// Creates an empty buffer with the default configuration.
    ///
    /// No memory is allocated until the first write.
    #[must_use]
    pub fn new() -> Self {
        Self::from_options(Options::default())
    }

    /// Starts building a buffer with non-default configuration.
    pub fn builder() -> SharedBufferBuilder {
        SharedBufferBuilder::new()
    }

    /// Creates an empty buffer that has already allocated room for `capacity` bytes.
    ///
    /// The first write that does not fit grows the buffer as if it had been filled by earlier writes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if `capacity` is greater than [`MAX_LEN`] and
    /// [`Error::Allocation`] if the allocator cannot provide the requested capacity.
    ///
    /// [`MAX_LEN`]: crate::MAX_LEN
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let options = Options::default();

        if capacity > options.max_len {
            return Err(Error::capacity_exceeded(0, capacity, options.max_len));
        }

        let mut state = State::default();
        state.reserve_total(capacity)?;

        Ok(Self {
            state: Mutex::new(state),
            options,
        })
    }

    pub(crate) fn from_options(options: Options) -> Self {
        Self {
            state: Mutex::new(State::default()),
            options,
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock()
    }

    pub(crate) const fn options(&self) -> &Options {
        &self.options
    }

    /// Appends `data` to the end of the buffer and returns the number of bytes written.
    ///
    /// The read offset is not affected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExceeded`] if the buffer would grow beyond its maximum length and
    /// [`Error::Allocation`] if the allocator cannot provide the required capacity. The buffer is
    /// left unchanged in both cases.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        self.state.lock().append(data, &self.options)
    }

    /// Appends the UTF-8 bytes of `text` and returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// See [`write()`][Self::write].
    pub fn write_text(&self, text: &str) -> Result<usize> {
        self.write(text.as_bytes())
    }

    /// Appends formatted text and returns the number of bytes written.
    ///
    /// This makes the buffer a target of the `write!` macro. The text is formatted before the
    /// buffer is locked and is then appended in one atomic write.
    ///
    /// ```
    /// let buffer = sharedbuf::SharedBuffer::new();
    ///
    /// let written = write!(buffer, "test1: this is a test #{}\n", 1)?;
    /// assert_eq!(written, 25);
    /// # Ok::<(), sharedbuf::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// See [`write()`][Self::write].
    pub fn write_fmt(&self, args: fmt::Arguments<'_>) -> Result<usize> {
        match args.as_str() {
            Some(text) => self.write_text(text),
            None => self.write_text(&fmt::format(args)),
        }
    }

    /// Drains unread bytes into `dest`, advancing the read offset by the number of bytes copied.
    ///
    /// Copies as many bytes as fit into `dest`. If no unread bytes remain, returns
    /// [`ReadOutcome::EndOfData`] immediately instead of waiting for more data.
    pub fn read_into(&self, dest: &mut [u8]) -> ReadOutcome {
        let mut state = self.state.lock();

        let unread = state.unread();
        if unread.is_empty() {
            return ReadOutcome::EndOfData;
        }

        let count = unread.len().min(dest.len());
        dest[..count].copy_from_slice(&unread[..count]);
        state.consume(count);

        ReadOutcome::Read(count)
    }

    /// Drains all unread bytes and returns them as text.
    ///
    /// Invalid UTF-8 sequences are replaced with `U+FFFD REPLACEMENT CHARACTER`. The read offset
    /// advances past every unread byte regardless.
    #[must_use]
    pub fn read_remaining_text(&self) -> String {
        let mut state = self.state.lock();

        let text = String::from_utf8_lossy(state.unread()).into_owned();
        state.consume_all();

        text
    }

    /// Returns a copy of every byte written since the buffer was created or last cleared.
    ///
    /// The copy includes bytes that have already been consumed. The read offset is not affected.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.state.lock().data.clone()
    }

    /// Lends every byte written since the buffer was created or last cleared to `f`, without copying.
    ///
    /// The buffer stays locked while `f` runs, so no other operation can modify or reallocate the
    /// bytes while they are being inspected. Calling another method of this buffer from within `f`
    /// deadlocks.
    ///
    /// ```
    /// let buffer = sharedbuf::SharedBuffer::new();
    /// buffer.write(b"abc")?;
    ///
    /// let checksum: u32 = buffer.with_bytes(|bytes| bytes.iter().map(|b| u32::from(*b)).sum());
    /// assert_eq!(checksum, 294);
    /// # Ok::<(), sharedbuf::Error>(())
    /// ```
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.state.lock().data)
    }

    /// Returns every byte written since the buffer was created or last cleared as text.
    ///
    /// The text includes bytes that have already been consumed. Invalid UTF-8 sequences are replaced
    /// with `U+FFFD REPLACEMENT CHARACTER`. The read offset is not affected.
    #[must_use]
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.state.lock().data).into_owned()
    }

    /// Number of bytes that have been written but not yet consumed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().unread().len()
    }

    /// Whether every written byte has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of bytes written since the buffer was created or last cleared, consumed or not.
    #[must_use]
    pub fn written_len(&self) -> usize {
        self.state.lock().data.len()
    }

    /// Number of bytes the buffer can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.state.lock().data.capacity()
    }

    /// Rewinds the read offset to the start so that every written byte can be read again.
    pub fn reset(&self) {
        self.state.lock().offset = 0;
    }

    /// Discards every written byte and rewinds the read offset. Allocated capacity is retained.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.offset = 0;
        state.data.clear();
    }
}

impl Default for SharedBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<u8>> for SharedBuffer {
    /// Creates a buffer whose entire contents are unread.
    fn from(data: Vec<u8>) -> Self {
        let buffer = Self::new();
        buffer.state.lock().data = data;
        buffer
    }
}

impl From<&[u8]> for SharedBuffer {
    /// Creates a buffer whose entire contents are unread.
    fn from(data: &[u8]) -> Self {
        Self::from(data.to_vec())
    }
}

impl fmt::Display for SharedBuffer {
    /// Formats every written byte as text, see [`SharedBuffer::to_text()`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.state.lock().data))
    }
}

impl fmt::Debug for SharedBuffer {
    #[cfg_attr(test, mutants::skip)] // We have no API contract here.
    #[cfg_attr(coverage_nightly, coverage(off))] // We have no API contract here.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();

        f.debug_struct(type_name::<Self>())
            .field("len", &state.unread().len())
            .field("offset", &state.offset)
            .field("written_len", &state.data.len())
            .field("capacity", &state.data.capacity())
            .field("max_len", &self.options.max_len)
            .finish()
    }
}
