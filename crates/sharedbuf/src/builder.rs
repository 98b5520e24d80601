// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::num::NonZero;

use crate::{MAX_LEN, READ_CHUNK_SIZE, SMALL_ALLOCATION, SharedBuffer};

/// Immutable configuration of a [`SharedBuffer`], fixed when the buffer is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Options {
    pub(crate) min_allocation: usize,
    pub(crate) read_chunk_size: NonZero<usize>,
    pub(crate) max_len: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            min_allocation: SMALL_ALLOCATION,
            read_chunk_size: READ_CHUNK_SIZE,
            max_len: MAX_LEN,
        }
    }
}

/// Creates a [`SharedBuffer`] with non-default configuration.
///
/// Obtain an instance via [`SharedBuffer::builder()`].
///
/// # Example
///
/// ```
/// use std::num::NonZero;
///
/// use sharedbuf::SharedBuffer;
///
/// let buffer = SharedBuffer::builder()
///     .min_allocation(4096)
///     .read_chunk_size(NonZero::new(8 * 1024).unwrap())
///     .max_len(1024 * 1024)
///     .build();
///
/// buffer.write(b"hello")?;
/// assert!(buffer.capacity() >= 4096);
/// # Ok::<(), sharedbuf::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct SharedBufferBuilder {
    options: Options,
}

impl SharedBufferBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sets the capacity of the first allocation, unless the first write needs more.
    ///
    /// Defaults to [`SMALL_ALLOCATION`].
    pub fn min_allocation(mut self, bytes: usize) -> Self {
        self.options.min_allocation = bytes;
        self
    }

    /// Sets the size of the chunks that [`SharedBuffer::read_from()`] pulls from a byte source.
    ///
    /// Defaults to [`READ_CHUNK_SIZE`].
    pub fn read_chunk_size(mut self, bytes: NonZero<usize>) -> Self {
        self.options.read_chunk_size = bytes;
        self
    }

    /// Sets the maximum logical length of the buffer.
    ///
    /// Writes that would grow the buffer beyond this length fail with
    /// [`Error::CapacityExceeded`][crate::Error::CapacityExceeded]. Values above [`MAX_LEN`]
    /// are clamped to it.
    pub fn max_len(mut self, bytes: usize) -> Self {
        self.options.max_len = bytes.min(MAX_LEN);
        self
    }

    /// Creates the buffer. No memory is allocated until the first write.
    #[must_use]
    pub fn build(self) -> SharedBuffer {
        SharedBuffer::from_options(self.options)
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = SharedBufferBuilder::new().options;

        assert_eq!(options.min_allocation, SMALL_ALLOCATION);
        assert_eq!(options.read_chunk_size, READ_CHUNK_SIZE);
        assert_eq!(READ_CHUNK_SIZE.get(), 32 * 1024);
        assert_eq!(options.max_len, MAX_LEN);
    }

    #[test]
    fn max_len_is_clamped() {
        let options = SharedBufferBuilder::new().max_len(usize::MAX).options;

        assert_eq!(options.max_len, MAX_LEN);
    }

    #[test]
    fn build_allocates_nothing() {
        let buffer = SharedBuffer::builder().min_allocation(1024).build();

        assert_eq!(buffer.capacity(), 0);
        assert!(buffer.is_empty());
    }
}
