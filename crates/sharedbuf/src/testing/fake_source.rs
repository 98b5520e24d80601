// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::type_name;
use std::io;
use std::num::NonZero;

/// A byte source that yields the contents it was built with.
///
/// This is for test and example purposes only and is not optimized for performance.
///
/// Once the contents are exhausted, the source signals end of data (`Ok(0)`) unless it has been
/// configured to fail or to report an impossible count instead.
///
/// # Example
///
/// ```
/// use std::io::{ErrorKind, Read};
///
/// use sharedbuf::testing::FakeSource;
///
/// let mut source = FakeSource::builder()
///     .contents(b"abc".to_vec())
///     .fail_with(ErrorKind::ConnectionReset)
///     .build();
///
/// let mut chunk = [0; 8];
/// assert_eq!(source.read(&mut chunk).unwrap(), 3);
/// assert_eq!(source.read(&mut chunk).unwrap_err().kind(), ErrorKind::ConnectionReset);
/// ```
pub struct FakeSource {
    contents: Vec<u8>,
    position: usize,

    // For testing purposes, we may choose to limit the read size and
    // thereby force the caller to do multiple read operations.
    max_read_size: Option<NonZero<usize>>,

    end: End,
    interrupt_first_read: bool,
    read_calls: usize,
}

#[derive(Clone, Copy, Debug)]
enum End {
    EndOfData,
    Fail(io::ErrorKind),
    InvalidCount,
}

impl FakeSource {
    /// Starts building a new `FakeSource`.
    pub fn builder() -> FakeSourceBuilder {
        FakeSourceBuilder {
            contents: Vec::new(),
            max_read_size: None,
            end: End::EndOfData,
            interrupt_first_read: false,
        }
    }

    /// Creates a source that yields `contents` followed by end of data.
    #[must_use]
    pub fn new(contents: impl Into<Vec<u8>>) -> Self {
        Self::builder().contents(contents).build()
    }

    /// Creates a source that signals end of data on the first read.
    #[must_use]
    pub fn empty() -> Self {
        Self::builder().build()
    }

    /// Number of bytes that have not been read yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.contents.len() - self.position
    }

    /// Number of times [`read()`](io::Read::read) has been called.
    #[must_use]
    pub fn read_calls(&self) -> usize {
        self.read_calls
    }
}

impl io::Read for FakeSource {
    #[cfg_attr(test, mutants::skip)] // Mutations easily lead to infinite loops, not worth the effort.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_calls += 1;

        if self.interrupt_first_read {
            self.interrupt_first_read = false;
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }

        let count = self
            .remaining()
            .min(buf.len())
            .min(self.max_read_size.map_or(usize::MAX, NonZero::get));

        if count == 0 {
            return match self.end {
                End::EndOfData => Ok(0),
                End::Fail(kind) => Err(io::Error::new(kind, "fake source failure")),
                End::InvalidCount => Ok(buf.len() + 1),
            };
        }

        buf[..count].copy_from_slice(&self.contents[self.position..self.position + count]);
        self.position += count;

        Ok(count)
    }
}

impl std::fmt::Debug for FakeSource {
    #[cfg_attr(coverage_nightly, coverage(off))] // We have no API contract here.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("len", &self.contents.len())
            .field("position", &self.position)
            .field("max_read_size", &self.max_read_size)
            .field("end", &self.end)
            .field("read_calls", &self.read_calls)
            .finish_non_exhaustive()
    }
}

/// Creates an instance of [`FakeSource`].
///
/// Access through [`FakeSource::builder()`].
#[derive(Debug)]
#[must_use]
pub struct FakeSourceBuilder {
    contents: Vec<u8>,
    max_read_size: Option<NonZero<usize>>,
    end: End,
    interrupt_first_read: bool,
}

impl FakeSourceBuilder {
    /// Sets the bytes the source yields. Defaults to no bytes.
    pub fn contents(mut self, contents: impl Into<Vec<u8>>) -> Self {
        self.contents = contents.into();
        self
    }

    /// Limits how many bytes a single read may return.
    pub fn max_read_size(mut self, max_read_size: NonZero<usize>) -> Self {
        self.max_read_size = Some(max_read_size);
        self
    }

    /// Fails with an error of `kind` once the contents are exhausted, instead of signaling end of data.
    pub fn fail_with(mut self, kind: io::ErrorKind) -> Self {
        self.end = End::Fail(kind);
        self
    }

    /// Once the contents are exhausted, reports reading one byte more than the caller's buffer holds.
    pub fn report_invalid_count(mut self) -> Self {
        self.end = End::InvalidCount;
        self
    }

    /// Fails the first read with [`io::ErrorKind::Interrupted`].
    pub fn interrupt_first_read(mut self) -> Self {
        self.interrupt_first_read = true;
        self
    }

    /// Builds the `FakeSource` with the provided configuration.
    #[must_use]
    pub fn build(self) -> FakeSource {
        FakeSource {
            contents: self.contents,
            position: 0,
            max_read_size: self.max_read_size,
            end: self.end,
            interrupt_first_read: self.interrupt_first_read,
            read_calls: 0,
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn yields_contents_then_end_of_data() {
        let mut source = FakeSource::new(b"hello".to_vec());
        let mut buf = [0; 16];

        assert_eq!(source.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf[..5], b"hello");
        assert_eq!(source.read(&mut buf).unwrap(), 0);
        assert_eq!(source.read_calls(), 2);
    }

    #[test]
    fn max_read_size_splits_reads() {
        let mut source = FakeSource::builder()
            .contents(b"abcdefg".to_vec())
            .max_read_size(NonZero::new(3).unwrap())
            .build();
        let mut buf = [0; 16];

        assert_eq!(source.read(&mut buf).unwrap(), 3);
        assert_eq!(source.read(&mut buf).unwrap(), 3);
        assert_eq!(source.read(&mut buf).unwrap(), 1);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn invalid_count_exceeds_buffer() {
        let mut source = FakeSource::builder().report_invalid_count().build();
        let mut buf = [0; 4];

        assert_eq!(source.read(&mut buf).unwrap(), 5);
    }

    #[test]
    fn interrupt_happens_once() {
        let mut source = FakeSource::builder().contents(b"x".to_vec()).interrupt_first_read().build();
        let mut buf = [0; 4];

        assert_eq!(source.read(&mut buf).unwrap_err().kind(), io::ErrorKind::Interrupted);
        assert_eq!(source.read(&mut buf).unwrap(), 1);
    }
}
