// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::any::type_name;
use std::io;

/// A byte sink that collects all accepted bytes into itself.
///
/// This is for test and example purposes only and is not optimized for performance.
///
/// By default every write is accepted in full. The sink can be configured to accept only part of
/// each write, to report accepting more bytes than it was offered, or to fail.
///
/// # Example
///
/// ```
/// use sharedbuf::testing::FakeSink;
/// use sharedbuf::{Error, SharedBuffer};
///
/// let buffer = SharedBuffer::from(&b"hello world"[..]);
/// let mut sink = FakeSink::builder().accept_at_most(5).build();
///
/// let error = buffer.write_to(&mut sink).unwrap_err();
/// assert!(matches!(error, Error::SinkShortWrite { accepted: 5, offered: 11 }));
/// assert_eq!(sink.contents(), b"hello");
/// assert_eq!(buffer.len(), 6);
/// ```
pub struct FakeSink {
    contents: Vec<u8>,
    accept_at_most: Option<usize>,
    overreport: usize,
    fail_with: Option<io::ErrorKind>,
    write_calls: usize,
}

impl FakeSink {
    /// Starts building a new `FakeSink`.
    pub fn builder() -> FakeSinkBuilder {
        FakeSinkBuilder {
            accept_at_most: None,
            overreport: 0,
            fail_with: None,
        }
    }

    /// Creates a sink that accepts every write in full.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// References the bytes accepted by the sink so far.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Consumes the sink and returns the bytes it accepted.
    #[must_use]
    pub fn into_contents(self) -> Vec<u8> {
        self.contents
    }

    /// Number of times [`write()`](io::Write::write) has been called.
    #[must_use]
    pub fn write_calls(&self) -> usize {
        self.write_calls
    }
}

impl Default for FakeSink {
    fn default() -> Self {
        Self::new()
    }
}

impl io::Write for FakeSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_calls += 1;

        if let Some(kind) = self.fail_with {
            return Err(io::Error::new(kind, "fake sink failure"));
        }

        let count = buf.len().min(self.accept_at_most.unwrap_or(usize::MAX));
        self.contents.extend_from_slice(&buf[..count]);

        Ok(count + self.overreport)
    }

    #[cfg_attr(test, mutants::skip)] // Nothing to flush.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for FakeSink {
    #[cfg_attr(coverage_nightly, coverage(off))] // We have no API contract here.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("len", &self.contents.len())
            .field("accept_at_most", &self.accept_at_most)
            .field("overreport", &self.overreport)
            .field("fail_with", &self.fail_with)
            .field("write_calls", &self.write_calls)
            .finish_non_exhaustive()
    }
}

/// Creates an instance of [`FakeSink`].
///
/// Access through [`FakeSink::builder()`].
#[derive(Debug)]
#[must_use]
pub struct FakeSinkBuilder {
    accept_at_most: Option<usize>,
    overreport: usize,
    fail_with: Option<io::ErrorKind>,
}

impl FakeSinkBuilder {
    /// Accepts at most `bytes` of each write.
    pub fn accept_at_most(mut self, bytes: usize) -> Self {
        self.accept_at_most = Some(bytes);
        self
    }

    /// Reports accepting `extra` bytes more than were actually accepted.
    pub fn overreport(mut self, extra: usize) -> Self {
        self.overreport = extra;
        self
    }

    /// Fails every write with an error of `kind`, accepting nothing.
    pub fn fail_with(mut self, kind: io::ErrorKind) -> Self {
        self.fail_with = Some(kind);
        self
    }

    /// Builds the `FakeSink` with the provided configuration.
    #[must_use]
    pub fn build(self) -> FakeSink {
        FakeSink {
            contents: Vec::new(),
            accept_at_most: self.accept_at_most,
            overreport: self.overreport,
            fail_with: self.fail_with,
            write_calls: 0,
        }
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn accepts_everything_by_default() {
        let mut sink = FakeSink::new();

        assert_eq!(sink.write(b"hello").unwrap(), 5);
        assert_eq!(sink.write(b" world").unwrap(), 6);
        assert_eq!(sink.into_contents(), b"hello world");
    }

    #[test]
    fn accept_at_most_limits_each_write() {
        let mut sink = FakeSink::builder().accept_at_most(2).build();

        assert_eq!(sink.write(b"abc").unwrap(), 2);
        assert_eq!(sink.write(b"def").unwrap(), 2);
        assert_eq!(sink.contents(), b"abde");
        assert_eq!(sink.write_calls(), 2);
    }

    #[test]
    fn overreport_adds_to_count() {
        let mut sink = FakeSink::builder().overreport(3).build();

        assert_eq!(sink.write(b"ab").unwrap(), 5);
        assert_eq!(sink.contents(), b"ab");
    }

    #[test]
    fn fail_with_accepts_nothing() {
        let mut sink = FakeSink::builder().fail_with(io::ErrorKind::BrokenPipe).build();

        assert_eq!(sink.write(b"ab").unwrap_err().kind(), io::ErrorKind::BrokenPipe);
        assert!(sink.contents().is_empty());
    }
}
