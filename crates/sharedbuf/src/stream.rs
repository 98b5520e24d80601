// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io;

use tracing::{Level, event};

use crate::{Error, Result, SharedBuffer};

impl SharedBuffer {
    /// Appends everything `source` yields until it signals end of data.
    ///
    /// The source is read in chunks of [`READ_CHUNK_SIZE`] bytes (configurable via
    /// [`SharedBufferBuilder::read_chunk_size()`]). The buffer is not locked while the source is
    /// read; each chunk is then appended as a separate atomic write, so concurrent readers may
    /// observe the data arriving chunk by chunk.
    ///
    /// Returns the number of bytes appended. Reads failing with [`io::ErrorKind::Interrupted`]
    /// are retried.
    ///
    /// # Errors
    ///
    /// * [`Error::Source`] if the source fails.
    /// * [`Error::SourceProtocolViolation`] if the source reports reading more bytes than the
    ///   chunk it was handed can hold.
    /// * [`Error::Append`] if a chunk cannot be appended to the buffer.
    ///
    /// Bytes appended before the failure remain in the buffer and are reported by
    /// [`Error::transferred()`].
    ///
    /// [`READ_CHUNK_SIZE`]: crate::READ_CHUNK_SIZE
    /// [`SharedBufferBuilder::read_chunk_size()`]: crate::SharedBufferBuilder::read_chunk_size
    pub fn read_from<R>(&self, source: &mut R) -> Result<u64>
    where
        R: io::Read + ?Sized,
    {
        let capacity = self.options().read_chunk_size.get();
        let mut chunk = vec![0_u8; capacity];
        let mut transferred: u64 = 0;

        loop {
            let reported = match source.read(&mut chunk) {
                Ok(0) => break,
                Ok(reported) => reported,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => return Err(Error::Source { transferred, source }),
            };

            let Some(data) = chunk.get(..reported) else {
                return Err(Error::SourceProtocolViolation {
                    reported,
                    capacity,
                    transferred,
                });
            };

            self.write(data).map_err(|e| Error::Append {
                transferred,
                source: Box::new(e),
            })?;

            transferred += reported as u64;
        }

        event!(Level::TRACE, message = "read from byte source", transferred);

        Ok(transferred)
    }

    /// Drains every unread byte into `sink` with a single write.
    ///
    /// The buffer stays locked while the sink runs. A slow sink therefore blocks all other
    /// operations on this buffer until it returns, and a sink that calls back into this same
    /// buffer deadlocks.
    ///
    /// Returns the number of bytes drained, which is zero if nothing was unread (in which case the
    /// sink is not called).
    ///
    /// # Errors
    ///
    /// * [`Error::SinkShortWrite`] if the sink accepts fewer bytes than offered. The read offset
    ///   advances by the accepted count.
    /// * [`Error::SinkInvalidCount`] if the sink reports accepting more bytes than offered. The read
    ///   offset is not changed.
    /// * [`Error::Sink`] if the sink fails. The read offset is not changed.
    pub fn write_to<W>(&self, sink: &mut W) -> Result<u64>
    where
        W: io::Write + ?Sized,
    {
        let mut state = self.lock();

        let offered = state.unread().len();
        if offered == 0 {
            return Ok(0);
        }

        let accepted = sink.write(state.unread()).map_err(|source| Error::Sink { source })?;

        if accepted > offered {
            return Err(Error::SinkInvalidCount {
                reported: accepted,
                offered,
            });
        }

        state.consume(accepted);

        if accepted < offered {
            return Err(Error::SinkShortWrite { accepted, offered });
        }

        event!(Level::TRACE, message = "wrote to byte sink", transferred = accepted);

        Ok(accepted as u64)
    }
}

impl io::Write for &SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        SharedBuffer::write(*self, buf).map_err(Error::into_io_error)
    }

    #[cfg_attr(test, mutants::skip)] // Writes are never buffered, there is nothing to flush.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // Trivial forwarder.
impl io::Write for SharedBuffer {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut &*self, buf)
    }

    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for &SharedBuffer {
    /// Drains unread bytes into `buf`. End of data is reported as `Ok(0)`.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_into(buf).count())
    }
}

#[cfg_attr(coverage_nightly, coverage(off))] // Trivial forwarder.
impl io::Read for SharedBuffer {
    #[cfg_attr(test, mutants::skip)] // Trivial forwarder.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(&mut &*self, buf)
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::num::NonZero;

    use super::*;
    use crate::log_capture::LogCapture;
    use crate::testing::{FakeSink, FakeSource};

    #[test]
    fn read_from_exhausted_source() {
        let buffer = SharedBuffer::new();
        let mut source = FakeSource::empty();

        assert_eq!(buffer.read_from(&mut source).unwrap(), 0);
        assert_eq!(buffer.len(), 0);
        assert_eq!(source.read_calls(), 1);
    }

    #[test]
    fn read_from_appends_in_chunks() {
        let buffer = SharedBuffer::builder().read_chunk_size(NonZero::new(4).unwrap()).build();
        let mut source = FakeSource::new(b"0123456789".to_vec());

        assert_eq!(buffer.read_from(&mut source).unwrap(), 10);
        assert_eq!(buffer.read_remaining_text(), "0123456789");

        // Three chunks of at most 4 bytes plus the end-of-data read.
        assert_eq!(source.read_calls(), 4);
    }

    #[test]
    fn read_from_keeps_existing_content() {
        let buffer = SharedBuffer::from(&b"head:"[..]);
        let mut source = FakeSource::new(b"tail".to_vec());

        buffer.read_from(&mut source).unwrap();

        assert_eq!(buffer.read_remaining_text(), "head:tail");
    }

    #[test]
    fn read_from_retries_interrupted() {
        let buffer = SharedBuffer::new();
        let mut source = FakeSource::builder().contents(b"abc".to_vec()).interrupt_first_read().build();

        assert_eq!(buffer.read_from(&mut source).unwrap(), 3);
        assert_eq!(buffer.to_text(), "abc");
    }

    #[test]
    fn read_from_source_error_keeps_progress() {
        let buffer = SharedBuffer::builder().read_chunk_size(NonZero::new(2).unwrap()).build();
        let mut source = FakeSource::builder()
            .contents(b"abcde".to_vec())
            .fail_with(io::ErrorKind::ConnectionReset)
            .build();

        let error = buffer.read_from(&mut source).unwrap_err();

        assert!(matches!(
            &error,
            Error::Source { transferred: 5, source } if source.kind() == io::ErrorKind::ConnectionReset
        ));
        assert_eq!(error.transferred(), 5);
        assert_eq!(buffer.read_remaining_text(), "abcde");
    }

    #[test]
    fn read_from_detects_invalid_count() {
        let buffer = SharedBuffer::builder().read_chunk_size(NonZero::new(8).unwrap()).build();
        let mut source = FakeSource::builder().contents(b"xyz".to_vec()).report_invalid_count().build();

        let error = buffer.read_from(&mut source).unwrap_err();

        assert!(matches!(
            error,
            Error::SourceProtocolViolation {
                reported: 9,
                capacity: 8,
                transferred: 3
            }
        ));
        assert_eq!(buffer.read_remaining_text(), "xyz");
    }

    #[test]
    fn read_from_reports_append_failure() {
        let buffer = SharedBuffer::builder()
            .read_chunk_size(NonZero::new(4).unwrap())
            .max_len(6)
            .build();
        let mut source = FakeSource::new(b"abcdefgh".to_vec());

        let error = buffer.read_from(&mut source).unwrap_err();

        assert!(matches!(
            &error,
            Error::Append { transferred: 4, source }
                if matches!(**source, Error::CapacityExceeded { current: 4, requested: 4, max: 6 })
        ));
        assert_eq!(buffer.read_remaining_text(), "abcd");
    }

    #[test]
    fn write_to_drains_everything() {
        let buffer = SharedBuffer::from(&b"hello world"[..]);
        let mut sink = FakeSink::new();

        assert_eq!(buffer.write_to(&mut sink).unwrap(), 11);
        assert_eq!(buffer.len(), 0);
        assert_eq!(sink.contents(), b"hello world");
    }

    #[test]
    fn write_to_skips_sink_when_drained() {
        let buffer = SharedBuffer::from(&b"abc"[..]);
        _ = buffer.read_remaining_text();
        let mut sink = FakeSink::new();

        assert_eq!(buffer.write_to(&mut sink).unwrap(), 0);
        assert_eq!(sink.write_calls(), 0);
    }

    #[test]
    fn write_to_only_offers_unread_bytes() {
        let buffer = SharedBuffer::from(&b"skip|keep"[..]);
        _ = buffer.read_into(&mut [0; 5]);
        let mut sink = FakeSink::new();

        assert_eq!(buffer.write_to(&mut sink).unwrap(), 4);
        assert_eq!(sink.contents(), b"keep");
        assert_eq!(buffer.to_vec(), b"skip|keep");
    }

    #[test]
    fn write_to_short_write_advances_by_accepted() {
        let buffer = SharedBuffer::from(&b"hello world"[..]);
        let mut sink = FakeSink::builder().accept_at_most(5).build();

        let error = buffer.write_to(&mut sink).unwrap_err();

        assert!(matches!(error, Error::SinkShortWrite { accepted: 5, offered: 11 }));
        assert_eq!(buffer.len(), 6);
        assert_eq!(buffer.read_remaining_text(), " world");
    }

    #[test]
    fn write_to_invalid_count_leaves_offset() {
        let buffer = SharedBuffer::from(&b"hello"[..]);
        let mut sink = FakeSink::builder().overreport(1).build();

        let error = buffer.write_to(&mut sink).unwrap_err();

        assert!(matches!(error, Error::SinkInvalidCount { reported: 6, offered: 5 }));
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn write_to_sink_error_leaves_offset() {
        let buffer = SharedBuffer::from(&b"hello"[..]);
        let mut sink = FakeSink::builder().fail_with(io::ErrorKind::BrokenPipe).build();

        let error = buffer.write_to(&mut sink).unwrap_err();

        assert!(matches!(&error, Error::Sink { source } if source.kind() == io::ErrorKind::BrokenPipe));
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn buffers_feed_each_other() {
        let source = SharedBuffer::new();
        source.write_text("test me\n").unwrap();

        let copy = SharedBuffer::new();
        assert_eq!(copy.read_from(&mut &source).unwrap(), 8);
        assert_eq!(copy.to_text(), "test me\n");

        source.reset();
        let target = SharedBuffer::new();
        assert_eq!(source.write_to(&mut &target).unwrap(), 8);
        assert_eq!(target.to_vec(), b"test me\n");
        assert!(source.is_empty());
    }

    #[test]
    fn std_io_traits() {
        let mut buffer = SharedBuffer::new();

        buffer.write_all(b"line one\n").unwrap();
        (&buffer).write_all(b"line two\n").unwrap();
        buffer.flush().unwrap();

        let mut text = String::new();
        (&buffer).read_to_string(&mut text).unwrap();
        assert_eq!(text, "line one\nline two\n");

        let mut rest = Vec::new();
        assert_eq!(buffer.read_to_end(&mut rest).unwrap(), 0);
    }

    #[test]
    fn snapshot_with_std_io_traits_in_scope() {
        let mut buffer = SharedBuffer::new();
        buffer.write_all(b"abc").unwrap();

        assert_eq!(buffer.to_vec(), b"abc");
        assert_eq!(buffer.to_vec(), b"abc");
        assert_eq!(buffer.len(), 3);

        let mut drained = Vec::new();
        buffer.read_to_end(&mut drained).unwrap();
        assert_eq!(drained, b"abc");
        assert_eq!(buffer.to_vec(), b"abc");
    }

    #[test]
    fn std_io_copy_between_buffers() {
        let source = SharedBuffer::from(vec![42; 100_000]);
        let target = SharedBuffer::new();

        let copied = io::copy(&mut &source, &mut &target).unwrap();

        assert_eq!(copied, 100_000);
        assert_eq!(target.len(), 100_000);
        assert!(source.is_empty());
    }

    #[test]
    fn std_io_write_maps_growth_failure() {
        let buffer = SharedBuffer::builder().max_len(4).build();

        let error = (&buffer).write_all(b"too long").unwrap_err();

        assert_eq!(error.kind(), io::ErrorKind::OutOfMemory);
        assert!(buffer.is_empty());
    }

    #[test]
    fn transfers_are_logged() {
        let log_capture = LogCapture::new();
        let _guard = log_capture.set_default();

        let buffer = SharedBuffer::new();
        buffer.read_from(&mut FakeSource::new(b"abc".to_vec())).unwrap();
        buffer.write_to(&mut FakeSink::new()).unwrap();

        log_capture.assert_contains("read from byte source");
        log_capture.assert_contains("wrote to byte sink");
        log_capture.assert_contains("transferred=3");
    }
}
