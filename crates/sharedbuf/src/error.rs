// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::TryReserveError;
use std::io;

/// The result for fallible operations on a [`SharedBuffer`][crate::SharedBuffer].
pub type Result<T> = std::result::Result<T, Error>;

/// An error signaled by a [`SharedBuffer`][crate::SharedBuffer] operation.
///
/// Appends fail only when the buffer cannot grow. The remaining variants come from the bulk
/// adapters and describe a misbehaving or failing byte source or sink.
///
/// Reaching the end of the unread data is not an error, see [`ReadOutcome`][crate::ReadOutcome].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The logical length would exceed the maximum length of the buffer.
    ///
    /// The buffer is left unchanged.
    #[error("buffer too large (current {current}, new {requested}, max {max})")]
    CapacityExceeded {
        /// Logical length of the buffer when the write was attempted.
        current: usize,
        /// Number of bytes the write tried to append.
        requested: usize,
        /// Maximum logical length of the buffer.
        max: usize,
    },

    /// The allocator could not provide the capacity the buffer needed to grow.
    ///
    /// The buffer is left unchanged.
    #[error("failed to allocate buffer capacity of {requested} bytes")]
    Allocation {
        /// Total capacity that was requested.
        requested: usize,
        /// The allocator failure.
        #[source]
        source: TryReserveError,
    },

    /// The byte source reported reading more bytes than fit into the chunk it was handed.
    #[error("byte source reported reading {reported} bytes into a {capacity}-byte chunk")]
    SourceProtocolViolation {
        /// The impossible count reported by the source.
        reported: usize,
        /// Size of the chunk handed to the source.
        capacity: usize,
        /// Bytes appended to the buffer before the violation.
        transferred: u64,
    },

    /// The byte source failed. Bytes read before the failure remain in the buffer.
    #[error("byte source failed after {transferred} bytes")]
    Source {
        /// Bytes appended to the buffer before the failure.
        transferred: u64,
        /// The error reported by the source.
        #[source]
        source: io::Error,
    },

    /// A chunk read from a byte source could not be appended to the buffer.
    #[error("failed to append chunk to buffer after {transferred} bytes")]
    Append {
        /// Bytes appended to the buffer before the failure.
        transferred: u64,
        /// The reason the append failed.
        #[source]
        source: Box<Self>,
    },

    /// The byte sink accepted fewer bytes than it was offered.
    ///
    /// The read cursor has been advanced by the accepted count.
    #[error("short write: byte sink accepted {accepted} of {offered} bytes")]
    SinkShortWrite {
        /// Bytes accepted by the sink.
        accepted: usize,
        /// Bytes offered to the sink.
        offered: usize,
    },

    /// The byte sink reported accepting more bytes than it was offered.
    ///
    /// The read cursor is left unchanged.
    #[error("invalid write count {reported}, should be at most {offered}")]
    SinkInvalidCount {
        /// The impossible count reported by the sink.
        reported: usize,
        /// Bytes offered to the sink.
        offered: usize,
    },

    /// The byte sink failed without accepting any bytes.
    ///
    /// The read cursor is left unchanged.
    #[error("byte sink failed")]
    Sink {
        /// The error reported by the sink.
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// Number of bytes moved between the buffer and the external source or sink before the failure.
    ///
    /// Growth failures moved nothing and report 0.
    #[must_use]
    pub fn transferred(&self) -> u64 {
        match self {
            Self::CapacityExceeded { .. } | Self::Allocation { .. } | Self::SinkInvalidCount { .. } | Self::Sink { .. } => 0,
            Self::SourceProtocolViolation { transferred, .. } | Self::Source { transferred, .. } | Self::Append { transferred, .. } => {
                *transferred
            }
            Self::SinkShortWrite { accepted, .. } => *accepted as u64,
        }
    }

    pub(crate) const fn capacity_exceeded(current: usize, requested: usize, max: usize) -> Self {
        Self::CapacityExceeded { current, requested, max }
    }

    /// Converts a failed append into the error reported through [`io::Write`].
    ///
    /// Appending can only fail to grow the buffer, which std I/O reports as out of memory.
    pub(crate) fn into_io_error(self) -> io::Error {
        debug_assert!(
            matches!(self, Self::CapacityExceeded { .. } | Self::Allocation { .. }),
            "only growth failures are reported through std I/O"
        );

        io::Error::new(io::ErrorKind::OutOfMemory, self)
    }
}
