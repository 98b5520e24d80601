// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A thread-safe growable byte buffer with shared append and read cursors.
//!
//! [`SharedBuffer`] is the in-memory analogue of a pipe. Producers append bytes at the end of the
//! buffer, consumers drain bytes from a read cursor that only moves forward. Any number of threads
//! may call any operation on the same buffer at the same time without external synchronization.
//!
//! ```
//! use sharedbuf::{ReadOutcome, SharedBuffer};
//!
//! let buffer = SharedBuffer::new();
//!
//! buffer.write_text("test me\n")?;
//! write!(buffer, "test1: this is a test #{}\n", 1)?;
//!
//! let mut dest = vec![0; buffer.len()];
//! assert_eq!(buffer.read_into(&mut dest), ReadOutcome::Read(33));
//! assert_eq!(buffer.read_into(&mut dest), ReadOutcome::EndOfData);
//! # Ok::<(), sharedbuf::Error>(())
//! ```
//!
//! # Storage layout
//!
//! The buffer owns one contiguous store. Bytes that have been written are never moved relative to
//! each other, so the read cursor stays meaningful across reallocations:
//!
//! ```text
//! 0            read offset           length            capacity
//! | consumed    | unread              | reserve          |
//! ```
//!
//! Consumed bytes remain physically present until [`SharedBuffer::clear()`] is called, which means
//! [`SharedBuffer::reset()`] can replay them.
//!
//! # Locking
//!
//! A single mutex guards the whole buffer state and every public operation holds it for its entire
//! duration, so each call is linearizable with respect to every other call on the same buffer.
//! No operation waits for data to arrive: reading from a drained buffer returns
//! [`ReadOutcome::EndOfData`] immediately.
//!
//! The bulk adapters interact with external I/O differently:
//!
//! * [`SharedBuffer::read_from()`] calls the byte source without holding the lock and appends each
//!   chunk as a separate atomic write. Concurrent readers may observe partial progress.
//! * [`SharedBuffer::write_to()`] holds the lock while the byte sink runs. A slow sink blocks every
//!   other operation on the buffer until it returns.
//!
//! # Inspecting the contents
//!
//! [`SharedBuffer::to_vec()`] returns an owned snapshot of everything written so far.
//! [`SharedBuffer::with_bytes()`] lends the same region to a closure without copying; the borrow
//! cannot outlive the closure, so a later reallocation can never invalidate it.
//!
//! The `test-util` feature enables fake byte sources and sinks in the `testing` module.

use std::num::NonZero;

mod buffer;
mod builder;
mod error;
#[cfg(test)]
mod log_capture;
mod nil;
mod outcome;
mod stream;

pub use buffer::SharedBuffer;
pub use builder::SharedBufferBuilder;
pub use error::{Error, Result};
pub use nil::{NIL_SENTINEL, display_or_nil, drain_text_or_nil};
pub use outcome::ReadOutcome;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

/// Capacity of the first allocation made by a buffer, unless the first write needs more.
pub const SMALL_ALLOCATION: usize = 64;

/// Size of the chunks that [`SharedBuffer::read_from()`] pulls from a byte source.
pub const READ_CHUNK_SIZE: NonZero<usize> = NonZero::new(32 * 1024).unwrap();

/// The largest logical length a buffer can reach.
///
/// Rust does not permit allocations larger than `isize::MAX` bytes.
pub const MAX_LEN: usize = isize::MAX.unsigned_abs();
