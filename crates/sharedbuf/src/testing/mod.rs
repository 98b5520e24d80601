// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Fake byte sources and sinks for testing code that moves data through a
//! [`SharedBuffer`][crate::SharedBuffer].
//!
//! Both fakes can be configured to misbehave in the ways real I/O endpoints do: delivering data in
//! small pieces, failing part-way, or reporting a byte count that cannot be true.

mod fake_sink;
mod fake_source;

pub use fake_sink::*;
pub use fake_source::*;
