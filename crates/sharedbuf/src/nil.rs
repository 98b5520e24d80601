// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Text helpers that tolerate a missing buffer, useful when logging optional state.

use crate::SharedBuffer;

/// The text returned in place of an absent buffer's contents.
pub const NIL_SENTINEL: &str = "<nil>";

/// Returns every byte written to `buffer` as text, or [`NIL_SENTINEL`] if there is no buffer.
///
/// See [`SharedBuffer::to_text()`].
///
/// ```
/// use sharedbuf::{SharedBuffer, display_or_nil};
///
/// let buffer = SharedBuffer::from(&b"ready"[..]);
///
/// assert_eq!(display_or_nil(Some(&buffer)), "ready");
/// assert_eq!(display_or_nil(None), "<nil>");
/// ```
#[must_use]
pub fn display_or_nil(buffer: Option<&SharedBuffer>) -> String {
    buffer.map_or_else(|| NIL_SENTINEL.to_owned(), SharedBuffer::to_text)
}

/// Drains the unread bytes of `buffer` as text, or returns [`NIL_SENTINEL`] if there is no buffer.
///
/// See [`SharedBuffer::read_remaining_text()`].
#[must_use]
pub fn drain_text_or_nil(buffer: Option<&SharedBuffer>) -> String {
    buffer.map_or_else(|| NIL_SENTINEL.to_owned(), SharedBuffer::read_remaining_text)
}
