// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// The result of draining bytes from a [`SharedBuffer`][crate::SharedBuffer] into a slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReadOutcome {
    /// This many bytes were copied into the destination and consumed from the buffer.
    ///
    /// The count may be zero if the destination slice is empty.
    Read(usize),

    /// No unread bytes remain in the buffer. Nothing was copied.
    EndOfData,
}

impl ReadOutcome {
    /// Number of bytes copied, with [`EndOfData`][Self::EndOfData] counting as zero.
    #[must_use]
    pub const fn count(self) -> usize {
        match self {
            Self::Read(count) => count,
            Self::EndOfData => 0,
        }
    }

    /// Whether the buffer had no unread bytes.
    #[must_use]
    pub const fn is_end_of_data(self) -> bool {
        matches!(self, Self::EndOfData)
    }
}
