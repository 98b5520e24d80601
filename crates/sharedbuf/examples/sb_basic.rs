// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Basics of working with `SharedBuffer`.
//!
//! 1. We append text to a buffer and drain it in pieces, observing that the read cursor advances.
//! 2. We rewind the cursor and replay the buffer into other buffers via the bulk adapters.

use sharedbuf::{ReadOutcome, SharedBuffer, display_or_nil};

fn main() -> sharedbuf::Result<()> {
    let buffer = SharedBuffer::new();

    buffer.write_text("test me\n")?;
    write!(buffer, "test1: this is a test #{}\n", 1)?;

    let mut dest = vec![0; buffer.len()];
    let outcome = buffer.read_into(&mut dest);
    println!("Buffer1: {outcome:?}, {:?}", String::from_utf8_lossy(&dest));
    assert_eq!(outcome, ReadOutcome::Read(33));

    buffer.write(b"test2: another test here!\n")?;
    println!("Buffer2: {:?}", buffer.read_remaining_text());

    buffer.write_text("test3: how about this?\n")?;
    buffer.write(b"Done!")?;
    println!("Buffer3: {:?}", buffer.read_remaining_text());

    // Inspection is independent of the read cursor.
    println!("Buffer str w/o reset: {:?}", buffer.to_text());

    buffer.reset();
    println!("Buffer reset: {:?}", buffer.read_remaining_text());

    buffer.reset();
    let copy = SharedBuffer::new();
    let transferred = copy.read_from(&mut &buffer)?;
    println!("copy read from buffer: {transferred}, {:?}", display_or_nil(Some(&copy)));

    buffer.reset();
    let drained = SharedBuffer::new();
    let transferred = buffer.write_to(&mut &drained)?;
    println!("buffer write to drained: {transferred}, {:?}", String::from_utf8_lossy(&drained.to_vec()));

    println!("absent buffer: {}", display_or_nil(None));

    Ok(())
}
