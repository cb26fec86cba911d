//! Fuzz target for record line decoding
//!
//! A peer controls every byte of every line we decode.
//!
//! # Invariants
//!
//! - NEVER panic on arbitrary input
//! - Anything that decodes re-encodes to a line that decodes to the same
//!   record
//! - Re-encoded lines end in exactly one `\n` and fit the frame limit

#![no_main]

use libfuzzer_sys::fuzz_target;
use tpmkey_proto::{decode_line, encode_line, MAX_FRAME_LEN};

fuzz_target!(|data: &[u8]| {
    let Ok(record) = decode_line(data) else {
        return;
    };

    let line = encode_line(&record).expect("decoded record must re-encode");
    assert!(line.len() <= MAX_FRAME_LEN);
    assert_eq!(line.iter().filter(|&&b| b == b'\n').count(), 1);
    assert_eq!(line.last(), Some(&b'\n'));

    let again = decode_line(&line).expect("re-encoded line must decode");
    assert_eq!(again, record);
});
