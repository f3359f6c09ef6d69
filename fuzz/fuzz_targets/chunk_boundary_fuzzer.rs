//! Fuzz target for streaming parser chunk-boundary handling.
//!
//! Feeds the same arbitrary byte sequence to the [`Parser`] in one shot
//! and split at an arbitrary offset, and checks that both runs agree on
//! how many frames they produced and never panic.
//!
//! # Invariants
//!
//! - Splitting the input at any offset never changes the number of
//!   frames produced (chunk-independence).
//! - No input, however malformed, causes a panic: every failure path
//!   returns a structured `CesrError`.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use cesr_proto::{create_parser, parse_bytes, ParserOptions};

#[derive(Debug, Arbitrary)]
struct ChunkedInput {
    data: Vec<u8>,
    split_at: usize,
}

fuzz_target!(|input: ChunkedInput| {
    let whole = parse_bytes(&input.data, ParserOptions::default());

    let split = if input.data.is_empty() { 0 } else { input.split_at % input.data.len() };
    let mut parser = create_parser();
    parser.feed(&input.data[..split]);
    let mut frames = parser.drain().unwrap_or_default();
    parser.feed(&input.data[split..]);
    frames.extend(parser.drain().unwrap_or_default());
    let flushed = parser.flush();

    if let (Ok(whole_frames), true) = (&whole, flushed.is_ok()) {
        assert_eq!(whole_frames.len(), frames.len());
    }
});
