//! Fuzz target for matter/counter/indexer token decoding.
//!
//! This fuzzer tests text-domain token decoding with arbitrary byte
//! sequences to find:
//! - Parser crashes or panics
//! - Integer overflows in soft-size arithmetic
//! - Buffer over-reads when slicing by declared size
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an
//! error variant of `CesrError`.

#![no_main]

use libfuzzer_sys::fuzz_target;
use cesr_proto::tables::Versionage;
use cesr_proto::{counter, indexer, matter};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else { return };

    let _ = matter::decode_text(text);
    let _ = indexer::decode_text(text);
    let _ = counter::decode_text(text, Versionage::V2_DEFAULT);
    let _ = counter::decode_text(text, Versionage { major: 1, minor: 0 });

    let _ = matter::decode_binary(data);
    let _ = indexer::decode_binary(data);
    let _ = counter::decode_binary(data, Versionage::V2_DEFAULT);
});
