//! Property-based tests for the cross-cutting invariants the parser
//! engine depends on: chunking shouldn't change what gets parsed, matter
//! tokens round-trip byte-for-byte, and dispatch never over- or
//! under-consumes its declared payload.

#![allow(clippy::unwrap_used)]

use cesr_proto::{b64, create_parser, matter, parse_bytes, CesrFrame, Emission, ParserOptions};
use proptest::prelude::*;

fn json_body(t: &str, extra_pad: usize) -> Vec<u8> {
    let padding = "x".repeat(extra_pad);
    let body = format!(r#"{{"v":"KERI10JSON000000_","t":"{t}","p":"{padding}"}}"#);
    let size = body.len();
    body.replace("000000", &format!("{size:06x}")).into_bytes()
}

fn split_into_chunks(buf: &[u8], cut_points: &[usize]) -> Vec<Vec<u8>> {
    let mut cuts: Vec<usize> = cut_points.iter().copied().filter(|&c| c > 0 && c < buf.len()).collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunks = Vec::new();
    let mut start = 0;
    for cut in cuts {
        chunks.push(buf[start..cut].to_vec());
        start = cut;
    }
    chunks.push(buf[start..].to_vec());
    chunks
}

fn only_frames(emissions: Vec<Emission>) -> Vec<CesrFrame> {
    emissions
        .into_iter()
        .filter_map(|e| match e {
            Emission::Frame(f) => Some(f),
            Emission::Error(_) => None,
        })
        .collect()
}

proptest! {
    /// Parsing a buffer in one shot, or fed in arbitrarily many pieces,
    /// must yield the same frames.
    #[test]
    fn chunk_boundaries_do_not_change_parsed_output(
        extra_pad in 0usize..40,
        cuts in proptest::collection::vec(0usize..120, 0..8),
    ) {
        let buf = json_body("icp", extra_pad);

        let whole = only_frames(parse_bytes(&buf, ParserOptions::default()));

        let mut parser = create_parser(ParserOptions::default());
        let mut chunked = Vec::new();
        for chunk in split_into_chunks(&buf, &cuts) {
            chunked.extend(parser.feed(&chunk));
        }
        chunked.extend(parser.flush());
        let chunked = only_frames(chunked);

        prop_assert_eq!(whole.len(), chunked.len());
        for (a, b) in whole.iter().zip(chunked.iter()) {
            prop_assert_eq!(&a.envelope.ilk, &b.envelope.ilk);
            prop_assert_eq!(a.envelope.size, b.envelope.size);
        }
    }

    /// A body's attachment group surviving a chunk boundary cut mid-token
    /// still attaches to the same frame regardless of where the cut lands.
    #[test]
    fn chunk_boundaries_do_not_change_attachment_output(cut in 0usize..200) {
        let raw = [9u8; 64];
        let siger_full = format!("AB{}", b64::encode_b64(&raw));
        let siger = &siger_full[..88];
        let group = format!("-AAB{siger}");
        let mut buf = json_body("icp", 0);
        buf.extend_from_slice(group.as_bytes());

        let whole = only_frames(parse_bytes(&buf, ParserOptions::default()));

        let mut parser = create_parser(ParserOptions::default());
        let mut chunked = Vec::new();
        for chunk in split_into_chunks(&buf, &[cut]) {
            chunked.extend(parser.feed(&chunk));
        }
        chunked.extend(parser.flush());
        let chunked = only_frames(chunked);

        prop_assert_eq!(whole.len(), 1);
        prop_assert_eq!(chunked.len(), 1);
        prop_assert_eq!(whole[0].attachments.len(), chunked[0].attachments.len());
        if !whole[0].attachments.is_empty() {
            prop_assert_eq!(&whole[0].attachments[0].name, &chunked[0].attachments[0].name);
        }
    }

    /// Decoding a matter token and re-encoding its raw bytes under its code
    /// reproduces the original qb64 text exactly.
    #[test]
    fn matter_round_trip_is_byte_exact(raw in proptest::collection::vec(any::<u8>(), 32..=32)) {
        let text = format!("E{}", cesr_proto::b64::encode_b64(&raw));
        let token = matter::decode_text(&text).unwrap();
        prop_assert_eq!(token.reencode(), text);
    }

    /// A matter token's declared binary size is always the ceiling-3/4
    /// conversion of its text size, regardless of which fixed-size code
    /// produced it.
    #[test]
    fn matter_size_identity_holds(raw in proptest::collection::vec(any::<u8>(), 32..=32)) {
        let text = format!("E{}", cesr_proto::b64::encode_b64(&raw));
        let token = matter::decode_text(&text).unwrap();
        prop_assert_eq!(token.full_size_binary, cesr_proto::b64::text_to_binary_len(token.full_size_text));
    }

    /// Dispatching a `RawQuadlets` group consumes exactly `4 * count`
    /// payload characters: never fewer (truncated), never more (overrun).
    #[test]
    fn raw_quadlets_dispatch_consumes_exactly_its_declared_size(quadlets in 0usize..30) {
        let payload: String = "A".repeat(quadlets * 4);
        let count_field = cesr_proto::b64::int_to_b64(quadlets as u128, 2).unwrap();
        let text = format!("-H{count_field}{payload}");

        let group = cesr_proto::dispatch::dispatch_text(
            &text,
            cesr_proto::Versionage::V2_DEFAULT,
            cesr_proto::DispatchMode::Strict,
            |_| {},
        ).unwrap();

        prop_assert_eq!(group.consumed_text, text.len());
    }
}
