//! End-to-end scenario tests exercising the parser engine, dispatch, and
//! body parsing together rather than in isolation.

#![allow(clippy::unwrap_used, clippy::panic)]

use cesr_proto::b64;
use cesr_proto::dispatch::{self, DispatchMode, GroupPayload};
use cesr_proto::tables::Versionage;
use cesr_proto::{parse_bytes, CesrError, Emission, ErrorKind, ParserOptions};

fn json_body(t: &str) -> Vec<u8> {
    let body = format!(r#"{{"v":"KERI10JSON000000_","t":"{t}"}}"#);
    let size = body.len();
    body.replace("000000", &format!("{size:06x}")).into_bytes()
}

fn expect_frames(emissions: &[Emission]) -> Vec<&cesr_proto::CesrFrame> {
    emissions
        .iter()
        .map(|e| match e {
            Emission::Frame(f) => f,
            Emission::Error(e) => panic!("unexpected error emission: {e:?}"),
        })
        .collect()
}

#[test]
fn scenario_single_message_no_attachments() {
    let emissions = parse_bytes(&json_body("icp"), ParserOptions::default());
    let frames = expect_frames(&emissions);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].envelope.ilk.as_deref(), Some("icp"));
    assert!(frames[0].attachments.is_empty());
}

#[test]
fn scenario_message_with_attached_signature_group() {
    let raw = [0u8; 64];
    let siger_full = format!("AA{}", b64::encode_b64(&raw));
    let siger = &siger_full[..88];
    let group = format!("-AAB{siger}");

    let mut buf = json_body("icp");
    buf.extend_from_slice(group.as_bytes());

    let emissions = parse_bytes(&buf, ParserOptions::default());
    let frames = expect_frames(&emissions);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].attachments.len(), 1);
    assert_eq!(frames[0].attachments[0].name, "ControllerIdxSigs");
}

#[test]
fn scenario_back_to_back_messages_both_parse() {
    let mut buf = json_body("icp");
    buf.extend_from_slice(&json_body("rot"));

    let emissions = parse_bytes(&buf, ParserOptions::default());
    let frames = expect_frames(&emissions);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].envelope.ilk.as_deref(), Some("icp"));
    assert_eq!(frames[1].envelope.ilk.as_deref(), Some("rot"));
}

/// S4: a truncated final frame surfaces as a single shortage emission, not
/// an `Err` that aborts every frame already parsed.
#[test]
fn scenario_truncated_final_message_is_a_shortage_emission_not_a_parse_error() {
    let body = json_body("icp");
    let truncated = &body[..body.len() - 8];

    let emissions = parse_bytes(truncated, ParserOptions::default());
    assert_eq!(emissions.len(), 1);
    match &emissions[0] {
        Emission::Error(e) => assert_eq!(e.kind, ErrorKind::Shortage),
        Emission::Frame(f) => panic!("unexpected frame emission: {f:?}"),
    }
}

/// S2: a native `FixBodyGroup` body (no surrounding JSON/CBOR) parses to a
/// frame whose envelope carries the decoded native fields.
#[test]
fn scenario_native_fix_body_group_frame() {
    let digest = format!("E{}", b64::encode_b64(&[4u8; 32]));
    let count_field = b64::int_to_b64((digest.len() / 4) as u128, 2).unwrap();
    let buf = format!("-H{count_field}{digest}").into_bytes();

    let emissions = parse_bytes(&buf, ParserOptions::default());
    let frames = expect_frames(&emissions);
    assert_eq!(frames.len(), 1);
    let native = frames[0].envelope.native.as_ref().expect("expected a native body");
    assert_eq!(native.body_code, "FixBodyGroup");
    assert_eq!(native.fields[0].token.code, "E");
}

/// S3: the same native `FixBodyGroup` body, this time fed as raw qb2 bytes,
/// parses to an equivalent frame (text/binary domain parity).
#[test]
fn scenario_binary_domain_native_body_matches_text_domain() {
    let digest = format!("E{}", b64::encode_b64(&[4u8; 32]));
    let count_field = b64::int_to_b64((digest.len() / 4) as u128, 2).unwrap();
    let text = format!("-H{count_field}{digest}");
    let binary = b64::decode_b64(&text).unwrap();

    let text_emissions = parse_bytes(text.as_bytes(), ParserOptions::default());
    let binary_emissions = parse_bytes(&binary, ParserOptions::default());

    let text_frames = expect_frames(&text_emissions);
    let binary_frames = expect_frames(&binary_emissions);
    assert_eq!(text_frames.len(), 1);
    assert_eq!(binary_frames.len(), 1);

    let text_native = text_frames[0].envelope.native.as_ref().unwrap();
    let binary_native = binary_frames[0].envelope.native.as_ref().unwrap();
    assert_eq!(text_native.fields[0].token.code, binary_native.fields[0].token.code);
    assert_eq!(text_native.fields[0].token.raw, binary_native.fields[0].token.raw);
}

/// S5: a trailing annotation (separator) byte after a complete message is
/// skipped silently rather than producing an error.
#[test]
fn scenario_trailing_annotation_produces_one_frame_no_errors() {
    let mut buf = json_body("icp");
    buf.push(b'\n');

    let emissions = parse_bytes(&buf, ParserOptions::default());
    assert_eq!(emissions.len(), 1);
    match &emissions[0] {
        Emission::Frame(f) => assert_eq!(f.envelope.ilk.as_deref(), Some("icp")),
        Emission::Error(e) => panic!("unexpected error emission: {e:?}"),
    }
}

#[test]
fn scenario_compat_mode_bridges_a_v2_only_group_for_a_v1_stream() {
    // "-Q" (GenericGroup) only exists in the v2 table; a v1-declared
    // stream in compat mode should still resolve it via fallback.
    let mut seen_fallback = false;
    let group = dispatch::dispatch_text("-QAA", Versionage { major: 1, minor: 0 }, DispatchMode::Compat, |ev| {
        seen_fallback = true;
        assert_eq!(ev.to.major, 2);
    })
    .unwrap();
    assert_eq!(group.name, "GenericGroup");
    assert!(seen_fallback);
}

#[test]
fn scenario_strict_mode_rejects_the_same_cross_version_group() {
    let err = dispatch::dispatch_text("-QAA", Versionage { major: 1, minor: 0 }, DispatchMode::Strict, |_| {});
    assert!(matches!(err, Err(CesrError::UnknownCode { .. })));
}

#[test]
fn scenario_genus_counter_switches_active_version_mid_stream() {
    // Genus counter "-_AAABAA": soft field's last 3 chars are "BAA",
    // char0='B' (b64 value 1) clamps to major=1, char1='A' -> minor=0.
    let genus = "-_AAABAA";
    let group = dispatch::dispatch_text(genus, Versionage::V2_DEFAULT, DispatchMode::Strict, |_| {}).unwrap();
    match group.payload {
        GroupPayload::Genus(v) => assert_eq!(v.major, 1),
        _ => panic!("expected genus payload"),
    }
}
