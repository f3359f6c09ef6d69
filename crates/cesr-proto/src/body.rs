//! Body parsing: the four body-group shapes a `BodyWithAttachmentGroup`
//! wrapper (or a bare body-group counter at frame start) can carry.
//!
//! Native bodies (`FixBodyGroup`/`MapBodyGroup` and their "Big" siblings)
//! are CESR-native field sequences rather than a foreign serialization;
//! non-native bodies (`NonNativeBodyGroup`/`BigNonNativeBodyGroup`) wrap a
//! JSON/CBOR/MGPK [`SerderEnvelope`].

use crate::dispatch::{AttachmentGroup, GroupPayload};
use crate::error::{CesrError, Result};
use crate::matter::{self, MatterToken};
use crate::serder::{self, SerderEnvelope};
use crate::sniff::Domain;
use crate::tables::counter::is_body_group_name;
use crate::tables::matter::{is_digest_code, is_verfer_code};
use crate::tables::Versionage;

/// One field of a native body. `label` is `Some` only inside a
/// `MapBodyGroup`; a `FixBodyGroup`'s fields are positional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeField {
    /// The field's label token, for `MapBodyGroup` (any matter code is
    /// accepted here — the labeler is lenient).
    pub label: Option<MatterToken>,
    /// The field's value token (digest, verifier, verser, or ilker code).
    pub token: MatterToken,
}

/// A decoded `FixBodyGroup`/`MapBodyGroup` native body: its field sequence
/// plus whatever `proto`/`pvrsn`/`ilk`/`said` metadata its verser/ilker/
/// digest fields carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeBody {
    /// The body-group name this was decoded from, e.g. `"FixBodyGroup"`.
    pub body_code: &'static str,
    /// The field sequence, in wire order.
    pub fields: Vec<NativeField>,
    /// Protocol family, from a verser field if present.
    pub proto: Option<String>,
    /// Protocol version, from a verser field if present.
    pub pvrsn: Option<Versionage>,
    /// Message type tag, from an ilker field if present.
    pub ilk: Option<String>,
    /// Self-addressing identifier, from the first digest-coded field.
    pub said: Option<String>,
}

/// The interpreted shape of a body group's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyKind {
    /// `FixBodyGroup`/`BigFixBodyGroup`/`MapBodyGroup`/`BigMapBodyGroup`: a
    /// CESR-native field sequence.
    Native(NativeBody),
    /// `NonNativeBodyGroup`/`BigNonNativeBodyGroup`: a foreign-serialized
    /// envelope (JSON, or CBOR/MGPK behind the `cbor-peek` feature).
    NonNative(SerderEnvelope),
    /// Recovery path: a `NonNativeBodyGroup` whose payload didn't reap as
    /// a valid envelope. Carries the raw bytes instead of failing the
    /// whole group, matching the one documented leniency in this family.
    Opaque(Vec<u8>),
}

/// Parse a dispatched body-group [`AttachmentGroup`] into its [`BodyKind`].
///
/// `domain` is the domain the group was dispatched in: a `Fix`/`MapBodyGroup`
/// payload is a sequence of nested matter tokens, and those tokens are
/// decoded through `matter::decode_text`/`decode_binary` according to it.
/// `NonNativeBodyGroup` payloads are domain-independent raw bytes either way.
///
/// # Errors
/// - Returns an error if `group.name` is not one of the recognized
///   `RawQuadlets`-shaped body-group names (`BodyWithAttachmentGroup` and
///   its "Big" sibling are `Wrapper`-shaped and are not handled here; the
///   parser engine splits their nested payload before reaching this
///   function).
/// - For native bodies, [`CesrError::Deserialize`] if a value field's code
///   is neither a digest, verifier, verser, nor ilker code.
pub fn parse_body(group: &AttachmentGroup, domain: Domain) -> Result<BodyKind> {
    if !is_body_group_name(group.name) {
        return Err(CesrError::Deserialize {
            hint: Some(format!("`{}` is not a body-group name", group.name)),
            offset: None,
        });
    }

    let raw = match &group.payload {
        GroupPayload::RawQuadlets(bytes) => bytes,
        _ => {
            return Err(CesrError::Deserialize {
                hint: Some("body group payload was not raw quadlets".to_string()),
                offset: None,
            })
        },
    };

    match group.name {
        "FixBodyGroup" | "BigFixBodyGroup" => parse_fix(group.name, raw, domain),
        "MapBodyGroup" | "BigMapBodyGroup" => parse_map(group.name, raw, domain),
        "NonNativeBodyGroup" | "BigNonNativeBodyGroup" => Ok(parse_non_native(raw)),
        other => Err(CesrError::Deserialize {
            hint: Some(format!("unhandled body-group name `{other}`")),
            offset: None,
        }),
    }
}

fn parse_fix(body_code: &'static str, raw: &[u8], domain: Domain) -> Result<BodyKind> {
    let mut fields = Vec::new();
    let mut cursor = 0usize;
    while cursor < raw.len() {
        let (token, len) = decode_token(raw, cursor, domain)?;
        require_value_code(&token)?;
        cursor += len;
        fields.push(NativeField { label: None, token });
    }
    Ok(BodyKind::Native(finish_native(body_code, fields)))
}

fn parse_map(body_code: &'static str, raw: &[u8], domain: Domain) -> Result<BodyKind> {
    let mut fields = Vec::new();
    let mut cursor = 0usize;
    while cursor < raw.len() {
        // The labeler is lenient: any decodable matter code names a field.
        let (label, label_len) = decode_token(raw, cursor, domain)?;
        cursor += label_len;

        let (token, len) = decode_token(raw, cursor, domain)?;
        require_value_code(&token)?;
        cursor += len;

        fields.push(NativeField { label: Some(label), token });
    }
    Ok(BodyKind::Native(finish_native(body_code, fields)))
}

/// Decode one nested matter token from `raw[cursor..]`, returning it
/// alongside how many bytes of `raw` it consumed.
fn decode_token(raw: &[u8], cursor: usize, domain: Domain) -> Result<(MatterToken, usize)> {
    match domain {
        Domain::Binary => {
            let tok = matter::decode_binary(&raw[cursor..])?;
            let len = tok.full_size_binary;
            Ok((tok, len))
        },
        _ => {
            let text = as_utf8(&raw[cursor..])?;
            let tok = matter::decode_text(text)?;
            let len = tok.full_size_text;
            Ok((tok, len))
        },
    }
}

fn as_utf8(raw: &[u8]) -> Result<&str> {
    std::str::from_utf8(raw).map_err(|_| CesrError::Deserialize {
        hint: Some("native body payload was not valid utf-8".to_string()),
        offset: None,
    })
}

fn finish_native(body_code: &'static str, fields: Vec<NativeField>) -> NativeBody {
    let (proto, pvrsn, ilk, said) = extract_metadata(&fields);
    NativeBody { body_code, fields, proto, pvrsn, ilk, said }
}

/// Scan a native body's fields in wire order for verser ("O"), ilker ("X"),
/// and (first) digest-coded fields, pulling out the `proto`/`pvrsn`/`ilk`/
/// `said` metadata a `SerderEnvelope` normally carries.
fn extract_metadata(fields: &[NativeField]) -> (Option<String>, Option<Versionage>, Option<String>, Option<String>) {
    let mut proto = None;
    let mut pvrsn = None;
    let mut ilk = None;
    let mut said = None;

    for field in fields {
        let tok = &field.token;
        match tok.code.as_str() {
            "O" => {
                if let Some((p, v)) = decode_verser(tok) {
                    proto = Some(p);
                    pvrsn = Some(v);
                }
            },
            "X" => {
                if let Some(tag) = decode_ilker(tok) {
                    ilk = Some(tag);
                }
            },
            code if said.is_none() && is_digest_code(code) => {
                said = Some(tok.qb64_text.clone());
            },
            _ => {},
        }
    }

    (proto, pvrsn, ilk, said)
}

/// A verser's raw body is 6 bytes: a 4-byte ASCII protocol tag followed by
/// one byte each of major and minor version.
fn decode_verser(tok: &MatterToken) -> Option<(String, Versionage)> {
    if tok.raw.len() < 6 {
        return None;
    }
    let proto = String::from_utf8(tok.raw[0..4].to_vec()).ok()?;
    let major = Versionage::clamp_major(tok.raw[4]);
    let minor = tok.raw[5];
    Some((proto, Versionage { major, minor }))
}

/// An ilker's raw body is 3 bytes: an ASCII ilk tag (`"icp"`, `"rot"`, ...).
fn decode_ilker(tok: &MatterToken) -> Option<String> {
    if tok.raw.len() < 3 {
        return None;
    }
    String::from_utf8(tok.raw[0..3].to_vec()).ok()
}

fn require_value_code(token: &MatterToken) -> Result<()> {
    if is_digest_code(&token.code) || is_verfer_code(&token.code) || token.code == "O" || token.code == "X" {
        Ok(())
    } else {
        Err(CesrError::Deserialize {
            hint: Some(format!("value field code `{}` is neither digest, verifier, verser, nor ilker", token.code)),
            offset: None,
        })
    }
}

fn parse_non_native(raw: &[u8]) -> BodyKind {
    match serder::reap(raw) {
        Ok(envelope) => BodyKind::NonNative(envelope),
        Err(_) => BodyKind::Opaque(raw.to_vec()),
    }
}
