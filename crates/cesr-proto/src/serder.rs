//! Serder envelope reaping: pull a self-describing message body's size,
//! ilk, and SAID out of a buffer without fully deserializing it.

use bytes::Bytes;
use serde::Deserialize;

use crate::error::{CesrError, Result};
use crate::tables::Versionage;
use crate::vstring::{self, Kind};

/// A reaped message envelope: enough to know how many bytes the body
/// occupies and, where cheaply available, its ilk/SAID metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerderEnvelope {
    /// The exact body bytes, `size` long.
    pub raw: Bytes,
    /// Protocol family from the version string.
    pub proto: String,
    /// Protocol version.
    pub pvrsn: Versionage,
    /// Genus version, present only for v2 bodies.
    pub gvrsn: Option<Versionage>,
    /// Serialization kind.
    pub kind: Kind,
    /// Declared total body size in bytes.
    pub size: usize,
    /// Message type tag (`"t"` field), when cheaply extractable.
    pub ilk: Option<String>,
    /// Self-addressing identifier (`"d"` field), when cheaply extractable.
    pub said: Option<String>,
    /// Native (`FixBodyGroup`/`MapBodyGroup`) field sequence, present only
    /// when this envelope was built from a native body rather than reaped
    /// from a JSON/CBOR serialization.
    pub native: Option<crate::body::NativeBody>,
}

#[derive(Deserialize)]
struct Metadata {
    t: Option<String>,
    d: Option<String>,
}

/// Reap a message envelope from the start of `buf`.
///
/// Finds the version string, validates `buf` holds the full declared size,
/// and extracts `t`/`d` metadata fields for JSON bodies. Non-JSON bodies get
/// `ilk`/`said` as `None` unless the `cbor-peek` feature is enabled and the
/// body is CBOR.
///
/// # Errors
/// - Whatever [`vstring::smell`] returns (`Shortage`/`VersionError`).
/// - [`CesrError::Shortage`] if `buf` is shorter than the declared size.
pub fn reap(buf: &[u8]) -> Result<SerderEnvelope> {
    let sm = vstring::smell(buf)?;
    if buf.len() < sm.size {
        return Err(CesrError::Shortage { need: sm.size, have: buf.len(), offset: None });
    }
    let raw = Bytes::copy_from_slice(&buf[..sm.size]);

    let (ilk, said) = match sm.kind {
        Kind::Json => extract_json(&raw),
        #[cfg(feature = "cbor-peek")]
        Kind::Cbor => extract_cbor(&raw),
        _ => (None, None),
    };

    Ok(SerderEnvelope {
        raw,
        proto: sm.proto,
        pvrsn: sm.pvrsn,
        gvrsn: sm.gvrsn,
        kind: sm.kind,
        size: sm.size,
        ilk,
        said,
        native: None,
    })
}

impl SerderEnvelope {
    /// Build a degenerate envelope for a `NonNativeBodyGroup` payload that
    /// didn't smell as a recognized serialization (spec's documented
    /// leniency: carry the raw bytes rather than failing the whole group).
    #[must_use]
    pub fn opaque(raw: Vec<u8>, active_version: Versionage) -> Self {
        let size = raw.len();
        Self {
            raw: Bytes::from(raw),
            proto: String::new(),
            pvrsn: active_version,
            gvrsn: None,
            kind: Kind::Cesr,
            size,
            ilk: None,
            said: None,
            native: None,
        }
    }
}

fn extract_json(raw: &[u8]) -> (Option<String>, Option<String>) {
    match serde_json::from_slice::<Metadata>(raw) {
        Ok(meta) => (meta.t, meta.d),
        Err(_) => (None, None),
    }
}

#[cfg(feature = "cbor-peek")]
fn extract_cbor(raw: &[u8]) -> (Option<String>, Option<String>) {
    match ciborium::de::from_reader::<Metadata, _>(raw) {
        Ok(meta) => (meta.t, meta.d),
        Err(_) => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_body(t: &str, d: &str) -> Vec<u8> {
        let inner = format!(r#""t":"{t}","d":"{d}""#);
        let body = format!(r#"{{"v":"KERI10JSON000000_",{inner}}}"#);
        let size = body.len();
        body.replace("000000", &format!("{size:06x}")).into_bytes()
    }

    #[test]
    fn reaps_ilk_and_said_from_json_body() {
        let body = json_body("icp", "EExampleSaid");
        let env = reap(&body).unwrap();
        assert_eq!(env.proto, "KERI");
        assert_eq!(env.ilk.as_deref(), Some("icp"));
        assert_eq!(env.said.as_deref(), Some("EExampleSaid"));
        assert_eq!(env.raw.len(), env.size);
    }

    #[test]
    fn shortage_when_buffer_shorter_than_declared_size() {
        let body = json_body("icp", "EExampleSaid");
        let truncated = &body[..body.len() - 10];
        let err = reap(truncated).unwrap_err();
        assert!(err.is_shortage());
    }
}
