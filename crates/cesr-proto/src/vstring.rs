//! Version-string smeller: recognizes v1/v2 message headers inside a
//! serialized body.

use crate::b64;
use crate::error::{CesrError, Result};
use crate::tables::Versionage;

/// Serialization kind named by a version string's `KIND` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// JavaScript Object Notation.
    Json,
    /// Concise Binary Object Representation.
    Cbor,
    /// `MessagePack`.
    MsgPack,
    /// Native CESR body (no foreign serialization).
    Cesr,
}

impl Kind {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "JSON" => Some(Self::Json),
            "CBOR" => Some(Self::Cbor),
            "MGPK" => Some(Self::MsgPack),
            "CESR" => Some(Self::Cesr),
            _ => None,
        }
    }
}

/// The result of a successful version-string smell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Smellage {
    /// Protocol family, e.g. `"KERI"` or `"ACDC"`.
    pub proto: String,
    /// Protocol version.
    pub pvrsn: Versionage,
    /// Genus version, present only for v2 bodies.
    pub gvrsn: Option<Versionage>,
    /// Serialization kind.
    pub kind: Kind,
    /// Declared total body size in bytes.
    pub size: usize,
    /// Byte offset within the scanned window where the version string
    /// started.
    pub offset: usize,
    /// Length in bytes of the matched version-string token itself.
    pub match_len: usize,
}

const WINDOW: usize = 256;
const MAX_START_OFFSET: usize = 8;
const V1_LEN: usize = 17;
const V2_LEN: usize = 19;

/// Scan the first up to 256 bytes of `raw` for a v1 or v2 version string.
///
/// # Errors
/// - [`CesrError::Shortage`] if `raw` is too short to rule out a match
///   further along (`raw.len() < 64`).
/// - [`CesrError::VersionError`] if no window matches and `raw.len() >= 64`.
pub fn smell(raw: &[u8]) -> Result<Smellage> {
    let window = &raw[..raw.len().min(WINDOW)];

    for offset in 0..=MAX_START_OFFSET.min(window.len()) {
        if let Some(rest) = window.get(offset..) {
            if rest.len() >= V1_LEN {
                if let Some(sm) = try_v1(rest, offset) {
                    return Ok(sm);
                }
            }
            if rest.len() >= V2_LEN {
                if let Some(sm) = try_v2(rest, offset) {
                    return Ok(sm);
                }
            }
        }
    }

    if raw.len() >= 64 {
        Err(CesrError::VersionError { offset: Some(0) })
    } else {
        Err(CesrError::shortage(64, raw.len()))
    }
}

fn is_upper_ascii(b: &[u8]) -> bool {
    b.iter().all(u8::is_ascii_uppercase)
}

fn is_hex(b: &[u8]) -> bool {
    b.iter().all(|c| c.is_ascii_hexdigit())
}

fn try_v1(rest: &[u8], offset: usize) -> Option<Smellage> {
    if rest.len() < V1_LEN {
        return None;
    }
    let proto = &rest[0..4];
    let major = &rest[4..5];
    let minor = &rest[5..6];
    let kind = &rest[6..10];
    let size = &rest[10..16];
    let term = rest[16];

    if !is_upper_ascii(proto) || !is_hex(major) || !is_hex(minor) || !is_upper_ascii(kind)
        || !is_hex(size) || term != b'_'
    {
        return None;
    }

    let kind = Kind::from_tag(std::str::from_utf8(kind).ok()?)?;
    let major_val = u8::from_str_radix(std::str::from_utf8(major).ok()?, 16).ok()?;
    let minor_val = u8::from_str_radix(std::str::from_utf8(minor).ok()?, 16).ok()?;
    let size_val = usize::from_str_radix(std::str::from_utf8(size).ok()?, 16).ok()?;

    Some(Smellage {
        proto: String::from_utf8_lossy(proto).into_owned(),
        pvrsn: Versionage { major: Versionage::clamp_major(major_val), minor: minor_val },
        gvrsn: None,
        kind,
        size: size_val,
        offset,
        match_len: V1_LEN,
    })
}

fn try_v2(rest: &[u8], offset: usize) -> Option<Smellage> {
    if rest.len() < V2_LEN {
        return None;
    }
    let proto = &rest[0..4];
    let pmaj = &rest[4..5];
    let pmin = &rest[5..7];
    let gmaj = &rest[7..8];
    let gmin = &rest[8..10];
    let kind = &rest[10..14];
    let size = &rest[14..18];
    let term = rest[18];

    if !is_upper_ascii(proto) || !is_upper_ascii(kind) || term != b'.' {
        return None;
    }

    let pmaj_text = std::str::from_utf8(pmaj).ok()?;
    let pmin_text = std::str::from_utf8(pmin).ok()?;
    let gmaj_text = std::str::from_utf8(gmaj).ok()?;
    let gmin_text = std::str::from_utf8(gmin).ok()?;
    let size_text = std::str::from_utf8(size).ok()?;

    let pmaj_val = u8::try_from(b64::b64_to_int(pmaj_text).ok()?).ok()?;
    let pmin_val = u8::try_from(b64::b64_to_int(pmin_text).ok()?).ok()?;
    let gmaj_val = u8::try_from(b64::b64_to_int(gmaj_text).ok()?).ok()?;
    let gmin_val = u8::try_from(b64::b64_to_int(gmin_text).ok()?).ok()?;
    let size_val = usize::try_from(b64::b64_to_int(size_text).ok()?).ok()?;
    let kind = Kind::from_tag(std::str::from_utf8(kind).ok()?)?;

    Some(Smellage {
        proto: String::from_utf8_lossy(proto).into_owned(),
        pvrsn: Versionage { major: Versionage::clamp_major(pmaj_val), minor: pmin_val },
        gvrsn: Some(Versionage { major: Versionage::clamp_major(gmaj_val), minor: gmin_val }),
        kind,
        size: size_val,
        offset,
        match_len: V2_LEN,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smells_v1_inside_json_envelope() {
        let body = br#"{"v":"KERI10JSON00002e_","t":"icp"}"#;
        let sm = smell(body).unwrap();
        assert_eq!(sm.proto, "KERI");
        assert_eq!(sm.pvrsn.major, 1);
        assert_eq!(sm.kind, Kind::Json);
        assert_eq!(sm.size, 0x2e);
        assert_eq!(sm.offset, 6);
    }

    #[test]
    fn rejects_match_starting_too_far_in() {
        let mut body = vec![b' '; 20];
        body.extend_from_slice(b"KERI10JSON00002e_");
        body.extend_from_slice(&[0u8; 64]);
        let err = smell(&body).unwrap_err();
        assert!(matches!(err, CesrError::VersionError { .. }));
    }

    #[test]
    fn short_input_is_shortage_not_version_error() {
        let body = b"{\"v\":\"KE";
        let err = smell(body).unwrap_err();
        assert!(err.is_shortage());
    }
}
