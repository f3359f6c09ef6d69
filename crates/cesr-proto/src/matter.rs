//! Matter (primitive) token decoder: text and binary domains.

use crate::b64::{self, text_to_binary_len};
use crate::error::{CesrError, Result};
use crate::tables::matter::{self, hard_size};

/// A decoded primitive token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatterToken {
    /// Hard-code text, e.g. `"E"` or `"0B"`.
    pub code: String,
    /// Decoded raw bytes (lead-size padding already dropped).
    pub raw: Vec<u8>,
    /// The exact qb64 text this token was decoded from.
    pub qb64_text: String,
    /// Full size in text characters.
    pub full_size_text: usize,
    /// Full size in binary bytes.
    pub full_size_binary: usize,
}

impl MatterToken {
    /// Re-encode [`Self::raw`] under [`Self::code`]; used to verify the
    /// round-trip invariant from spec.md §3 ("re-encoding raw_bytes under
    /// code reproduces qb64_text byte-for-byte").
    #[must_use]
    pub fn reencode(&self) -> String {
        format!("{}{}", self.code, b64::encode_b64(&self.raw))
    }
}

/// Decode one matter token from the start of `text` (base64url text domain).
///
/// # Errors
/// - [`CesrError::Shortage`] if `text` is shorter than the token's full size.
/// - [`CesrError::UnknownCode`] if no hard-code/sizage lookup matches.
/// - [`CesrError::Deserialize`] for malformed base64 content.
pub fn decode_text(text: &str) -> Result<MatterToken> {
    let first = text.as_bytes().first().ok_or_else(|| CesrError::shortage(1, 0))?;
    let hs = hard_size(*first)
        .ok_or_else(|| CesrError::UnknownCode { code: (*first as char).to_string(), offset: None })?;

    if text.len() < hs {
        return Err(CesrError::shortage(hs, text.len()));
    }
    let code = &text[..hs];

    let sizage = matter::lookup(code).or_else(|| {
        // Four-char fallback per spec §4.3.
        if text.len() >= 4 { matter::lookup(&text[..4]) } else { None }
    });
    let (code, sizage) = match sizage {
        Some(sz) if matter::lookup(code).is_some() => (code.to_string(), sz),
        Some(sz) => (text[..4].to_string(), sz),
        None => return Err(CesrError::UnknownCode { code: code.to_string(), offset: None }),
    };

    let full_size = match sizage.fs {
        Some(fs) => fs,
        None => {
            if text.len() < sizage.hs + sizage.ss {
                return Err(CesrError::shortage(sizage.hs + sizage.ss, text.len()));
            }
            let soft = &text[sizage.hs..sizage.hs + sizage.ss];
            let count = b64::b64_to_int(soft)?;
            sizage.hs + sizage.ss + 4 * usize::try_from(count).unwrap_or(usize::MAX)
        },
    };

    if text.len() < full_size {
        return Err(CesrError::Shortage { need: full_size, have: text.len(), offset: None });
    }

    let qb64_text = text[..full_size].to_string();
    let body = &qb64_text[sizage.hs + sizage.ss..];
    let mut raw = b64::decode_b64(body)?;
    if sizage.ls > 0 {
        if raw.len() < sizage.ls {
            return Err(CesrError::Deserialize {
                hint: Some("lead-size exceeds decoded body length".to_string()),
                offset: None,
            });
        }
        raw.drain(0..sizage.ls);
    }

    Ok(MatterToken {
        code,
        raw,
        qb64_text,
        full_size_text: full_size,
        full_size_binary: text_to_binary_len(full_size),
    })
}

/// Decode one matter token from the start of `binary` (qb2 binary domain).
///
/// # Errors
/// Same taxonomy as [`decode_text`], plus [`CesrError::Deserialize`] if
/// mid-pad bits between the code and payload are nonzero.
pub fn decode_binary(binary: &[u8]) -> Result<MatterToken> {
    if binary.is_empty() {
        return Err(CesrError::shortage(1, 0));
    }
    // Recover the code by converting the first sextet-aligned bytes to text.
    // We don't know `hs` yet, so peek the first quadlet-equivalent: 3 bytes
    // (4 sextets) is always enough to resolve a 1, 2, or 4-char hard code's
    // first character, then widen as needed.
    let peek_len = binary.len().min(3);
    let peek_text = b64::encode_b64(&binary[..peek_len]);
    let first = peek_text.as_bytes().first().ok_or_else(|| CesrError::shortage(1, 0))?;
    let hs = hard_size(*first)
        .ok_or_else(|| CesrError::UnknownCode { code: (*first as char).to_string(), offset: None })?;

    let hs_bytes = text_to_binary_len(hs);
    if binary.len() < hs_bytes {
        return Err(CesrError::shortage(hs_bytes, binary.len()));
    }
    let code_text = b64::encode_b64(&binary[..hs_bytes]);
    let code_candidate = &code_text[..hs];

    let sizage = matter::lookup(code_candidate).or_else(|| {
        let wide_bytes = text_to_binary_len(4);
        if binary.len() >= wide_bytes {
            let wide_text = b64::encode_b64(&binary[..wide_bytes]);
            matter::lookup(&wide_text[..4])
        } else {
            None
        }
    });
    let (code, sizage) = match sizage {
        Some(sz) if matter::lookup(code_candidate).is_some() => (code_candidate.to_string(), sz),
        Some(sz) => {
            let wide_text = b64::encode_b64(&binary[..text_to_binary_len(4)]);
            (wide_text[..4].to_string(), sz)
        },
        None => return Err(CesrError::UnknownCode { code: code_candidate.to_string(), offset: None }),
    };

    let full_size_text = match sizage.fs {
        Some(fs) => fs,
        None => {
            let soft_bytes = text_to_binary_len(sizage.hs + sizage.ss);
            if binary.len() < soft_bytes {
                return Err(CesrError::shortage(soft_bytes, binary.len()));
            }
            let prefix_text = b64::encode_b64(&binary[..soft_bytes]);
            let soft = &prefix_text[sizage.hs..sizage.hs + sizage.ss];
            let count = b64::b64_to_int(soft)?;
            sizage.hs + sizage.ss + 4 * usize::try_from(count).unwrap_or(usize::MAX)
        },
    };
    let full_size_binary = text_to_binary_len(full_size_text);

    if binary.len() < full_size_binary {
        return Err(CesrError::Shortage { need: full_size_binary, have: binary.len(), offset: None });
    }

    let full_text = b64::encode_b64(&binary[..full_size_binary]);
    let qb64_text = full_text[..full_size_text].to_string();
    let body = &qb64_text[sizage.hs + sizage.ss..];
    let mut raw = b64::decode_b64(body)?;
    if sizage.ls > 0 {
        if raw.len() < sizage.ls {
            return Err(CesrError::Deserialize {
                hint: Some("lead-size exceeds decoded body length".to_string()),
                offset: None,
            });
        }
        raw.drain(0..sizage.ls);
    }

    Ok(MatterToken { code, raw, qb64_text, full_size_text, full_size_binary })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_text_fixed_digest() {
        let raw = [7u8; 32];
        let token_text = format!("E{}", b64::encode_b64(&raw));
        let tok = decode_text(&token_text).unwrap();
        assert_eq!(tok.code, "E");
        assert_eq!(tok.raw, raw);
        assert_eq!(tok.full_size_text, 44);
    }

    #[test]
    fn decode_text_reencode_round_trips() {
        let raw = [9u8; 32];
        let token_text = format!("D{}", b64::encode_b64(&raw));
        let tok = decode_text(&token_text).unwrap();
        assert_eq!(tok.reencode(), tok.qb64_text);
    }

    #[test]
    fn decode_text_unknown_code() {
        let err = decode_text("~~~~").unwrap_err();
        assert!(matches!(err, CesrError::UnknownCode { .. }));
    }

    #[test]
    fn decode_text_shortage_on_truncated_input() {
        let raw = [1u8; 32];
        let full = format!("E{}", b64::encode_b64(&raw));
        let truncated = &full[..full.len() - 5];
        let err = decode_text(truncated).unwrap_err();
        assert!(err.is_shortage());
    }

    #[test]
    fn text_and_binary_domains_agree() {
        let raw = [3u8; 32];
        let text = format!("E{}", b64::encode_b64(&raw));
        let text_tok = decode_text(&text).unwrap();

        let binary = b64::decode_b64(&text).unwrap();
        let bin_tok = decode_binary(&binary).unwrap();

        assert_eq!(text_tok.code, bin_tok.code);
        assert_eq!(text_tok.raw, bin_tok.raw);
        assert_eq!(text_tok.full_size_text, bin_tok.full_size_text);
        assert_eq!(text_tok.full_size_binary, bin_tok.full_size_binary);
    }
}
