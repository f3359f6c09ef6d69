//! Indexer (indexed primitive) token decoder: text and binary domains.
//!
//! Structurally identical to [`crate::matter`] decoding except the soft
//! field(s) carry an index (and, for dual-soft codes, an ordinal) rather
//! than a lead-size/variable-length count.

use crate::b64::{self, text_to_binary_len};
use crate::error::{CesrError, Result};
use crate::tables::indexer::{self, hard_size};

/// A decoded indexed-signature token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerToken {
    /// Hard-code text.
    pub code: String,
    /// Decoded raw bytes.
    pub raw: Vec<u8>,
    /// Index into the signing-key list.
    pub index: u32,
    /// Ordinal (prior-key index), present only for dual-soft codes.
    pub ordinal: Option<u32>,
    /// Exact qb64 text this token was decoded from.
    pub qb64_text: String,
    /// Full size in text characters.
    pub full_size_text: usize,
    /// Full size in binary bytes.
    pub full_size_binary: usize,
}

/// Decode one indexer token from the start of `text`.
///
/// # Errors
/// [`CesrError::Shortage`]/[`CesrError::UnknownCode`]/[`CesrError::Deserialize`]
/// per the same rules as [`crate::matter::decode_text`].
pub fn decode_text(text: &str) -> Result<IndexerToken> {
    let first = text.as_bytes().first().ok_or_else(|| CesrError::shortage(1, 0))?;
    let hs = hard_size(*first)
        .ok_or_else(|| CesrError::UnknownCode { code: (*first as char).to_string(), offset: None })?;

    if text.len() < hs {
        return Err(CesrError::shortage(hs, text.len()));
    }
    let code = &text[..hs];
    let xizage = indexer::lookup(code)
        .ok_or_else(|| CesrError::UnknownCode { code: code.to_string(), offset: None })?;

    if text.len() < xizage.fs {
        return Err(CesrError::Shortage { need: xizage.fs, have: text.len(), offset: None });
    }

    let qb64_text = text[..xizage.fs].to_string();
    let index_field = &qb64_text[xizage.hs..xizage.hs + xizage.ss];
    let index = u32::try_from(b64::b64_to_int(index_field)?).unwrap_or(u32::MAX);

    let ordinal = if xizage.os > 0 {
        let start = xizage.hs + xizage.ss;
        let ord_field = &qb64_text[start..start + xizage.os];
        Some(u32::try_from(b64::b64_to_int(ord_field)?).unwrap_or(u32::MAX))
    } else {
        None
    };

    let body_start = xizage.hs + xizage.ss + xizage.os;
    let mut raw = b64::decode_b64(&qb64_text[body_start..])?;
    if xizage.ls > 0 {
        if raw.len() < xizage.ls {
            return Err(CesrError::Deserialize {
                hint: Some("lead-size exceeds decoded body length".to_string()),
                offset: None,
            });
        }
        raw.drain(0..xizage.ls);
    }

    Ok(IndexerToken {
        code: code.to_string(),
        raw,
        index,
        ordinal,
        qb64_text,
        full_size_text: xizage.fs,
        full_size_binary: text_to_binary_len(xizage.fs),
    })
}

/// Decode one indexer token from the start of `binary`.
///
/// # Errors
/// Same taxonomy as [`decode_text`].
pub fn decode_binary(binary: &[u8]) -> Result<IndexerToken> {
    if binary.is_empty() {
        return Err(CesrError::shortage(1, 0));
    }
    let peek_len = binary.len().min(3);
    let peek_text = b64::encode_b64(&binary[..peek_len]);
    let first = peek_text.as_bytes().first().ok_or_else(|| CesrError::shortage(1, 0))?;
    let hs = hard_size(*first)
        .ok_or_else(|| CesrError::UnknownCode { code: (*first as char).to_string(), offset: None })?;

    let code_bytes = text_to_binary_len(hs);
    if binary.len() < code_bytes {
        return Err(CesrError::shortage(code_bytes, binary.len()));
    }
    let code_text = b64::encode_b64(&binary[..code_bytes]);
    let code = &code_text[..hs];
    let xizage = indexer::lookup(code)
        .ok_or_else(|| CesrError::UnknownCode { code: code.to_string(), offset: None })?;

    let full_size_binary = text_to_binary_len(xizage.fs);
    if binary.len() < full_size_binary {
        return Err(CesrError::Shortage { need: full_size_binary, have: binary.len(), offset: None });
    }

    let full_text = b64::encode_b64(&binary[..full_size_binary]);
    let qb64_text = full_text[..xizage.fs].to_string();
    let index_field = &qb64_text[xizage.hs..xizage.hs + xizage.ss];
    let index = u32::try_from(b64::b64_to_int(index_field)?).unwrap_or(u32::MAX);

    let ordinal = if xizage.os > 0 {
        let start = xizage.hs + xizage.ss;
        let ord_field = &qb64_text[start..start + xizage.os];
        Some(u32::try_from(b64::b64_to_int(ord_field)?).unwrap_or(u32::MAX))
    } else {
        None
    };

    let body_start = xizage.hs + xizage.ss + xizage.os;
    let mut raw = b64::decode_b64(&qb64_text[body_start..])?;
    if xizage.ls > 0 {
        if raw.len() < xizage.ls {
            return Err(CesrError::Deserialize {
                hint: Some("lead-size exceeds decoded body length".to_string()),
                offset: None,
            });
        }
        raw.drain(0..xizage.ls);
    }

    Ok(IndexerToken {
        code: code.to_string(),
        raw,
        index,
        ordinal,
        qb64_text,
        full_size_text: xizage.fs,
        full_size_binary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_text_single_soft_field() {
        let raw = [5u8; 64];
        let body = b64::encode_b64(&raw);
        // code "A" (hs=1), index field "B" (=1), then body, trimmed to fs=88.
        let text = format!("AB{body}");
        let tok = decode_text(&text[..88]).unwrap();
        assert_eq!(tok.code, "A");
        assert_eq!(tok.index, 1);
        assert!(tok.ordinal.is_none());
    }

    #[test]
    fn decode_text_unknown_code() {
        assert!(decode_text("~~~~").is_err());
    }
}
