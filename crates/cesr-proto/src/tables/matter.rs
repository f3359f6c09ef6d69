//! Matter (primitive) code sizing table.
//!
//! This is a representative subset of the real CESR matter code space —
//! enough digest, signing-key, and signature families to exercise every
//! code path the parser engine and attachment dispatch need (fixed-size
//! `hs=1`/`hs=2` codes, a larger `hs=4` family, and one variable-length
//! `fs = None` family) — rather than a byte-for-byte transcription of the
//! full reference table, which was not available in the grounding corpus
//! for this crate (see `DESIGN.md`).

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::tables::Sizage;

/// Hard-size (in characters) implied by a matter code's leading character.
///
/// - `A`-`Z`, `a`-`z`: one-character hard codes (small fixed-size primitives).
/// - `0`: two-character hard codes (64-byte primitives: signatures, wide
///   digests).
/// - `1`-`3`: four-character hard codes (56+ byte primitives).
/// - `4`-`7`: four-character hard codes for variable-length ("Big") bodies,
///   where the soft field carries the quadlet count instead of a fixed size.
#[must_use]
pub fn hard_size(lead: u8) -> Option<usize> {
    match lead {
        b'A'..=b'Z' | b'a'..=b'z' => Some(1),
        b'0' => Some(2),
        b'1'..=b'3' => Some(4),
        b'4'..=b'7' => Some(4),
        _ => None,
    }
}

/// Code -> sizage map, keyed by the full hard-code text.
pub static MATTER_SIZES: LazyLock<HashMap<&'static str, Sizage>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    // hs=1, 32-byte raw primitives (seeds, verfers, digests). fs=44 chars:
    // 1 code char + 43 b64 chars encoding 32 raw bytes with 1 lead pad byte.
    for code in ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"] {
        m.insert(code, Sizage { hs: 1, ss: 0, xs: 0, fs: Some(44), ls: 0 });
    }

    // hs=1, 56-byte raw primitives (Ed448 family).
    m.insert("K", Sizage { hs: 1, ss: 0, xs: 0, fs: Some(76), ls: 0 });
    m.insert("L", Sizage { hs: 1, ss: 0, xs: 0, fs: Some(76), ls: 0 });

    // hs=2, 64-byte raw primitives (signatures, wide digests).
    for code in ["0B", "0C", "0D", "0E", "0F"] {
        m.insert(code, Sizage { hs: 2, ss: 0, xs: 0, fs: Some(88), ls: 0 });
    }

    // hs=4, 114-byte raw primitives (Ed448 signature).
    m.insert("1AAA", Sizage { hs: 4, ss: 0, xs: 0, fs: Some(156), ls: 0 });
    m.insert("1AAB", Sizage { hs: 4, ss: 0, xs: 0, fs: Some(156), ls: 0 });

    // hs=4 big/variable: soft field carries the quadlet-pair count in
    // 4 chars. `fs = None` signals `fs = hs + ss + 4*b64toInt(soft)`.
    m.insert("4A", Sizage { hs: 2, ss: 2, xs: 0, fs: None, ls: 0 });
    m.insert("5A", Sizage { hs: 2, ss: 2, xs: 0, fs: None, ls: 1 });
    m.insert("6A", Sizage { hs: 4, ss: 4, xs: 0, fs: None, ls: 0 });

    // Verser/ilker codes used by native (FixBody/MapBody) field tokenization
    // (spec §4.8). Both are sized so the b64 body is a clean quadlet
    // multiple: "O"'s 8 body chars decode to 6 raw bytes (4-byte proto tag
    // + 1-byte major + 1-byte minor), "X"'s 4 body chars decode to 3 raw
    // bytes (a 3-ASCII-char ilk tag like "icp"). A 7-char or 3-char body
    // would straddle a quadlet boundary and need padding to decode at all.
    m.insert("O", Sizage { hs: 1, ss: 0, xs: 0, fs: Some(9), ls: 0 }); // verser (native pvrsn)
    m.insert("X", Sizage { hs: 1, ss: 0, xs: 0, fs: Some(5), ls: 0 }); // ilker (ilk tag)

    m
});

/// Look up sizage for `code`, trying the 1/2/4-char hard-code lengths in
/// that order (the parser already knows `hs` from [`hard_size`] so this is
/// mostly a direct lookup; callers that hit an unfamiliar `hs=1` letter
/// retry with the 4-char "Big" fallback per spec §4.3).
#[must_use]
pub fn lookup(code: &str) -> Option<Sizage> {
    MATTER_SIZES.get(code).copied()
}

/// True if `code`'s first character marks it as a digest-family primitive.
#[must_use]
pub fn is_digest_code(code: &str) -> bool {
    matches!(code, "E" | "F" | "G" | "H" | "I" | "0D" | "0E" | "0F")
}

/// True if `code`'s first character marks it as a verifier-family primitive.
#[must_use]
pub fn is_verfer_code(code: &str) -> bool {
    matches!(code, "B" | "D" | "K" | "L" | "C")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hard_size_buckets() {
        assert_eq!(hard_size(b'A'), Some(1));
        assert_eq!(hard_size(b'z'), Some(1));
        assert_eq!(hard_size(b'0'), Some(2));
        assert_eq!(hard_size(b'1'), Some(4));
        assert_eq!(hard_size(b'4'), Some(4));
        assert_eq!(hard_size(b'-'), None);
    }

    #[test]
    fn lookup_known_digest() {
        let sz = lookup("E").expect("E is a known digest code");
        assert_eq!(sz.fs, Some(44));
    }

    #[test]
    fn variable_length_code_has_no_fixed_fs() {
        let sz = lookup("4A").expect("4A is a known big-matter code");
        assert!(sz.fs.is_none());
    }
}
