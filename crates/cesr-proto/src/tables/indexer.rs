//! Indexer (indexed signature) code sizing table.
//!
//! Indexer codes are matter-like but carry one or two soft fields: an index
//! (required) and, for "dual" codes, an ordinal marking the prior-event
//! signing key index. Like [`super::matter`], this is a representative
//! subset covering the Ed25519/ECDSA families the dispatch scenarios in
//! spec.md §8 exercise.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::tables::Xizage;

/// Code -> xizage map, keyed by the full hard-code text.
pub static INDEXER_SIZES: LazyLock<HashMap<&'static str, Xizage>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    // hs=1, single soft field (index only), raw=64 bytes (Ed25519/ECDSA sig).
    for code in ["A", "B", "C", "D"] {
        m.insert(code, Xizage { hs: 1, ss: 1, os: 0, fs: 88, ls: 0 });
    }

    // hs=1, dual soft field (index + ordinal "prior key index"), raw=64.
    for code in ["0A", "0B"] {
        m.insert(code, Xizage { hs: 2, ss: 2, os: 2, fs: 92, ls: 0 });
    }

    // hs=1, raw=114 (Ed448 indexed signature).
    m.insert("2A", Xizage { hs: 4, ss: 4, os: 0, fs: 160, ls: 0 });

    m
});

/// Hard-size (characters) implied by an indexer code's leading character.
#[must_use]
pub fn hard_size(lead: u8) -> Option<usize> {
    match lead {
        b'A'..=b'Z' | b'a'..=b'z' => Some(1),
        b'0' => Some(2),
        b'1'..=b'3' => Some(4),
        _ => None,
    }
}

/// Look up xizage for `code`.
#[must_use]
pub fn lookup(code: &str) -> Option<Xizage> {
    INDEXER_SIZES.get(code).copied()
}

/// True if `code` is recognized as an indexed-signature code suitable for
/// appearing inside a controller/witness indexed-signature list.
#[must_use]
pub fn is_controller_sig_code(code: &str) -> bool {
    INDEXER_SIZES.contains_key(code)
}
