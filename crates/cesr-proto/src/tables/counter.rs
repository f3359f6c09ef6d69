//! Counter (group-header) code sizing and naming tables, one per major
//! version, plus the genus/version counter shared by both.
//!
//! Every counter in this representative table is `hs=2, ss=2, fs=4` (one
//! quadlet total: a two-char code, two-char count) except the genus counter,
//! which is wider so its qb64 can also carry a protocol-genus tag ahead of
//! the version digits. Real CESR also defines four-char-hard "Big" counters
//! for counts above 4095; §4.6's dispatch families don't depend on that
//! extra width to be exercised, so only the genus counter gets non-default
//! sizing here (see `DESIGN.md`).

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::tables::Cizage;

/// The semantic role a counter's payload plays, used by attachment dispatch
/// (spec §4.6) to pick the right parsing family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Family 1: payload is `count` quadlets/triplets of raw bytes, returned
    /// as-is (not further interpreted).
    RawQuadlets,
    /// Family 1, wrapper flavor: payload is recursively dispatched as zero
    /// or more nested groups (or a nested frame, for body wrappers).
    Wrapper,
    /// Family 2: `count` repetitions of a fixed tuple of primitive kinds.
    Tuple(&'static [TupleSlot]),
    /// Family 3: `count` items of `(matter..., nested siger list)`.
    CompositeSigerList {
        /// Number of leading matter primitives before the nested list.
        leading_matter: usize,
    },
    /// Family 4: genus/version counter.
    Genus,
}

/// One element of a [`GroupKind::Tuple`] shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TupleSlot {
    /// A plain matter primitive.
    Matter,
    /// An indexer (indexed signature) primitive.
    Indexer,
}

/// A counter table entry: its sizing plus its dispatch shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterEntry {
    /// Human-readable name, used in diagnostics and the body-group sniff
    /// list (spec §4.8).
    pub name: &'static str,
    /// Text/binary sizing.
    pub cizage: Cizage,
    /// Dispatch shape.
    pub kind: GroupKind,
}

const Q: Cizage = Cizage { hs: 2, ss: 2, fs: 4 };

/// Genus/version counter code, shared across both major-version tables.
pub const GENUS_CODE: &str = "-_";
/// Genus counter sizing: 2-char code + 6-char soft field.
pub const GENUS_CIZAGE: Cizage = Cizage { hs: 2, ss: 6, fs: 8 };

macro_rules! table {
    ($($code:literal => $name:literal, $kind:expr;)+) => {{
        let mut m = HashMap::new();
        $(m.insert($code, CounterEntry { name: $name, cizage: Q, kind: $kind });)+
        m.insert(GENUS_CODE, CounterEntry {
            name: "GenusVersion",
            cizage: GENUS_CIZAGE,
            kind: GroupKind::Genus,
        });
        m
    }};
}

/// Major-version-1 counter table.
pub static V1: LazyLock<HashMap<&'static str, CounterEntry>> = LazyLock::new(|| {
    table! {
        "-A" => "ControllerIdxSigs", GroupKind::Tuple(&[TupleSlot::Indexer]);
        "-B" => "WitnessIdxSigs", GroupKind::Tuple(&[TupleSlot::Indexer]);
        "-C" => "NonTransReceiptCouples", GroupKind::Tuple(&[TupleSlot::Matter, TupleSlot::Matter]);
        "-D" => "TransReceiptQuadruples", GroupKind::Tuple(&[
            TupleSlot::Matter, TupleSlot::Matter, TupleSlot::Matter, TupleSlot::Indexer,
        ]);
        "-E" => "TransIdxSigGroups", GroupKind::CompositeSigerList { leading_matter: 3 };
        "-F" => "TransLastIdxSigGroups", GroupKind::CompositeSigerList { leading_matter: 1 };
        "-G" => "SealSourceTriples", GroupKind::Tuple(&[
            TupleSlot::Matter, TupleSlot::Matter, TupleSlot::Matter,
        ]);
        "-V" => "AttachmentGroup", GroupKind::Wrapper;
        "-W" => "BodyWithAttachmentGroup", GroupKind::Wrapper;
        "-U" => "ESSRWrapperGroup", GroupKind::Wrapper;
        "-X" => "GenericListGroup", GroupKind::Wrapper;
        "-Y" => "GenericMapGroup", GroupKind::Wrapper;
        "-Z" => "GenericGroup", GroupKind::Wrapper;
        "-H" => "FixBodyGroup", GroupKind::RawQuadlets;
        "-I" => "MapBodyGroup", GroupKind::RawQuadlets;
        "-J" => "NonNativeBodyGroup", GroupKind::RawQuadlets;
    }
});

/// Major-version-2 counter table. Shares names/shapes with v1 for the
/// families that carry over unchanged, and adds the v2-only wrapper and
/// "Big" (wide count) codes.
pub static V2: LazyLock<HashMap<&'static str, CounterEntry>> = LazyLock::new(|| {
    table! {
        "-A" => "ControllerIdxSigs", GroupKind::Tuple(&[TupleSlot::Indexer]);
        "-B" => "WitnessIdxSigs", GroupKind::Tuple(&[TupleSlot::Indexer]);
        "-C" => "NonTransReceiptCouples", GroupKind::Tuple(&[TupleSlot::Matter, TupleSlot::Matter]);
        "-D" => "TransReceiptQuadruples", GroupKind::Tuple(&[
            TupleSlot::Matter, TupleSlot::Matter, TupleSlot::Matter, TupleSlot::Indexer,
        ]);
        "-E" => "TransIdxSigGroups", GroupKind::CompositeSigerList { leading_matter: 3 };
        "-F" => "TransLastIdxSigGroups", GroupKind::CompositeSigerList { leading_matter: 1 };
        "-G" => "SealSourceTriples", GroupKind::Tuple(&[
            TupleSlot::Matter, TupleSlot::Matter, TupleSlot::Matter,
        ]);
        "-V" => "AttachmentGroup", GroupKind::Wrapper;
        "-W" => "BodyWithAttachmentGroup", GroupKind::Wrapper;
        "-K" => "BigBodyWithAttachmentGroup", GroupKind::Wrapper;
        "-U" => "ESSRWrapperGroup", GroupKind::Wrapper;
        "-X" => "GenericListGroup", GroupKind::Wrapper;
        "-Y" => "GenericMapGroup", GroupKind::Wrapper;
        "-Q" => "GenericGroup", GroupKind::Wrapper;
        "-H" => "FixBodyGroup", GroupKind::RawQuadlets;
        "-I" => "MapBodyGroup", GroupKind::RawQuadlets;
        "-J" => "NonNativeBodyGroup", GroupKind::RawQuadlets;
        "-L" => "BigFixBodyGroup", GroupKind::RawQuadlets;
        "-M" => "BigMapBodyGroup", GroupKind::RawQuadlets;
        "-N" => "BigNonNativeBodyGroup", GroupKind::RawQuadlets;
    }
});

/// Look up a counter entry in the active major version's table, `None` if
/// the code is unrecognized there.
#[must_use]
pub fn lookup(major: u8, code: &str) -> Option<CounterEntry> {
    let table = if major == 1 { &V1 } else { &V2 };
    table.get(code).copied()
}

/// Names that identify a "body-group" counter — recognized at frame start
/// in addition to attachment-group counters (spec §4.8's pending-resumption
/// rule and body dispatch both check membership in this set).
#[must_use]
pub fn is_body_group_name(name: &str) -> bool {
    matches!(
        name,
        "BodyWithAttachmentGroup"
            | "BigBodyWithAttachmentGroup"
            | "NonNativeBodyGroup"
            | "BigNonNativeBodyGroup"
            | "FixBodyGroup"
            | "BigFixBodyGroup"
            | "MapBodyGroup"
            | "BigMapBodyGroup"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v1_and_v2_share_common_codes() {
        assert_eq!(lookup(1, "-A").unwrap().name, "ControllerIdxSigs");
        assert_eq!(lookup(2, "-A").unwrap().name, "ControllerIdxSigs");
    }

    #[test]
    fn v2_only_code_absent_from_v1() {
        assert!(lookup(1, "-Q").is_none());
        assert!(lookup(2, "-Q").is_some());
    }

    #[test]
    fn genus_code_present_in_both() {
        assert_eq!(lookup(1, GENUS_CODE).unwrap().name, "GenusVersion");
        assert_eq!(lookup(2, GENUS_CODE).unwrap().name, "GenusVersion");
    }
}
