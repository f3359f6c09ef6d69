//! Attachment dispatch: turns a decoded counter token plus its payload
//! bytes into a structured [`AttachmentGroup`], per the four group-shape
//! families the active major version's counter table names.

pub mod v1;
pub mod v2;

use crate::b64::{binary_to_text_len, text_to_binary_len};
use crate::counter::{self, CounterToken};
use crate::error::{CesrError, Result};
use crate::indexer::{self, IndexerToken};
use crate::matter::{self, MatterToken};
use crate::sniff::Domain;
use crate::tables::counter::{CounterEntry, GroupKind, TupleSlot};
use crate::tables::{counter as counter_table, Versionage};

/// Whether a cross-major-version counter code falls back to the other
/// table, and how the caller is told about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Unknown codes are fatal ([`CesrError::UnknownCode`]).
    #[default]
    Strict,
    /// An unknown code under the declared major version is retried against
    /// the other major version's table before giving up.
    Compat,
}

/// Emitted when [`DispatchMode::Compat`] falls back to a different major
/// version's table to resolve a counter code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackEvent {
    /// The major version dispatch was originally attempted under.
    pub from: Versionage,
    /// The major version the code was actually resolved under.
    pub to: Versionage,
    /// Domain of the input that triggered the fallback.
    pub domain: Domain,
    /// Human-readable reason, for logging.
    pub reason: String,
}

/// One slot of a decoded [`GroupKind::Tuple`] or [`GroupKind::CompositeSigerList`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TupleItem {
    /// A plain matter primitive.
    Matter(MatterToken),
    /// An indexed signature primitive.
    Indexer(IndexerToken),
}

/// The decoded, interpreted payload of an attachment group, one variant per
/// dispatch family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupPayload {
    /// Family 1: raw quadlet/triplet bytes, uninterpreted.
    RawQuadlets(Vec<u8>),
    /// Family 1 (wrapper flavor): recursively dispatched nested groups.
    Nested(Vec<AttachmentGroup>),
    /// Family 2: `count` repetitions of a fixed tuple shape.
    Tuples(Vec<Vec<TupleItem>>),
    /// Family 3: `count` items of leading matter primitives plus a nested
    /// indexed-signature list.
    SigerGroups(Vec<SigerGroup>),
    /// Family 4: the genus/version counter's declared version.
    Genus(Versionage),
}

/// One item of a [`GroupPayload::SigerGroups`] family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigerGroup {
    /// Leading matter primitives (e.g. a seal digest/sequence/prior digest).
    pub leading: Vec<MatterToken>,
    /// The nested list of indexed signatures.
    pub sigers: Vec<IndexerToken>,
}

/// A fully decoded and interpreted attachment group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentGroup {
    /// Hard-code text, e.g. `"-V"`.
    pub code: String,
    /// Human-readable group name.
    pub name: &'static str,
    /// Declared count from the counter's soft field.
    pub count: u32,
    /// The interpreted payload.
    pub payload: GroupPayload,
    /// Total bytes consumed from the text input (counter + payload).
    pub consumed_text: usize,
    /// Total bytes consumed from the binary-domain equivalent.
    pub consumed_binary: usize,
}

/// Dispatch one attachment group from the start of `text`.
///
/// # Errors
/// Propagates [`CesrError::Shortage`]/[`CesrError::UnknownCode`]/
/// [`CesrError::GroupSize`] from the counter and payload decode steps.
pub fn dispatch_text(
    text: &str,
    version: Versionage,
    mode: DispatchMode,
    mut on_fallback: impl FnMut(FallbackEvent),
) -> Result<AttachmentGroup> {
    dispatch_text_dyn(text, version, mode, &mut on_fallback)
}

// Monomorphic inner implementation: `dispatch_text`/`build_payload_text` recurse
// into each other for nested groups, and a generic `impl FnMut` parameter would
// grow a new `&mut &mut ... F` type on every nesting level, blowing the
// monomorphization recursion limit. Using `&mut dyn FnMut` here keeps the
// recursive call sites monomorphic while the public API keeps accepting any
// `impl FnMut(FallbackEvent)`.
fn dispatch_text_dyn(
    text: &str,
    version: Versionage,
    mode: DispatchMode,
    on_fallback: &mut dyn FnMut(FallbackEvent),
) -> Result<AttachmentGroup> {
    let (tok, resolved_version) = resolve_counter_text(text, version, mode, on_fallback)?;
    let entry = counter_table::lookup(resolved_version.major, &tok.code)
        .ok_or_else(|| CesrError::UnknownCode { code: tok.code.clone(), offset: None })?;

    let payload_text = &text[tok.full_size_text..];
    let (payload, payload_consumed_text) =
        build_payload_text(&tok, &entry, payload_text, resolved_version, mode, on_fallback)?;

    let consumed_text = tok.full_size_text + payload_consumed_text;
    Ok(AttachmentGroup {
        code: tok.code,
        name: entry.name,
        count: tok.count,
        payload,
        consumed_text,
        consumed_binary: text_to_binary_len(consumed_text),
    })
}

fn resolve_counter_text(
    text: &str,
    version: Versionage,
    mode: DispatchMode,
    on_fallback: &mut dyn FnMut(FallbackEvent),
) -> Result<(CounterToken, Versionage)> {
    match counter::decode_text(text, version) {
        Ok(tok) => Ok((tok, version)),
        Err(CesrError::UnknownCode { code, offset }) if mode == DispatchMode::Compat => {
            let other = Versionage { major: other_major(version.major), minor: 0 };
            match counter::decode_text(text, other) {
                Ok(tok) => {
                    on_fallback(FallbackEvent {
                        from: version,
                        to: other,
                        domain: Domain::Text,
                        reason: format!("code `{code}` unknown under major {}", version.major),
                    });
                    Ok((tok, other))
                },
                Err(_) => Err(CesrError::UnknownCode { code, offset }),
            }
        },
        Err(e) => Err(e),
    }
}

const fn other_major(major: u8) -> u8 {
    if major == 1 { 2 } else { 1 }
}

fn build_payload_text(
    tok: &CounterToken,
    entry: &CounterEntry,
    payload: &str,
    version: Versionage,
    mode: DispatchMode,
    on_fallback: &mut dyn FnMut(FallbackEvent),
) -> Result<(GroupPayload, usize)> {
    match entry.kind {
        GroupKind::RawQuadlets => {
            let need_chars = usize::try_from(tok.count).unwrap_or(usize::MAX) * 4;
            if payload.len() < need_chars {
                return Err(CesrError::Shortage { need: need_chars, have: payload.len(), offset: None });
            }
            let raw = payload[..need_chars].as_bytes().to_vec();
            Ok((GroupPayload::RawQuadlets(raw), need_chars))
        },

        GroupKind::Wrapper => {
            let need_chars = usize::try_from(tok.count).unwrap_or(usize::MAX) * 4;
            if payload.len() < need_chars {
                return Err(CesrError::Shortage { need: need_chars, have: payload.len(), offset: None });
            }
            let mut nested = Vec::new();
            let mut cursor = 0usize;
            let slice = &payload[..need_chars];
            while cursor < slice.len() {
                let group = dispatch_text_dyn(&slice[cursor..], version, mode, on_fallback)?;
                cursor += group.consumed_text;
                nested.push(group);
            }
            if cursor != need_chars {
                return Err(CesrError::GroupSize { declared: need_chars, consumed: cursor, offset: None });
            }
            Ok((GroupPayload::Nested(nested), need_chars))
        },

        GroupKind::Tuple(slots) => {
            let mut cursor = 0usize;
            let mut tuples = Vec::new();
            for _ in 0..tok.count {
                let mut items = Vec::with_capacity(slots.len());
                for slot in slots {
                    let rest = &payload[cursor..];
                    let (item, len) = decode_tuple_slot(*slot, rest)?;
                    cursor += len;
                    items.push(item);
                }
                tuples.push(items);
            }
            Ok((GroupPayload::Tuples(tuples), cursor))
        },

        GroupKind::CompositeSigerList { leading_matter } => {
            let mut cursor = 0usize;
            let mut groups = Vec::new();
            for _ in 0..tok.count {
                let mut leading = Vec::with_capacity(leading_matter);
                for _ in 0..leading_matter {
                    let m = matter::decode_text(&payload[cursor..])?;
                    cursor += m.full_size_text;
                    leading.push(m);
                }
                let sig_tok = counter::decode_text(&payload[cursor..], version)?;
                let sig_entry = counter_table::lookup(version.major, &sig_tok.code)
                    .ok_or_else(|| CesrError::UnknownCode { code: sig_tok.code.clone(), offset: None })?;
                let sig_payload = &payload[cursor + sig_tok.full_size_text..];
                let need_chars = usize::try_from(sig_tok.count).unwrap_or(usize::MAX) * 4;
                if sig_payload.len() < need_chars {
                    return Err(CesrError::Shortage { need: need_chars, have: sig_payload.len(), offset: None });
                }
                let mut sigers = Vec::new();
                let mut sig_cursor = 0usize;
                while sig_cursor < need_chars {
                    let s = indexer::decode_text(&sig_payload[sig_cursor..])?;
                    sig_cursor += s.full_size_text;
                    sigers.push(s);
                }
                if sig_cursor != need_chars {
                    return Err(CesrError::GroupSize { declared: need_chars, consumed: sig_cursor, offset: None });
                }
                let _ = sig_entry;
                cursor += sig_tok.full_size_text + need_chars;
                groups.push(SigerGroup { leading, sigers });
            }
            Ok((GroupPayload::SigerGroups(groups), cursor))
        },

        GroupKind::Genus => {
            let gv = counter::genus_versionage(tok)?;
            Ok((GroupPayload::Genus(gv), 0))
        },
    }
}

fn decode_tuple_slot(slot: TupleSlot, text: &str) -> Result<(TupleItem, usize)> {
    match slot {
        TupleSlot::Matter => {
            let m = matter::decode_text(text)?;
            let len = m.full_size_text;
            Ok((TupleItem::Matter(m), len))
        },
        TupleSlot::Indexer => {
            let i = indexer::decode_text(text)?;
            let len = i.full_size_text;
            Ok((TupleItem::Indexer(i), len))
        },
    }
}

/// Dispatch one attachment group from the start of `binary` (qb2 domain).
///
/// Mirrors [`dispatch_text`] exactly, decoding through the binary-domain
/// counterparts of every token decoder.
///
/// # Errors
/// Same taxonomy as [`dispatch_text`].
pub fn dispatch_binary(
    binary: &[u8],
    version: Versionage,
    mode: DispatchMode,
    mut on_fallback: impl FnMut(FallbackEvent),
) -> Result<AttachmentGroup> {
    dispatch_binary_dyn(binary, version, mode, &mut on_fallback)
}

// See the comment on `dispatch_text_dyn`: kept monomorphic to avoid an
// unbounded generic instantiation chain across nested `Wrapper` groups.
fn dispatch_binary_dyn(
    binary: &[u8],
    version: Versionage,
    mode: DispatchMode,
    on_fallback: &mut dyn FnMut(FallbackEvent),
) -> Result<AttachmentGroup> {
    let (tok, resolved_version) = resolve_counter_binary(binary, version, mode, on_fallback)?;
    let entry = counter_table::lookup(resolved_version.major, &tok.code)
        .ok_or_else(|| CesrError::UnknownCode { code: tok.code.clone(), offset: None })?;

    let payload_binary = &binary[tok.full_size_binary..];
    let (payload, payload_consumed_binary) =
        build_payload_binary(&tok, &entry, payload_binary, resolved_version, mode, on_fallback)?;

    let consumed_binary = tok.full_size_binary + payload_consumed_binary;
    Ok(AttachmentGroup {
        code: tok.code,
        name: entry.name,
        count: tok.count,
        payload,
        consumed_text: binary_to_text_len(consumed_binary),
        consumed_binary,
    })
}

fn resolve_counter_binary(
    binary: &[u8],
    version: Versionage,
    mode: DispatchMode,
    on_fallback: &mut dyn FnMut(FallbackEvent),
) -> Result<(CounterToken, Versionage)> {
    match counter::decode_binary(binary, version) {
        Ok(tok) => Ok((tok, version)),
        Err(CesrError::UnknownCode { code, offset }) if mode == DispatchMode::Compat => {
            let other = Versionage { major: other_major(version.major), minor: 0 };
            match counter::decode_binary(binary, other) {
                Ok(tok) => {
                    on_fallback(FallbackEvent {
                        from: version,
                        to: other,
                        domain: Domain::Binary,
                        reason: format!("code `{code}` unknown under major {}", version.major),
                    });
                    Ok((tok, other))
                },
                Err(_) => Err(CesrError::UnknownCode { code, offset }),
            }
        },
        Err(e) => Err(e),
    }
}

fn build_payload_binary(
    tok: &CounterToken,
    entry: &CounterEntry,
    payload: &[u8],
    version: Versionage,
    mode: DispatchMode,
    on_fallback: &mut dyn FnMut(FallbackEvent),
) -> Result<(GroupPayload, usize)> {
    match entry.kind {
        GroupKind::RawQuadlets => {
            let need_bytes = usize::try_from(tok.count).unwrap_or(usize::MAX) * 3;
            if payload.len() < need_bytes {
                return Err(CesrError::Shortage { need: need_bytes, have: payload.len(), offset: None });
            }
            let raw = payload[..need_bytes].to_vec();
            Ok((GroupPayload::RawQuadlets(raw), need_bytes))
        },

        GroupKind::Wrapper => {
            let need_bytes = usize::try_from(tok.count).unwrap_or(usize::MAX) * 3;
            if payload.len() < need_bytes {
                return Err(CesrError::Shortage { need: need_bytes, have: payload.len(), offset: None });
            }
            let mut nested = Vec::new();
            let mut cursor = 0usize;
            let slice = &payload[..need_bytes];
            while cursor < slice.len() {
                let group = dispatch_binary_dyn(&slice[cursor..], version, mode, on_fallback)?;
                cursor += group.consumed_binary;
                nested.push(group);
            }
            if cursor != need_bytes {
                return Err(CesrError::GroupSize { declared: need_bytes, consumed: cursor, offset: None });
            }
            Ok((GroupPayload::Nested(nested), need_bytes))
        },

        GroupKind::Tuple(slots) => {
            let mut cursor = 0usize;
            let mut tuples = Vec::new();
            for _ in 0..tok.count {
                let mut items = Vec::with_capacity(slots.len());
                for slot in slots {
                    let rest = &payload[cursor..];
                    let (item, len) = decode_tuple_slot_binary(*slot, rest)?;
                    cursor += len;
                    items.push(item);
                }
                tuples.push(items);
            }
            Ok((GroupPayload::Tuples(tuples), cursor))
        },

        GroupKind::CompositeSigerList { leading_matter } => {
            let mut cursor = 0usize;
            let mut groups = Vec::new();
            for _ in 0..tok.count {
                let mut leading = Vec::with_capacity(leading_matter);
                for _ in 0..leading_matter {
                    let m = matter::decode_binary(&payload[cursor..])?;
                    cursor += m.full_size_binary;
                    leading.push(m);
                }
                let sig_tok = counter::decode_binary(&payload[cursor..], version)?;
                let sig_entry = counter_table::lookup(version.major, &sig_tok.code)
                    .ok_or_else(|| CesrError::UnknownCode { code: sig_tok.code.clone(), offset: None })?;
                let sig_payload = &payload[cursor + sig_tok.full_size_binary..];
                let need_bytes = usize::try_from(sig_tok.count).unwrap_or(usize::MAX) * 3;
                if sig_payload.len() < need_bytes {
                    return Err(CesrError::Shortage { need: need_bytes, have: sig_payload.len(), offset: None });
                }
                let mut sigers = Vec::new();
                let mut sig_cursor = 0usize;
                while sig_cursor < need_bytes {
                    let s = indexer::decode_binary(&sig_payload[sig_cursor..])?;
                    sig_cursor += s.full_size_binary;
                    sigers.push(s);
                }
                if sig_cursor != need_bytes {
                    return Err(CesrError::GroupSize { declared: need_bytes, consumed: sig_cursor, offset: None });
                }
                let _ = sig_entry;
                cursor += sig_tok.full_size_binary + need_bytes;
                groups.push(SigerGroup { leading, sigers });
            }
            Ok((GroupPayload::SigerGroups(groups), cursor))
        },

        GroupKind::Genus => {
            let gv = counter::genus_versionage(tok)?;
            Ok((GroupPayload::Genus(gv), 0))
        },
    }
}

fn decode_tuple_slot_binary(slot: TupleSlot, binary: &[u8]) -> Result<(TupleItem, usize)> {
    match slot {
        TupleSlot::Matter => {
            let m = matter::decode_binary(binary)?;
            let len = m.full_size_binary;
            Ok((TupleItem::Matter(m), len))
        },
        TupleSlot::Indexer => {
            let i = indexer::decode_binary(binary)?;
            let len = i.full_size_binary;
            Ok((TupleItem::Indexer(i), len))
        },
    }
}
