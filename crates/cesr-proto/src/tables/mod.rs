//! Static code tables: sizing and name maps for matter, counter, and
//! indexer codes, per `Versionage`.
//!
//! These are process-wide immutable static data (module-level
//! [`std::sync::LazyLock`] maps), initialized once and shared by every
//! parser instance. No lifecycle concerns, no mutation.

pub mod counter;
pub mod indexer;
pub mod matter;

/// Protocol/dispatch version: `{major, minor}`.
///
/// `major` selects which counter table (v1 or v2) is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Versionage {
    /// Major version; clamped to `{1, 2}` per spec.
    pub major: u8,
    /// Minor version.
    pub minor: u8,
}

impl Versionage {
    /// The default active version before any genus counter is seen.
    pub const V2_DEFAULT: Self = Self { major: 2, minor: 0 };

    /// Clamp a raw major value to `{1, 2}`; values `>= 3` map to `2`.
    ///
    /// Implements the intentionally-preserved tolerance from spec.md §9:
    /// "values >= 3 are silently mapped to 2."
    #[must_use]
    pub const fn clamp_major(raw: u8) -> u8 {
        if raw == 1 { 1 } else { 2 }
    }
}

/// Sizing for a matter (primitive) code.
///
/// `hs + ss + (paired body) = fs` when `fs` is fixed; when `fs` is `None`,
/// `fs = hs + ss + 4 * b64toInt(soft)` — computed at decode time from the
/// soft-size field actually present in the stream, not stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sizage {
    /// Hard-code size (characters).
    pub hs: usize,
    /// Soft-size field width (characters).
    pub ss: usize,
    /// Extra prepad characters before the raw body.
    pub xs: usize,
    /// Full size in text characters; `None` for variable-length codes.
    pub fs: Option<usize>,
    /// Lead-size: bytes of zero-padding dropped from the decoded raw body.
    pub ls: usize,
}

/// Sizing for a counter code: counters have no variable body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cizage {
    /// Hard-code size (characters).
    pub hs: usize,
    /// Soft-size field width (characters), holding the quadlet/triplet count.
    pub ss: usize,
    /// Full size in text characters: `hs + ss`.
    pub fs: usize,
}

impl Cizage {
    /// Binary full-size in bytes: `ceil(fs * 3 / 4)`.
    #[must_use]
    pub const fn fs_binary(&self) -> usize {
        crate::b64::text_to_binary_len(self.fs)
    }
}

/// Sizing for an indexer code: matter-like but with two soft fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Xizage {
    /// Hard-code size (characters).
    pub hs: usize,
    /// Primary soft-size field width (index).
    pub ss: usize,
    /// Secondary soft-size field width (ordinal); zero if absent.
    pub os: usize,
    /// Full size in text characters.
    pub fs: usize,
    /// Lead-size: bytes of zero-padding dropped from the decoded raw body.
    pub ls: usize,
}
