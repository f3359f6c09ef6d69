//! Error taxonomy for the CESR stream parser.
//!
//! Every fallible boundary in this crate returns [`CesrError`]. The six
//! variants match the failure taxonomy the parser contract guarantees:
//! `Shortage` is recoverable within a streaming `feed`/`drain` loop, the
//! other five are fatal for the current frame attempt.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CesrError>;

/// Taxonomy of parser failures.
///
/// Each variant carries an optional byte `offset` (position within the
/// current `feed`d buffer the parser was examining) and an optional `hint`
/// string with extra diagnostic context.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CesrError {
    /// More bytes are needed to complete the current token or frame.
    ///
    /// Non-fatal while streaming: the parser retains unconsumed input and
    /// resumes from the same position on the next `feed`.
    #[error("shortage: need {need} bytes, have {have}{}", fmt_offset(*.offset))]
    Shortage {
        /// Total bytes required to complete the decode.
        need: usize,
        /// Bytes currently available.
        have: usize,
        /// Byte offset within the stream where the shortage was detected.
        offset: Option<usize>,
    },

    /// A token's code is not present in the active version's table.
    #[error("unknown code `{code}`{}", fmt_offset(*.offset))]
    UnknownCode {
        /// The unrecognized code string.
        code: String,
        /// Byte offset where the code was read.
        offset: Option<usize>,
    },

    /// A well-formed code carried a malformed body.
    #[error("deserialize error{}{}", fmt_hint(.hint), fmt_offset(*.offset))]
    Deserialize {
        /// Extra diagnostic context (bad padding, non-b64 char, etc).
        hint: Option<String>,
        /// Byte offset where the malformed body begins.
        offset: Option<usize>,
    },

    /// No recognizable version string was found within the permitted window.
    #[error("version string not found{}", fmt_offset(*.offset))]
    VersionError {
        /// Byte offset of the window that was scanned.
        offset: Option<usize>,
    },

    /// The domain sniff returned an unexpected domain, or a body/wrapper
    /// invariant failed.
    #[error("cold start violation{}{}", fmt_hint(.hint), fmt_offset(*.offset))]
    ColdStart {
        /// Extra diagnostic context.
        hint: Option<String>,
        /// Byte offset where the violation was detected.
        offset: Option<usize>,
    },

    /// Nested parsing consumed fewer or more bytes than declared.
    #[error("group size mismatch: declared {declared}, consumed {consumed}{}", fmt_offset(*.offset))]
    GroupSize {
        /// Declared payload length in bytes.
        declared: usize,
        /// Bytes actually consumed by the nested parse.
        consumed: usize,
        /// Byte offset of the group header.
        offset: Option<usize>,
    },
}

fn fmt_offset(offset: Option<usize>) -> String {
    match offset {
        Some(o) => format!(" (at offset {o})"),
        None => String::new(),
    }
}

fn fmt_hint(hint: &Option<String>) -> String {
    match hint {
        Some(h) => format!(": {h}"),
        None => String::new(),
    }
}

impl CesrError {
    /// True if this error is [`CesrError::Shortage`].
    #[must_use]
    pub const fn is_shortage(&self) -> bool {
        matches!(self, Self::Shortage { .. })
    }

    /// The byte offset associated with this error, if any.
    #[must_use]
    pub const fn offset(&self) -> Option<usize> {
        match self {
            Self::Shortage { offset, .. }
            | Self::UnknownCode { offset, .. }
            | Self::Deserialize { offset, .. }
            | Self::VersionError { offset }
            | Self::ColdStart { offset, .. }
            | Self::GroupSize { offset, .. } => *offset,
        }
    }

    /// Build a [`CesrError::Shortage`] with no offset attached.
    #[must_use]
    pub const fn shortage(need: usize, have: usize) -> Self {
        Self::Shortage { need, have, offset: None }
    }

    /// Attach (or overwrite) the offset on this error.
    #[must_use]
    pub fn with_offset(mut self, at: usize) -> Self {
        match &mut self {
            Self::Shortage { offset, .. }
            | Self::UnknownCode { offset, .. }
            | Self::Deserialize { offset, .. }
            | Self::ColdStart { offset, .. }
            | Self::GroupSize { offset, .. } => *offset = Some(at),
            Self::VersionError { offset } => *offset = Some(at),
        }
        self
    }
}
