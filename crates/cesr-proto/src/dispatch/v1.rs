//! Major-version-1 attachment dispatch entry point.

use super::{dispatch_text, AttachmentGroup, DispatchMode, FallbackEvent};
use crate::error::Result;
use crate::tables::Versionage;

const V1: Versionage = Versionage { major: 1, minor: 0 };

/// Dispatch one attachment group under the v1 counter table.
///
/// # Errors
/// See [`dispatch_text`].
pub fn dispatch(
    text: &str,
    mode: DispatchMode,
    on_fallback: impl FnMut(FallbackEvent),
) -> Result<AttachmentGroup> {
    dispatch_text(text, V1, mode, on_fallback)
}
