//! Major-version-2 attachment dispatch entry point.

use super::{dispatch_text, AttachmentGroup, DispatchMode, FallbackEvent};
use crate::error::Result;
use crate::tables::Versionage;

const V2: Versionage = Versionage { major: 2, minor: 0 };

/// Dispatch one attachment group under the v2 counter table.
///
/// # Errors
/// See [`dispatch_text`].
pub fn dispatch(
    text: &str,
    mode: DispatchMode,
    on_fallback: impl FnMut(FallbackEvent),
) -> Result<AttachmentGroup> {
    dispatch_text(text, V2, mode, on_fallback)
}
