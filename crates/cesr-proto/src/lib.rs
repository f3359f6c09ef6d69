//! Streaming parser for CESR (Composable Event Streaming Representation),
//! the dual-domain, self-framing concatenative encoding used by the
//! KERI/ACDC protocol family.
//!
//! The entry points are [`Parser`] for incremental, shortage-recoverable
//! streaming, and [`parse_bytes`] for one-shot parsing of a complete
//! buffer.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod b64;
pub mod body;
pub mod counter;
pub mod dispatch;
pub mod error;
pub mod indexer;
pub mod matter;
pub mod parser;
pub mod serder;
pub mod sniff;
pub mod tables;
pub mod views;
pub mod vstring;

#[cfg(feature = "async")]
pub mod stream;

pub use dispatch::{AttachmentGroup, DispatchMode, FallbackEvent, GroupPayload};
pub use error::CesrError;
pub use parser::{CesrFrame, Emission, EmittedError, ErrorKind, Parser, ParserOptions};
pub use serder::SerderEnvelope;
pub use sniff::Domain;
pub use tables::Versionage;

/// Build a [`Parser`] with the given options.
#[must_use]
pub fn create_parser(options: ParserOptions) -> Parser {
    Parser::new(options)
}

/// Parse a complete, in-memory buffer in one shot.
///
/// Equivalent to feeding the whole buffer to a fresh [`Parser`] and
/// flushing it. Useful for tests and for callers who already have the
/// entire message available (no streaming needed). A truncated final frame
/// surfaces as a trailing `Emission::Error { kind: ErrorKind::Shortage, .. }`
/// rather than as an `Err`.
pub fn parse_bytes(buf: &[u8], options: ParserOptions) -> Vec<Emission> {
    let mut parser = Parser::new(options);
    let mut emissions = parser.feed(buf);
    emissions.extend(parser.flush());
    emissions
}
