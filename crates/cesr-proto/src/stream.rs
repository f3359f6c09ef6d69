//! Optional async adapter (`async` feature): turns a stream of raw byte
//! chunks into a stream of parsed [`CesrFrame`]s, pulling the underlying
//! [`Parser`] along as chunks arrive.

use async_stream::stream;
use bytes::Bytes;
use futures_core::Stream;

use crate::parser::{CesrFrame, Emission, EmittedError, Parser, ParserOptions};

/// Adapt a stream of byte chunks into a stream of parse emissions.
///
/// This is a pull adapter, not a background task: it does no work until
/// polled, and polling it drives both the chunk source and the parser
/// forward in lockstep. Errors are yielded as `Err` items rather than
/// ending the stream — a malformed frame doesn't prevent later, independent
/// frames in the same source from still being parsed.
pub fn to_async_frames<S>(source: S, options: ParserOptions) -> impl Stream<Item = Result<CesrFrame, EmittedError>>
where
    S: Stream<Item = Bytes>,
{
    stream! {
        let mut parser = Parser::new(options);
        for await chunk in source {
            for emission in parser.feed(&chunk) {
                yield emission_to_result(emission);
            }
        }
        for emission in parser.flush() {
            yield emission_to_result(emission);
        }
    }
}

fn emission_to_result(emission: Emission) -> Result<CesrFrame, EmittedError> {
    match emission {
        Emission::Frame(frame) => Ok(frame),
        Emission::Error(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;

    fn chunks(parts: Vec<&'static [u8]>) -> impl Stream<Item = Bytes> {
        async_stream::stream! {
            for part in parts {
                yield Bytes::from_static(part);
            }
        }
    }

    #[tokio::test]
    async fn adapts_chunked_input_into_frames() {
        let body = br#"{"v":"KERI10JSON00002e_","t":"icp"}"#;
        let mid = body.len() / 2;
        let source = chunks(vec![&body[..mid], &body[mid..]]);
        let mut out = Box::pin(to_async_frames(source, ParserOptions::default()));

        let mut frames = Vec::new();
        while let Some(result) = futures_next(out.as_mut()).await {
            frames.push(result.unwrap());
        }
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].envelope.ilk.as_deref(), Some("icp"));
    }

    #[tokio::test]
    async fn surfaces_a_truncated_stream_as_an_error_item() {
        let body = br#"{"v":"KERI10JSON00002e_","t":"icp"}"#;
        let truncated = &body[..body.len() - 6];
        let source = chunks(vec![truncated]);
        let mut out = Box::pin(to_async_frames(source, ParserOptions::default()));

        let mut items = Vec::new();
        while let Some(result) = futures_next(out.as_mut()).await {
            items.push(result);
        }
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());
    }

    async fn futures_next<S: Stream + ?Sized>(mut s: Pin<&mut S>) -> Option<S::Item> {
        std::future::poll_fn(|cx| s.as_mut().poll_next(cx)).await
    }
}
