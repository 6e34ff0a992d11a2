//! Drives a [`StreamAssembler`] from an [`http::Request`] body.

use std::sync::Arc;

use bytes::Buf;
use http::Request;
use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use jsonmeta_core::{FilterConfig, InvariantViolation, MetadataSink, Outcome};
use tracing::{trace, warn};

use crate::assembler::StreamAssembler;
use crate::body::BufferedBody;

fn report<T>(result: Result<T, InvariantViolation>) {
    if let Err(error) = result {
        warn!(%error, "json to metadata driven out of order");
    }
}

/// Runs the filter over a request and returns it with a replayable body.
///
/// The body is read frame by frame into the assembler, which owns the only
/// copy of the buffered bytes and hands it back for replay. Metadata produced by
/// the rules is committed to `sink` before this returns. The returned outcome
/// is `None` only when reading the body failed; in that case nothing is
/// committed or counted and the body replays the bytes read followed by the
/// error.
pub async fn process_request<B, S>(
    config: &Arc<FilterConfig>,
    request: Request<B>,
    sink: &mut S,
) -> (Request<BufferedBody<B>>, Option<Outcome>)
where
    B: HttpBody + Unpin,
    S: MetadataSink + ?Sized,
{
    let (parts, mut body) = request.into_parts();
    let mut assembler = StreamAssembler::new(Arc::clone(config));

    report(assembler.on_headers(&parts.headers, body.is_end_stream(), sink));
    if assembler.is_done() {
        let outcome = assembler.outcome();
        return (
            Request::from_parts(parts, BufferedBody::Passthrough(body)),
            outcome,
        );
    }

    let mut trailers = None;
    loop {
        match body.frame().await {
            Some(Ok(frame)) => match frame.into_data() {
                Ok(mut data) => {
                    let chunk = data.copy_to_bytes(data.remaining());
                    trace!(len = chunk.len(), "request body chunk");
                    report(assembler.on_data(&chunk, false, sink));
                }
                Err(frame) => {
                    if let Ok(map) = frame.into_trailers() {
                        report(assembler.on_trailers(sink));
                        trailers = Some(map);
                    }
                }
            },
            Some(Err(error)) => {
                warn!("request body failed before it was complete");
                let body = BufferedBody::partial(assembler.into_body(), error);
                return (Request::from_parts(parts, body), None);
            }
            None => break,
        }
    }

    if !assembler.is_done() {
        report(assembler.on_data(&[], true, sink));
    }

    let outcome = assembler.outcome();
    let body = BufferedBody::complete_with_trailers(assembler.into_body(), trailers);
    (Request::from_parts(parts, body), outcome)
}
