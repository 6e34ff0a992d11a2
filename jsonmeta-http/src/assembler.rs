//! Per-message body assembly state machine.
//!
//! The host drives a [`StreamAssembler`] through three resumption points, in
//! order: [`on_headers`](StreamAssembler::on_headers), any number of
//! [`on_data`](StreamAssembler::on_data) calls, and optionally
//! [`on_trailers`](StreamAssembler::on_trailers). The filter never acts on a
//! partial body: every chunk is buffered until end-of-message, then the rules
//! run exactly once.
//!
//! ```text
//! Idle ──headers──▶ AwaitingBody ──data──▶ Buffering ──data──▶ Buffering
//!                        │                     │
//!                        │ rejected type /     │ end of stream / trailers
//!                        │ no body             ▼
//!                        └──────────────────▶ Done
//! ```
//!
//! Finalization moves the buffer out of the state, so a second finalization
//! of the same message cannot be expressed. The frozen buffer is kept in
//! `Done` and handed back by [`into_body`](StreamAssembler::into_body), so
//! the bytes the rules parsed are the bytes that get forwarded. Once `Done`,
//! further data and trailers pass through untouched.

use std::fmt;
use std::mem;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use jsonmeta_core::{
    FilterConfig, InvariantViolation, MetadataSink, Outcome, apply_all_on_missing, process_body,
};
use tracing::debug;

/// What the host should do after the headers were processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadersStatus {
    /// Forward the headers; the filter is finished with this message.
    Continue,
    /// Hold the headers until the body was seen.
    StopIteration,
}

/// What the host should do with a body chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStatus {
    /// Forward the data.
    Continue,
    /// Keep the data buffered and deliver the next chunk.
    StopIterationAndBuffer,
}

enum State {
    Idle,
    AwaitingBody,
    Buffering(BytesMut),
    Done { outcome: Outcome, body: Bytes },
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Idle => f.write_str("State::Idle"),
            State::AwaitingBody => f.write_str("State::AwaitingBody"),
            State::Buffering(buffer) => f
                .debug_tuple("State::Buffering")
                .field(&format!("{} bytes", buffer.len()))
                .finish(),
            State::Done { outcome, body } => f
                .debug_struct("State::Done")
                .field("outcome", outcome)
                .field("body", &format!("{} bytes", body.len()))
                .finish(),
        }
    }
}

/// Reads the content type header, or `None` if it is not valid text.
fn content_type(headers: &HeaderMap) -> Option<&str> {
    match headers.get(CONTENT_TYPE) {
        Some(value) => value.to_str().ok(),
        None => Some(""),
    }
}

/// Body assembly and rule trigger for a single message.
#[derive(Debug)]
pub struct StreamAssembler {
    config: Arc<FilterConfig>,
    state: State,
}

impl StreamAssembler {
    pub fn new(config: Arc<FilterConfig>) -> Self {
        Self {
            config,
            state: State::Idle,
        }
    }

    /// The counted outcome, once the message was finalized.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.state {
            State::Done { outcome, .. } => Some(outcome),
            _ => None,
        }
    }

    /// The body buffered so far, or the whole body once finalized.
    ///
    /// Empty when the body was never read (rejected content type or a
    /// header-only message).
    pub fn into_body(self) -> Bytes {
        match self.state {
            State::Idle | State::AwaitingBody => Bytes::new(),
            State::Buffering(buffer) => buffer.freeze(),
            State::Done { body, .. } => body,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, State::Done { .. })
    }

    /// Processes the request headers.
    ///
    /// `end_stream` tells that no body or trailers will follow.
    ///
    /// # Errors
    ///
    /// [`InvariantViolation::HeadersAlreadyReceived`] if called twice.
    pub fn on_headers<S>(
        &mut self,
        headers: &HeaderMap,
        end_stream: bool,
        sink: &mut S,
    ) -> Result<HeadersStatus, InvariantViolation>
    where
        S: MetadataSink + ?Sized,
    {
        if !matches!(self.state, State::Idle) {
            return Err(InvariantViolation::HeadersAlreadyReceived);
        }

        let allowed = content_type(headers)
            .is_some_and(|content_type| self.config.content_type_allowed(content_type));
        if !allowed {
            debug!("content type not allowed, skipping json to metadata");
            self.complete(Outcome::MismatchedContentType, Bytes::new());
            return Ok(HeadersStatus::Continue);
        }

        if end_stream {
            apply_all_on_missing(self.config.rules(), sink);
            self.complete(Outcome::NoBody, Bytes::new());
            return Ok(HeadersStatus::Continue);
        }

        self.state = State::AwaitingBody;
        Ok(HeadersStatus::StopIteration)
    }

    /// Processes one body chunk.
    ///
    /// `end_stream` marks the last chunk; it may be empty.
    ///
    /// # Errors
    ///
    /// [`InvariantViolation::HeadersNotReceived`] if called before [`on_headers`](Self::on_headers).
    pub fn on_data<S>(
        &mut self,
        chunk: &[u8],
        end_stream: bool,
        sink: &mut S,
    ) -> Result<DataStatus, InvariantViolation>
    where
        S: MetadataSink + ?Sized,
    {
        match &mut self.state {
            State::Idle => return Err(InvariantViolation::HeadersNotReceived),
            State::Done { .. } => return Ok(DataStatus::Continue),
            State::AwaitingBody => {
                self.state = State::Buffering(BytesMut::from(chunk));
            }
            State::Buffering(buffer) => buffer.extend_from_slice(chunk),
        }

        if end_stream {
            self.finalize(sink);
            return Ok(DataStatus::Continue);
        }
        Ok(DataStatus::StopIterationAndBuffer)
    }

    /// Processes the arrival of trailers, which ends the message.
    ///
    /// # Errors
    ///
    /// [`InvariantViolation::HeadersNotReceived`] if called before [`on_headers`](Self::on_headers).
    pub fn on_trailers<S>(&mut self, sink: &mut S) -> Result<(), InvariantViolation>
    where
        S: MetadataSink + ?Sized,
    {
        match self.state {
            State::Idle => Err(InvariantViolation::HeadersNotReceived),
            State::Done { .. } => Ok(()),
            State::AwaitingBody | State::Buffering(_) => {
                self.finalize(sink);
                Ok(())
            }
        }
    }

    /// Runs the rules over everything buffered so far and moves to `Done`.
    fn finalize<S>(&mut self, sink: &mut S)
    where
        S: MetadataSink + ?Sized,
    {
        let body = match mem::replace(&mut self.state, State::Idle) {
            State::Buffering(buffer) => buffer.freeze(),
            State::AwaitingBody => Default::default(),
            state @ (State::Idle | State::Done { .. }) => {
                self.state = state;
                return;
            }
        };
        let outcome = process_body(self.config.rules(), &body, sink);
        self.complete(outcome, body);
    }

    fn complete(&mut self, outcome: Outcome, body: Bytes) {
        debug!(outcome = %outcome, "json to metadata finished");
        self.config.stats().record(outcome);
        self.state = State::Done { outcome, body };
    }
}
