//! Request body wrapper handed to the next service.
//!
//! The filter has to read the whole body before the rules can run, and the
//! upstream still expects to receive every byte. Reading therefore ends in
//! one of three states:
//!
//! - **Complete**: the body was read to its end and is replayed from memory,
//!   followed by its trailers if it had any
//! - **Partial**: reading stopped on an error; the bytes read so far are
//!   replayed and then the same error is yielded once
//! - **Passthrough**: the body was never read (content type rejected or no
//!   body), and is forwarded untouched

use bytes::{Buf, Bytes};
use http::HeaderMap;
use http_body::{Body as HttpBody, Frame, SizeHint};
use pin_project::pin_project;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

fn poll_inner<B: HttpBody>(
    body: Pin<&mut B>,
    cx: &mut Context<'_>,
) -> Poll<Option<Result<Frame<Bytes>, B::Error>>> {
    body.poll_frame(cx).map(|ready| {
        ready.map(|result| {
            result.map(|frame| frame.map_data(|mut data| data.copy_to_bytes(data.remaining())))
        })
    })
}

/// A request body after the filter looked at it.
///
/// # Variants
///
/// - [`Complete`](BufferedBody::Complete): fully read, replayed from memory
/// - [`Partial`](BufferedBody::Partial): read up to an error, prefix then error
/// - [`Passthrough`](BufferedBody::Passthrough): not read at all
#[pin_project(project = BufferedBodyProj)]
pub enum BufferedBody<B>
where
    B: HttpBody,
{
    /// Fully read body. Each field is taken when yielded, so the data comes
    /// out once and the trailers once after it.
    Complete {
        data: Option<Bytes>,
        trailers: Option<HeaderMap>,
    },

    /// Body whose reading failed. The prefix comes out first, then the
    /// error once; both fields are taken when yielded.
    Partial {
        prefix: Option<Bytes>,
        error: Option<B::Error>,
    },

    Passthrough(#[pin] B),
}

impl<B> BufferedBody<B>
where
    B: HttpBody,
{
    /// A complete body with no trailers. Empty data yields no data frame.
    pub fn complete(data: Bytes) -> Self {
        Self::complete_with_trailers(data, None)
    }

    pub fn complete_with_trailers(data: Bytes, trailers: Option<HeaderMap>) -> Self {
        BufferedBody::Complete {
            data: (!data.is_empty()).then_some(data),
            trailers,
        }
    }

    /// The bytes read before `error`, replayed ahead of it.
    pub fn partial(prefix: Bytes, error: B::Error) -> Self {
        BufferedBody::Partial {
            prefix: (!prefix.is_empty()).then_some(prefix),
            error: Some(error),
        }
    }
}

impl<B> HttpBody for BufferedBody<B>
where
    B: HttpBody,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            BufferedBodyProj::Complete { data, trailers } => {
                if let Some(bytes) = data.take() {
                    Poll::Ready(Some(Ok(Frame::data(bytes))))
                } else if let Some(trailers) = trailers.take() {
                    Poll::Ready(Some(Ok(Frame::trailers(trailers))))
                } else {
                    Poll::Ready(None)
                }
            }
            BufferedBodyProj::Partial { prefix, error } => match prefix.take() {
                Some(bytes) => Poll::Ready(Some(Ok(Frame::data(bytes)))),
                None => Poll::Ready(error.take().map(Err)),
            },
            BufferedBodyProj::Passthrough(body) => poll_inner(body, cx),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            BufferedBody::Complete { data, .. } | BufferedBody::Partial { prefix: data, .. } => {
                SizeHint::with_exact(data.as_ref().map(|b| b.len() as u64).unwrap_or(0))
            }
            BufferedBody::Passthrough(body) => body.size_hint(),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            BufferedBody::Complete { data, trailers } => data.is_none() && trailers.is_none(),
            BufferedBody::Partial { prefix, error } => prefix.is_none() && error.is_none(),
            BufferedBody::Passthrough(body) => body.is_end_stream(),
        }
    }
}

impl<B> fmt::Debug for BufferedBody<B>
where
    B: HttpBody,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferedBody::Complete { data, trailers } => f
                .debug_struct("Complete")
                .field(
                    "data",
                    &format!("{} bytes", data.as_ref().map(Bytes::len).unwrap_or(0)),
                )
                .field("trailers", &trailers.is_some())
                .finish(),
            BufferedBody::Partial { prefix, error } => f
                .debug_struct("Partial")
                .field(
                    "prefix",
                    &format!("{} bytes", prefix.as_ref().map(Bytes::len).unwrap_or(0)),
                )
                .field("error", &error.is_some())
                .finish(),
            BufferedBody::Passthrough(_) => f.debug_tuple("Passthrough").field(&"...").finish(),
        }
    }
}
