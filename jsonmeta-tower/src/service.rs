//! Tower service running the json to metadata filter ahead of an inner service.

use std::mem;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use http::Request;
use http_body::Body as HttpBody;
use jsonmeta_core::{DynamicMetadata, FilterConfig};
use jsonmeta_http::{BufferedBody, process_request};
use tower::Service;
use tracing::{Instrument, debug, debug_span};

/// Service that fills the request's [`DynamicMetadata`] extension from its
/// JSON body before calling the inner service.
///
/// Metadata set by an earlier layer is taken from the extensions, merged
/// with what the rules produce, and put back.
#[derive(Debug)]
pub struct JsonToMetadataService<S> {
    inner: S,
    config: Arc<FilterConfig>,
}

impl<S> JsonToMetadataService<S> {
    pub fn new(inner: S, config: Arc<FilterConfig>) -> Self {
        Self { inner, config }
    }
}

impl<S> Clone for JsonToMetadataService<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S, ReqBody> Service<Request<ReqBody>> for JsonToMetadataService<S>
where
    S: Service<Request<BufferedBody<ReqBody>>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: HttpBody + Unpin + Send + 'static,
    ReqBody::Data: Send,
    ReqBody::Error: Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        let config = Arc::clone(&self.config);
        // poll_ready was called on self.inner, so that is the one to call
        let clone = self.inner.clone();
        let mut inner = mem::replace(&mut self.inner, clone);

        let span = debug_span!(
            "json_to_metadata",
            method = %request.method(),
            uri = %request.uri(),
        );

        async move {
            let mut metadata = request
                .extensions_mut()
                .remove::<DynamicMetadata>()
                .unwrap_or_default();
            let (mut request, outcome) = process_request(&config, request, &mut metadata).await;
            debug!(?outcome, "request body processed");
            request.extensions_mut().insert(metadata);
            inner.call(request).await
        }
        .instrument(span)
        .boxed()
    }
}
