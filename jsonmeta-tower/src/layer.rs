//! Tower layer wrapping services with the json to metadata filter.

use std::sync::Arc;

use jsonmeta_core::FilterConfig;
use tower::Layer;

use crate::service::JsonToMetadataService;

/// Tower [`Layer`] that runs the json to metadata rules on every request.
///
/// Every service built from one layer shares the same [`FilterConfig`] and
/// therefore the same outcome counters.
#[derive(Debug, Clone)]
pub struct JsonToMetadata {
    config: Arc<FilterConfig>,
}

impl JsonToMetadata {
    pub fn new(config: FilterConfig) -> Self {
        Self::from_shared(Arc::new(config))
    }

    pub fn from_shared(config: Arc<FilterConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Arc<FilterConfig> {
        &self.config
    }
}

impl<S> Layer<S> for JsonToMetadata {
    type Service = JsonToMetadataService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        JsonToMetadataService::new(inner, Arc::clone(&self.config))
    }
}
