//! Serde representation of the json to metadata filter configuration.
//!
//! ```yaml
//! request_rules:
//!   rules:
//!     - selectors:
//!         - key: version
//!       on_present:
//!         metadata_namespace: envoy.lb
//!         key: version
//!       on_missing:
//!         metadata_namespace: envoy.lb
//!         key: version
//!         value: unknown
//!   allow_content_types:
//!     - application/json
//!     - application/better-json
//!   allow_empty_content_type: false
//! ```
//!
//! [`ConfigFilter::into_filter_config`] validates the rules and produces the
//! [`FilterConfig`](jsonmeta_core::FilterConfig) used at runtime.

mod error;
pub mod filter;
pub mod rule;

pub use error::ConfigError;
pub use filter::{ConfigFilter, ConfigRequestRules};
pub use rule::{ConfigKeyValuePair, ConfigRule, ConfigSelector};
