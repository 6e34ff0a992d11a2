//! # jsonmeta-core
//!
//! Rule engine that projects values from a JSON body into dynamic metadata.
//!
//! A filter is configured with a list of [`Rule`]s. Each rule names an
//! object-key path into the body and up to three outcomes:
//!
//! - **on_present**: the path resolved; write the converted leaf (or a literal)
//! - **on_missing**: the path did not resolve, or the leaf failed to convert
//! - **on_error**: the whole body is not valid JSON
//!
//! Results of all rules are staged in a [`MetadataBuilder`] and committed to a
//! host [`MetadataSink`] once per message.
//!
//! This crate is protocol-agnostic; it works on a complete body buffer.
//! Incremental body assembly over HTTP lives in `jsonmeta-http`.
//!
//! ## Feature Flags
//!
//! - `metrics` - Report outcome counters through the `metrics` facade
//!
//! ## Example
//!
//! ```
//! use jsonmeta_core::{DynamicMetadata, KeyValuePair, Outcome, Rule, ValueType, process_body};
//!
//! let rule = Rule::new(
//!     ["user", "tier"],
//!     Some(KeyValuePair::new("tier").value_type(ValueType::String)),
//!     Some(KeyValuePair::new("tier").value("unknown")),
//!     None,
//! )
//! .unwrap();
//!
//! let mut metadata = DynamicMetadata::new();
//! let outcome = process_body(&[rule], br#"{"user":{"tier":"gold"}}"#, &mut metadata);
//!
//! assert_eq!(outcome, Outcome::Success);
//! assert_eq!(
//!     metadata.get(jsonmeta_core::DEFAULT_NAMESPACE, "tier").and_then(|v| v.as_str()),
//!     Some("gold")
//! );
//! ```

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod rule;
pub mod stats;
pub mod value;

pub use config::{DEFAULT_CONTENT_TYPE, FilterConfig, FilterConfigBuilder};
pub use engine::{
    RuleOutcome, apply_all_on_error, apply_all_on_missing, evaluate, parse_body, process_body,
};
pub use error::{BodyParseError, ConfigError, ConversionError, InvariantViolation};
pub use metadata::{
    DynamicMetadata, MetadataBuilder, MetadataSink, MetadataValue, StagedMetadata, Struct,
    StructMap,
};
pub use rule::{KeyValuePair, Rule, ValueType};
pub use stats::{FilterStats, Outcome, STAT_PREFIX};
pub use value::{LookupError, Object, Scalar};

/// Namespace used when a rule does not configure one.
pub const DEFAULT_NAMESPACE: &str = "envoy.filters.http.json_to_metadata";

/// Maximum length in bytes of a string value written as metadata.
pub const MAX_PAYLOAD_VALUE_LEN: usize = 8 * 1024;
