//! # jsonmeta-http
//!
//! HTTP request plumbing for the json to metadata rules in `jsonmeta-core`.
//!
//! - [`StreamAssembler`] is the per-request state machine. A host calls it at
//!   headers, at every body chunk and at trailers; it buffers the body and runs
//!   the rules once the message is complete.
//! - [`process_request`] drives an assembler from an [`http::Request`] whose
//!   body implements [`http_body::Body`], and hands back a request with a
//!   [`BufferedBody`] that replays every byte to the next service.
//!
//! ```
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use http_body_util::Full;
//! use jsonmeta_core::{DynamicMetadata, FilterConfig, KeyValuePair, Outcome, Rule};
//! use jsonmeta_http::process_request;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let rule = Rule::new(["id"], Some(KeyValuePair::new("id")), None, None).unwrap();
//! let config = Arc::new(FilterConfig::builder().rule(rule).build());
//!
//! let request = http::Request::builder()
//!     .header("content-type", "application/json")
//!     .body(Full::new(Bytes::from_static(br#"{"id":7}"#)))
//!     .unwrap();
//!
//! let mut metadata = DynamicMetadata::new();
//! let (_request, outcome) = process_request(&config, request, &mut metadata).await;
//!
//! assert_eq!(outcome, Some(Outcome::Success));
//! assert!(!metadata.is_empty());
//! # }
//! ```

pub mod assembler;
pub mod body;
pub mod request;

pub use assembler::{DataStatus, HeadersStatus, StreamAssembler};
pub use body::BufferedBody;
pub use request::process_request;
