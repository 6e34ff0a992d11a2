//! Tower middleware for the json to metadata filter.
//!
//! [`JsonToMetadata`] is a Tower [`Layer`](tower::Layer). For every request it
//! checks the content type, reads the whole body, evaluates the configured
//! rules and stores the result as a [`DynamicMetadata`] request extension.
//! The inner service receives the request with a [`BufferedBody`] that
//! replays the body unchanged.
//!
//! # Quick Start
//!
//! ```
//! use std::convert::Infallible;
//!
//! use jsonmeta_core::{DynamicMetadata, FilterConfig, KeyValuePair, Rule};
//! use jsonmeta_http::BufferedBody;
//! use jsonmeta_tower::JsonToMetadata;
//! use tower::{ServiceBuilder, service_fn};
//!
//! let rule = Rule::new(
//!     ["tenant"],
//!     Some(KeyValuePair::new("tenant")),
//!     Some(KeyValuePair::new("tenant").value("anonymous")),
//!     None,
//! )
//! .unwrap();
//!
//! let service = ServiceBuilder::new()
//!     .layer(JsonToMetadata::new(FilterConfig::builder().rule(rule).build()))
//!     .service(service_fn(|request: http::Request<BufferedBody<String>>| async move {
//!         let metadata = request.extensions().get::<DynamicMetadata>().cloned();
//!         Ok::<_, Infallible>(http::Response::new(format!("{metadata:?}")))
//!     }));
//! # let _ = service;
//! ```
//!
//! [`DynamicMetadata`]: jsonmeta_core::DynamicMetadata
//! [`BufferedBody`]: jsonmeta_http::BufferedBody

pub mod layer;
pub mod service;

pub use layer::JsonToMetadata;
pub use service::JsonToMetadataService;
