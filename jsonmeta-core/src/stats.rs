//! Per-filter outcome counters.
//!
//! Every message increments exactly one of the four counters. The counters
//! live in [`FilterStats`] so they can be read back directly; with the
//! `metrics` feature enabled each increment is also reported through the
//! [`metrics`](https://docs.rs/metrics) facade under the same stat name.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

/// Prefix shared by every stat name.
pub const STAT_PREFIX: &str = "json_to_metadata.";

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of requests whose body was valid JSON.
    pub static ref RQ_SUCCESS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "json_to_metadata.rq_success",
            "Total number of requests with a valid JSON body."
        );
        "json_to_metadata.rq_success"
    };
    /// Track number of requests without a body.
    pub static ref RQ_NO_BODY_COUNTER: &'static str = {
        metrics::describe_counter!(
            "json_to_metadata.rq_no_body",
            "Total number of requests without a body."
        );
        "json_to_metadata.rq_no_body"
    };
    /// Track number of requests whose body failed to parse.
    pub static ref RQ_INVALID_JSON_BODY_COUNTER: &'static str = {
        metrics::describe_counter!(
            "json_to_metadata.rq_invalid_json_body",
            "Total number of requests with a body that is not valid JSON."
        );
        "json_to_metadata.rq_invalid_json_body"
    };
    /// Track number of requests skipped because of their content type.
    pub static ref RQ_MISMATCHED_CONTENT_TYPE_COUNTER: &'static str = {
        metrics::describe_counter!(
            "json_to_metadata.rq_mismatched_content_type",
            "Total number of requests with a content type outside the allow list."
        );
        "json_to_metadata.rq_mismatched_content_type"
    };
}

/// Message-level result of running the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The body was valid JSON (object or not).
    Success,
    /// The message had no body.
    NoBody,
    /// The body was not valid JSON.
    InvalidJsonBody,
    /// The content type was not allowed; no rule ran.
    MismatchedContentType,
}

impl Outcome {
    /// Counter name without the [`STAT_PREFIX`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "rq_success",
            Outcome::NoBody => "rq_no_body",
            Outcome::InvalidJsonBody => "rq_invalid_json_body",
            Outcome::MismatchedContentType => "rq_mismatched_content_type",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four outcome counters of one filter configuration.
#[derive(Debug, Default)]
pub struct FilterStats {
    rq_success: AtomicU64,
    rq_no_body: AtomicU64,
    rq_invalid_json_body: AtomicU64,
    rq_mismatched_content_type: AtomicU64,
}

impl FilterStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, outcome: Outcome) -> &AtomicU64 {
        match outcome {
            Outcome::Success => &self.rq_success,
            Outcome::NoBody => &self.rq_no_body,
            Outcome::InvalidJsonBody => &self.rq_invalid_json_body,
            Outcome::MismatchedContentType => &self.rq_mismatched_content_type,
        }
    }

    /// Increments the counter for `outcome`.
    pub fn record(&self, outcome: Outcome) {
        self.counter(outcome).fetch_add(1, Ordering::Relaxed);
        record_outcome_metric(outcome);
    }

    /// Current value of the counter for `outcome`.
    pub fn get(&self, outcome: Outcome) -> u64 {
        self.counter(outcome).load(Ordering::Relaxed)
    }

    /// Sum of all four counters, i.e. the number of messages processed.
    pub fn total(&self) -> u64 {
        [
            Outcome::Success,
            Outcome::NoBody,
            Outcome::InvalidJsonBody,
            Outcome::MismatchedContentType,
        ]
        .into_iter()
        .map(|outcome| self.get(outcome))
        .sum()
    }
}

#[cfg(feature = "metrics")]
#[inline]
fn record_outcome_metric(outcome: Outcome) {
    let counter = match outcome {
        Outcome::Success => *RQ_SUCCESS_COUNTER,
        Outcome::NoBody => *RQ_NO_BODY_COUNTER,
        Outcome::InvalidJsonBody => *RQ_INVALID_JSON_BODY_COUNTER,
        Outcome::MismatchedContentType => *RQ_MISMATCHED_CONTENT_TYPE_COUNTER,
    };
    metrics::counter!(counter).increment(1);
}

/// No-op version when metrics feature is disabled.
#[cfg(not(feature = "metrics"))]
#[inline]
fn record_outcome_metric(_outcome: Outcome) {}
