//! Error types for rule construction and body processing.
//!
//! Only [`ConfigError`] is fatal. [`ConversionError`] and [`BodyParseError`]
//! are recovered inside the engine by falling back to a rule's `on_missing`
//! or `on_error` outcome, and never abort the message.

use thiserror::Error;

/// A rule or filter configuration failed validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Neither `on_present` nor `on_missing` was configured.
    #[error("json to metadata filter: neither `on_present` nor `on_missing` set")]
    NoOutcome,

    /// `on_missing` was configured without a literal value.
    #[error("json to metadata filter: cannot specify on_missing rule with empty value")]
    OnMissingWithoutValue,

    /// `on_error` was configured without a literal value.
    #[error("json to metadata filter: cannot specify on_error rule with empty value")]
    OnErrorWithoutValue,

    /// The rule has no selectors.
    #[error("json to metadata filter: rule must have at least one selector")]
    NoSelectors,

    /// A selector key is the empty string.
    #[error("json to metadata filter: selector {index} has an empty key")]
    EmptySelectorKey {
        /// Position of the offending selector in the rule.
        index: usize,
    },

    /// An outcome has no metadata key to write to.
    #[error("json to metadata filter: {outcome} has an empty metadata key")]
    EmptyMetadataKey {
        /// Which outcome (`on_present`, `on_missing`, `on_error`) is invalid.
        outcome: &'static str,
    },
}

/// A JSON scalar could not be converted into its destination type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The string is not a valid floating point literal.
    #[error("value {0} to number conversion failed")]
    NotANumber(String),

    /// The value exceeds [`MAX_PAYLOAD_VALUE_LEN`](crate::MAX_PAYLOAD_VALUE_LEN).
    #[error("metadata value is too long. value.length: {0}")]
    PayloadTooLarge(usize),
}

/// The buffered body is not valid JSON.
#[derive(Debug, Error)]
#[error("invalid json body: {0}")]
pub struct BodyParseError(#[from] serde_json::Error);

/// The stream assembler was driven out of order.
///
/// This is a programming error in the host integration, reported as a value
/// instead of a panic so the message can still be forwarded.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Headers were delivered twice for the same message.
    #[error("request headers were already processed")]
    HeadersAlreadyReceived,

    /// Body data or trailers arrived before the headers.
    #[error("request headers have not been processed yet")]
    HeadersNotReceived,
}
