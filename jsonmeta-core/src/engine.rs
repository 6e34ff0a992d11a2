//! Rule evaluation over a fully buffered body.
//!
//! [`process_body`] is the single entry point used once per message: it parses
//! the body, runs every rule through [`evaluate`] and commits the staged
//! metadata. The `apply_all_*` helpers cover the paths where the body cannot
//! be matched at all.
//!
//! Per-rule failures (absent path, non-scalar leaf, failed conversion) fall
//! back to the rule's `on_missing` outcome. Only a body that is not valid JSON
//! selects `on_error`.

use serde_json::Value;
use tracing::{debug, warn};

use crate::convert::check_payload_len;
use crate::error::{BodyParseError, ConversionError};
use crate::metadata::{MetadataBuilder, MetadataSink, MetadataValue};
use crate::rule::{KeyValuePair, Rule, ValueType};
use crate::stats::Outcome;
use crate::value::{Object, Scalar};

/// What a single rule contributed to the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The `on_present` outcome was written.
    Applied,
    /// The path did not resolve; `on_missing` was written if configured.
    Missing,
    /// The body was invalid; `on_error` was written if configured.
    ErrorHandled,
    /// The value was found but produced no metadata.
    Skipped,
}

fn apply_key_value<S>(builder: &mut MetadataBuilder<'_, S>, kv: &KeyValuePair, value: MetadataValue)
where
    S: MetadataSink + ?Sized,
{
    builder.apply(
        kv.metadata_namespace(),
        kv.key(),
        value,
        kv.preserve_existing_metadata_value(),
    );
}

/// Writes the `on_missing` literal of `rule`, if any.
pub fn apply_on_missing<S>(rule: &Rule, builder: &mut MetadataBuilder<'_, S>) -> RuleOutcome
where
    S: MetadataSink + ?Sized,
{
    if let Some(kv) = rule.on_missing()
        && let Some(value) = kv.literal()
    {
        apply_key_value(builder, kv, value.clone());
    }
    RuleOutcome::Missing
}

/// Writes the `on_error` literal of `rule`, if any.
pub fn apply_on_error<S>(rule: &Rule, builder: &mut MetadataBuilder<'_, S>) -> RuleOutcome
where
    S: MetadataSink + ?Sized,
{
    if let Some(kv) = rule.on_error()
        && let Some(value) = kv.literal()
    {
        apply_key_value(builder, kv, value.clone());
    }
    RuleOutcome::ErrorHandled
}

/// Converts a found leaf according to the `on_present` destination type.
///
/// `Ok(None)` means the value converted to an empty string and nothing
/// should be written.
fn convert_present(
    kv: &KeyValuePair,
    scalar: Scalar,
) -> Result<Option<MetadataValue>, ConversionError> {
    match kv.get_value_type() {
        ValueType::ProtobufValue => scalar.into_metadata_value().map(Some),
        ValueType::Number => scalar.into_number().map(|n| Some(MetadataValue::Number(n))),
        ValueType::String => {
            let text = scalar.into_display_string();
            check_payload_len(&text)?;
            if text.is_empty() {
                debug!("value is empty, not adding metadata. key: {}", kv.key());
                return Ok(None);
            }
            Ok(Some(MetadataValue::String(text)))
        }
    }
}

/// Evaluates one rule against an object root.
pub fn evaluate<S>(root: Object<'_>, rule: &Rule, builder: &mut MetadataBuilder<'_, S>) -> RuleOutcome
where
    S: MetadataSink + ?Sized,
{
    let mut node = root;
    for key in rule.intermediate_keys() {
        match node.object(key) {
            Ok(next) => node = next,
            Err(error) => {
                warn!("{}", error);
                return apply_on_missing(rule, builder);
            }
        }
    }

    if let Some(kv) = rule.on_present()
        && let Some(value) = kv.literal()
    {
        apply_key_value(builder, kv, value.clone());
        return RuleOutcome::Applied;
    }

    // Looked up even without on_present, unlike Envoy, so an on_missing-only rule fires.
    let scalar = match node.scalar(rule.leaf_key()) {
        Ok(scalar) => scalar,
        Err(error) => {
            warn!("{}", error);
            return apply_on_missing(rule, builder);
        }
    };

    let Some(kv) = rule.on_present() else {
        return RuleOutcome::Skipped;
    };

    match convert_present(kv, scalar) {
        Ok(Some(value)) => {
            apply_key_value(builder, kv, value);
            RuleOutcome::Applied
        }
        Ok(None) => RuleOutcome::Skipped,
        Err(error) => {
            warn!("{} key: {}", error, rule.leaf_key());
            apply_on_missing(rule, builder)
        }
    }
}

/// Writes the `on_missing` outcome of every rule and commits.
pub fn apply_all_on_missing<S>(rules: &[Rule], sink: &mut S)
where
    S: MetadataSink + ?Sized,
{
    let mut builder = MetadataBuilder::new(&*sink);
    for rule in rules {
        apply_on_missing(rule, &mut builder);
    }
    let staged = builder.finish();
    staged.commit(sink);
}

/// Writes the `on_error` outcome of every rule and commits.
pub fn apply_all_on_error<S>(rules: &[Rule], sink: &mut S)
where
    S: MetadataSink + ?Sized,
{
    let mut builder = MetadataBuilder::new(&*sink);
    for rule in rules {
        apply_on_error(rule, &mut builder);
    }
    let staged = builder.finish();
    staged.commit(sink);
}

/// Parses a buffered body as JSON.
pub fn parse_body(body: &[u8]) -> Result<Value, BodyParseError> {
    Ok(serde_json::from_slice(body)?)
}

/// Runs every rule against a complete body and commits the result into `sink`.
///
/// Returns the message-level outcome to count.
pub fn process_body<S>(rules: &[Rule], body: &[u8], sink: &mut S) -> Outcome
where
    S: MetadataSink + ?Sized,
{
    if body.is_empty() {
        apply_all_on_missing(rules, sink);
        return Outcome::NoBody;
    }

    let json = match parse_body(body) {
        Ok(json) => json,
        Err(error) => {
            debug!("{}", error);
            apply_all_on_error(rules, sink);
            return Outcome::InvalidJsonBody;
        }
    };

    // A bare string or number is valid JSON but has no keys to match.
    let Some(root) = Object::from_value(&json) else {
        debug!(
            "Apply on_missing for all rules on a valid application/json body but not a json object."
        );
        apply_all_on_missing(rules, sink);
        return Outcome::Success;
    };

    let mut builder = MetadataBuilder::new(&*sink);
    for rule in rules {
        evaluate(root, rule, &mut builder);
    }
    let staged = builder.finish();
    staged.commit(sink);
    Outcome::Success
}
