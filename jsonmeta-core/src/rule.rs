//! Validated extraction rules.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::metadata::{MetadataValue, decide_namespace};

/// Destination representation of a value read from the body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    /// Keep the JSON type: bools stay bools, numbers become numbers,
    /// strings stay strings.
    #[default]
    ProtobufValue,
    /// Render the value as text.
    String,
    /// Parse the value as a floating point number.
    Number,
}

/// Where and how one outcome of a rule writes metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyValuePair {
    metadata_namespace: String,
    key: String,
    value: Option<MetadataValue>,
    value_type: ValueType,
    preserve_existing_metadata_value: bool,
}

impl KeyValuePair {
    /// Writes to `key` in the default namespace, deriving the value from the body.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.metadata_namespace = namespace.into();
        self
    }

    /// Writes a fixed value instead of deriving it from the body.
    pub fn value(mut self, value: impl Into<MetadataValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn preserve_existing(mut self, preserve: bool) -> Self {
        self.preserve_existing_metadata_value = preserve;
        self
    }

    /// The namespace to write to, with the default applied.
    pub fn metadata_namespace(&self) -> &str {
        decide_namespace(&self.metadata_namespace)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn literal(&self) -> Option<&MetadataValue> {
        self.value.as_ref()
    }

    pub fn get_value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn preserve_existing_metadata_value(&self) -> bool {
        self.preserve_existing_metadata_value
    }
}

/// A JSON path plus what to write when it is present, missing, or the body is invalid.
///
/// Only object-key selectors are supported: every key but the last descends
/// into a nested object, the last one names the leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    keys: Vec<String>,
    on_present: Option<KeyValuePair>,
    on_missing: Option<KeyValuePair>,
    on_error: Option<KeyValuePair>,
}

impl Rule {
    /// Validates the raw rule fields.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoOutcome`] if neither `on_present` nor `on_missing` is set
    /// - [`ConfigError::OnMissingWithoutValue`] / [`ConfigError::OnErrorWithoutValue`]
    ///   if those outcomes have no literal value to write
    /// - [`ConfigError::NoSelectors`] / [`ConfigError::EmptySelectorKey`] for a bad path
    /// - [`ConfigError::EmptyMetadataKey`] if an outcome has no key
    pub fn new<I, K>(
        selectors: I,
        on_present: Option<KeyValuePair>,
        on_missing: Option<KeyValuePair>,
        on_error: Option<KeyValuePair>,
    ) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        if on_present.is_none() && on_missing.is_none() {
            return Err(ConfigError::NoOutcome);
        }
        if on_missing.as_ref().is_some_and(|kv| kv.value.is_none()) {
            return Err(ConfigError::OnMissingWithoutValue);
        }
        if on_error.as_ref().is_some_and(|kv| kv.value.is_none()) {
            return Err(ConfigError::OnErrorWithoutValue);
        }

        let outcomes = [
            ("on_present", &on_present),
            ("on_missing", &on_missing),
            ("on_error", &on_error),
        ];
        for (outcome, kv) in outcomes {
            if kv.as_ref().is_some_and(|kv| kv.key.is_empty()) {
                return Err(ConfigError::EmptyMetadataKey { outcome });
            }
        }

        let keys: Vec<String> = selectors.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Err(ConfigError::NoSelectors);
        }
        if let Some(index) = keys.iter().position(String::is_empty) {
            return Err(ConfigError::EmptySelectorKey { index });
        }

        Ok(Self {
            keys,
            on_present,
            on_missing,
            on_error,
        })
    }

    /// The full selector path, leaf last.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Keys descended through before the leaf lookup.
    pub fn intermediate_keys(&self) -> &[String] {
        &self.keys[..self.keys.len() - 1]
    }

    pub fn leaf_key(&self) -> &str {
        // Non-empty by construction
        &self.keys[self.keys.len() - 1]
    }

    pub fn on_present(&self) -> Option<&KeyValuePair> {
        self.on_present.as_ref()
    }

    pub fn on_missing(&self) -> Option<&KeyValuePair> {
        self.on_missing.as_ref()
    }

    pub fn on_error(&self) -> Option<&KeyValuePair> {
        self.on_error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_NAMESPACE;

    #[test]
    fn test_requires_present_or_missing() {
        let err = Rule::new(["a"], None, None, Some(KeyValuePair::new("k").value("e")));
        assert_eq!(err, Err(ConfigError::NoOutcome));
    }

    #[test]
    fn test_on_missing_requires_value() {
        let err = Rule::new(["a"], None, Some(KeyValuePair::new("k")), None);
        assert_eq!(err, Err(ConfigError::OnMissingWithoutValue));
    }

    #[test]
    fn test_on_error_requires_value() {
        let err = Rule::new(
            ["a"],
            Some(KeyValuePair::new("k")),
            None,
            Some(KeyValuePair::new("k")),
        );
        assert_eq!(err, Err(ConfigError::OnErrorWithoutValue));
    }

    #[test]
    fn test_rejects_bad_paths_and_keys() {
        let present = || Some(KeyValuePair::new("k"));
        assert_eq!(
            Rule::new(Vec::<String>::new(), present(), None, None),
            Err(ConfigError::NoSelectors)
        );
        assert_eq!(
            Rule::new(["a", ""], present(), None, None),
            Err(ConfigError::EmptySelectorKey { index: 1 })
        );
        assert_eq!(
            Rule::new(["a"], Some(KeyValuePair::new("")), None, None),
            Err(ConfigError::EmptyMetadataKey {
                outcome: "on_present"
            })
        );
    }

    #[test]
    fn test_path_kept_verbatim() {
        let rule = Rule::new(["a", "b", "a"], Some(KeyValuePair::new("k")), None, None).unwrap();
        assert_eq!(rule.keys(), ["a", "b", "a"]);
        assert_eq!(rule.intermediate_keys(), ["a", "b"]);
        assert_eq!(rule.leaf_key(), "a");
    }

    #[test]
    fn test_default_namespace_and_type() {
        let kv = KeyValuePair::new("k");
        assert_eq!(kv.metadata_namespace(), DEFAULT_NAMESPACE);
        assert_eq!(kv.get_value_type(), ValueType::ProtobufValue);
        assert!(!kv.preserve_existing_metadata_value());

        let kv = kv.namespace("ns");
        assert_eq!(kv.metadata_namespace(), "ns");
    }
}
