//! Rule configuration.
//!
//! ```yaml
//! selectors:
//!   - key: version
//!   - key: major
//! on_present:
//!   metadata_namespace: envoy.lb
//!   key: version
//!   type: STRING
//! on_missing:
//!   metadata_namespace: envoy.lb
//!   key: version
//!   value: unknown
//!   preserve_existing_metadata_value: true
//! ```

use jsonmeta_core::{KeyValuePair, MetadataValue, Rule, ValueType};
use serde::{Deserialize, Serialize};

/// One step of the path into the body.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigSelector {
    pub key: String,
}

/// Target of one rule outcome.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigKeyValuePair {
    /// Empty selects the filter's default namespace.
    pub metadata_namespace: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<MetadataValue>,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub preserve_existing_metadata_value: bool,
}

impl ConfigKeyValuePair {
    pub fn into_key_value_pair(self) -> KeyValuePair {
        let pair = KeyValuePair::new(self.key)
            .namespace(self.metadata_namespace)
            .value_type(self.value_type)
            .preserve_existing(self.preserve_existing_metadata_value);
        match self.value {
            Some(value) => pair.value(value),
            None => pair,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConfigRule {
    pub selectors: Vec<ConfigSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_present: Option<ConfigKeyValuePair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_missing: Option<ConfigKeyValuePair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_error: Option<ConfigKeyValuePair>,
}

impl ConfigRule {
    pub fn into_rule(self) -> Result<Rule, jsonmeta_core::ConfigError> {
        Rule::new(
            self.selectors.into_iter().map(|selector| selector.key),
            self.on_present.map(ConfigKeyValuePair::into_key_value_pair),
            self.on_missing.map(ConfigKeyValuePair::into_key_value_pair),
            self.on_error.map(ConfigKeyValuePair::into_key_value_pair),
        )
    }
}
