use std::sync::Arc;

use jsonmeta_core::FilterConfig;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rule::ConfigRule;

/// Rules applied to request bodies and the content types they apply to.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigRequestRules {
    pub rules: Vec<ConfigRule>,
    /// Empty means only `application/json`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_content_types: Vec<String>,
    #[serde(default)]
    pub allow_empty_content_type: bool,
}

/// Top level configuration of the filter.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFilter {
    pub request_rules: ConfigRequestRules,
}

impl ConfigFilter {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_saphyr::from_str(yaml)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validates every rule and builds the shared filter configuration.
    pub fn into_filter_config(self) -> Result<Arc<FilterConfig>, ConfigError> {
        let request_rules = self.request_rules;
        let rules = request_rules
            .rules
            .into_iter()
            .enumerate()
            .map(|(index, rule)| {
                rule.into_rule()
                    .map_err(|source| ConfigError::InvalidRule { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let builder = request_rules
            .allow_content_types
            .into_iter()
            .fold(FilterConfig::builder().rules(rules), |builder, content_type| {
                builder.allow_content_type(content_type)
            })
            .allow_empty_content_type(request_rules.allow_empty_content_type);

        Ok(Arc::new(builder.build()))
    }
}
