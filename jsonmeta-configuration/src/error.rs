use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("rule {index} is invalid: {source}")]
    InvalidRule {
        index: usize,
        #[source]
        source: jsonmeta_core::ConfigError,
    },

    #[error("failed to parse YAML configuration: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),
}
