use jsonmeta_configuration::{ConfigError, ConfigFilter};
use jsonmeta_core::{
    DEFAULT_NAMESPACE, DynamicMetadata, MetadataValue, Outcome, ValueType, process_body,
};
use pretty_assertions::assert_eq;

const YAML: &str = r#"
request_rules:
  rules:
    - selectors:
        - key: version
      on_present:
        metadata_namespace: envoy.lb
        key: version
        type: STRING
      on_missing:
        metadata_namespace: envoy.lb
        key: version
        value: unknown
        preserve_existing_metadata_value: true
      on_error:
        metadata_namespace: envoy.lb
        key: version
        value: error
    - selectors:
        - key: limits
        - key: rps
      on_present:
        key: rps
        type: NUMBER
  allow_content_types:
    - application/json
    - application/better-json
"#;

#[test]
fn test_yaml_deserialize() {
    let config = ConfigFilter::from_yaml(YAML).unwrap();
    let rules = &config.request_rules.rules;

    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].selectors[0].key, "version");
    let on_present = rules[0].on_present.as_ref().unwrap();
    assert_eq!(on_present.metadata_namespace, "envoy.lb");
    assert_eq!(on_present.value_type, ValueType::String);
    let on_missing = rules[0].on_missing.as_ref().unwrap();
    assert_eq!(on_missing.value, Some(MetadataValue::from("unknown")));
    assert!(on_missing.preserve_existing_metadata_value);
    assert_eq!(rules[1].selectors.len(), 2);
    assert_eq!(rules[1].on_missing, None);
    assert_eq!(
        config.request_rules.allow_content_types,
        vec!["application/json", "application/better-json"]
    );
    assert!(!config.request_rules.allow_empty_content_type);
}

#[test]
fn test_json_matches_yaml() {
    let json = r#"{
        "request_rules": {
            "rules": [
                {
                    "selectors": [{"key": "version"}],
                    "on_present": {"metadata_namespace": "envoy.lb", "key": "version", "type": "STRING"},
                    "on_missing": {
                        "metadata_namespace": "envoy.lb",
                        "key": "version",
                        "value": "unknown",
                        "preserve_existing_metadata_value": true
                    },
                    "on_error": {"metadata_namespace": "envoy.lb", "key": "version", "value": "error"}
                },
                {
                    "selectors": [{"key": "limits"}, {"key": "rps"}],
                    "on_present": {"key": "rps", "type": "NUMBER"}
                }
            ],
            "allow_content_types": ["application/json", "application/better-json"]
        }
    }"#;

    assert_eq!(
        ConfigFilter::from_json(json).unwrap(),
        ConfigFilter::from_yaml(YAML).unwrap()
    );
}

#[test]
fn test_into_filter_config() {
    let config = ConfigFilter::from_yaml(YAML)
        .unwrap()
        .into_filter_config()
        .unwrap();

    assert_eq!(config.rules().len(), 2);
    assert!(config.content_type_allowed("application/better-json"));
    assert!(!config.content_type_allowed(""));

    let mut metadata = DynamicMetadata::new();
    let outcome = process_body(
        config.rules(),
        br#"{"version":1.5,"limits":{"rps":"20"}}"#,
        &mut metadata,
    );

    assert_eq!(outcome, Outcome::Success);
    assert_eq!(
        metadata.get("envoy.lb", "version"),
        Some(&MetadataValue::from("1.500000"))
    );
    assert_eq!(
        metadata.get(DEFAULT_NAMESPACE, "rps"),
        Some(&MetadataValue::Number(20.0))
    );
}

#[test]
fn test_invalid_rule_reports_index() {
    let yaml = r#"
request_rules:
  rules:
    - selectors:
        - key: a
      on_present:
        key: a
    - selectors:
        - key: b
      on_error:
        key: b
        value: failed
"#;

    let error = ConfigFilter::from_yaml(yaml)
        .unwrap()
        .into_filter_config()
        .unwrap_err();

    match error {
        ConfigError::InvalidRule { index, source } => {
            assert_eq!(index, 1);
            assert_eq!(source, jsonmeta_core::ConfigError::NoOutcome);
        }
        other => panic!("expected an invalid rule, got {other:?}"),
    }
}

#[test]
fn test_unknown_fields_are_rejected() {
    let yaml = r#"
request_rules:
  rules: []
  allow_content_type: application/json
"#;

    assert!(matches!(
        ConfigFilter::from_yaml(yaml),
        Err(ConfigError::Yaml(_))
    ));
}
