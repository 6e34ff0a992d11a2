//! Filter-wide configuration shared by every message.

use std::collections::HashSet;

use crate::rule::Rule;
use crate::stats::FilterStats;

/// Content type accepted when no allow list is configured.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Validated rules, content type gate and counters of one filter instance.
///
/// Immutable once built apart from its atomic counters; share it between
/// requests through an `Arc`.
#[derive(Debug)]
pub struct FilterConfig {
    rules: Vec<Rule>,
    allow_content_types: HashSet<String>,
    allow_empty_content_type: bool,
    stats: FilterStats,
}

impl FilterConfig {
    pub fn builder() -> FilterConfigBuilder {
        FilterConfigBuilder::default()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn stats(&self) -> &FilterStats {
        &self.stats
    }

    /// Checks a request content type against the allow list.
    ///
    /// The comparison is an exact match on the whole header value, so
    /// parameters such as `; charset=utf-8` must be listed explicitly.
    /// An empty value is governed by `allow_empty_content_type`.
    pub fn content_type_allowed(&self, content_type: &str) -> bool {
        if content_type.is_empty() {
            return self.allow_empty_content_type;
        }
        self.allow_content_types.contains(content_type)
    }
}

/// Builder for [`FilterConfig`].
#[derive(Debug, Default)]
pub struct FilterConfigBuilder {
    rules: Vec<Rule>,
    allow_content_types: HashSet<String>,
    allow_empty_content_type: bool,
}

impl FilterConfigBuilder {
    /// Appends a rule. Rules are evaluated in the order they are added.
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(mut self, rules: impl IntoIterator<Item = Rule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Adds an accepted content type. Without any, only
    /// [`DEFAULT_CONTENT_TYPE`] is accepted.
    pub fn allow_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.allow_content_types.insert(content_type.into());
        self
    }

    /// Accepts requests that carry no content type header.
    pub fn allow_empty_content_type(mut self, allow: bool) -> Self {
        self.allow_empty_content_type = allow;
        self
    }

    pub fn build(self) -> FilterConfig {
        let allow_content_types = if self.allow_content_types.is_empty() {
            HashSet::from([DEFAULT_CONTENT_TYPE.to_owned()])
        } else {
            self.allow_content_types
        };
        FilterConfig {
            rules: self.rules,
            allow_content_types,
            allow_empty_content_type: self.allow_empty_content_type,
            stats: FilterStats::new(),
        }
    }
}
