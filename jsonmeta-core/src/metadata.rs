//! Dynamic metadata values, the host store boundary and the per-message builder.
//!
//! Rules never write to the store directly. Every write of one evaluation pass
//! goes through a [`MetadataBuilder`], which consults the store only for the
//! preserve-existing check. The pass ends with [`MetadataBuilder::finish`],
//! and the resulting [`StagedMetadata`] is committed in a single step.
//! `commit` consumes the staged map, so committing twice is not expressible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::DEFAULT_NAMESPACE;

/// A structured metadata value.
///
/// Values read from the body are always [`Bool`](Self::Bool),
/// [`Number`](Self::Number) or [`String`](Self::String). Literal values from
/// configuration may use any variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<MetadataValue>),
    Struct(Struct),
}

impl MetadataValue {
    /// Returns the string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric payload, if this is a number value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Number(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_owned())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

/// The fields stored under one metadata namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Struct {
    fields: BTreeMap<String, MetadataValue>,
}

impl Struct {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Inserts a field, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: MetadataValue) -> Option<MetadataValue> {
        self.fields.insert(key.into(), value)
    }

    /// Moves every field of `other` into `self`, overwriting duplicates.
    pub fn merge(&mut self, other: Struct) {
        self.fields.extend(other.fields);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetadataValue)> {
        self.fields.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, MetadataValue)> for Struct {
    fn from_iter<I: IntoIterator<Item = (K, MetadataValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Namespace to fields mapping staged during one evaluation pass.
pub type StructMap = BTreeMap<String, Struct>;

/// Host-side metadata store the filter reads from and commits into.
///
/// # For Implementors
///
/// `set_namespace` must *merge* the given fields into the namespace rather
/// than replace it, so that values written by earlier stages under other keys
/// survive. `clear_route_cache` is called at most once per message, after all
/// namespaces were written.
pub trait MetadataSink {
    /// Returns the metadata already stored under `namespace`.
    fn existing(&self, namespace: &str) -> Option<&Struct>;

    /// Merges `fields` into `namespace`.
    fn set_namespace(&mut self, namespace: &str, fields: Struct);

    /// Signals that routing decisions derived from metadata must be recomputed.
    fn clear_route_cache(&mut self);
}

/// In-memory [`MetadataSink`] carried alongside a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicMetadata {
    namespaces: StructMap,
    route_cache_clears: usize,
}

impl DynamicMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the fields of `namespace`.
    pub fn namespace(&self, namespace: &str) -> Option<&Struct> {
        self.namespaces.get(namespace)
    }

    /// Returns a single value.
    pub fn get(&self, namespace: &str, key: &str) -> Option<&MetadataValue> {
        self.namespaces.get(namespace).and_then(|s| s.get(key))
    }

    /// Stores a single value, as an earlier processing stage would.
    pub fn insert(&mut self, namespace: &str, key: &str, value: MetadataValue) {
        self.namespaces
            .entry(namespace.to_owned())
            .or_default()
            .insert(key, value);
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Number of route cache invalidations requested so far.
    pub fn route_cache_clears(&self) -> usize {
        self.route_cache_clears
    }

    pub fn namespaces(&self) -> &StructMap {
        &self.namespaces
    }
}

impl MetadataSink for DynamicMetadata {
    fn existing(&self, namespace: &str) -> Option<&Struct> {
        self.namespaces.get(namespace)
    }

    fn set_namespace(&mut self, namespace: &str, fields: Struct) {
        self.namespaces
            .entry(namespace.to_owned())
            .or_default()
            .merge(fields);
    }

    fn clear_route_cache(&mut self) {
        self.route_cache_clears += 1;
    }
}

/// Resolves an empty configured namespace to [`DEFAULT_NAMESPACE`].
pub fn decide_namespace(namespace: &str) -> &str {
    if namespace.is_empty() {
        DEFAULT_NAMESPACE
    } else {
        namespace
    }
}

/// Accumulates the writes of one evaluation pass.
///
/// Writes from different rules to the same `namespace.key` are
/// last-write-wins in the order they are applied.
#[derive(Debug)]
pub struct MetadataBuilder<'a, S: ?Sized> {
    existing: &'a S,
    staged: StructMap,
}

impl<'a, S> MetadataBuilder<'a, S>
where
    S: MetadataSink + ?Sized,
{
    /// Creates an empty builder checking preserve-existing writes against `existing`.
    pub fn new(existing: &'a S) -> Self {
        Self {
            existing,
            staged: StructMap::new(),
        }
    }

    /// Stages `value` under `namespace.key`.
    ///
    /// Returns `false` when `preserve_existing` is set and the store already
    /// holds `namespace.key`; the write is dropped in that case. Values staged
    /// earlier in this pass do not count as existing.
    pub fn apply(
        &mut self,
        namespace: &str,
        key: &str,
        value: MetadataValue,
        preserve_existing: bool,
    ) -> bool {
        if preserve_existing
            && self
                .existing
                .existing(namespace)
                .is_some_and(|fields| fields.contains_key(key))
        {
            trace!(
                "Found key {} in namespace {}. Preserve the existing metadata value.",
                key, namespace
            );
            return false;
        }

        trace!("add metadata ns:{} key:{}", namespace, key);
        self.staged
            .entry(namespace.to_owned())
            .or_default()
            .insert(key, value);
        true
    }

    /// Ends the pass, releasing the borrow of the store.
    pub fn finish(self) -> StagedMetadata {
        StagedMetadata {
            staged: self.staged,
        }
    }
}

/// The outcome of an evaluation pass, ready to be committed.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "staged metadata has no effect until committed"]
pub struct StagedMetadata {
    staged: StructMap,
}

impl StagedMetadata {
    /// Writes every staged namespace into `sink`.
    ///
    /// When anything was staged, the route cache is cleared exactly once
    /// afterwards. Returns whether anything was written.
    pub fn commit<S>(self, sink: &mut S) -> bool
    where
        S: MetadataSink + ?Sized,
    {
        if self.staged.is_empty() {
            return false;
        }
        for (namespace, fields) in self.staged {
            sink.set_namespace(&namespace, fields);
        }
        sink.clear_route_cache();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_later_write_wins_within_a_pass() {
        let mut store = DynamicMetadata::new();
        let mut builder = MetadataBuilder::new(&store);
        assert!(builder.apply("ns", "k", "first".into(), false));
        assert!(builder.apply("ns", "k", "second".into(), true));

        let staged = builder.finish();
        assert!(staged.commit(&mut store));
        assert_eq!(store.get("ns", "k"), Some(&MetadataValue::from("second")));
    }

    #[test]
    fn test_preserve_existing_only_checks_the_store() {
        let mut store = DynamicMetadata::new();
        store.insert("ns", "kept", "old".into());

        let mut builder = MetadataBuilder::new(&store);
        assert!(!builder.apply("ns", "kept", "new".into(), true));
        assert!(builder.apply("ns", "other", "new".into(), true));
        let staged = builder.finish();
        assert!(staged.commit(&mut store));

        assert_eq!(store.get("ns", "kept"), Some(&MetadataValue::from("old")));
        assert_eq!(store.get("ns", "other"), Some(&MetadataValue::from("new")));
    }

    #[test]
    fn test_overwrite_without_preserve() {
        let mut store = DynamicMetadata::new();
        store.insert("ns", "k", "old".into());

        let mut builder = MetadataBuilder::new(&store);
        assert!(builder.apply("ns", "k", 1.0.into(), false));
        let staged = builder.finish();
        let _ = staged.commit(&mut store);

        assert_eq!(store.get("ns", "k"), Some(&MetadataValue::Number(1.0)));
    }

    #[test]
    fn test_commit_merges_and_clears_route_cache_once() {
        let mut store = DynamicMetadata::new();
        store.insert("a", "existing", true.into());

        let mut builder = MetadataBuilder::new(&store);
        builder.apply("a", "x", 1.0.into(), false);
        builder.apply("b", "y", 2.0.into(), false);
        let staged = builder.finish();
        assert!(staged.commit(&mut store));

        assert_eq!(store.namespace("a").map(Struct::len), Some(2));
        assert_eq!(store.namespace("b").map(Struct::len), Some(1));
        assert_eq!(store.route_cache_clears(), 1);
    }

    #[test]
    fn test_empty_commit_is_silent() {
        let mut store = DynamicMetadata::new();
        let staged = MetadataBuilder::new(&store).finish();
        assert!(!staged.commit(&mut store));
        assert!(store.is_empty());
        assert_eq!(store.route_cache_clears(), 0);
    }

    #[test]
    fn test_decide_namespace() {
        assert_eq!(decide_namespace(""), DEFAULT_NAMESPACE);
        assert_eq!(decide_namespace("custom"), "custom");
    }

    #[test]
    fn test_value_serializes_as_plain_json() {
        let value: Struct = [
            ("flag", MetadataValue::Bool(true)),
            ("n", MetadataValue::Number(1.5)),
            ("s", MetadataValue::from("x")),
            ("none", MetadataValue::Null),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"flag": true, "n": 1.5, "s": "x", "none": null})
        );
    }

    #[test]
    fn test_value_deserializes_from_plain_json() {
        let value: MetadataValue =
            serde_json::from_value(serde_json::json!({"k": [1, "a", false]})).unwrap();
        let expected = MetadataValue::Struct(
            [(
                "k",
                MetadataValue::List(vec![
                    MetadataValue::Number(1.0),
                    MetadataValue::from("a"),
                    MetadataValue::Bool(false),
                ]),
            )]
            .into_iter()
            .collect(),
        );
        assert_eq!(value, expected);
    }
}
