//! Typed attribute maps evaluated by filter expressions.
//!
//! Candidates describe themselves to filters as an [`Attributes`] map. Keys
//! are case-insensitive; values are typed so that `(version>=1.2)` compares
//! versions and `(service.ranking>=10)` compares integers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::version::Version;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawValue", into = "RawValue")]
pub enum AttrValue {
    Str(String),
    Long(i64),
    /// Unsigned integers such as module and service ids, which may exceed
    /// `i64::MAX`.
    ULong(u64),
    Double(f64),
    Bool(bool),
    Version(Version),
    List(Vec<AttrValue>),
}

/// Wire form of [`AttrValue`].
///
/// Versions travel as plain strings; they are only typed when built in code,
/// so a string such as `"2"` is never silently reinterpreted as a version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawValue {
    Bool(bool),
    Long(i64),
    ULong(u64),
    Double(f64),
    Str(String),
    List(Vec<RawValue>),
}

impl From<RawValue> for AttrValue {
    fn from(raw: RawValue) -> Self {
        match raw {
            RawValue::Bool(b) => AttrValue::Bool(b),
            RawValue::Long(n) => AttrValue::Long(n),
            RawValue::ULong(n) => AttrValue::ULong(n),
            RawValue::Double(d) => AttrValue::Double(d),
            RawValue::Str(s) => AttrValue::Str(s),
            RawValue::List(items) => AttrValue::List(items.into_iter().map(Into::into).collect()),
        }
    }
}

impl From<AttrValue> for RawValue {
    fn from(value: AttrValue) -> Self {
        match value {
            AttrValue::Bool(b) => RawValue::Bool(b),
            AttrValue::Long(n) => RawValue::Long(n),
            AttrValue::ULong(n) => RawValue::ULong(n),
            AttrValue::Double(d) => RawValue::Double(d),
            AttrValue::Str(s) => RawValue::Str(s),
            AttrValue::Version(v) => RawValue::Str(v.to_string()),
            AttrValue::List(items) => RawValue::List(items.into_iter().map(Into::into).collect()),
        }
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s}"),
            Self::Long(n) => write!(f, "{n}"),
            Self::ULong(n) => write!(f, "{n}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Version(v) => write!(f, "{v}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(n: i64) -> Self {
        AttrValue::Long(n)
    }
}

impl From<i32> for AttrValue {
    fn from(n: i32) -> Self {
        AttrValue::Long(n.into())
    }
}

impl From<u64> for AttrValue {
    fn from(n: u64) -> Self {
        AttrValue::ULong(n)
    }
}

impl From<f64> for AttrValue {
    fn from(d: f64) -> Self {
        AttrValue::Double(d)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<Version> for AttrValue {
    fn from(v: Version) -> Self {
        AttrValue::Version(v)
    }
}

impl<T: Into<AttrValue>> From<Vec<T>> for AttrValue {
    fn from(items: Vec<T>) -> Self {
        AttrValue::List(items.into_iter().map(Into::into).collect())
    }
}

// ---------------------------------------------------------------------------
// Attribute map
// ---------------------------------------------------------------------------

/// Case-insensitive map of attribute name → value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, AttrValue>", into = "BTreeMap<String, AttrValue>")]
pub struct Attributes {
    /// Keys are stored lowercased.
    entries: BTreeMap<String, AttrValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace an attribute, returning the previous value.
    pub fn insert(&mut self, key: &str, value: impl Into<AttrValue>) -> Option<AttrValue> {
        self.entries.insert(normalize_key(key), value.into())
    }

    /// Look up an attribute by name, ignoring case.
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.entries.get(&normalize_key(key))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy every entry of `other` into `self`, overwriting duplicates.
    pub fn merge(&mut self, other: &Attributes) {
        for (k, v) in &other.entries {
            self.entries.insert(k.clone(), v.clone());
        }
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

impl From<BTreeMap<String, AttrValue>> for Attributes {
    fn from(map: BTreeMap<String, AttrValue>) -> Self {
        Self {
            entries: map
                .into_iter()
                .map(|(k, v)| (normalize_key(&k), v))
                .collect(),
        }
    }
}

impl From<Attributes> for BTreeMap<String, AttrValue> {
    fn from(attrs: Attributes) -> Self {
        attrs.entries
    }
}

impl<K: AsRef<str>, V: Into<AttrValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (k, v) in iter {
            attrs.insert(k.as_ref(), v);
        }
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_case_insensitive() {
        let attrs = Attributes::new().with("objectClass", "org.example.Log");
        assert!(attrs.contains_key("OBJECTCLASS"));
        assert_eq!(attrs.get("objectclass"), Some(&AttrValue::from("org.example.Log")));
        assert_eq!(attrs.iter().next().map(|(k, _)| k), Some("objectclass"));
    }

    #[test]
    fn merge_overwrites() {
        let mut a = Attributes::new().with("x", 1i64).with("y", "keep");
        let b = Attributes::new().with("X", 2i64);
        a.merge(&b);
        assert_eq!(a.get("x"), Some(&AttrValue::Long(2)));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn json_values_are_typed_without_versions() {
        let attrs: Attributes =
            serde_json::from_str(r#"{"Name": "2", "ranking": 10, "weight": 0.5, "on": true, "tags": ["a", "b"]}"#)
                .unwrap();
        assert_eq!(attrs.get("name"), Some(&AttrValue::Str("2".into())));
        assert_eq!(attrs.get("ranking"), Some(&AttrValue::Long(10)));
        assert_eq!(attrs.get("weight"), Some(&AttrValue::Double(0.5)));
        assert_eq!(attrs.get("on"), Some(&AttrValue::Bool(true)));
        assert_eq!(
            attrs.get("tags"),
            Some(&AttrValue::List(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn unsigned_ids_keep_their_full_range() {
        assert_eq!(AttrValue::from(u64::MAX), AttrValue::ULong(u64::MAX));
        let attrs: Attributes = serde_json::from_str(r#"{"id": 18446744073709551615}"#).unwrap();
        assert_eq!(attrs.get("id"), Some(&AttrValue::ULong(u64::MAX)));
        let json = serde_json::to_string(&Attributes::new().with("id", u64::MAX)).unwrap();
        assert_eq!(json, r#"{"id":18446744073709551615}"#);
    }

    #[test]
    fn versions_serialize_as_strings() {
        let attrs = Attributes::new().with("version", Version::new(1, 2, 0));
        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(json, r#"{"version":"1.2.0"}"#);
    }

    #[test]
    fn collect_from_pairs() {
        let attrs: Attributes = [("a", 1i64), ("B", 2i64)].into_iter().collect();
        assert_eq!(attrs.get("b"), Some(&AttrValue::Long(2)));
    }
}
