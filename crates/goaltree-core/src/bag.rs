//! Property bags
//!
//! A [`PropertyBag`] is the ordered key/value frontmatter of one document.
//! Every key survives a round trip, recognized or not. Engine output is kept
//! apart from it as typed [`DerivedField`] / [`DerivedValue`] pairs until it
//! is merged back.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::fmt::{self, Display, Formatter};

/// Ordered frontmatter of one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag(IndexMap<String, Value>);

impl PropertyBag {
    /// Empty bag
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a YAML mapping
    ///
    /// Non-string keys (`2025: ...`, `true: ...`) are kept under their YAML
    /// spelling so nothing is dropped.
    #[must_use]
    pub fn from_mapping(mapping: Mapping) -> Self {
        let entries = mapping
            .into_iter()
            .map(|(key, value)| (key_to_string(&key), value))
            .collect();
        Self(entries)
    }

    /// Build from any YAML value; anything but a mapping yields an empty bag
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Mapping(mapping) => Self::from_mapping(mapping),
            _ => Self::new(),
        }
    }

    /// Convert into a YAML mapping, keeping key order
    #[must_use]
    pub fn to_mapping(&self) -> Mapping {
        self.0
            .iter()
            .map(|(k, v)| (Value::String(k.clone()), v.clone()))
            .collect()
    }

    /// Value for key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether key is present
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert or overwrite a value; new keys go last
    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Remove a key, keeping the order of the others
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Entries in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the bag has no keys
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take every entry out, leaving the bag empty
    pub(crate) fn drain(&mut self) -> Vec<(String, Value)> {
        self.0.drain(..).collect()
    }
}

impl FromIterator<(String, Value)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// Derived fields written by the engine, in canonical display order
///
/// Variants name their field in camel case: `RootGoal` is `rootGoal`.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DerivedField {
    RootGoal,
    RootGoalPriority,
    ChainPriority,
    Depth,
    NodeType,
    IsLeaf,
    Status,
    DaysRemaining,
    IsOverdue,
    CompletedDate,
    HasBlockedChildren,
    HasUrgentChildren,
    ChildCount,
    Children,
    TotalDescendants,
    LeafCount,
    TotalTimeEstimate,
    CalculatedProgress,
    CalculatedExpectedAcquireDate,
    GoalYear,
    GoalQuarter,
}

impl DerivedField {
    /// Canonical order of derived keys in a document
    pub const CANONICAL_ORDER: [DerivedField; 21] = [
        Self::RootGoal,
        Self::RootGoalPriority,
        Self::ChainPriority,
        Self::Depth,
        Self::NodeType,
        Self::IsLeaf,
        Self::Status,
        Self::DaysRemaining,
        Self::IsOverdue,
        Self::CompletedDate,
        Self::HasBlockedChildren,
        Self::HasUrgentChildren,
        Self::ChildCount,
        Self::Children,
        Self::TotalDescendants,
        Self::LeafCount,
        Self::TotalTimeEstimate,
        Self::CalculatedProgress,
        Self::CalculatedExpectedAcquireDate,
        Self::GoalYear,
        Self::GoalQuarter,
    ];

    /// Fields that only make sense on nodes with children
    pub const INTERNAL_ONLY: [DerivedField; 9] = [
        Self::HasBlockedChildren,
        Self::HasUrgentChildren,
        Self::ChildCount,
        Self::Children,
        Self::TotalDescendants,
        Self::LeafCount,
        Self::TotalTimeEstimate,
        Self::CalculatedProgress,
        Self::CalculatedExpectedAcquireDate,
    ];

    /// Field name without prefix
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::RootGoal => "rootGoal",
            Self::RootGoalPriority => "rootGoalPriority",
            Self::ChainPriority => "chainPriority",
            Self::Depth => "depth",
            Self::NodeType => "nodeType",
            Self::IsLeaf => "isLeaf",
            Self::Status => "status",
            Self::DaysRemaining => "daysRemaining",
            Self::IsOverdue => "isOverdue",
            Self::CompletedDate => "completedDate",
            Self::HasBlockedChildren => "hasBlockedChildren",
            Self::HasUrgentChildren => "hasUrgentChildren",
            Self::ChildCount => "childCount",
            Self::Children => "children",
            Self::TotalDescendants => "totalDescendants",
            Self::LeafCount => "leafCount",
            Self::TotalTimeEstimate => "totalTimeEstimate",
            Self::CalculatedProgress => "calculatedProgress",
            Self::CalculatedExpectedAcquireDate => "calculatedExpectedAcquireDate",
            Self::GoalYear => "goalYear",
            Self::GoalQuarter => "goalQuarter",
        }
    }

    /// Full key with the given prefix
    #[inline]
    #[must_use]
    pub fn key(self, prefix: &str) -> String {
        format!("{prefix}{}", self.name())
    }
}

impl Display for DerivedField {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed value of a derived field
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedValue {
    /// Whole number
    Integer(i64),
    /// Possibly fractional number
    Number(f64),
    /// Text (status labels, `[[links]]`)
    Text(String),
    /// Flag
    Bool(bool),
    /// List of `[[links]]`
    Links(Vec<String>),
    /// Explicit null
    Null,
}

impl DerivedValue {
    /// Number, written as an integer when it has no fraction
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn number(value: f64) -> Self {
        if value.fract() == 0.0 && value.abs() < 9.0e15 {
            Self::Integer(value as i64)
        } else {
            Self::Number(value)
        }
    }

    /// YAML representation
    #[must_use]
    pub fn to_yaml(&self) -> Value {
        match self {
            Self::Integer(i) => Value::Number((*i).into()),
            Self::Number(n) => Value::Number((*n).into()),
            Self::Text(s) => Value::String(s.clone()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Links(links) => {
                Value::Sequence(links.iter().cloned().map(Value::String).collect())
            }
            Self::Null => Value::Null,
        }
    }
}

impl From<Option<i64>> for DerivedValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Self::Null, Self::Integer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bag_keeps_insertion_order() {
        let mut bag = PropertyBag::new();
        bag.insert("b", Value::from(1));
        bag.insert("a", Value::from(2));
        bag.insert("c", Value::from(3));
        bag.remove("a");

        assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["b", "c"]);
    }

    #[test]
    fn bag_from_mapping_stringifies_keys() {
        let mapping: Mapping = serde_yaml::from_str("2025: year\ntitle: x\ntrue: yes\n").unwrap();
        let bag = PropertyBag::from_mapping(mapping);

        assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["2025", "title", "true"]);
        assert_eq!(bag.get("title"), Some(&Value::String("x".to_string())));
    }

    #[test]
    fn bag_from_non_mapping_is_empty() {
        assert!(PropertyBag::from_value(Value::String("text".into())).is_empty());
    }

    #[test]
    fn canonical_order_is_sorted() {
        let mut sorted = DerivedField::CANONICAL_ORDER;
        sorted.sort();
        assert_eq!(sorted, DerivedField::CANONICAL_ORDER);
        assert_eq!(DerivedField::Depth.key("_"), "_depth");
    }

    #[test]
    fn number_prefers_integer() {
        assert_eq!(DerivedValue::number(3.0), DerivedValue::Integer(3));
        assert_eq!(DerivedValue::number(2.5), DerivedValue::Number(2.5));
        assert_eq!(DerivedValue::number(4.0).to_yaml(), Value::from(4));
    }
}
