//! Link resolution
//!
//! Turns a loosely typed frontmatter reference into a target string and
//! resolves that target against the document namespace. Neither step ever
//! fails: an unusable value is simply `None`, and the graph builder decides
//! what an unresolved target means.

use crate::types::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::Value;
use std::collections::HashMap;

static WIKI_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\[([^\]|]+)(?:\|[^\]]+)?\]\]").expect("wiki link pattern is valid")
});

/// Extract the link target from a raw property value
///
/// - `"[[Launch]]"` / `"[[Launch|the launch]]"` → `Launch`
/// - `"Launch"` → `Launch`
/// - `{path: Goals/Launch.md}` → `Goals/Launch.md`
/// - unquoted `[[Launch]]`, which YAML reads as a nested list → `Launch`
#[must_use]
pub fn extract_link_target(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => extract_from_text(text),
        Value::Mapping(map) => match map.get("path") {
            Some(Value::String(path)) if !path.is_empty() => Some(path.clone()),
            _ => None,
        },
        Value::Sequence(outer) => match outer.as_slice() {
            [Value::Sequence(inner)] => match inner.as_slice() {
                [Value::String(target)] if !target.is_empty() => Some(target.clone()),
                _ => None,
            },
            _ => None,
        },
        Value::Tagged(tagged) => extract_link_target(&tagged.value),
        _ => None,
    }
}

fn extract_from_text(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    if let Some(caps) = WIKI_LINK.captures(text) {
        return Some(caps[1].to_string());
    }
    Some(text.to_string())
}

/// Lookup of link targets in the document namespace
pub trait LinkNamespace {
    /// Resolve `target` as written in the document `source`
    fn resolve(&self, target: &str, source: &NodeId) -> Option<NodeId>;
}

/// Namespace over a fixed list of document identifiers
///
/// Resolution order: exact identifier, identifier plus `.md`, then file
/// stem. Several documents sharing a stem resolve to the one in the source's
/// folder, else to the first in scan order. `#heading` and `^block`
/// suffixes are ignored.
#[derive(Debug, Clone, Default)]
pub struct PathNamespace {
    ids: Vec<NodeId>,
    by_path: HashMap<String, usize>,
    by_stem: HashMap<String, Vec<usize>>,
}

impl PathNamespace {
    /// Build namespace from identifiers in scan order
    #[must_use]
    pub fn new<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        let mut namespace = Self::default();
        for id in ids {
            let idx = namespace.ids.len();
            namespace.by_path.insert(id.as_str().to_string(), idx);
            namespace
                .by_stem
                .entry(id.basename().to_string())
                .or_default()
                .push(idx);
            namespace.ids.push(id);
        }
        namespace
    }

    /// Number of documents in the namespace
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the namespace is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl LinkNamespace for PathNamespace {
    fn resolve(&self, target: &str, source: &NodeId) -> Option<NodeId> {
        let target = strip_subpath(target).trim();
        if target.is_empty() {
            return None;
        }

        if let Some(&idx) = self.by_path.get(target) {
            return Some(self.ids[idx].clone());
        }
        if let Some(&idx) = self.by_path.get(&format!("{target}.md")) {
            return Some(self.ids[idx].clone());
        }

        let stem = target.strip_suffix(".md").unwrap_or(target);
        let candidates = self.by_stem.get(stem)?;
        let preferred = candidates
            .iter()
            .find(|&&idx| self.ids[idx].folder() == source.folder())
            .or_else(|| candidates.first())?;
        Some(self.ids[*preferred].clone())
    }
}

fn strip_subpath(target: &str) -> &str {
    let end = target.find(['#', '^']).unwrap_or(target.len());
    &target[..end]
}
