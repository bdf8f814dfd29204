//! Property extraction
//!
//! Reads the typed goal fields off a raw [`PropertyBag`]. Every reader is
//! total: absent or uncoercible values fall back to the field's default
//! (`0`, `false`, `None`) and are never reported.

use crate::bag::PropertyBag;
use crate::config::GoalSettings;
use crate::link::extract_link_target;
use crate::types::{Category, EnergyType, GoalNode, NodeId, NodeType, TaskSize};
use serde_yaml::Value;

/// Coerce a raw value to a number
///
/// Numbers pass through, numeric strings are parsed, booleans count as
/// `1`/`0`. Everything else, and any non-finite result, is `0`.
#[must_use]
pub fn coerce_number(value: Option<&Value>) -> f64 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(0.0)
            }
        }
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        Some(Value::Tagged(tagged)) => coerce_number(Some(&tagged.value)),
        _ => 0.0,
    };
    if number.is_finite() {
        number
    } else {
        0.0
    }
}

/// Coerce a raw value to a flag; only `true` (or the text `"true"`) counts
#[must_use]
pub fn coerce_flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn coerce_text(value: Option<&Value>) -> Option<&str> {
    match value {
        Some(Value::String(s)) => Some(s.as_str()),
        _ => None,
    }
}

/// Reads goal fields using the configured key names
#[derive(Debug, Clone, Copy)]
pub struct PropertyExtractor<'a> {
    settings: &'a GoalSettings,
}

impl<'a> PropertyExtractor<'a> {
    /// Create extractor over settings
    #[inline]
    #[must_use]
    pub fn new(settings: &'a GoalSettings) -> Self {
        Self { settings }
    }

    /// Progress, clamped to `[0, 100]`
    #[must_use]
    pub fn progress(&self, bag: &PropertyBag) -> f64 {
        coerce_number(bag.get(&self.settings.progress_property)).clamp(0.0, 100.0)
    }

    /// Priority, `0` when unset
    #[must_use]
    pub fn priority(&self, bag: &PropertyBag) -> f64 {
        coerce_number(bag.get(&self.settings.priority_property))
    }

    /// Target date: the link target if the value is link-like, else the text
    #[must_use]
    pub fn expected_acquire_date(&self, bag: &PropertyBag) -> Option<String> {
        let value = bag.get(&self.settings.expected_acquire_date_property)?;
        extract_link_target(value).or_else(|| coerce_text(Some(value)).map(str::to_string))
    }

    /// Blocked flag
    #[must_use]
    pub fn blocked(&self, bag: &PropertyBag) -> bool {
        coerce_flag(bag.get(&self.settings.blocked_property))
    }

    /// Urgent flag
    #[must_use]
    pub fn urgent(&self, bag: &PropertyBag) -> bool {
        coerce_flag(bag.get(&self.settings.urgent_property))
    }

    /// Explicit node type
    #[must_use]
    pub fn node_type(&self, bag: &PropertyBag) -> Option<NodeType> {
        coerce_text(bag.get(&self.settings.node_type_property)).and_then(NodeType::parse)
    }

    /// Workflow category
    #[must_use]
    pub fn category(&self, bag: &PropertyBag) -> Option<Category> {
        coerce_text(bag.get(&self.settings.category_property)).and_then(Category::parse)
    }

    /// Task size, case-insensitive
    #[must_use]
    pub fn size(&self, bag: &PropertyBag) -> Option<TaskSize> {
        coerce_text(bag.get(&self.settings.size_property)).and_then(TaskSize::parse)
    }

    /// Energy type
    #[must_use]
    pub fn energy_type(&self, bag: &PropertyBag) -> Option<EnergyType> {
        coerce_text(bag.get(&self.settings.energy_type_property)).and_then(EnergyType::parse)
    }

    /// Assignee
    #[must_use]
    pub fn assignee(&self, bag: &PropertyBag) -> Option<String> {
        coerce_text(bag.get(&self.settings.assignee_property)).map(str::to_string)
    }

    /// Raw parent link target, before namespace resolution
    #[must_use]
    pub fn parent_target(&self, bag: &PropertyBag) -> Option<String> {
        bag.get(&self.settings.goal_property)
            .and_then(extract_link_target)
    }

    /// Bare node with every user field read; parent and children left empty
    #[must_use]
    pub fn extract(&self, id: NodeId, name: impl Into<String>, bag: &PropertyBag) -> GoalNode {
        let mut node = GoalNode::new(id);
        node.name = name.into();
        node.progress = self.progress(bag);
        node.priority = self.priority(bag);
        node.expected_acquire_date = self.expected_acquire_date(bag);
        node.blocked = self.blocked(bag);
        node.urgent = self.urgent(bag);
        node.size = self.size(bag);
        node.energy_type = self.energy_type(bag);
        node.assignee = self.assignee(bag);
        node.node_type = self.node_type(bag);
        node.category = self.category(bag);
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(text: &str) -> PropertyBag {
        PropertyBag::from_value(serde_yaml::from_str(text).unwrap())
    }

    #[test]
    fn numbers_coerce_like_frontmatter() {
        assert_eq!(coerce_number(Some(&Value::from(40))), 40.0);
        assert_eq!(coerce_number(Some(&Value::from(" 12.5 "))), 12.5);
        assert_eq!(coerce_number(Some(&Value::from(""))), 0.0);
        assert_eq!(coerce_number(Some(&Value::from("lots"))), 0.0);
        assert_eq!(coerce_number(Some(&Value::from(true))), 1.0);
        assert_eq!(coerce_number(Some(&Value::Null)), 0.0);
        assert_eq!(coerce_number(None), 0.0);
        assert_eq!(coerce_number(Some(&Value::from("NaN"))), 0.0);
    }

    #[test]
    fn flags_accept_only_true() {
        assert!(coerce_flag(Some(&Value::from(true))));
        assert!(coerce_flag(Some(&Value::from("TRUE"))));
        assert!(!coerce_flag(Some(&Value::from(1))));
        assert!(!coerce_flag(Some(&Value::from("yes"))));
        assert!(!coerce_flag(None));
    }

    #[test]
    fn extracts_full_node() {
        let settings = GoalSettings::default();
        let extractor = PropertyExtractor::new(&settings);
        let raw = bag(r#"
goal: "[[Launch]]"
progress: 150
priority: "2"
expectedAcquireDate: "[[2025-03-15]]"
blocked: true
urgent: false
size: m
energyType: creative
assignee: sam
nodeType: project
category: active
"#);

        let node = extractor.extract(NodeId::new("Goals/Site.md"), "Site", &raw);
        assert_eq!(node.progress, 100.0);
        assert_eq!(node.priority, 2.0);
        assert_eq!(node.expected_acquire_date.as_deref(), Some("2025-03-15"));
        assert!(node.blocked);
        assert!(!node.urgent);
        assert_eq!(node.size, Some(TaskSize::M));
        assert_eq!(node.energy_type, Some(EnergyType::Creative));
        assert_eq!(node.assignee.as_deref(), Some("sam"));
        assert_eq!(node.node_type, Some(NodeType::Project));
        assert_eq!(node.category, Some(Category::Active));
        assert_eq!(extractor.parent_target(&raw).as_deref(), Some("Launch"));
        assert!(node.parent.is_none());
    }

    #[test]
    fn invalid_enums_default_to_none() {
        let settings = GoalSettings::default();
        let extractor = PropertyExtractor::new(&settings);
        let raw = bag("size: XL\ncategory: Active\nnodeType: epic\nenergyType: 3\n");

        assert_eq!(extractor.size(&raw), None);
        assert_eq!(extractor.category(&raw), None);
        assert_eq!(extractor.node_type(&raw), None);
        assert_eq!(extractor.energy_type(&raw), None);
    }

    #[test]
    fn plain_date_text_is_kept() {
        let settings = GoalSettings::default();
        let extractor = PropertyExtractor::new(&settings);

        let raw = bag("expectedAcquireDate: 2025-03-15\n");
        assert_eq!(
            extractor.expected_acquire_date(&raw).as_deref(),
            Some("2025-03-15")
        );
        assert_eq!(extractor.expected_acquire_date(&bag("expectedAcquireDate:\n")), None);
    }

    #[test]
    fn custom_key_names() {
        let mut settings = GoalSettings::default();
        settings.progress_property = "done".to_string();
        let extractor = PropertyExtractor::new(&settings);

        assert_eq!(extractor.progress(&bag("done: 30\nprogress: 90\n")), 30.0);
    }
}
