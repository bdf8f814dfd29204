//! Core types for the goal graph
//!
//! Defines the node identifier, the per-pass [`GoalNode`] value object and
//! the closed vocabularies read from frontmatter:
//! - node types (strategic goal down to sub-task)
//! - workflow categories
//! - task sizes and their hour estimates
//! - energy types

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Stable identifier of a goal document (its vault-relative path)
///
/// # Examples
/// - `Goals/Launch.md`
/// - `Goals/2025/Write book.md`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create identifier from a path-like string
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Identifier as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File stem of the identifier (`Goals/Launch.md` → `Launch`)
    #[must_use]
    pub fn basename(&self) -> &str {
        let file = self.0.rsplit('/').next().unwrap_or(&self.0);
        file.strip_suffix(".md").unwrap_or(file)
    }

    /// Folder part of the identifier, empty for top-level documents
    #[must_use]
    pub fn folder(&self) -> &str {
        self.0.rfind('/').map_or("", |idx| &self.0[..idx])
    }

    /// Extension of the identifier without the dot
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let file = self.0.rsplit('/').next().unwrap_or(&self.0);
        file.rfind('.').map(|idx| &file[idx + 1..])
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Position of a node in the planning hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeType {
    /// Top-level goal
    StrategicGoal,
    /// Goal nested under a strategic goal
    SubGoal,
    /// Concrete deliverable
    Project,
    /// Phase of a project
    Stage,
    /// Unit of work
    Task,
    /// Smallest unit of work
    SubTask,
}

impl NodeType {
    /// All node types in hierarchy order
    pub const ALL: [NodeType; 6] = [
        Self::StrategicGoal,
        Self::SubGoal,
        Self::Project,
        Self::Stage,
        Self::Task,
        Self::SubTask,
    ];

    /// Frontmatter spelling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StrategicGoal => "strategic-goal",
            Self::SubGoal => "sub-goal",
            Self::Project => "project",
            Self::Stage => "stage",
            Self::Task => "task",
            Self::SubTask => "sub-task",
        }
    }

    /// Parse the exact frontmatter spelling
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == value)
    }
}

impl Display for NodeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workflow category a goal is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Captured, not yet triaged
    Inbox,
    /// Being worked on
    Active,
    /// Parked for later
    Incubator,
    /// Shelved
    Archive,
    /// Done and kept for reference
    History,
}

impl Category {
    /// All categories
    pub const ALL: [Category; 5] = [
        Self::Inbox,
        Self::Active,
        Self::Incubator,
        Self::Archive,
        Self::History,
    ];

    /// Frontmatter spelling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Active => "active",
            Self::Incubator => "incubator",
            Self::Archive => "archive",
            Self::History => "history",
        }
    }

    /// Parse the exact frontmatter spelling
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

/// T-shirt size of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskSize {
    /// Half an hour
    S,
    /// Two hours
    M,
    /// Four hours
    L,
}

impl TaskSize {
    /// Estimated effort in hours
    #[must_use]
    pub const fn hours(self) -> f64 {
        match self {
            Self::S => 0.5,
            Self::M => 2.0,
            Self::L => 4.0,
        }
    }

    /// Parse a size, ignoring case
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "S" => Some(Self::S),
            "M" => Some(Self::M),
            "L" => Some(Self::L),
            _ => None,
        }
    }
}

/// Kind of attention a task needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyType {
    /// Deep, creative work
    Creative,
    /// Routine, administrative work
    Administrative,
}

impl EnergyType {
    /// Parse the exact frontmatter spelling
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "creative" => Some(Self::Creative),
            "administrative" => Some(Self::Administrative),
            _ => None,
        }
    }
}

/// One goal/task document as seen by a single processing pass
#[derive(Debug, Clone, PartialEq)]
pub struct GoalNode {
    /// Document identifier
    pub id: NodeId,
    /// Display name (file stem)
    pub name: String,
    /// User progress in `[0, 100]`; authoritative on leaves only
    pub progress: f64,
    /// Priority, `0` when unset; lower numbers are more important
    pub priority: f64,
    /// Target date as written (possibly wrapped in link syntax)
    pub expected_acquire_date: Option<String>,
    /// Blocked flag
    pub blocked: bool,
    /// Urgent flag
    pub urgent: bool,
    /// Task size
    pub size: Option<TaskSize>,
    /// Energy type
    pub energy_type: Option<EnergyType>,
    /// Assignee
    pub assignee: Option<String>,
    /// Explicit node type, inferred from depth when absent
    pub node_type: Option<NodeType>,
    /// Workflow category
    pub category: Option<Category>,
    /// Parent identifier; may name a node that does not exist (orphan)
    pub parent: Option<NodeId>,
    /// Children in document scan order
    pub children: Vec<NodeId>,
}

impl GoalNode {
    /// Bare node with every field at its default
    #[must_use]
    pub fn new(id: NodeId) -> Self {
        let name = id.basename().to_string();
        Self {
            id,
            name,
            progress: 0.0,
            priority: 0.0,
            expected_acquire_date: None,
            blocked: false,
            urgent: false,
            size: None,
            energy_type: None,
            assignee: None,
            node_type: None,
            category: None,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Node without children
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Node filed under the active category
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.category == Some(Category::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_parts() {
        let id = NodeId::new("Goals/2025/Write book.md");
        assert_eq!(id.basename(), "Write book");
        assert_eq!(id.folder(), "Goals/2025");
        assert_eq!(id.extension(), Some("md"));

        let top = NodeId::new("Inbox.md");
        assert_eq!(top.folder(), "");
        assert_eq!(top.basename(), "Inbox");
    }

    #[test]
    fn size_parse_ignores_case() {
        assert_eq!(TaskSize::parse("m"), Some(TaskSize::M));
        assert_eq!(TaskSize::parse("L"), Some(TaskSize::L));
        assert_eq!(TaskSize::parse("XL"), None);
        assert!((TaskSize::S.hours() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn enum_parse_is_exact() {
        assert_eq!(NodeType::parse("sub-goal"), Some(NodeType::SubGoal));
        assert_eq!(NodeType::parse("Sub-Goal"), None);
        assert_eq!(Category::parse("active"), Some(Category::Active));
        assert_eq!(Category::parse("ACTIVE"), None);
        assert_eq!(EnergyType::parse("creative"), Some(EnergyType::Creative));
    }

    #[test]
    fn new_node_defaults() {
        let node = GoalNode::new(NodeId::new("Goals/Launch.md"));
        assert_eq!(node.name, "Launch");
        assert!(node.is_leaf());
        assert!(!node.is_active());
        assert!(node.parent.is_none());
    }
}
