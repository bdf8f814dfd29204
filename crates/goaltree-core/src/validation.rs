//! Goal graph validation
//!
//! Scans the forest once and reports structural problems (orphans, cycles)
//! and data-quality gaps (missing progress, dates, sizes...). Issues are
//! ordinary output, never errors.

use crate::graph::GoalGraph;
use crate::types::{Category, GoalNode, NodeId};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

/// Names listed per issue group in a formatted report
pub const EXAMPLES_PER_GROUP: usize = 3;

/// How serious an issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Structure is broken
    Error,
    /// Recommended data is missing
    Warning,
    /// Worth a look
    Info,
}

/// Kinds of issue, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// Parent link names no goal
    Orphaned,
    /// Parent chain loops
    Circular,
    /// Urgent without a target date
    UrgentNoDate,
    /// Active leaf without progress
    MissingProgress,
    /// Active leaf without a target date
    MissingDate,
    /// Active goal without priority
    MissingPriority,
    /// Active leaf without size
    MissingSize,
    /// No workflow category
    MissingCategory,
    /// Still in the inbox
    InboxStale,
}

impl IssueKind {
    /// Report order
    pub const REPORT_ORDER: [IssueKind; 9] = [
        Self::Orphaned,
        Self::Circular,
        Self::UrgentNoDate,
        Self::MissingProgress,
        Self::MissingDate,
        Self::MissingPriority,
        Self::MissingSize,
        Self::MissingCategory,
        Self::InboxStale,
    ];

    /// Severity of this kind
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Orphaned | Self::Circular => Severity::Error,
            Self::UrgentNoDate
            | Self::MissingProgress
            | Self::MissingDate
            | Self::MissingPriority => Severity::Warning,
            Self::MissingSize | Self::MissingCategory | Self::InboxStale => Severity::Info,
        }
    }

    /// Short identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Orphaned => "orphaned",
            Self::Circular => "circular",
            Self::UrgentNoDate => "urgent-no-date",
            Self::MissingProgress => "missing-progress",
            Self::MissingDate => "missing-date",
            Self::MissingPriority => "missing-priority",
            Self::MissingSize => "missing-size",
            Self::MissingCategory => "missing-category",
            Self::InboxStale => "inbox-stale",
        }
    }

    /// Group heading in reports
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Orphaned => "Orphaned goals",
            Self::Circular => "Circular references",
            Self::UrgentNoDate => "Urgent without date",
            Self::MissingProgress => "Missing progress",
            Self::MissingDate => "Missing dates",
            Self::MissingPriority => "Missing priority",
            Self::MissingSize => "Missing size",
            Self::MissingCategory => "Missing category",
            Self::InboxStale => "Inbox items to triage",
        }
    }

    /// Whether the kind breaks the tree structure
    #[inline]
    #[must_use]
    pub const fn is_critical(self) -> bool {
        matches!(self, Self::Orphaned | Self::Circular)
    }
}

impl Display for IssueKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding about one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// What is wrong
    pub kind: IssueKind,
    /// Node identifier
    pub id: NodeId,
    /// Node display name
    pub name: String,
    /// Human-readable message
    pub message: String,
}

impl ValidationIssue {
    fn new(kind: IssueKind, node: &GoalNode, message: String) -> Self {
        Self {
            kind,
            id: node.id.clone(),
            name: node.name.clone(),
            message,
        }
    }

    /// Severity of the issue
    #[inline]
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

/// Issue counts per severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IssueSummary {
    /// Structural errors
    pub errors: usize,
    /// Warnings
    pub warnings: usize,
    /// Informational notes
    pub info: usize,
}

impl IssueSummary {
    /// Total number of issues
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.info
    }
}

impl Display for IssueSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error(s), {} warning(s), {} info",
            self.errors, self.warnings, self.info
        )
    }
}

/// Validate every node, in scan order
#[must_use]
pub fn validate_graph(graph: &GoalGraph) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for node in graph.nodes() {
        check_node(graph, node, &mut issues);
    }
    tracing::debug!("Validated {} goals: {} issue(s)", graph.len(), issues.len());
    issues
}

fn check_node(graph: &GoalGraph, node: &GoalNode, issues: &mut Vec<ValidationIssue>) {
    let name = &node.name;

    if node.parent.as_ref().is_some_and(|p| !graph.contains(p)) {
        issues.push(ValidationIssue::new(
            IssueKind::Orphaned,
            node,
            format!("\"{name}\" links to non-existent parent goal"),
        ));
    }

    if detect_cycle(graph, &node.id) {
        issues.push(ValidationIssue::new(
            IssueKind::Circular,
            node,
            format!("\"{name}\" is part of a circular reference"),
        ));
    }

    let active = node.is_active();
    if node.is_leaf() && active {
        if node.progress == 0.0 {
            issues.push(ValidationIssue::new(
                IssueKind::MissingProgress,
                node,
                format!("Leaf goal \"{name}\" has no progress set"),
            ));
        }
        if node.expected_acquire_date.is_none() {
            issues.push(ValidationIssue::new(
                IssueKind::MissingDate,
                node,
                format!("\"{name}\" has no expected acquire date"),
            ));
        }
        if node.size.is_none() {
            issues.push(ValidationIssue::new(
                IssueKind::MissingSize,
                node,
                format!("\"{name}\" has no size estimate"),
            ));
        }
    }

    if active && node.priority == 0.0 {
        issues.push(ValidationIssue::new(
            IssueKind::MissingPriority,
            node,
            format!("\"{name}\" has no priority set"),
        ));
    }

    match node.category {
        None => issues.push(ValidationIssue::new(
            IssueKind::MissingCategory,
            node,
            format!("\"{name}\" has no category"),
        )),
        Some(Category::Inbox) => issues.push(ValidationIssue::new(
            IssueKind::InboxStale,
            node,
            format!("\"{name}\" is still in the inbox"),
        )),
        Some(_) => {}
    }

    if node.urgent && node.expected_acquire_date.is_none() {
        issues.push(ValidationIssue::new(
            IssueKind::UrgentNoDate,
            node,
            format!("Urgent goal \"{name}\" has no expected acquire date"),
        ));
    }
}

/// Whether following parents from `start` revisits a node
///
/// Stops at the first parent that names no node.
#[must_use]
pub fn detect_cycle(graph: &GoalGraph, start: &NodeId) -> bool {
    let mut visited: HashSet<&NodeId> = HashSet::new();
    let mut current = start;

    loop {
        if !visited.insert(current) {
            return true;
        }
        match graph.get(current).and_then(|node| node.parent.as_ref()) {
            Some(parent) => current = parent,
            None => return false,
        }
    }
}

/// Issues breaking the tree structure (orphaned and circular)
#[must_use]
pub fn critical_issues(issues: &[ValidationIssue]) -> Vec<&ValidationIssue> {
    issues.iter().filter(|i| i.kind.is_critical()).collect()
}

/// Issues grouped by kind, in report order; empty groups are skipped
#[must_use]
pub fn group_issues_by_kind(issues: &[ValidationIssue]) -> Vec<(IssueKind, Vec<&ValidationIssue>)> {
    IssueKind::REPORT_ORDER
        .into_iter()
        .map(|kind| (kind, issues.iter().filter(|i| i.kind == kind).collect::<Vec<_>>()))
        .filter(|(_, group)| !group.is_empty())
        .collect()
}

/// Multi-line report for a user notice
///
/// Each group lists at most [`EXAMPLES_PER_GROUP`] names followed by a
/// `... and N more` line.
#[must_use]
pub fn format_issues(issues: &[ValidationIssue]) -> String {
    if issues.is_empty() {
        return "All goals validated successfully!".to_string();
    }

    let mut lines = vec![format!("Found {} issue(s):", issues.len())];
    for (kind, group) in group_issues_by_kind(issues) {
        lines.push(format!("\n{} ({}):", kind.label(), group.len()));
        for issue in group.iter().take(EXAMPLES_PER_GROUP) {
            lines.push(format!("  - {}", issue.name));
        }
        if group.len() > EXAMPLES_PER_GROUP {
            lines.push(format!(
                "  ... and {} more",
                group.len() - EXAMPLES_PER_GROUP
            ));
        }
    }
    lines.join("\n")
}

/// Count issues per severity
#[must_use]
pub fn summarize(issues: &[ValidationIssue]) -> IssueSummary {
    issues
        .iter()
        .fold(IssueSummary::default(), |mut summary, issue| {
            match issue.severity() {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.info += 1,
            }
            summary
        })
}
