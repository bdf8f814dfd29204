//! Calculation engine
//!
//! Pure traversals over a [`GoalGraph`]. Every recursive function carries a
//! visited set and answers a revisit with its neutral value (`0`, `None`,
//! `false`), so each call is O(N) and cycles terminate. Identifiers that do
//! not name a node contribute nothing.
//!
//! Date-dependent functions take `today` explicitly.

use crate::config::ProgressMethod;
use crate::graph::GoalGraph;
use crate::types::{GoalNode, NodeId, NodeType};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

/// Identifiers already seen by one traversal
pub type Visited = HashSet<NodeId>;

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4}-\d{2}-\d{2})").expect("date pattern is valid"));
static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{4})").expect("year pattern is valid"));
static YEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-(\d{2})").expect("month pattern is valid"));

/// Progress status of a goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GoalStatus {
    /// Nothing done yet
    NotStarted,
    /// Some progress
    InProgress,
    /// Target date passed before completion
    Overdue,
    /// Progress reached 100
    Completed,
}

impl GoalStatus {
    /// Frontmatter spelling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::InProgress => "in-progress",
            Self::Overdue => "overdue",
            Self::Completed => "completed",
        }
    }
}

impl Display for GoalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn first_visit(visited: &mut Visited, id: &NodeId) -> bool {
    visited.insert(id.clone())
}

// ----------------------------------------------------------------------------
// Rollups over children
// ----------------------------------------------------------------------------

/// Progress of a node: own progress on leaves, child rollup otherwise
///
/// Weighted rollup gives each child `max_priority - priority + 1`, so the
/// child with priority 1 weighs most. Unset priority (0) counts as 1.
#[must_use]
pub fn accumulated_progress(graph: &GoalGraph, id: &NodeId, method: ProgressMethod) -> f64 {
    accumulated_progress_in(graph, id, method, &mut Visited::new())
}

/// [`accumulated_progress`] with a caller-supplied visited set
pub fn accumulated_progress_in(
    graph: &GoalGraph,
    id: &NodeId,
    method: ProgressMethod,
    visited: &mut Visited,
) -> f64 {
    if !first_visit(visited, id) {
        return 0.0;
    }
    let Some(node) = graph.get(id) else {
        return 0.0;
    };
    if node.is_leaf() {
        return node.progress;
    }

    let mut children: Vec<(f64, f64)> = Vec::with_capacity(node.children.len());
    for child_id in &node.children {
        let Some(child) = graph.get(child_id) else {
            continue;
        };
        let progress = accumulated_progress_in(graph, child_id, method, visited);
        let priority = if child.priority == 0.0 { 1.0 } else { child.priority };
        children.push((progress, priority));
    }

    if children.is_empty() {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let count = children.len() as f64;
    match method {
        ProgressMethod::Simple => children.iter().map(|(p, _)| p).sum::<f64>() / count,
        ProgressMethod::Weighted => {
            let max_priority = children
                .iter()
                .map(|(_, priority)| *priority)
                .fold(f64::MIN, f64::max);
            let (weighted_sum, total_weight) =
                children
                    .iter()
                    .fold((0.0, 0.0), |(sum, total), (progress, priority)| {
                        let weight = max_priority - priority + 1.0;
                        (sum + progress * weight, total + weight)
                    });
            if total_weight > 0.0 {
                weighted_sum / total_weight
            } else {
                0.0
            }
        }
    }
}

/// Latest target date below a node (own date on leaves)
///
/// Dates compare by the calendar date they embed, so `[[2025-03-15]]` and
/// `2025-03-15` are equal; `None` dates are skipped.
#[must_use]
pub fn latest_date(graph: &GoalGraph, id: &NodeId) -> Option<String> {
    latest_date_in(graph, id, &mut Visited::new())
}

fn latest_date_in(graph: &GoalGraph, id: &NodeId, visited: &mut Visited) -> Option<String> {
    if !first_visit(visited, id) {
        return None;
    }
    let node = graph.get(id)?;
    if node.is_leaf() {
        return node.expected_acquire_date.clone();
    }

    let mut latest: Option<String> = None;
    for child_id in &node.children {
        if let Some(date) = latest_date_in(graph, child_id, visited) {
            if latest
                .as_ref()
                .map_or(true, |current| date_order_key(&date) > date_order_key(current))
            {
                latest = Some(date);
            }
        }
    }
    latest
}

fn date_order_key(date: &str) -> (Option<NaiveDate>, &str) {
    (parse_date(date), date)
}

/// Number of nodes below a node
#[must_use]
pub fn total_descendants(graph: &GoalGraph, id: &NodeId) -> usize {
    total_descendants_in(graph, id, &mut Visited::new())
}

fn total_descendants_in(graph: &GoalGraph, id: &NodeId, visited: &mut Visited) -> usize {
    if !first_visit(visited, id) {
        return 0;
    }
    let Some(node) = graph.get(id) else {
        return 0;
    };
    let mut count = node.children.len();
    for child_id in &node.children {
        count += total_descendants_in(graph, child_id, visited);
    }
    count
}

/// Number of leaves below a node; a leaf counts itself
#[must_use]
pub fn leaf_count(graph: &GoalGraph, id: &NodeId) -> usize {
    leaf_count_in(graph, id, &mut Visited::new())
}

fn leaf_count_in(graph: &GoalGraph, id: &NodeId, visited: &mut Visited) -> usize {
    if !first_visit(visited, id) {
        return 0;
    }
    let Some(node) = graph.get(id) else {
        return 0;
    };
    if node.is_leaf() {
        return 1;
    }
    node.children
        .iter()
        .map(|child_id| leaf_count_in(graph, child_id, visited))
        .sum()
}

/// Whether any descendant is blocked
#[must_use]
pub fn has_blocked_descendants(graph: &GoalGraph, id: &NodeId) -> bool {
    any_descendant_in(graph, id, |n| n.blocked, &mut Visited::new())
}

/// Whether any descendant is urgent
#[must_use]
pub fn has_urgent_descendants(graph: &GoalGraph, id: &NodeId) -> bool {
    any_descendant_in(graph, id, |n| n.urgent, &mut Visited::new())
}

fn any_descendant_in<F>(graph: &GoalGraph, id: &NodeId, flag: F, visited: &mut Visited) -> bool
where
    F: Fn(&GoalNode) -> bool + Copy,
{
    if !first_visit(visited, id) {
        return false;
    }
    let Some(node) = graph.get(id) else {
        return false;
    };
    for child_id in &node.children {
        if graph.get(child_id).is_some_and(flag) {
            return true;
        }
        if any_descendant_in(graph, child_id, flag, visited) {
            return true;
        }
    }
    false
}

/// Estimated hours: own size on leaves, sum of children otherwise
#[must_use]
pub fn total_time_estimate(graph: &GoalGraph, id: &NodeId) -> f64 {
    total_time_estimate_in(graph, id, &mut Visited::new())
}

fn total_time_estimate_in(graph: &GoalGraph, id: &NodeId, visited: &mut Visited) -> f64 {
    if !first_visit(visited, id) {
        return 0.0;
    }
    let Some(node) = graph.get(id) else {
        return 0.0;
    };
    if node.is_leaf() {
        return node.size.map_or(0.0, |size| size.hours());
    }
    node.children
        .iter()
        .map(|child_id| total_time_estimate_in(graph, child_id, visited))
        .sum()
}

// ----------------------------------------------------------------------------
// Parent chain
// ----------------------------------------------------------------------------

/// Root of the tree containing a node
///
/// Follows parents until one does not resolve. `None` for unknown
/// identifiers and for chains that loop.
#[must_use]
pub fn find_root<'g>(graph: &'g GoalGraph, id: &NodeId) -> Option<&'g GoalNode> {
    let mut visited = Visited::new();
    let mut current = graph.get(id)?;
    loop {
        if !first_visit(&mut visited, &current.id) {
            return None;
        }
        match graph.parent_of(&current.id) {
            Some(parent) => current = parent,
            None => return Some(current),
        }
    }
}

/// Sum of priorities from the root down to a node
#[must_use]
pub fn chain_priority(graph: &GoalGraph, id: &NodeId) -> f64 {
    chain_priority_in(graph, id, &mut Visited::new())
}

fn chain_priority_in(graph: &GoalGraph, id: &NodeId, visited: &mut Visited) -> f64 {
    if !first_visit(visited, id) {
        return 0.0;
    }
    let Some(node) = graph.get(id) else {
        return 0.0;
    };
    match node.parent.as_ref().filter(|p| graph.contains(p)) {
        Some(parent) => chain_priority_in(graph, parent, visited) + node.priority,
        None => node.priority,
    }
}

/// Distance from the root; roots and orphans are at depth 0
#[must_use]
pub fn depth(graph: &GoalGraph, id: &NodeId) -> usize {
    depth_in(graph, id, &mut Visited::new())
}

fn depth_in(graph: &GoalGraph, id: &NodeId, visited: &mut Visited) -> usize {
    if !first_visit(visited, id) {
        return 0;
    }
    let Some(node) = graph.get(id) else {
        return 0;
    };
    match node.parent.as_ref().filter(|p| graph.contains(p)) {
        Some(parent) => 1 + depth_in(graph, parent, visited),
        None => 0,
    }
}

/// Node type: the explicit one, else inferred from depth and children
#[must_use]
pub fn infer_node_type(graph: &GoalGraph, id: &NodeId) -> NodeType {
    let Some(node) = graph.get(id) else {
        return NodeType::Task;
    };
    if let Some(explicit) = node.node_type {
        return explicit;
    }

    let has_children = !node.is_leaf();
    match depth(graph, id) {
        0 => NodeType::StrategicGoal,
        1 if has_children => NodeType::SubGoal,
        1 => NodeType::Project,
        2 if has_children => NodeType::Project,
        2 => NodeType::Task,
        3 if has_children => NodeType::Stage,
        3 => NodeType::Task,
        4 if has_children => NodeType::Task,
        _ => NodeType::SubTask,
    }
}

/// `[[name]]` links to each existing child
#[must_use]
pub fn children_links(graph: &GoalGraph, id: &NodeId) -> Vec<String> {
    graph.get(id).map_or_else(Vec::new, |node| {
        node.children
            .iter()
            .filter_map(|child_id| graph.get(child_id))
            .map(|child| format!("[[{}]]", child.name))
            .collect()
    })
}

// ----------------------------------------------------------------------------
// Dates
// ----------------------------------------------------------------------------

/// Calendar date embedded in a date-like string (`[[2025-03-15]]`, `2025-03-15T10:00`)
#[must_use]
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    let caps = ISO_DATE.captures(date)?;
    NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()
}

/// Status from progress and target date
#[must_use]
pub fn status(progress: f64, date: Option<&str>, today: NaiveDate) -> GoalStatus {
    if progress >= 100.0 {
        return GoalStatus::Completed;
    }
    if date.and_then(parse_date).is_some_and(|target| target < today) {
        return GoalStatus::Overdue;
    }
    if progress > 0.0 {
        GoalStatus::InProgress
    } else {
        GoalStatus::NotStarted
    }
}

/// Whole days until the target date; negative once it has passed
#[must_use]
pub fn days_remaining(date: Option<&str>, today: NaiveDate) -> Option<i64> {
    let target = parse_date(date?)?;
    Some((target - today).num_days())
}

/// Whether an unfinished goal is past its target date
#[must_use]
pub fn is_overdue(progress: f64, date: Option<&str>, today: NaiveDate) -> bool {
    if progress >= 100.0 {
        return false;
    }
    days_remaining(date, today).is_some_and(|days| days < 0)
}

/// Leading four-digit year of a date string
#[must_use]
pub fn year_from_date(date: Option<&str>) -> Option<i32> {
    let caps = YEAR.captures(date?)?;
    caps[1].parse().ok()
}

/// Quarter label (`Q1`..`Q4`) from the month of a date string
#[must_use]
pub fn quarter_from_date(date: Option<&str>) -> Option<&'static str> {
    let caps = YEAR_MONTH.captures(date?)?;
    let month: u32 = caps[1].parse().ok()?;
    Some(match month {
        0..=3 => "Q1",
        4..=6 => "Q2",
        7..=9 => "Q3",
        _ => "Q4",
    })
}

/// `[[YYYY-MM-DD]]` link for the date embedded in a string
#[must_use]
pub fn format_date_as_link(date: Option<&str>) -> Option<String> {
    let caps = ISO_DATE.captures(date?)?;
    Some(format!("[[{}]]", &caps[1]))
}

/// `YYYY-MM-DD` spelling of a date
#[must_use]
pub fn date_string(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
