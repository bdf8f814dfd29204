//! Derived-field writer
//!
//! Computes the enabled derived fields of one node and merges them into its
//! persisted [`PropertyBag`]. User keys are never touched, except the raw
//! progress of internal nodes, whose progress is owned by the rollup.
//!
//! After merging, keys are ordered: derived keys in canonical order, derived
//! keys the engine does not know (kept as they were), then user keys in their
//! original order.

use crate::bag::{DerivedField, DerivedValue, PropertyBag};
use crate::calc;
use crate::config::GoalSettings;
use crate::graph::GoalGraph;
use crate::types::{GoalNode, NodeId};
use chrono::NaiveDate;
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Computed changes for one node's property bag
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedUpdate {
    prefix: String,
    set: BTreeMap<DerivedField, DerivedValue>,
    clear: BTreeSet<DerivedField>,
    remove_user_keys: Vec<String>,
}

impl DerivedUpdate {
    fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            set: BTreeMap::new(),
            clear: BTreeSet::new(),
            remove_user_keys: Vec::new(),
        }
    }

    fn set(&mut self, field: DerivedField, value: DerivedValue) {
        self.clear.remove(&field);
        self.set.insert(field, value);
    }

    fn clear(&mut self, field: DerivedField) {
        if !self.set.contains_key(&field) {
            self.clear.insert(field);
        }
    }

    /// Value computed for a field, if any
    #[inline]
    #[must_use]
    pub fn get(&self, field: DerivedField) -> Option<&DerivedValue> {
        self.set.get(&field)
    }

    /// Whether the field will be removed from the bag
    #[inline]
    #[must_use]
    pub fn clears(&self, field: DerivedField) -> bool {
        self.clear.contains(&field)
    }

    /// Fields written, in canonical order
    pub fn fields(&self) -> impl Iterator<Item = (DerivedField, &DerivedValue)> {
        self.set.iter().map(|(field, value)| (*field, value))
    }

    /// User keys the update removes
    #[must_use]
    pub fn removed_user_keys(&self) -> &[String] {
        &self.remove_user_keys
    }

    /// Merge into a bag and reorder its keys
    pub fn apply(&self, bag: &mut PropertyBag) {
        for (field, value) in &self.set {
            bag.insert(field.key(&self.prefix), value.to_yaml());
        }
        for field in &self.clear {
            bag.remove(&field.key(&self.prefix));
        }
        for key in &self.remove_user_keys {
            bag.remove(key);
        }
        reorder_properties(bag, &self.prefix);
    }
}

/// Order keys: canonical derived keys, other derived keys, then user keys
///
/// Relative order inside the last two groups is preserved.
pub fn reorder_properties(bag: &mut PropertyBag, prefix: &str) {
    let mut derived: Vec<(String, Value)> = Vec::new();
    let mut user: Vec<(String, Value)> = Vec::new();
    for (key, value) in bag.drain() {
        if key.starts_with(prefix) {
            derived.push((key, value));
        } else {
            user.push((key, value));
        }
    }

    let mut ordered: Vec<(String, Value)> = Vec::with_capacity(derived.len() + user.len());
    for field in DerivedField::CANONICAL_ORDER {
        let key = field.key(prefix);
        if let Some(pos) = derived.iter().position(|(k, _)| *k == key) {
            ordered.push(derived.remove(pos));
        }
    }
    ordered.extend(derived);
    ordered.extend(user);

    *bag = ordered.into_iter().collect();
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Some(_) => true,
    }
}

/// Computes derived fields according to [`GoalSettings`]
#[derive(Debug, Clone, Copy)]
pub struct DerivedFieldWriter<'a> {
    settings: &'a GoalSettings,
}

impl<'a> DerivedFieldWriter<'a> {
    /// Create writer over settings
    #[inline]
    #[must_use]
    pub fn new(settings: &'a GoalSettings) -> Self {
        Self { settings }
    }

    /// Compute the update for one node
    ///
    /// `existing` is the node's current bag; it decides whether the
    /// completion date is already stamped. `None` when the node is unknown.
    #[must_use]
    pub fn compute(
        &self,
        graph: &GoalGraph,
        id: &NodeId,
        existing: &PropertyBag,
        today: NaiveDate,
    ) -> Option<DerivedUpdate> {
        let node = graph.get(id)?;
        let enabled = &self.settings.enabled_properties;
        let mut update = DerivedUpdate::new(&self.settings.computed_property_prefix);

        if enabled.root_goal {
            if let Some(root) = calc::find_root(graph, id) {
                update.set(
                    DerivedField::RootGoal,
                    DerivedValue::Text(format!("[[{}]]", root.name)),
                );
                update.set(
                    DerivedField::RootGoalPriority,
                    DerivedValue::number(root.priority),
                );
            }
        }

        if enabled.chain_priority && node.parent.is_some() {
            update.set(
                DerivedField::ChainPriority,
                DerivedValue::number(calc::chain_priority(graph, id)),
            );
        }

        if enabled.depth {
            update.set(DerivedField::Depth, count(calc::depth(graph, id)));
        }

        if enabled.node_type {
            update.set(
                DerivedField::NodeType,
                DerivedValue::Text(calc::infer_node_type(graph, id).as_str().to_string()),
            );
            update.set(DerivedField::IsLeaf, DerivedValue::Bool(node.is_leaf()));
        }

        if node.is_leaf() {
            self.compute_leaf(node, existing, today, &mut update);
        } else {
            self.compute_internal(graph, node, existing, today, &mut update);
        }

        Some(update)
    }

    /// Compute and merge in one step
    ///
    /// Returns `false` when the node is unknown and the bag was left alone.
    pub fn update(
        &self,
        graph: &GoalGraph,
        id: &NodeId,
        bag: &mut PropertyBag,
        today: NaiveDate,
    ) -> bool {
        match self.compute(graph, id, bag, today) {
            Some(update) => {
                update.apply(bag);
                true
            }
            None => false,
        }
    }

    fn compute_internal(
        &self,
        graph: &GoalGraph,
        node: &GoalNode,
        existing: &PropertyBag,
        today: NaiveDate,
        update: &mut DerivedUpdate,
    ) {
        let enabled = &self.settings.enabled_properties;
        let id = &node.id;

        if enabled.hierarchy_metrics {
            update.set(
                DerivedField::TotalDescendants,
                count(calc::total_descendants(graph, id)),
            );
            update.set(DerivedField::LeafCount, count(calc::leaf_count(graph, id)));
            update.set(DerivedField::ChildCount, count(node.children.len()));
            update.set(
                DerivedField::Children,
                DerivedValue::Links(calc::children_links(graph, id)),
            );
        }

        if enabled.blocked_tracking {
            update.set(
                DerivedField::HasBlockedChildren,
                DerivedValue::Bool(calc::has_blocked_descendants(graph, id)),
            );
        }

        if enabled.workflow_tracking {
            update.set(
                DerivedField::HasUrgentChildren,
                DerivedValue::Bool(calc::has_urgent_descendants(graph, id)),
            );
            let hours = calc::total_time_estimate(graph, id);
            if hours > 0.0 {
                update.set(DerivedField::TotalTimeEstimate, DerivedValue::number(hours));
            } else {
                update.clear(DerivedField::TotalTimeEstimate);
            }
        }

        let progress = calc::accumulated_progress(
            graph,
            id,
            self.settings.progress_calculation_method,
        )
        .round();
        update.set(DerivedField::CalculatedProgress, DerivedValue::number(progress));
        if existing.contains_key(&self.settings.progress_property) {
            update
                .remove_user_keys
                .push(self.settings.progress_property.clone());
        }

        let latest = calc::latest_date(graph, id);
        match calc::format_date_as_link(latest.as_deref()) {
            Some(link) => update.set(
                DerivedField::CalculatedExpectedAcquireDate,
                DerivedValue::Text(link),
            ),
            None => update.clear(DerivedField::CalculatedExpectedAcquireDate),
        }
        self.compute_dated(progress, latest.as_deref(), existing, today, update);
    }

    fn compute_leaf(
        &self,
        node: &GoalNode,
        existing: &PropertyBag,
        today: NaiveDate,
        update: &mut DerivedUpdate,
    ) {
        for field in DerivedField::INTERNAL_ONLY {
            update.clear(field);
        }
        self.compute_dated(
            node.progress,
            node.expected_acquire_date.as_deref(),
            existing,
            today,
            update,
        );
    }

    /// Year, quarter, status and time metrics shared by leaves and internal nodes
    fn compute_dated(
        &self,
        progress: f64,
        date: Option<&str>,
        existing: &PropertyBag,
        today: NaiveDate,
        update: &mut DerivedUpdate,
    ) {
        let enabled = &self.settings.enabled_properties;

        match calc::year_from_date(date) {
            Some(year) => update.set(DerivedField::GoalYear, DerivedValue::Integer(year.into())),
            None => update.clear(DerivedField::GoalYear),
        }
        match calc::quarter_from_date(date) {
            Some(quarter) => update.set(
                DerivedField::GoalQuarter,
                DerivedValue::Text(quarter.to_string()),
            ),
            None => update.clear(DerivedField::GoalQuarter),
        }

        if enabled.status {
            update.set(
                DerivedField::Status,
                DerivedValue::Text(calc::status(progress, date, today).as_str().to_string()),
            );
        }

        if enabled.time_metrics {
            update.set(
                DerivedField::DaysRemaining,
                calc::days_remaining(date, today).into(),
            );
            update.set(
                DerivedField::IsOverdue,
                DerivedValue::Bool(calc::is_overdue(progress, date, today)),
            );

            let completed_key = DerivedField::CompletedDate.key(&self.settings.computed_property_prefix);
            if progress >= 100.0 {
                if !is_truthy(existing.get(&completed_key)) {
                    update.set(
                        DerivedField::CompletedDate,
                        DerivedValue::Text(format!("[[{}]]", calc::date_string(today))),
                    );
                }
            } else {
                update.clear(DerivedField::CompletedDate);
            }
        }
    }
}

fn count(n: usize) -> DerivedValue {
    DerivedValue::Integer(i64::try_from(n).unwrap_or(i64::MAX))
}
