//! Processing passes
//!
//! A pass rebuilds the forest from the store, validates it, plans the nodes
//! to refresh and writes their derived fields back one document at a time.

use crate::error::{PassResult, StoreError};
use crate::host::Notifier;
use crate::store::DocumentStore;
use chrono::NaiveDate;
use goaltree_core::link::PathNamespace;
use goaltree_core::planner::plan_updates;
use goaltree_core::validation::{
    critical_issues, format_issues, summarize, validate_graph, IssueSummary, ValidationIssue,
};
use goaltree_core::writer::DerivedFieldWriter;
use goaltree_core::{Document, GoalGraph, GoalSettings, GraphBuilder, NodeId};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// How long the structural-issue notice stays up after a pass
pub const CRITICAL_NOTICE_DURATION: Duration = Duration::from_millis(5000);

/// How long the validation report stays up when it lists issues
pub const ISSUES_NOTICE_DURATION: Duration = Duration::from_millis(10_000);

/// How long the all-clear validation notice stays up
pub const ALL_CLEAR_NOTICE_DURATION: Duration = Duration::from_millis(3000);

/// Outcome of one processing pass
#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    /// Goals in the forest
    pub goals: usize,
    /// Goals recomputed
    pub planned: usize,
    /// Documents whose frontmatter changed
    pub written: usize,
    /// Every validation issue found
    pub issues: Vec<ValidationIssue>,
}

impl PassReport {
    /// Number of orphaned or circular issues
    #[must_use]
    pub fn critical(&self) -> usize {
        critical_issues(&self.issues).len()
    }
}

/// Outcome of the validate command
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// Goals in the forest
    pub goals: usize,
    /// Issues in scan order
    pub issues: Vec<ValidationIssue>,
    /// Counts per severity
    pub summary: IssueSummary,
    /// Grouped notice text
    pub message: String,
}

/// Runs passes against a store
pub struct PassRunner<S: DocumentStore + ?Sized> {
    store: Arc<S>,
    settings: RwLock<GoalSettings>,
    notifier: Arc<dyn Notifier>,
}

impl<S: DocumentStore + ?Sized> PassRunner<S> {
    /// Create runner
    #[must_use]
    pub fn new(store: Arc<S>, settings: GoalSettings, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            settings: RwLock::new(settings),
            notifier,
        }
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Snapshot of the current settings
    #[must_use]
    pub fn settings(&self) -> GoalSettings {
        self.settings.read().clone()
    }

    /// Replace settings for later passes
    pub fn set_settings(&self, settings: GoalSettings) {
        *self.settings.write() = settings;
    }

    /// Whether a document identifier lies in the goals scope
    #[must_use]
    pub fn in_scope(&self, id: &NodeId) -> bool {
        GraphBuilder::new(&self.settings.read()).in_scope(id)
    }

    /// Read every in-scope document
    ///
    /// Links resolve against the whole vault. Documents that vanish or whose
    /// frontmatter cannot be parsed are skipped with a warning.
    pub async fn load_documents(
        &self,
        settings: &GoalSettings,
    ) -> PassResult<(Vec<Document>, PathNamespace)> {
        let refs = self.store.list_documents().await?;
        let namespace = PathNamespace::new(refs.iter().map(|r| r.id.clone()));
        let builder = GraphBuilder::new(settings);

        let mut documents = Vec::new();
        for doc in refs.into_iter().filter(|r| builder.in_scope(&r.id)) {
            match self.store.read_properties(&doc.id).await {
                Ok(properties) => documents.push(Document {
                    id: doc.id,
                    name: doc.name,
                    properties,
                }),
                Err(err @ (StoreError::NotFound(_) | StoreError::Frontmatter { .. })) => {
                    tracing::warn!("Skipping {}: {}", doc.id, err);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok((documents, namespace))
    }

    /// Build the forest from the store
    pub async fn build_graph(&self, settings: &GoalSettings) -> PassResult<GoalGraph> {
        let (documents, namespace) = self.load_documents(settings).await?;
        Ok(GraphBuilder::new(settings).build(&documents, &namespace))
    }

    /// Run one pass over the nodes affected by `changed` (all when empty)
    pub async fn run_pass(
        &self,
        changed: &HashSet<NodeId>,
        today: NaiveDate,
    ) -> PassResult<PassReport> {
        let settings = self.settings();
        let graph = self.build_graph(&settings).await?;

        let issues = validate_graph(&graph);
        let critical = critical_issues(&issues).len();
        if critical > 0 {
            tracing::warn!("{} orphaned/circular goal reference(s)", critical);
            self.notifier.notify(
                &format!(
                    "Goal hierarchy issues detected: {critical} orphaned/circular reference(s). \
                     Run \"validate\" for details."
                ),
                CRITICAL_NOTICE_DURATION,
            );
        }

        let targets = plan_updates(&graph, changed);
        let writer = DerivedFieldWriter::new(&settings);
        let mut written = 0;
        for id in &targets {
            let update = |bag: &mut goaltree_core::PropertyBag| {
                writer.update(&graph, id, bag, today);
            };
            match self.store.update_properties(id, &update).await {
                Ok(true) => {
                    written += 1;
                    tracing::debug!("Updated {}", id);
                }
                Ok(false) => {}
                Err(StoreError::NotFound(_)) => {
                    tracing::warn!("Goal {} disappeared during the pass", id);
                }
                Err(err) => return Err(err.into()),
            }
        }

        tracing::info!(
            "Pass complete: {} goals, {} recomputed, {} written",
            graph.len(),
            targets.len(),
            written
        );
        Ok(PassReport {
            goals: graph.len(),
            planned: targets.len(),
            written,
            issues,
        })
    }

    /// Validate the forest and show the grouped report
    pub async fn validate(&self) -> PassResult<ValidationReport> {
        let settings = self.settings();
        let graph = self.build_graph(&settings).await?;

        let issues = validate_graph(&graph);
        let summary = summarize(&issues);
        let message = format_issues(&issues);
        let duration = if issues.is_empty() {
            ALL_CLEAR_NOTICE_DURATION
        } else {
            ISSUES_NOTICE_DURATION
        };
        self.notifier.notify(&message, duration);
        tracing::info!("Validated {} goals: {}", graph.len(), summary);

        Ok(ValidationReport {
            goals: graph.len(),
            issues,
            summary,
            message,
        })
    }
}
