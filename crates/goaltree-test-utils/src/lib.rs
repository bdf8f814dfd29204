//! Testing utilities for the goaltree workspace
//!
//! In-memory store, recording notifier and document fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::NaiveDate;
use goaltree_core::{NodeId, PropertyBag};
use goaltree_vault::{DocumentRef, DocumentStore, Notifier, PropertyTransform, StoreError, StoreResult};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Parse a YAML mapping into a bag
pub fn bag(yaml: &str) -> PropertyBag {
    PropertyBag::from_value(serde_yaml::from_str(yaml).unwrap())
}

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Documents held in memory, listed in insertion order
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<IndexMap<NodeId, PropertyBag>>,
    writes: AtomicUsize,
    write_delay: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document from YAML frontmatter
    #[must_use]
    pub fn with_document(self, id: &str, yaml: &str) -> Self {
        self.insert(id, bag(yaml));
        self
    }

    /// Sleep before applying each update, to hold a pass in flight
    #[must_use]
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    pub fn insert(&self, id: &str, properties: PropertyBag) {
        self.docs.lock().insert(NodeId::new(id), properties);
    }

    pub fn remove(&self, id: &str) -> Option<PropertyBag> {
        self.docs.lock().shift_remove(&NodeId::new(id))
    }

    pub fn rename(&self, old: &str, new: &str) {
        let mut docs = self.docs.lock();
        if let Some(properties) = docs.shift_remove(&NodeId::new(old)) {
            docs.insert(NodeId::new(new), properties);
        }
    }

    pub fn properties(&self, id: &str) -> PropertyBag {
        self.docs
            .lock()
            .get(&NodeId::new(id))
            .cloned()
            .unwrap_or_else(|| panic!("no document {id}"))
    }

    /// Number of updates that changed a bag
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_documents(&self) -> StoreResult<Vec<DocumentRef>> {
        Ok(self
            .docs
            .lock()
            .keys()
            .cloned()
            .map(DocumentRef::new)
            .collect())
    }

    async fn read_properties(&self, id: &NodeId) -> StoreResult<PropertyBag> {
        self.docs
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn update_properties(
        &self,
        id: &NodeId,
        transform: PropertyTransform<'_>,
    ) -> StoreResult<bool> {
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }

        let mut docs = self.docs.lock();
        let properties = docs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let before = properties.clone();
        transform(properties);
        let changed = *properties != before;
        if changed {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(changed)
    }
}

/// Notifier that keeps every notice
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<(String, Duration)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(String, Duration)> {
        self.notices.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices.lock().iter().map(|(m, _)| m.clone()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, duration: Duration) {
        self.notices.lock().push((message.to_string(), duration));
    }
}

/// Root R with children A (priority 1, progress 40) and B (priority 3,
/// progress 80), plus an unrelated note outside the goals folder
pub fn weighted_vault() -> MemoryStore {
    MemoryStore::new()
        .with_document("Goals/R.md", "priority: 2")
        .with_document(
            "Goals/A.md",
            "goal: \"[[R]]\"\npriority: 1\nprogress: 40\ncategory: active\nsize: M\nexpectedAcquireDate: \"2025-06-30\"",
        )
        .with_document(
            "Goals/B.md",
            "goal: \"[[R]]\"\npriority: 3\nprogress: 80\ncategory: active\nsize: s\nexpectedAcquireDate: \"2025-09-30\"",
        )
        .with_document("Notes/Journal.md", "mood: fine")
}
