//! Pass scheduling
//!
//! [`PassController`] owns all mutable plugin state:
//! - the in-flight flag: a pass requested while one runs is dropped
//! - the pending change set, consumed by the next pass
//! - the debounce timer, restarted by every event
//!
//! Delete and rename events clear the pending set, so the next pass covers
//! every goal. Cancelling the timer never interrupts a pass that already
//! started; the pass runs on its own task.

use crate::error::PassResult;
use crate::pass::{PassReport, PassRunner};
use crate::store::DocumentStore;
use chrono::{Local, NaiveDate};
use goaltree_core::NodeId;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Quiet period between the last event and the pass it triggers
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
struct ControllerState {
    in_flight: AtomicBool,
    pending: Mutex<HashSet<NodeId>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

/// Clears the in-flight flag when the pass ends, whatever the outcome
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Debounced, single-flight pass scheduler
pub struct PassController<S: DocumentStore + ?Sized + 'static> {
    runner: Arc<PassRunner<S>>,
    state: Arc<ControllerState>,
    debounce: Duration,
}

impl<S: DocumentStore + ?Sized + 'static> Clone for PassController<S> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            state: Arc::clone(&self.state),
            debounce: self.debounce,
        }
    }
}

impl<S: DocumentStore + ?Sized + 'static> PassController<S> {
    /// Controller with [`DEFAULT_DEBOUNCE`]
    #[must_use]
    pub fn new(runner: Arc<PassRunner<S>>) -> Self {
        Self {
            runner,
            state: Arc::new(ControllerState::default()),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Set debounce delay
    #[inline]
    #[must_use]
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Pass runner
    #[inline]
    #[must_use]
    pub fn runner(&self) -> &Arc<PassRunner<S>> {
        &self.runner
    }

    /// Debounce delay
    #[inline]
    #[must_use]
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Whether a pass is running
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.state.in_flight.load(Ordering::Acquire)
    }

    /// Snapshot of the pending change set
    #[must_use]
    pub fn pending(&self) -> HashSet<NodeId> {
        self.state.pending.lock().clone()
    }

    /// Forget pending changes; the next pass covers every goal
    pub fn clear_pending(&self) {
        self.state.pending.lock().clear();
    }

    /// Whether a debounce timer is armed
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.state
            .timer
            .lock()
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    /// A goal's frontmatter changed
    pub fn on_changed(&self, id: NodeId) {
        if !self.runner.in_scope(&id) {
            return;
        }
        tracing::debug!("Goal changed: {}", id);
        self.state.pending.lock().insert(id);
        self.schedule();
    }

    /// A goal was deleted
    pub fn on_deleted(&self, id: &NodeId) {
        if !self.runner.in_scope(id) {
            return;
        }
        tracing::debug!("Goal deleted: {}", id);
        self.clear_pending();
        self.schedule();
    }

    /// A document was renamed or moved into or out of the goals scope
    pub fn on_renamed(&self, old: &NodeId, new: &NodeId) {
        if !self.runner.in_scope(old) && !self.runner.in_scope(new) {
            return;
        }
        tracing::debug!("Goal renamed: {} -> {}", old, new);
        self.clear_pending();
        self.schedule();
    }

    /// Restart the debounce timer
    ///
    /// Must be called inside a tokio runtime.
    pub fn schedule(&self) {
        let controller = self.clone();
        let delay = self.debounce;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(async move {
                if let Err(err) = controller.process().await {
                    tracing::error!("Goal pass failed: {}", err);
                }
            });
        });

        if let Some(previous) = self.state.timer.lock().replace(timer) {
            previous.abort();
        }
    }

    /// Disarm the debounce timer
    pub fn cancel(&self) {
        if let Some(timer) = self.state.timer.lock().take() {
            timer.abort();
        }
    }

    /// Run a pass for today's date
    pub async fn process(&self) -> PassResult<Option<PassReport>> {
        self.process_at(Local::now().date_naive()).await
    }

    /// Run a pass over the pending changes
    ///
    /// Returns `Ok(None)` without doing anything when a pass is in flight.
    pub async fn process_at(&self, today: NaiveDate) -> PassResult<Option<PassReport>> {
        if self
            .state
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Pass already in flight; request dropped");
            return Ok(None);
        }
        let _in_flight = InFlight(&self.state.in_flight);

        let changed = std::mem::take(&mut *self.state.pending.lock());
        tracing::info!(
            "Starting pass ({})",
            if changed.is_empty() {
                "all goals".to_string()
            } else {
                format!("{} changed", changed.len())
            }
        );
        let report = self.runner.run_pass(&changed, today).await?;
        Ok(Some(report))
    }
}
