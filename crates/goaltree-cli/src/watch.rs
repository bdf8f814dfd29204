//! Polling watcher
//!
//! Compares markdown modification times between polls and feeds the
//! differences to the plugin's controller as change and delete events.
//! Files written by a pass show up as changes on the next poll; the pass
//! they trigger finds nothing to write, so the loop settles.

use goaltree_core::NodeId;
use goaltree_vault::{GoalPlugin, VaultPlugin, VaultStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Difference between two polls
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum VaultEvent {
    Changed(NodeId),
    Deleted(NodeId),
}

/// Events between two snapshots: changes (new or newer files) first, then
/// deletions, so a deletion still forces a full pass
pub(crate) fn diff(
    previous: &HashMap<NodeId, SystemTime>,
    current: &HashMap<NodeId, SystemTime>,
) -> Vec<VaultEvent> {
    let mut changed: Vec<&NodeId> = current
        .iter()
        .filter(|(id, modified)| previous.get(*id) != Some(*modified))
        .map(|(id, _)| id)
        .collect();
    let mut deleted: Vec<&NodeId> = previous.keys().filter(|id| !current.contains_key(*id)).collect();
    changed.sort();
    deleted.sort();

    changed
        .into_iter()
        .map(|id| VaultEvent::Changed(id.clone()))
        .chain(deleted.into_iter().map(|id| VaultEvent::Deleted(id.clone())))
        .collect()
}

/// Run an initial pass, then poll until Ctrl-C
pub(crate) async fn run(plugin: Arc<VaultPlugin<VaultStore>>, interval: Duration) -> anyhow::Result<()> {
    let store = Arc::clone(plugin.controller().runner().store());
    let mut known = store.modified_times().await?;

    if let Some(report) = plugin.start().await? {
        println!(
            "Initial pass: {} goals, {} written",
            report.goals, report.written
        );
    }
    tracing::info!(
        "Watching {} every {}ms",
        store.root().display(),
        interval.as_millis()
    );

    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                plugin.stop().await;
                return Ok(());
            }
        }

        let current = match store.modified_times().await {
            Ok(times) => times,
            Err(err) => {
                tracing::warn!("Poll failed: {}", err);
                continue;
            }
        };
        for event in diff(&known, &current) {
            match event {
                VaultEvent::Changed(id) => plugin.controller().on_changed(id),
                VaultEvent::Deleted(id) => plugin.controller().on_deleted(&id),
            }
        }
        known = current;
    }
}
