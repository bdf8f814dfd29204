use goaltree_core::NodeId;
use goaltree_test_utils::{bag, weighted_vault, MemoryStore, RecordingNotifier};
use goaltree_vault::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

const DEBOUNCE: Duration = Duration::from_millis(40);

fn controller(store: MemoryStore) -> (Arc<MemoryStore>, PassController<MemoryStore>) {
    let store = Arc::new(store);
    let runner = Arc::new(PassRunner::new(
        store.clone(),
        GoalSettings::default(),
        Arc::new(RecordingNotifier::new()),
    ));
    (store, PassController::new(runner).with_debounce(DEBOUNCE))
}

async fn settle() {
    tokio::time::sleep(DEBOUNCE * 5).await;
}

#[tokio::test]
async fn change_events_are_debounced_into_one_pass() {
    let (store, controller) = controller(weighted_vault());

    controller.on_changed(NodeId::new("Goals/A.md"));
    tokio::time::sleep(DEBOUNCE / 2).await;
    controller.on_changed(NodeId::new("Goals/B.md"));
    assert_eq!(
        controller.pending(),
        HashSet::from([NodeId::new("Goals/A.md"), NodeId::new("Goals/B.md")])
    );
    assert!(store.writes() == 0);

    settle().await;
    assert_eq!(store.writes(), 3);
    assert!(controller.pending().is_empty());
    assert!(!controller.is_in_flight());
}

#[tokio::test]
async fn out_of_scope_events_are_ignored() {
    let (store, controller) = controller(weighted_vault());

    controller.on_changed(NodeId::new("Notes/Journal.md"));
    controller.on_deleted(&NodeId::new("Notes/Old.md"));
    assert!(controller.pending().is_empty());
    assert!(!controller.is_scheduled());

    settle().await;
    assert_eq!(store.writes(), 0);
}

#[tokio::test]
async fn delete_forces_full_pass() {
    let store = weighted_vault().with_document("Goals/Solo.md", "priority: 1");
    let (store, controller) = controller(store);

    controller.on_changed(NodeId::new("Goals/Solo.md"));
    store.remove("Goals/B.md");
    controller.on_deleted(&NodeId::new("Goals/B.md"));
    assert!(controller.pending().is_empty());

    settle().await;
    assert!(store.properties("Goals/A.md").contains_key("_depth"));
    assert!(store.properties("Goals/Solo.md").contains_key("_depth"));
    assert_eq!(
        store.properties("Goals/R.md").get("_childCount"),
        Some(&serde_yaml::Value::from(1))
    );
}

#[tokio::test]
async fn rename_into_scope_forces_full_pass() {
    let (store, controller) = controller(weighted_vault());
    store.insert("Notes/Plan.md", bag("goal: \"[[R]]\""));

    controller.on_changed(NodeId::new("Goals/A.md"));
    store.rename("Notes/Plan.md", "Goals/Plan.md");
    controller.on_renamed(&NodeId::new("Notes/Plan.md"), &NodeId::new("Goals/Plan.md"));
    assert!(controller.pending().is_empty());
    assert!(controller.is_scheduled());

    settle().await;
    assert_eq!(
        store.properties("Goals/R.md").get("_childCount"),
        Some(&serde_yaml::Value::from(3))
    );
}

#[tokio::test]
async fn request_during_pass_is_dropped() {
    let store = weighted_vault().with_write_delay(Duration::from_millis(30));
    let (store, controller) = controller(store);

    let background = controller.clone();
    let first = tokio::spawn(async move { background.process().await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(controller.is_in_flight());

    let second = controller.process().await.unwrap();
    assert!(second.is_none());

    let report = first.await.unwrap().unwrap().unwrap();
    assert_eq!(report.planned, 3);
    assert!(!controller.is_in_flight());
    assert_eq!(store.writes(), 3);
}

#[tokio::test]
async fn cancel_disarms_timer() {
    let (store, controller) = controller(weighted_vault());

    controller.on_changed(NodeId::new("Goals/A.md"));
    controller.cancel();
    settle().await;

    assert_eq!(store.writes(), 0);
    assert_eq!(controller.pending(), HashSet::from([NodeId::new("Goals/A.md")]));
}

#[tokio::test]
async fn plugin_lifecycle() {
    let store = Arc::new(weighted_vault());
    let plugin = VaultPlugin::new(
        store.clone(),
        GoalSettings::default().with_prefix("gt_"),
        Arc::new(RecordingNotifier::new()),
    );

    let report = plugin.start().await.unwrap().unwrap();
    assert_eq!(report.goals, 3);
    assert!(store.properties("Goals/R.md").contains_key("gt_calculatedProgress"));

    let toml = plugin.render_configuration().unwrap();
    assert!(toml.contains("computed_property_prefix = \"gt_\""));

    plugin.controller().on_changed(NodeId::new("Goals/A.md"));
    plugin.stop().await;
    assert!(!plugin.controller().is_scheduled());
}
