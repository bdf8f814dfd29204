use goaltree_core::NodeId;
use goaltree_test_utils::{day, weighted_vault, MemoryStore, RecordingNotifier};
use goaltree_vault::pass::{ALL_CLEAR_NOTICE_DURATION, CRITICAL_NOTICE_DURATION, ISSUES_NOTICE_DURATION};
use goaltree_vault::prelude::*;
use pretty_assertions::assert_eq;
use serde_yaml::Value;
use std::collections::HashSet;

fn runner(store: MemoryStore) -> (Arc<MemoryStore>, Arc<RecordingNotifier>, PassRunner<MemoryStore>) {
    let store = Arc::new(store);
    let notifier = Arc::new(RecordingNotifier::new());
    let runner = PassRunner::new(store.clone(), GoalSettings::default(), notifier.clone());
    (store, notifier, runner)
}

#[tokio::test]
async fn full_pass_writes_rollups() {
    let (store, notifier, runner) = runner(weighted_vault());

    let report = runner.run_pass(&HashSet::new(), day(2025, 1, 1)).await.unwrap();
    assert_eq!(report.goals, 3);
    assert_eq!(report.planned, 3);
    assert_eq!(report.written, 3);
    assert_eq!(report.critical(), 0);
    assert!(notifier.notices().is_empty());

    let root = store.properties("Goals/R.md");
    assert_eq!(root.get("_calculatedProgress"), Some(&Value::from(50)));
    assert_eq!(root.get("_totalTimeEstimate"), Some(&Value::from(2.5)));
    assert_eq!(
        root.get("_calculatedExpectedAcquireDate"),
        Some(&Value::from("[[2025-09-30]]"))
    );

    let a = store.properties("Goals/A.md");
    assert_eq!(a.get("_rootGoal"), Some(&Value::from("[[R]]")));
    assert_eq!(a.get("_rootGoalPriority"), Some(&Value::from(2)));
    assert_eq!(a.get("_chainPriority"), Some(&Value::from(3)));
    assert_eq!(a.get("_nodeType"), Some(&Value::from("project")));

    assert_eq!(store.properties("Notes/Journal.md").len(), 1);
}

#[tokio::test]
async fn second_pass_changes_nothing() {
    let (store, _, runner) = runner(weighted_vault());

    runner.run_pass(&HashSet::new(), day(2025, 1, 1)).await.unwrap();
    let snapshot: Vec<_> = ["Goals/R.md", "Goals/A.md", "Goals/B.md"]
        .iter()
        .map(|id| store.properties(id))
        .collect();
    let writes = store.writes();

    let report = runner.run_pass(&HashSet::new(), day(2025, 1, 1)).await.unwrap();
    assert_eq!(report.written, 0);
    assert_eq!(store.writes(), writes);
    let again: Vec<_> = ["Goals/R.md", "Goals/A.md", "Goals/B.md"]
        .iter()
        .map(|id| store.properties(id))
        .collect();
    assert_eq!(again, snapshot);
}

#[tokio::test]
async fn incremental_pass_touches_only_the_branch() {
    let store = weighted_vault()
        .with_document("Goals/Other.md", "priority: 1")
        .with_document("Goals/OtherChild.md", "goal: \"[[Other]]\"");
    let (store, _, runner) = runner(store);

    let changed = HashSet::from([NodeId::new("Goals/B.md")]);
    let report = runner.run_pass(&changed, day(2025, 1, 1)).await.unwrap();
    assert_eq!(report.goals, 5);
    assert_eq!(report.planned, 2);
    assert!(store.properties("Goals/R.md").contains_key("_calculatedProgress"));
    assert!(!store.properties("Goals/A.md").contains_key("_depth"));
    assert!(!store.properties("Goals/Other.md").contains_key("_depth"));
}

#[tokio::test]
async fn orphan_raises_critical_notice() {
    let store = MemoryStore::new().with_document("Goals/A.md", "goal: \"[[Z]]\"");
    let (store, notifier, runner) = runner(store);

    let report = runner.run_pass(&HashSet::new(), day(2025, 1, 1)).await.unwrap();
    assert_eq!(report.critical(), 1);

    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].0.contains("1 orphaned/circular reference(s)"));
    assert_eq!(notices[0].1, CRITICAL_NOTICE_DURATION);

    let a = store.properties("Goals/A.md");
    assert_eq!(a.get("_rootGoal"), Some(&Value::from("[[A]]")));
    assert_eq!(a.get("_depth"), Some(&Value::from(0)));
}

#[tokio::test]
async fn validate_reports_grouped_issues() {
    let store = MemoryStore::new()
        .with_document("Goals/A.md", "category: active")
        .with_document("Goals/B.md", "goal: \"[[Missing]]\"\ncategory: archive");
    let (_, notifier, runner) = runner(store);

    let report = runner.validate().await.unwrap();
    assert_eq!(report.goals, 2);
    assert_eq!(report.summary.errors, 1);
    assert!(report.message.starts_with(&format!("Found {} issue(s):", report.issues.len())));
    assert!(report.message.contains("  - B"));
    assert_eq!(notifier.notices()[0].1, ISSUES_NOTICE_DURATION);
}

#[tokio::test]
async fn validate_all_clear() {
    let store = MemoryStore::new().with_document("Goals/Done.md", "category: archive");
    let (_, notifier, runner) = runner(store);

    let report = runner.validate().await.unwrap();
    assert!(report.issues.is_empty());
    assert_eq!(report.message, "All goals validated successfully!");
    assert_eq!(
        notifier.notices(),
        vec![("All goals validated successfully!".to_string(), ALL_CLEAR_NOTICE_DURATION)]
    );
}
