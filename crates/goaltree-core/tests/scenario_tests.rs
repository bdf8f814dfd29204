use chrono::NaiveDate;
use goaltree_core::calc;
use goaltree_core::prelude::*;
use pretty_assertions::assert_eq;
use serde_yaml::Value;
use std::collections::HashSet;

fn doc(id: &str, yaml: &str) -> Document {
    Document::new(id, PropertyBag::from_value(serde_yaml::from_str(yaml).unwrap()))
}

fn build(settings: &GoalSettings, docs: &[Document]) -> GoalGraph {
    let namespace = PathNamespace::new(docs.iter().map(|d| d.id.clone()));
    GraphBuilder::new(settings).build(docs, &namespace)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn weighted_rollup_from_documents() {
    let settings = GoalSettings::default();
    let docs = vec![
        doc("Goals/R.md", "priority: 2\nprogress: 5"),
        doc("Goals/A.md", "goal: \"[[R]]\"\npriority: 1\nprogress: 40"),
        doc("Goals/B.md", "goal:\n  - - R\npriority: 3\nprogress: \"80\""),
    ];
    let graph = build(&settings, &docs);
    let r = NodeId::new("Goals/R.md");

    assert_eq!(calc::accumulated_progress(&graph, &r, ProgressMethod::Weighted), 50.0);
    assert_eq!(calc::accumulated_progress(&graph, &r, ProgressMethod::Simple), 60.0);

    let writer = DerivedFieldWriter::new(&settings);
    let mut bag = docs[0].properties.clone();
    writer.update(&graph, &r, &mut bag, day(2025, 1, 1));
    assert_eq!(bag.get("_calculatedProgress"), Some(&Value::from(50)));
    assert!(!bag.contains_key("progress"));
    assert_eq!(bag.get("priority"), Some(&Value::from(2)));
}

#[test]
fn overdue_leaf() {
    let settings = GoalSettings::default();
    let docs = vec![doc(
        "Goals/Ship.md",
        "progress: 50\nexpectedAcquireDate: \"2025-03-15\"",
    )];
    let graph = build(&settings, &docs);
    let id = NodeId::new("Goals/Ship.md");

    let mut bag = docs[0].properties.clone();
    DerivedFieldWriter::new(&settings).update(&graph, &id, &mut bag, day(2025, 3, 16));
    assert_eq!(bag.get("_status"), Some(&Value::from("overdue")));
    assert_eq!(bag.get("_isOverdue"), Some(&Value::from(true)));
    assert_eq!(bag.get("_daysRemaining"), Some(&Value::from(-1)));
}

#[test]
fn completed_marker_is_stamped_once() {
    let settings = GoalSettings::default();
    let docs = vec![doc("Goals/Done.md", "progress: 100")];
    let graph = build(&settings, &docs);
    let id = NodeId::new("Goals/Done.md");
    let writer = DerivedFieldWriter::new(&settings);

    let mut bag = docs[0].properties.clone();
    writer.update(&graph, &id, &mut bag, day(2025, 5, 1));
    assert_eq!(bag.get("_completedDate"), Some(&Value::from("[[2025-05-01]]")));

    writer.update(&graph, &id, &mut bag, day(2025, 5, 2));
    assert_eq!(bag.get("_completedDate"), Some(&Value::from("[[2025-05-01]]")));
}

#[test]
fn missing_parent_is_one_orphan() {
    let settings = GoalSettings::default();
    let docs = vec![doc("Goals/A.md", "goal: \"[[Z]]\"\ncategory: inbox")];
    let graph = build(&settings, &docs);
    let a = NodeId::new("Goals/A.md");

    let issues = validate_graph(&graph);
    let orphans: Vec<&ValidationIssue> = issues
        .iter()
        .filter(|i| i.kind == IssueKind::Orphaned)
        .collect();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].id, a);
    assert_eq!(calc::find_root(&graph, &a).map(|n| n.id.clone()), Some(a));
    assert_eq!(critical_issues(&issues).len(), 1);
}

#[test]
fn changed_goal_plans_its_branch() {
    let settings = GoalSettings::default();
    let docs = vec![
        doc("Goals/R.md", "priority: 1"),
        doc("Goals/S.md", "priority: 4"),
        doc("Goals/A.md", "goal: \"[[S]]\"\npriority: 2"),
        doc("Goals/A1.md", "goal: \"[[A]]\"\npriority: 3"),
    ];
    let graph = build(&settings, &docs);

    let plan = plan_updates(&graph, &HashSet::from([NodeId::new("Goals/A.md")]));
    assert_eq!(
        plan,
        vec![
            NodeId::new("Goals/S.md"),
            NodeId::new("Goals/A.md"),
            NodeId::new("Goals/A1.md"),
        ]
    );
    assert_eq!(calc::chain_priority(&graph, &NodeId::new("Goals/A1.md")), 9.0);
}

#[test]
fn latest_date_prefers_calendar_order() {
    let settings = GoalSettings::default();
    let docs = vec![
        doc("Goals/R.md", "{}"),
        doc("Goals/A.md", "goal: \"[[R]]\"\nexpectedAcquireDate: \"[[2025-02-01]]\""),
        doc("Goals/B.md", "goal: \"[[R]]\"\nexpectedAcquireDate: 2025-11-20"),
    ];
    let graph = build(&settings, &docs);

    let latest = calc::latest_date(&graph, &NodeId::new("Goals/R.md"));
    assert_eq!(
        calc::format_date_as_link(latest.as_deref()),
        Some("[[2025-11-20]]".to_string())
    );
}
