use goaltree_test_utils::{day, RecordingNotifier};
use goaltree_vault::prelude::*;
use pretty_assertions::assert_eq;
use std::collections::HashSet;
use std::path::Path;

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel)).unwrap()
}

fn runner(root: &Path) -> PassRunner<VaultStore> {
    PassRunner::new(
        Arc::new(VaultStore::new(root)),
        GoalSettings::default(),
        Arc::new(RecordingNotifier::new()),
    )
}

#[tokio::test]
async fn pass_over_markdown_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Goals/Launch.md", "---\npriority: 1\nprogress: 5\n---\n# Launch\n");
    write(
        dir.path(),
        "Goals/Launch/Site.md",
        "---\ngoal: \"[[Launch]]\"\nprogress: 100\n---\nShip it.\n",
    );
    write(dir.path(), "Notes/Idea.md", "no frontmatter here\n");

    let report = runner(dir.path())
        .run_pass(&HashSet::new(), day(2025, 2, 3))
        .await
        .unwrap();
    assert_eq!(report.goals, 2);
    assert_eq!(report.written, 2);

    assert_eq!(
        read(dir.path(), "Goals/Launch.md"),
        "---\n\
         _rootGoal: '[[Launch]]'\n\
         _rootGoalPriority: 1\n\
         _depth: 0\n\
         _nodeType: strategic-goal\n\
         _isLeaf: false\n\
         _status: completed\n\
         _daysRemaining: null\n\
         _isOverdue: false\n\
         _completedDate: '[[2025-02-03]]'\n\
         _hasBlockedChildren: false\n\
         _hasUrgentChildren: false\n\
         _childCount: 1\n\
         _children:\n\
         - '[[Site]]'\n\
         _totalDescendants: 1\n\
         _leafCount: 1\n\
         _calculatedProgress: 100\n\
         priority: 1\n\
         ---\n\
         # Launch\n"
    );

    let site = read(dir.path(), "Goals/Launch/Site.md");
    assert!(site.starts_with("---\n_rootGoal: '[[Launch]]'\n"));
    assert!(site.contains("goal: '[[Launch]]'\nprogress: 100\n---\nShip it.\n"));
    assert_eq!(read(dir.path(), "Notes/Idea.md"), "no frontmatter here\n");
}

#[tokio::test]
async fn malformed_frontmatter_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let broken = "---\ngoal: [unclosed\n---\nbody\n";
    write(dir.path(), "Goals/Broken.md", broken);
    write(dir.path(), "Goals/Fine.md", "---\nprogress: 10\n---\n");

    let report = runner(dir.path())
        .run_pass(&HashSet::new(), day(2025, 2, 3))
        .await
        .unwrap();
    assert_eq!(report.goals, 1);
    assert_eq!(read(dir.path(), "Goals/Broken.md"), broken);
    assert!(read(dir.path(), "Goals/Fine.md").contains("_status: in-progress"));
}

#[tokio::test]
async fn modified_times_cover_markdown_only() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Goals/A.md", "");
    write(dir.path(), "Goals/a.txt", "");

    let times = VaultStore::new(dir.path()).modified_times().await.unwrap();
    assert_eq!(times.len(), 1);
    assert!(times.contains_key(&NodeId::new("Goals/A.md")));
}
