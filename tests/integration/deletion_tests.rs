use dupkeeper::actions::{DeleteConfig, DeletionEngine, PolicyError};
use dupkeeper::duplicates::{DuplicateFinder, FinderConfig};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two directories `A` and `B` with a shared `common.txt` and a unique
/// `only_a.txt`. Returns the temp root and the canonical `A` and `B`.
fn ab_fixture() -> (TempDir, PathBuf, PathBuf) {
    let root = TempDir::new().unwrap();
    let a = root.path().join("A");
    let b = root.path().join("B");
    fs::create_dir(&a).unwrap();
    fs::create_dir(&b).unwrap();
    fs::write(a.join("common.txt"), "shared content").unwrap();
    fs::write(b.join("common.txt"), "shared content").unwrap();
    fs::write(a.join("only_a.txt"), "unique to A").unwrap();
    let a = a.canonicalize().unwrap();
    let b = b.canonicalize().unwrap();
    (root, a, b)
}

fn engine(dirs: &[&Path]) -> DeletionEngine {
    let finder = DuplicateFinder::scan_paths(dirs.iter().copied(), FinderConfig::default()).unwrap();
    DeletionEngine::new(finder)
}

#[test]
fn test_scan_of_a_and_b_finds_common_file() {
    let (_root, a, b) = ab_fixture();
    let engine = engine(&[&a, &b]);

    let groups: Vec<_> = engine.finder().result().groups().collect();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, "shared content".len() as u64);
    assert_eq!(groups[0].paths, vec![a.join("common.txt"), b.join("common.txt")]);
}

#[test]
fn test_delete_in_b_keeps_copy_in_a() {
    let (_root, a, b) = ab_fixture();
    let mut engine = engine(&[&a, &b]);

    let report = engine
        .remove_in_directories([&b], &DeleteConfig::execute())
        .unwrap();

    assert_eq!(report.removed, vec![b.join("common.txt")]);
    assert!(report.all_succeeded());
    assert!(!b.join("common.txt").exists());
    assert!(a.join("common.txt").exists());
    assert!(a.join("only_a.txt").exists());
}

#[test]
fn test_delete_in_both_keeps_smallest_path() {
    let (_root, a, b) = ab_fixture();
    let mut engine = engine(&[&a, &b]);

    let report = engine
        .remove_in_directories([&a, &b], &DeleteConfig::execute())
        .unwrap();

    assert_eq!(report.removed, vec![b.join("common.txt")]);
    assert!(a.join("common.txt").exists());
    assert_eq!(report.bytes_freed, "shared content".len() as u64);
}

#[test]
fn test_dry_run_matches_real_run() {
    let (_root, a, b) = ab_fixture();
    fs::write(a.join("x1"), "xxx").unwrap();
    fs::write(b.join("x2"), "xxx").unwrap();
    fs::write(b.join("x3"), "xxx").unwrap();

    let mut engine = engine(&[&a, &b]);
    let planned = engine
        .remove_in_directories([&b], &DeleteConfig::dry_run())
        .unwrap();
    assert!(planned.dry_run);
    for path in &planned.removed {
        assert!(path.exists(), "dry run removed {}", path.display());
    }

    let actual = engine
        .remove_in_directories([&b], &DeleteConfig::execute())
        .unwrap();
    let planned: BTreeSet<_> = planned.removed.into_iter().collect();
    let actual: BTreeSet<_> = actual.removed.into_iter().collect();
    assert_eq!(planned, actual);
    assert_eq!(actual.len(), 3);
}

#[test]
fn test_pattern_dry_run_matches_real_run() {
    let (_root, a, b) = ab_fixture();
    let pattern = format!("{}/*.txt", b.display());

    let mut engine = engine(&[&a, &b]);
    let planned = engine
        .remove_by_pattern([&pattern], &DeleteConfig::dry_run())
        .unwrap();
    let actual = engine
        .remove_by_pattern([&pattern], &DeleteConfig::execute())
        .unwrap();

    assert_eq!(planned.removed, actual.removed);
    assert_eq!(actual.removed, vec![b.join("common.txt")]);
}

#[test]
fn test_second_real_deletion_needs_refresh() {
    let (_root, a, b) = ab_fixture();
    let mut engine = engine(&[&a, &b]);

    engine
        .remove_in_directories([&b], &DeleteConfig::execute())
        .unwrap();
    assert!(engine.is_stale());

    let err = engine
        .remove_in_directories([&a], &DeleteConfig::execute())
        .unwrap_err();
    assert!(matches!(err, PolicyError::StaleResults));

    engine.refresh();
    assert!(!engine.is_stale());
    let report = engine
        .remove_in_directories([&a], &DeleteConfig::execute())
        .unwrap();
    assert!(report.removed.is_empty());
    assert!(a.join("common.txt").exists());
}

#[test]
fn test_survivor_invariant_with_mixed_groups() {
    let root = TempDir::new().unwrap();
    let keep = root.path().join("keep");
    let target = root.path().join("target");
    fs::create_dir_all(target.join("nested")).unwrap();
    fs::create_dir(&keep).unwrap();

    // Group 1 has a copy outside the target; group 2 lives only inside it.
    fs::write(keep.join("one"), "group one").unwrap();
    fs::write(target.join("one"), "group one").unwrap();
    fs::write(target.join("nested/one"), "group one").unwrap();
    fs::write(target.join("two_a"), "group two!").unwrap();
    fs::write(target.join("two_b"), "group two!").unwrap();
    fs::write(target.join("nested/two_c"), "group two!").unwrap();

    let mut engine = engine(&[root.path()]);
    engine
        .remove_in_directories([&target], &DeleteConfig::execute())
        .unwrap();

    let target = target.canonicalize().unwrap();
    assert!(keep.join("one").exists());
    assert!(!target.join("one").exists());
    assert!(!target.join("nested/one").exists());

    let survivors: Vec<_> = ["two_a", "two_b", "nested/two_c"]
        .iter()
        .filter(|name| target.join(name).exists())
        .collect();
    assert_eq!(survivors, vec![&"nested/two_c"]);
}

#[test]
fn test_empty_files_are_all_removed() {
    let (_root, a, b) = ab_fixture();
    fs::write(a.join("empty1"), "").unwrap();
    fs::write(b.join("empty2"), "").unwrap();

    let mut engine = engine(&[&a, &b]);
    let report = engine.delete_empty_files(&DeleteConfig::execute()).unwrap();

    assert_eq!(report.removed_count(), 2);
    assert!(!a.join("empty1").exists());
    assert!(!b.join("empty2").exists());
    assert!(b.join("common.txt").exists());
}

#[test]
fn test_vanished_file_is_reported_not_fatal() {
    let (_root, a, b) = ab_fixture();
    fs::write(a.join("x1"), "xxx").unwrap();
    fs::write(b.join("x2"), "xxx").unwrap();

    let mut engine = engine(&[&a, &b]);
    fs::remove_file(b.join("x2")).unwrap();

    let report = engine
        .remove_in_directories([&b], &DeleteConfig::execute())
        .unwrap();
    assert_eq!(report.removed, vec![b.join("common.txt")]);
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.failed[0].0, b.join("x2"));
    assert!(!report.all_succeeded());
}
