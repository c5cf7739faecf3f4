use dupkeeper::actions::{DeleteConfig, DeletionEngine};
use dupkeeper::duplicates::{DuplicateFinder, FinderConfig};
use dupkeeper::scanner::DirectorySet;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_duplicates_across_three_directories() {
    let dirs: Vec<TempDir> = (0..3).map(|_| TempDir::new().unwrap()).collect();
    for (i, dir) in dirs.iter().enumerate() {
        fs::write(dir.path().join("shared.bin"), "the same bytes everywhere").unwrap();
        fs::write(dir.path().join("own.bin"), format!("only in dir {i}")).unwrap();
    }

    let finder =
        DuplicateFinder::scan_paths(dirs.iter().map(TempDir::path), FinderConfig::default())
            .unwrap();
    let groups: Vec<_> = finder.result().groups().collect();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].paths.len(), 3);
    assert_eq!(finder.summary().duplicate_files, 2);
}

#[test]
fn test_nested_directories_are_scanned_once() {
    let root = TempDir::new().unwrap();
    let inner = root.path().join("inner");
    fs::create_dir(&inner).unwrap();
    fs::write(root.path().join("top"), "dup").unwrap();
    fs::write(inner.join("deep"), "dup").unwrap();

    let finder =
        DuplicateFinder::scan_paths([root.path(), inner.as_path()], FinderConfig::default())
            .unwrap();
    assert_eq!(finder.summary().total_files, 2);
    assert_eq!(finder.result().groups().next().unwrap().paths.len(), 2);
    assert_eq!(finder.directories().len(), 2);
}

#[test]
fn test_repeated_directory_collapses() {
    let root = TempDir::new().unwrap();
    fs::create_dir(root.path().join("sub")).unwrap();

    let set = DirectorySet::resolve([
        root.path().to_path_buf(),
        root.path().join("."),
        root.path().join("sub/.."),
    ])
    .unwrap();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_sibling_prefix_is_not_inside_target() {
    let root = TempDir::new().unwrap();
    let data = root.path().join("data");
    let data_backup = root.path().join("data_backup");
    fs::create_dir(&data).unwrap();
    fs::create_dir(&data_backup).unwrap();
    fs::write(data.join("file"), "copy").unwrap();
    fs::write(data_backup.join("file"), "copy").unwrap();

    let finder = DuplicateFinder::scan_paths([root.path()], FinderConfig::default()).unwrap();
    let mut engine = DeletionEngine::new(finder);
    let report = engine
        .remove_in_directories([&data], &DeleteConfig::execute())
        .unwrap();

    assert_eq!(report.removed_count(), 1);
    assert!(!data.join("file").exists());
    assert!(data_backup.join("file").exists());
}

#[test]
fn test_target_outside_scanned_set_removes_nothing() {
    let scanned = TempDir::new().unwrap();
    let elsewhere = TempDir::new().unwrap();
    fs::write(scanned.path().join("a"), "dup").unwrap();
    fs::write(scanned.path().join("b"), "dup").unwrap();

    let finder = DuplicateFinder::scan_paths([scanned.path()], FinderConfig::default()).unwrap();
    let mut engine = DeletionEngine::new(finder);
    let report = engine
        .remove_in_directories([elsewhere.path()], &DeleteConfig::execute())
        .unwrap();

    assert!(report.removed.is_empty());
    assert!(!engine.is_stale());
    assert!(scanned.path().join("a").exists());
    assert!(scanned.path().join("b").exists());
}
