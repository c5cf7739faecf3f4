use dupkeeper::duplicates::{DuplicateFinder, FinderConfig, FinderError, SortOrder};
use dupkeeper::scanner::ResolveError;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn finder(dir: &Path) -> DuplicateFinder {
    let mut finder = DuplicateFinder::scan_paths([dir], FinderConfig::default()).unwrap();
    finder.sort_duplicates_alphabetically();
    finder
}

#[test]
fn test_scan_finds_content_duplicates() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), "hello").unwrap();
    fs::write(dir.path().join("b.txt"), "hello").unwrap();
    fs::write(dir.path().join("c.txt"), "world").unwrap();
    fs::write(dir.path().join("unique.txt"), "a longer unique file").unwrap();

    let finder = finder(dir.path());
    let groups: Vec<_> = finder.result().groups().collect();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 5);
    assert_eq!(groups[0].paths.len(), 2);
    assert!(groups[0].paths[0].ends_with("a.txt"));
    assert!(groups[0].paths[1].ends_with("b.txt"));
}

#[test]
fn test_group_members_share_size_and_content() {
    let dir = TempDir::new().unwrap();
    for (name, content) in [
        ("x1", "xxxx"),
        ("x2", "xxxx"),
        ("y1", "yyyy"),
        ("y2", "yyyy"),
        ("z1", "zzzzzzzz"),
        ("z2", "zzzzzzzz"),
        ("z3", "zzzzzzzz"),
    ] {
        fs::write(dir.path().join(name), content).unwrap();
    }

    let finder = finder(dir.path());
    assert_eq!(finder.result().group_count(), 3);
    for group in finder.result().groups() {
        let first = fs::read(&group.paths[0]).unwrap();
        for path in &group.paths {
            assert_eq!(fs::metadata(path).unwrap().len(), group.size);
            assert_eq!(fs::read(path).unwrap(), first);
        }
    }

    let sizes: Vec<u64> = finder
        .size_sorted_duplicates(SortOrder::Descending)
        .iter()
        .map(|(size, _)| *size)
        .collect();
    assert_eq!(sizes, vec![8, 4]);
}

#[test]
fn test_empty_files_are_reported_separately() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("e1"), "").unwrap();
    fs::write(dir.path().join("e2"), "").unwrap();
    fs::write(dir.path().join("data"), "data").unwrap();

    let finder = finder(dir.path());
    assert_eq!(finder.empty_files().len(), 2);
    assert!(!finder.result().has_duplicates());
    assert_eq!(finder.summary().empty_files, 2);
}

#[test]
fn test_every_file_is_accounted_for() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("empty"), "").unwrap();
    fs::write(dir.path().join("lonely"), "123456789").unwrap();
    fs::write(dir.path().join("same1"), "abc").unwrap();
    fs::write(dir.path().join("sub/same2"), "abc").unwrap();
    fs::write(dir.path().join("sub/other"), "abd").unwrap();

    let finder = finder(dir.path());
    let summary = finder.summary();
    assert_eq!(summary.total_files, 5);
    assert_eq!(summary.empty_files, 1);
    assert_eq!(summary.eliminated_by_size, 1);
    assert_eq!(summary.grouped_files, 2);
    assert_eq!(summary.unique_after_hash, 1);
    assert_eq!(
        summary.total_files,
        summary.empty_files
            + summary.eliminated_by_size
            + summary.failed_hashes
            + summary.unique_after_hash
            + summary.grouped_files
    );
}

#[test]
fn test_refresh_is_idempotent_without_changes() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a"), "same").unwrap();
    fs::write(dir.path().join("b"), "same").unwrap();
    fs::write(dir.path().join("c"), "").unwrap();

    let mut finder = finder(dir.path());
    let before = finder.result().clone();
    finder.refresh();
    finder.sort_duplicates_alphabetically();
    assert_eq!(finder.result(), &before);
}

#[test]
fn test_refresh_sees_new_files() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a"), "same").unwrap();

    let mut finder = finder(dir.path());
    assert!(!finder.result().has_duplicates());

    fs::write(dir.path().join("b"), "same").unwrap();
    finder.refresh();
    assert_eq!(finder.result().group_count(), 1);
}

#[test]
fn test_small_chunk_size_gives_same_groups() {
    let dir = TempDir::new().unwrap();
    let content = "0123456789".repeat(100);
    fs::write(dir.path().join("a"), &content).unwrap();
    fs::write(dir.path().join("b"), &content).unwrap();
    let mut altered = content.clone().into_bytes();
    altered[999] = b'x';
    fs::write(dir.path().join("c"), altered).unwrap();

    let default = finder(dir.path());
    let tiny = DuplicateFinder::scan_paths(
        [dir.path()],
        FinderConfig::default().with_chunk_size(7),
    )
    .unwrap();

    assert_eq!(tiny.chunk_size(), 7);
    assert_eq!(default.result().duplicates, tiny.result().duplicates);
    assert_eq!(tiny.result().group_count(), 1);
}

#[test]
fn test_zero_chunk_size_is_rejected() {
    let dir = TempDir::new().unwrap();
    let err = DuplicateFinder::scan_paths([dir.path()], FinderConfig::default().with_chunk_size(0))
        .unwrap_err();
    assert!(matches!(err, FinderError::InvalidChunkSize));
}

#[test]
fn test_missing_directory_is_rejected() {
    let dir = TempDir::new().unwrap();
    let err = DuplicateFinder::scan_paths([dir.path().join("missing")], FinderConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        FinderError::Resolve(ResolveError::InvalidPath { .. })
    ));
}

#[test]
fn test_file_argument_is_rejected() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("file");
    fs::write(&file, "x").unwrap();

    let err = DuplicateFinder::scan_paths([&file], FinderConfig::default()).unwrap_err();
    assert!(err.to_string().contains("not a directory"));
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_followed() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("real"), "content").unwrap();
    std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

    let finder = finder(dir.path());
    assert!(!finder.result().has_duplicates());
    assert_eq!(finder.summary().total_files, 1);
}
