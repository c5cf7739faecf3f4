use dupkeeper::cache::{ResultCache, REUSE_THRESHOLD, SHOW_THRESHOLD};
use dupkeeper::duplicates::{DuplicateFinder, FinderConfig};
use dupkeeper::scanner::DirectorySet;
use filetime::FileTime;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn populate(dir: &Path) {
    fs::write(dir.join("a.txt"), "cached duplicate").unwrap();
    fs::write(dir.join("b.txt"), "cached duplicate").unwrap();
    fs::write(dir.join("empty"), "").unwrap();
}

fn set_age(path: &Path, secs: i64) {
    let then = FileTime::from_unix_time(FileTime::now().unix_seconds() - secs, 0);
    filetime::set_file_mtime(path, then).unwrap();
}

#[test]
fn test_find_then_show_round_trip() {
    let data = TempDir::new().unwrap();
    let cache_root = TempDir::new().unwrap();
    populate(data.path());

    let cache = ResultCache::new(cache_root.path());
    let mut finder = DuplicateFinder::scan_paths([data.path()], FinderConfig::default()).unwrap();
    finder.sort_duplicates_alphabetically();
    cache.store(finder.result()).unwrap();

    let dirs = DirectorySet::resolve([data.path()]).unwrap();
    let cached = cache.lookup(&dirs, SHOW_THRESHOLD).unwrap();
    assert_eq!(&cached, finder.result());
}

#[test]
fn test_lookup_respects_threshold() {
    let data = TempDir::new().unwrap();
    let cache_root = TempDir::new().unwrap();
    populate(data.path());

    let cache = ResultCache::new(cache_root.path());
    let finder = DuplicateFinder::scan_paths([data.path()], FinderConfig::default()).unwrap();
    let entry = cache.store(finder.result()).unwrap();
    let dirs = DirectorySet::resolve([data.path()]).unwrap();

    set_age(&entry, 50 * 60);
    let fresh = cache.lookup(&dirs, REUSE_THRESHOLD);
    assert_eq!(fresh.as_ref(), Some(finder.result()));

    set_age(&entry, 61 * 60);
    assert!(cache.lookup(&dirs, REUSE_THRESHOLD).is_none());
    assert!(cache.lookup(&dirs, SHOW_THRESHOLD).is_some());

    set_age(&entry, 25 * 60 * 60);
    assert!(cache.lookup(&dirs, SHOW_THRESHOLD).is_none());
}

#[test]
fn test_lookup_uses_any_spelling_of_directories() {
    let data = TempDir::new().unwrap();
    let other = TempDir::new().unwrap();
    let cache_root = TempDir::new().unwrap();
    populate(data.path());
    fs::create_dir(data.path().join("sub")).unwrap();

    let cache = ResultCache::new(cache_root.path());
    let finder =
        DuplicateFinder::scan_paths([data.path(), other.path()], FinderConfig::default()).unwrap();
    cache.store(finder.result()).unwrap();

    let respelled =
        DirectorySet::resolve([other.path().to_path_buf(), data.path().join("sub/..")]).unwrap();
    assert!(cache.lookup(&respelled, SHOW_THRESHOLD).is_some());

    let subset = DirectorySet::resolve([data.path()]).unwrap();
    assert!(cache.lookup(&subset, SHOW_THRESHOLD).is_none());
}

#[test]
fn test_store_replaces_previous_entry() {
    let data = TempDir::new().unwrap();
    let cache_root = TempDir::new().unwrap();
    populate(data.path());

    let cache = ResultCache::new(cache_root.path());
    let mut finder = DuplicateFinder::scan_paths([data.path()], FinderConfig::default()).unwrap();
    let first = cache.store(finder.result()).unwrap();

    fs::write(data.path().join("c.txt"), "cached duplicate").unwrap();
    finder.refresh();
    finder.sort_duplicates_alphabetically();
    let second = cache.store(finder.result()).unwrap();

    assert!(!first.exists());
    assert!(second.exists());
    let dirs = DirectorySet::resolve([data.path()]).unwrap();
    let cached = cache.lookup(&dirs, SHOW_THRESHOLD).unwrap();
    assert_eq!(cached.groups().next().unwrap().paths.len(), 3);
}

#[test]
fn test_invalidate_only_touches_its_directories() {
    let one = TempDir::new().unwrap();
    let two = TempDir::new().unwrap();
    let cache_root = TempDir::new().unwrap();
    populate(one.path());
    populate(two.path());

    let cache = ResultCache::new(cache_root.path());
    for dir in [one.path(), two.path()] {
        let finder = DuplicateFinder::scan_paths([dir], FinderConfig::default()).unwrap();
        cache.store(finder.result()).unwrap();
    }

    let one_dirs = DirectorySet::resolve([one.path()]).unwrap();
    let two_dirs = DirectorySet::resolve([two.path()]).unwrap();
    let report = cache.invalidate(&one_dirs);

    assert_eq!(report.removed.len(), 1);
    assert!(cache.lookup(&one_dirs, SHOW_THRESHOLD).is_none());
    assert!(cache.lookup(&two_dirs, SHOW_THRESHOLD).is_some());

    let report = cache.clear_all();
    assert_eq!(report.removed.len(), 1);
    assert!(!report.has_failures());
    assert!(cache.lookup(&two_dirs, SHOW_THRESHOLD).is_none());
}

#[test]
fn test_cached_result_drives_deletion() {
    let data = TempDir::new().unwrap();
    let cache_root = TempDir::new().unwrap();
    populate(data.path());

    let cache = ResultCache::new(cache_root.path());
    let finder = DuplicateFinder::scan_paths([data.path()], FinderConfig::default()).unwrap();
    cache.store(finder.result()).unwrap();

    let dirs = DirectorySet::resolve([data.path()]).unwrap();
    let cached = cache.lookup(&dirs, Duration::from_secs(60)).unwrap();
    let finder = DuplicateFinder::from_result(cached, FinderConfig::default());
    assert_eq!(finder.result().group_count(), 1);
    assert_eq!(finder.empty_files().len(), 1);
    assert_eq!(finder.summary().duplicate_files, 1);
}

#[cfg(unix)]
#[test]
fn test_non_utf8_file_name_survives_store_and_lookup() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let data = TempDir::new().unwrap();
    let cache_root = TempDir::new().unwrap();
    let odd_name = OsStr::from_bytes(b"bad\xffname");
    fs::write(data.path().join("ok.txt"), "same bytes").unwrap();
    fs::write(data.path().join(odd_name), "same bytes").unwrap();

    let cache = ResultCache::new(cache_root.path());
    let finder = DuplicateFinder::scan_paths([data.path()], FinderConfig::default()).unwrap();
    assert_eq!(finder.result().group_count(), 1);
    cache.store(finder.result()).unwrap();

    let dirs = DirectorySet::resolve([data.path()]).unwrap();
    let cached = cache.lookup(&dirs, SHOW_THRESHOLD).unwrap();
    assert_eq!(&cached, finder.result());
    let group = cached.groups().next().unwrap();
    assert!(group.paths.iter().any(|p| p.file_name() == Some(odd_name)));
}
