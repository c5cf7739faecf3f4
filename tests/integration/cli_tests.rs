use clap::Parser;
use dupkeeper::cli::Cli;
use dupkeeper::error::ExitCode;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Fixture {
    _root: TempDir,
    cache: TempDir,
    a: PathBuf,
    b: PathBuf,
}

impl Fixture {
    /// `A` and `B` share `common.txt`; `A` also holds `only_a.txt`.
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let a = root.path().join("A");
        let b = root.path().join("B");
        fs::create_dir(&a).unwrap();
        fs::create_dir(&b).unwrap();
        fs::write(a.join("common.txt"), "shared content").unwrap();
        fs::write(b.join("common.txt"), "shared content").unwrap();
        fs::write(a.join("only_a.txt"), "unique to A").unwrap();
        Self {
            _root: root,
            cache: TempDir::new().unwrap(),
            a,
            b,
        }
    }

    fn run(&self, args: &[&str]) -> ExitCode {
        let mut argv: Vec<String> = vec![
            "dupkeeper".into(),
            "-q".into(),
            "--cache-dir".into(),
            path_arg(self.cache.path()),
            "--config".into(),
            path_arg(&self.cache.path().join("absent-config.toml")),
        ];
        argv.extend(args.iter().map(|s| (*s).to_string()));
        dupkeeper::run_app(Cli::try_parse_from(argv).unwrap()).unwrap()
    }

    fn dirs(&self) -> [String; 2] {
        [path_arg(&self.a), path_arg(&self.b)]
    }

    fn cache_entries(&self) -> usize {
        fs::read_dir(self.cache.path())
            .map(|rd| {
                rd.filter_map(Result::ok)
                    .filter(|e| e.file_name().to_string_lossy().ends_with(".json"))
                    .count()
            })
            .unwrap_or(0)
    }
}

fn path_arg(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

#[test]
fn test_find_stores_cache_entry() {
    let fx = Fixture::new();
    let [a, b] = fx.dirs();

    assert_eq!(fx.run(&["find-duplicates", &a, &b]), ExitCode::Success);
    assert_eq!(fx.cache_entries(), 1);
}

#[test]
fn test_find_without_duplicates_exits_no_duplicates() {
    let fx = Fixture::new();
    let a = path_arg(&fx.a);

    assert_eq!(
        fx.run(&["find-duplicates", &a, "--output", "json"]),
        ExitCode::NoDuplicates
    );
}

#[test]
fn test_show_uses_cache_and_misses_without_it() {
    let fx = Fixture::new();
    let [a, b] = fx.dirs();

    assert_eq!(fx.run(&["show-duplicates", &a, &b]), ExitCode::NoDuplicates);

    fx.run(&["find-duplicates", &a, &b]);
    assert_eq!(fx.run(&["show-duplicates", &a, &b]), ExitCode::Success);
    assert_eq!(fx.run(&["show-duplicates", &b, &a]), ExitCode::Success);
}

#[test]
fn test_dry_run_keeps_files_and_cache() {
    let fx = Fixture::new();
    let [a, b] = fx.dirs();
    fx.run(&["find-duplicates", &a, &b]);

    let code = fx.run(&["delete-duplicates", &a, &b, "--delete-dirs", &b, "-n"]);
    assert_eq!(code, ExitCode::Success);
    assert!(fx.b.join("common.txt").exists());
    assert_eq!(fx.cache_entries(), 1);
}

#[test]
fn test_real_deletion_invalidates_cache() {
    let fx = Fixture::new();
    let [a, b] = fx.dirs();
    fx.run(&["find-duplicates", &a, &b]);

    let code = fx.run(&["delete-duplicates", &a, &b, "--delete-dirs", &b]);
    assert_eq!(code, ExitCode::Success);
    assert!(!fx.b.join("common.txt").exists());
    assert!(fx.a.join("common.txt").exists());
    assert_eq!(fx.cache_entries(), 0);
    assert_eq!(fx.run(&["show-duplicates", &a, &b]), ExitCode::NoDuplicates);
}

#[test]
fn test_delete_reuses_fresh_cache_entry() {
    let fx = Fixture::new();
    let [a, b] = fx.dirs();
    fx.run(&["find-duplicates", &a, &b]);

    // Not in the cached result, so a reused result cannot select it.
    fs::write(fx.b.join("late.txt"), "shared content").unwrap();

    fx.run(&["delete-duplicates", &a, &b, "--delete-dirs", &b]);
    assert!(!fx.b.join("common.txt").exists());
    assert!(fx.b.join("late.txt").exists());
}

#[test]
fn test_delete_with_rescan_ignores_cache() {
    let fx = Fixture::new();
    let [a, b] = fx.dirs();
    fx.run(&["find-duplicates", &a, &b]);

    fs::write(fx.b.join("late.txt"), "shared content").unwrap();

    fx.run(&["delete-duplicates", &a, &b, "--delete-dirs", &b, "--rescan"]);
    assert!(!fx.b.join("common.txt").exists());
    assert!(!fx.b.join("late.txt").exists());
    assert!(fx.a.join("common.txt").exists());
}

#[test]
fn test_delete_without_cache_scans_first() {
    let fx = Fixture::new();
    let [a, b] = fx.dirs();

    let code = fx.run(&["delete-duplicates", &a, &b, "--delete-dirs", &a, &b]);
    assert_eq!(code, ExitCode::Success);
    // The smaller path survives when every copy is targeted.
    assert!(fx.a.join("common.txt").exists());
    assert!(!fx.b.join("common.txt").exists());
    assert_eq!(fx.cache_entries(), 0);
}

#[test]
fn test_vanished_file_gives_partial_failure() {
    let fx = Fixture::new();
    let [a, b] = fx.dirs();
    fs::write(fx.a.join("x1"), "xxx").unwrap();
    fs::write(fx.b.join("x2"), "xxx").unwrap();
    fx.run(&["find-duplicates", &a, &b]);

    fs::remove_file(fx.b.join("x2")).unwrap();

    let code = fx.run(&["delete-duplicates", &a, &b, "--delete-dirs", &b]);
    assert_eq!(code, ExitCode::PartialFailure);
    assert!(!fx.b.join("common.txt").exists());
    assert_eq!(fx.cache_entries(), 0);
}

#[test]
fn test_clear_cache_removes_entries() {
    let fx = Fixture::new();
    let [a, b] = fx.dirs();
    fx.run(&["find-duplicates", &a, &b]);
    fx.run(&["find-duplicates", &a]);
    assert_eq!(fx.cache_entries(), 2);

    assert_eq!(fx.run(&["clear-cache"]), ExitCode::Success);
    assert_eq!(fx.cache_entries(), 0);
}
