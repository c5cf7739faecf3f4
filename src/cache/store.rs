//! Result cache storage.
//!
//! Entries live as individual files directly under the cache root, named
//! `<fingerprint>-<pid>-<nanos>.json`. The fingerprint prefix groups all
//! entries for one directory set; the suffix is unique per writer.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use super::entry::{self, CachedResult};
use super::{CacheError, CacheResult};
use crate::duplicates::ScanResult;
use crate::scanner::DirectorySet;

/// Maximum age of an entry shown by `show-duplicates`.
pub const SHOW_THRESHOLD: Duration = Duration::from_secs(24 * 60 * 60);
/// Maximum age of an entry reused before deleting.
pub const REUSE_THRESHOLD: Duration = Duration::from_secs(60 * 60);

const FINGERPRINT_LEN: usize = 16;
const ENTRY_EXTENSION: &str = ".json";

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Stable identifier of a directory set.
///
/// SHA-256 of the sorted canonical paths joined by newlines, truncated to
/// 16 hex characters. Input order and spelling do not matter because the
/// set is already canonical and sorted.
///
/// # Example
///
/// ```no_run
/// use dupkeeper::cache::fingerprint;
/// use dupkeeper::scanner::DirectorySet;
///
/// let a = DirectorySet::resolve(["/tmp", "/var"]).unwrap();
/// let b = DirectorySet::resolve(["/var", "/tmp/."]).unwrap();
/// assert_eq!(fingerprint(&a), fingerprint(&b));
/// ```
#[must_use]
pub fn fingerprint(dirs: &DirectorySet) -> String {
    let joined = dirs
        .iter()
        .map(|p| p.to_string_lossy())
        .collect::<Vec<_>>()
        .join("\n");
    let mut digest = sha256_hex(joined.as_bytes());
    digest.truncate(FINGERPRINT_LEN);
    digest
}

/// Whether `name` looks like an entry file, returning its fingerprint.
fn entry_fingerprint(name: &str) -> Option<&str> {
    if !name.ends_with(ENTRY_EXTENSION) || name.len() <= FINGERPRINT_LEN {
        return None;
    }
    let (prefix, rest) = name.split_at_checked(FINGERPRINT_LEN)?;
    if !prefix.bytes().all(|b| b.is_ascii_hexdigit()) || !rest.starts_with('-') {
        return None;
    }
    Some(prefix)
}

/// Files removed (and not removed) by a cleanup.
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Entry files that were deleted.
    pub removed: Vec<PathBuf>,
    /// Entry files that could not be deleted.
    pub failed: Vec<(PathBuf, io::Error)>,
}

impl CleanupReport {
    /// Whether any removal failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Cache of scan results rooted at one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultCache {
    root: PathBuf,
}

impl ResultCache {
    /// Cache rooted at `root`. Nothing is created until the first store.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Per-user default root under the system temp directory.
    ///
    /// The directory name carries a digest of the user name, taken from
    /// `USER` or `USERNAME`.
    #[must_use]
    pub fn default_root() -> PathBuf {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown_user".to_string());
        let digest = sha256_hex(user.as_bytes());
        std::env::temp_dir().join(format!("dupkeeper_{}", &digest[..FINGERPRINT_LEN]))
    }

    /// The cache root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Persist `result`, replacing older entries for the same directories.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Io`] if the root cannot be created or the
    /// entry cannot be written, and [`CacheError::Serialize`] if encoding
    /// fails.
    pub fn store(&self, result: &ScanResult) -> CacheResult<PathBuf> {
        self.ensure_root()?;

        let fp = fingerprint(&result.directories);
        let text = entry::encode(&CachedResult::from_scan(result, &fp))?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let path = self
            .root
            .join(format!("{}-{}-{}{}", fp, std::process::id(), nanos, ENTRY_EXTENSION));

        let io_err = |source: io::Error| CacheError::Io {
            path: path.clone(),
            source,
        };
        let mut tmp = NamedTempFile::new_in(&self.root).map_err(io_err)?;
        tmp.write_all(text.as_bytes()).map_err(io_err)?;
        tmp.persist(&path).map_err(|e| io_err(e.error))?;

        let pruned = self.remove_entries(Some(&fp), Some(&path));
        if !pruned.removed.is_empty() {
            log::debug!("Pruned {} older cache entr(ies) for {}", pruned.removed.len(), fp);
        }

        log::info!("Stored scan result in cache: {}", path.display());
        Ok(path)
    }

    /// Newest stored result for `dirs` no older than `threshold`.
    ///
    /// Unreadable, corrupt or mismatched entries count as absent.
    #[must_use]
    pub fn lookup(&self, dirs: &DirectorySet, threshold: Duration) -> Option<ScanResult> {
        let fp = fingerprint(dirs);
        let (path, modified) = self
            .entries(Some(&fp))
            .into_iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)))?;

        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age > threshold {
            log::debug!(
                "Cache entry {} is {}s old, threshold {}s",
                path.display(),
                age.as_secs(),
                threshold.as_secs()
            );
            return None;
        }

        match read_entry(&path, dirs, &fp) {
            Ok(result) => Some(result),
            Err(e) => {
                log::warn!("Ignoring unusable cache entry {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Remove every entry for `dirs`.
    pub fn invalidate(&self, dirs: &DirectorySet) -> CleanupReport {
        let fp = fingerprint(dirs);
        let report = self.remove_entries(Some(&fp), None);
        log::debug!("Invalidated {} cache entr(ies) for {}", report.removed.len(), fp);
        report
    }

    /// Remove every entry under the root.
    pub fn clear_all(&self) -> CleanupReport {
        self.remove_entries(None, None)
    }

    fn ensure_root(&self) -> CacheResult<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(&self.root).map_err(|source| CacheError::Io {
            path: self.root.clone(),
            source,
        })
    }

    /// Entry files with their modification times, optionally for one
    /// fingerprint only.
    fn entries(&self, fp: Option<&str>) -> Vec<(PathBuf, SystemTime)> {
        let read_dir = match fs::read_dir(&self.root) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                log::warn!("Cannot read cache root {}: {}", self.root.display(), e);
                return Vec::new();
            }
        };

        read_dir
            .filter_map(Result::ok)
            .filter(|entry| {
                let name = entry.file_name();
                match (name.to_str().and_then(entry_fingerprint), fp) {
                    (Some(found), Some(wanted)) => found == wanted,
                    (Some(_), None) => true,
                    (None, _) => false,
                }
            })
            .filter_map(|entry| {
                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }
                Some((entry.path(), metadata.modified().ok()?))
            })
            .collect()
    }

    fn remove_entries(&self, fp: Option<&str>, keep: Option<&Path>) -> CleanupReport {
        let mut report = CleanupReport::default();
        for (path, _) in self.entries(fp) {
            if Some(path.as_path()) == keep {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => report.removed.push(path),
                // Another process got there first.
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    log::warn!("Failed to remove cache entry {}: {}", path.display(), e);
                    report.failed.push((path, e));
                }
            }
        }
        report
    }
}

fn read_entry(path: &Path, dirs: &DirectorySet, fp: &str) -> CacheResult<ScanResult> {
    let text = fs::read_to_string(path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cached = entry::decode(&text)?;
    if cached.fingerprint != fp {
        return Err(CacheError::Corrupt(format!(
            "fingerprint {} does not match {}",
            cached.fingerprint, fp
        )));
    }
    log::debug!(
        "Using cache entry {} created at {}",
        path.display(),
        cached.created_at.to_rfc3339()
    );
    cached.into_scan(dirs)
}
