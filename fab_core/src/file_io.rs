//! # File I/O Module
//!
//! Order files live on a shared shop drive, so saving and loading come with
//! safety features:
//! - **Atomic saves**: write to .tmp, fsync, rename, so a killed process
//!   never leaves a half-written order
//! - **File locking**: an OS-level lock plus a visible `.sfo.lock` metadata
//!   file stop two operators from editing the same order
//! - **Version validation**: schema compatibility is checked on load
//!
//! ## File Format
//!
//! Orders are saved as `.sfo` files containing pretty-printed JSON. Lock
//! files use the `.sfo.lock` extension and record who holds the lock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use fab_core::file_io::{save_order, load_order, FileLock};
//! use fab_core::order::Order;
//! use std::path::Path;
//!
//! let order = Order::new("Riverside Apartments", NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(), None);
//! let path = Path::new("riverside.sfo");
//!
//! let lock = FileLock::acquire(path, "counter-1")?;
//! save_order(&order, path)?;
//! drop(lock); // releases the lock
//! # Ok::<(), fab_core::errors::FabError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::{FabError, FabResult};
use crate::order::{Order, OrderStatus, SCHEMA_VERSION};

/// File extension for order files (without the dot)
pub const ORDER_EXTENSION: &str = "sfo";

/// Lock file metadata stored in .sfo.lock files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Operator identifier (login or station name)
    pub user_id: String,
    /// Machine name where the lock was acquired
    pub machine: String,
    /// Process ID that holds the lock
    pub pid: u32,
    /// When the lock was acquired
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    /// Create new lock info for the current process
    pub fn new(user_id: impl Into<String>) -> Self {
        LockInfo {
            user_id: user_id.into(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME")
            .ok()
            .or_else(|| std::env::var("HOST").ok())
    }
}

/// File lock guard that releases the lock when dropped.
///
/// Two layers: an OS-level exclusive lock (via fs2) for process safety, and
/// a `.lock` metadata file so another operator can see who is editing.
#[derive(Debug)]
pub struct FileLock {
    /// Path to the order file
    order_path: PathBuf,
    /// Path to the lock file
    lock_path: PathBuf,
    /// The underlying file handle (keeps the OS lock alive)
    _lock_file: File,
    /// Lock metadata
    pub info: LockInfo,
}

impl FileLock {
    /// Acquire an exclusive lock on an order file.
    ///
    /// # Returns
    ///
    /// * `Ok(FileLock)` - Lock acquired
    /// * `Err(FabError::FileLocked)` - Another operator holds the lock
    pub fn acquire(path: &Path, user_id: impl Into<String>) -> FabResult<Self> {
        let lock_path = lock_path_for(path);
        let info = LockInfo::new(user_id);

        if lock_path.exists() {
            if let Ok(existing) = read_lock_info(&lock_path) {
                if !is_lock_stale(&existing) {
                    return Err(FabError::file_locked(
                        path.display().to_string(),
                        format!("{} ({})", existing.user_id, existing.machine),
                        existing.locked_at.to_rfc3339(),
                    ));
                }
                warn!(
                    "taking over stale lock on {} (held by {} since {})",
                    path.display(),
                    existing.user_id,
                    existing.locked_at.to_rfc3339()
                );
            }
        }

        let mut lock_file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .map_err(|e| {
                FabError::file_error("create lock", lock_path.display().to_string(), e.to_string())
            })?;

        // Non-blocking: an operator waiting on a lock should see who has it,
        // not hang.
        lock_file.try_lock_exclusive().map_err(|_| {
            FabError::file_locked(
                path.display().to_string(),
                "another process".to_string(),
                "unknown".to_string(),
            )
        })?;

        let lock_json =
            serde_json::to_string_pretty(&info).map_err(|e| FabError::SerializationError {
                reason: e.to_string(),
            })?;

        lock_file.write_all(lock_json.as_bytes()).map_err(|e| {
            FabError::file_error("write lock", lock_path.display().to_string(), e.to_string())
        })?;

        lock_file.sync_all().map_err(|e| {
            FabError::file_error("sync lock", lock_path.display().to_string(), e.to_string())
        })?;

        Ok(FileLock {
            order_path: path.to_path_buf(),
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Check if an order file is locked without acquiring the lock.
    ///
    /// Returns `Some(LockInfo)` if locked, `None` if available.
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = lock_path_for(path);
        if lock_path.exists() {
            if let Ok(info) = read_lock_info(&lock_path) {
                if !is_lock_stale(&info) {
                    return Some(info);
                }
            }
        }
        None
    }

    /// Path to the order file this lock guards
    pub fn order_path(&self) -> &Path {
        &self.order_path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // The OS lock releases with the handle; the metadata file goes too.
        let _ = fs::remove_file(&self.lock_path);
    }
}

fn lock_path_for(order_path: &Path) -> PathBuf {
    let mut lock_path = order_path.to_path_buf();
    let extension = lock_path
        .extension()
        .map(|e| format!("{}.lock", e.to_string_lossy()))
        .unwrap_or_else(|| "lock".to_string());
    lock_path.set_extension(extension);
    lock_path
}

fn read_lock_info(lock_path: &Path) -> FabResult<LockInfo> {
    let mut file = File::open(lock_path).map_err(|e| {
        FabError::file_error("read lock", lock_path.display().to_string(), e.to_string())
    })?;

    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|e| {
        FabError::file_error("read lock", lock_path.display().to_string(), e.to_string())
    })?;

    serde_json::from_str(&contents).map_err(|e| FabError::SerializationError {
        reason: e.to_string(),
    })
}

/// A lock is stale when its process is gone (same machine) or it is more
/// than a day old (crashed machine on the shared drive).
fn is_lock_stale(info: &LockInfo) -> bool {
    if let Some(our_machine) = hostname() {
        if info.machine == our_machine {
            #[cfg(unix)]
            {
                if fs::metadata(format!("/proc/{}", info.pid)).is_err() {
                    return true;
                }
            }
            #[cfg(windows)]
            {
                use std::process::Command;
                let output = Command::new("tasklist")
                    .args(["/FI", &format!("PID eq {}", info.pid), "/NH"])
                    .output();
                if let Ok(output) = output {
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    if stdout.contains("No tasks") || !stdout.contains(&info.pid.to_string()) {
                        return true;
                    }
                }
            }
        }
    }

    let age = Utc::now() - info.locked_at;
    age.num_hours() > 24
}

/// Save an order to a file with atomic write semantics.
///
/// Serialize → write `.sfo.tmp` → fsync → rename. A crash mid-save leaves
/// the previous file intact.
pub fn save_order(order: &Order, path: &Path) -> FabResult<()> {
    let json = serde_json::to_string_pretty(order).map_err(|e| FabError::SerializationError {
        reason: e.to_string(),
    })?;

    let tmp_path = path.with_extension(format!("{}.tmp", ORDER_EXTENSION));

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        FabError::file_error(
            "create temp file",
            tmp_path.display().to_string(),
            e.to_string(),
        )
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        FabError::file_error(
            "write temp file",
            tmp_path.display().to_string(),
            e.to_string(),
        )
    })?;

    tmp_file.sync_all().map_err(|e| {
        FabError::file_error(
            "sync temp file",
            tmp_path.display().to_string(),
            e.to_string(),
        )
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        FabError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    debug!("saved order to {}", path.display());
    Ok(())
}

/// Load an order from a file.
///
/// # Returns
///
/// * `Ok(Order)` - Successfully loaded order
/// * `Err(FabError::VersionMismatch)` - File schema is incompatible
/// * `Err(FabError::SerializationError)` - Invalid JSON
/// * `Err(FabError::FileError)` - I/O error
pub fn load_order(path: &Path) -> FabResult<Order> {
    let mut file = File::open(path)
        .map_err(|e| FabError::file_error("open", path.display().to_string(), e.to_string()))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| FabError::file_error("read", path.display().to_string(), e.to_string()))?;

    let order: Order =
        serde_json::from_str(&contents).map_err(|e| FabError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), e),
        })?;

    validate_version(&order.meta.version)?;

    Ok(order)
}

/// Load an order, also reporting whether another operator holds its lock.
///
/// # Returns
///
/// * `Ok((Order, None))` - Loaded, no lock
/// * `Ok((Order, Some(LockInfo)))` - Loaded, but treat as read-only
pub fn load_order_with_lock_check(path: &Path) -> FabResult<(Order, Option<LockInfo>)> {
    let order = load_order(path)?;
    let lock_info = FileLock::check(path);
    Ok((order, lock_info))
}

/// Lightweight order summary for directory listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub path: PathBuf,
    pub site_name: String,
    pub start_date: NaiveDate,
    pub status: OrderStatus,
    pub item_count: usize,
}

/// Scan a directory for `.sfo` files and summarize each order.
///
/// Unreadable or incompatible files are skipped with a warning rather than
/// failing the whole listing; results are sorted by start date.
pub fn list_orders(dir: &Path) -> FabResult<Vec<OrderSummary>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        FabError::file_error("read directory", dir.display().to_string(), e.to_string())
    })?;

    let mut summaries = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(ORDER_EXTENSION) {
            continue;
        }
        match load_order(&path) {
            Ok(order) => summaries.push(OrderSummary {
                site_name: order.meta.site_name.clone(),
                start_date: order.meta.start_date,
                status: order.status,
                item_count: order.item_count(),
                path,
            }),
            Err(e) => warn!("skipping {}: {}", path.display(), e),
        }
    }

    summaries.sort_by_key(|s| s.start_date);
    Ok(summaries)
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> FabResult<()> {
    let file_parts: Vec<u32> = file_version
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(FabError::VersionMismatch {
            file_version: file_version.to_string(),
            expected_version: SCHEMA_VERSION.to_string(),
        });
    }

    // Major version must match.
    if file_parts[0] != current_parts[0] {
        return Err(FabError::VersionMismatch {
            file_version: file_version.to_string(),
            expected_version: SCHEMA_VERSION.to_string(),
        });
    }

    // In 0.x, a newer minor means the file may use fields we don't know.
    if current_parts[0] == 0
        && file_parts.len() > 1
        && current_parts.len() > 1
        && file_parts[1] > current_parts[1]
    {
        return Err(FabError::VersionMismatch {
            file_version: file_version.to_string(),
            expected_version: SCHEMA_VERSION.to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_order() -> Order {
        Order::new(
            "Test Site",
            NaiveDate::from_ymd_opt(2026, 8, 1).unwrap(),
            None,
        )
    }

    #[test]
    fn test_lock_path_generation() {
        let order_path = Path::new("/orders/riverside.sfo");
        assert_eq!(
            lock_path_for(order_path),
            Path::new("/orders/riverside.sfo.lock")
        );
    }

    #[test]
    fn test_lock_info_creation() {
        let info = LockInfo::new("counter-1");
        assert_eq!(info.user_id, "counter-1");
        assert!(info.pid > 0);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundtrip.sfo");

        save_order(&test_order(), &path).unwrap();

        let loaded = load_order(&path).unwrap();
        assert_eq!(loaded.meta.site_name, "Test Site");
        assert_eq!(loaded.status, OrderStatus::Pending);
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atomic.sfo");
        let tmp_path = path.with_extension("sfo.tmp");

        save_order(&test_order(), &path).unwrap();

        assert!(!tmp_path.exists());
        assert!(path.exists());
    }

    #[test]
    fn test_file_lock_acquire_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locked.sfo");
        File::create(&path).unwrap();

        let lock = FileLock::acquire(&path, "counter-1").unwrap();
        assert_eq!(lock.info.user_id, "counter-1");

        let lock_path = lock_path_for(&path);
        assert!(lock_path.exists());

        drop(lock);
        assert!(!lock_path.exists());
    }

    #[test]
    fn test_load_with_lock_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lock_check.sfo");

        save_order(&test_order(), &path).unwrap();

        let (loaded, lock_info) = load_order_with_lock_check(&path).unwrap();
        assert_eq!(loaded.meta.site_name, "Test Site");
        assert!(lock_info.is_none());
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.5").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }

    #[test]
    fn test_list_orders_skips_non_order_files() {
        let dir = tempfile::tempdir().unwrap();

        let mut first = test_order();
        first.rename("Alpha Site");
        save_order(&first, &dir.path().join("alpha.sfo")).unwrap();

        let mut second = Order::new(
            "Beta Site",
            NaiveDate::from_ymd_opt(2026, 7, 15).unwrap(),
            None,
        );
        second.set_status(OrderStatus::Completed);
        save_order(&second, &dir.path().join("beta.sfo")).unwrap();

        fs::write(dir.path().join("notes.txt"), "not an order").unwrap();
        fs::write(dir.path().join("broken.sfo"), "{not json").unwrap();

        let summaries = list_orders(dir.path()).unwrap();
        assert_eq!(summaries.len(), 2);
        // Sorted by start date: Beta (July) before Alpha (August).
        assert_eq!(summaries[0].site_name, "Beta Site");
        assert_eq!(summaries[0].status, OrderStatus::Completed);
        assert_eq!(summaries[1].site_name, "Alpha Site");
    }
}
