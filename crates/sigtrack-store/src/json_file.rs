//! A file-resident, ordered, append-only JSON array.
//!
//! [`JsonArrayFile`] is the single owner of its backing file.
//!
//! - Writes go to a sibling `<name>.tmp`, are fsynced, then renamed over the
//!   target, so readers only ever see a complete array.
//! - Every write holds an exclusive `fs2` lock on a sibling `<name>.lock`.
//!   The lock is per open file, so it serialises appends across processes and
//!   across handles in one process, however the path is spelled.
//! - An unreadable file is renamed to `<name>.corrupt-<timestamp>` before an
//!   append replaces it. History is never overwritten in place.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::StoreError;

/// Outcome of a best-effort storage operation.
///
/// Storage faults are not raised: the operation produces a usable `value`
/// (for example an empty history after a failed read) and reports the fault
/// alongside it so callers can still tell "nothing stored" from "could not
/// read".
#[derive(Debug)]
pub struct BestEffort<T> {
    pub value: T,
    pub fault: Option<StoreError>,
}

impl<T> BestEffort<T> {
    #[must_use]
    pub fn ok(value: T) -> Self {
        Self { value, fault: None }
    }

    #[must_use]
    pub fn degraded(value: T, fault: StoreError) -> Self {
        Self {
            value,
            fault: Some(fault),
        }
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.fault.is_some()
    }

    /// For a write: true when the new data reached disk, even if reading the
    /// previous contents failed.
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        self.fault.as_ref().is_none_or(StoreError::is_read_fault)
    }

    /// Convert into a strict result, discarding the fallback value on fault.
    ///
    /// # Errors
    ///
    /// Returns the recorded [`StoreError`] if the operation was degraded.
    pub fn into_result(self) -> Result<T, StoreError> {
        match self.fault {
            Some(err) => Err(err),
            None => Ok(self.value),
        }
    }
}

/// Exclusive lock on a sidecar file, released on drop.
struct FileLock {
    file: File,
}

impl FileLock {
    async fn acquire(lock_path: PathBuf) -> std::io::Result<Self> {
        tokio::task::spawn_blocking(move || {
            if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock_path)?;
            file.lock_exclusive()?;
            Ok(Self { file })
        })
        .await
        .map_err(std::io::Error::other)?
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

pub struct JsonArrayFile<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonArrayFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full array.
    ///
    /// A missing or blank file is an empty array. Reads take no lock: the
    /// file is only ever replaced by rename.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the file exists but cannot be read, or
    /// [`StoreError::Parse`] if it is not a JSON array of `T`.
    pub async fn load(&self) -> Result<Vec<T>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| StoreError::Parse {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Replace the file with `items`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Lock`] if the write lock cannot be taken,
    /// [`StoreError::Serialize`] if the items cannot be encoded, or
    /// [`StoreError::Write`] if the directory, temp file, or rename fails.
    pub async fn save(&self, items: &[T]) -> Result<(), StoreError> {
        let _lock = self.lock().await?;
        self.write_atomic(items).await
    }

    /// Append one item and return the new length.
    ///
    /// The load → push → save cycle runs under the write lock. If the
    /// previous contents cannot be read, the file is set aside and the append
    /// starts a fresh array; the read fault is carried in
    /// [`BestEffort::fault`] and [`BestEffort::is_persisted`] stays true.
    /// If the lock cannot be taken or the file cannot be set aside, nothing is
    /// written and the value is 0.
    pub async fn append(&self, item: T) -> BestEffort<usize> {
        let _lock = match self.lock().await {
            Ok(lock) => lock,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "failed to lock records");
                return BestEffort::degraded(0, e);
            }
        };

        let (mut items, read_fault) = match self.load().await {
            Ok(items) => (items, None),
            Err(e) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to load records; setting the file aside"
                );
                match self.set_aside().await {
                    Ok(kept) => {
                        tracing::warn!(kept = %kept.display(), "unreadable records preserved");
                    }
                    Err(set_aside_err) => {
                        tracing::error!(
                            path = %self.path.display(),
                            error = %set_aside_err,
                            "failed to set unreadable records aside; not writing"
                        );
                        return BestEffort::degraded(0, set_aside_err);
                    }
                }
                (Vec::new(), Some(e))
            }
        };

        items.push(item);
        let count = items.len();

        match self.write_atomic(&items).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), count, "saved records");
                BestEffort {
                    value: count,
                    fault: read_fault,
                }
            }
            Err(e) => {
                tracing::error!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to save records"
                );
                BestEffort::degraded(count, e)
            }
        }
    }

    async fn lock(&self) -> Result<FileLock, StoreError> {
        FileLock::acquire(self.sibling(".lock"))
            .await
            .map_err(|source| StoreError::Lock {
                path: self.path.clone(),
                source,
            })
    }

    /// Caller must hold the write lock.
    async fn write_atomic(&self, items: &[T]) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }

        let mut body = serde_json::to_vec_pretty(items).map_err(|e| StoreError::Serialize {
            path: self.path.clone(),
            source: e,
        })?;
        body.push(b'\n');

        let tmp = self.sibling(".tmp");
        let mut file = tokio::fs::File::create(&tmp).await.map_err(write_err)?;
        file.write_all(&body).await.map_err(write_err)?;
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_err(e));
        }
        Ok(())
    }

    /// Rename the current file to `<name>.corrupt-<timestamp>`.
    ///
    /// Caller must hold the write lock.
    async fn set_aside(&self) -> Result<PathBuf, StoreError> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S%.6fZ");
        let kept = self.sibling(&format!(".corrupt-{stamp}"));
        tokio::fs::rename(&self.path, &kept)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        Ok(kept)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_in(dir: &tempfile::TempDir, name: &str) -> JsonArrayFile<String> {
        JsonArrayFile::new(dir.path().join(name))
    }

    fn set_aside_files(dir: &Path, name: &str) -> Vec<PathBuf> {
        let prefix = format!("{name}.corrupt-");
        std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(&prefix))
            })
            .collect()
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = file_in(&dir, "absent.json");
        assert!(file.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("blank.json"), "  \n").unwrap();
        let file = file_in(&dir, "blank.json");
        assert!(file.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let file = file_in(&dir, "bad.json");
        let err = file.load().await.unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
        assert!(err.is_read_fault());
    }

    #[tokio::test]
    async fn save_creates_missing_directories_and_pretty_prints() {
        let dir = tempfile::tempdir().unwrap();
        let file: JsonArrayFile<String> =
            JsonArrayFile::new(dir.path().join("nested/deeper/items.json"));
        file.save(&["a".to_string(), "b".to_string()]).await.unwrap();

        let raw = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(raw, "[\n  \"a\",\n  \"b\"\n]\n");
        assert!(
            !dir.path().join("nested/deeper/items.json.tmp").exists(),
            "temp file should be renamed away"
        );
        assert!(dir.path().join("nested/deeper/items.json.lock").exists());
    }

    #[tokio::test]
    async fn append_preserves_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let file = file_in(&dir, "order.json");
        for (i, word) in ["one", "two", "three"].into_iter().enumerate() {
            let outcome = file.append(word.to_string()).await;
            assert!(!outcome.is_degraded());
            assert_eq!(outcome.value, i + 1);
        }
        assert_eq!(file.load().await.unwrap(), vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn append_over_corrupt_file_keeps_the_old_contents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("corrupt.json"), "[1, 2,").unwrap();
        let file = file_in(&dir, "corrupt.json");

        let outcome = file.append("fresh".to_string()).await;
        assert_eq!(outcome.value, 1);
        assert!(matches!(outcome.fault, Some(StoreError::Parse { .. })));
        assert!(outcome.is_persisted());
        assert_eq!(file.load().await.unwrap(), vec!["fresh"]);

        let kept = set_aside_files(dir.path(), "corrupt.json");
        assert_eq!(kept.len(), 1, "expected one set-aside file, got {kept:?}");
        assert_eq!(std::fs::read_to_string(&kept[0]).unwrap(), "[1, 2,");
    }

    #[tokio::test]
    async fn append_reports_write_fault_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the parent directory should be.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let file: JsonArrayFile<String> = JsonArrayFile::new(blocker.join("items.json"));

        let outcome = file.append("lost".to_string()).await;
        assert_eq!(outcome.value, 0);
        assert!(matches!(outcome.fault, Some(StoreError::Lock { .. })));
        assert!(!outcome.is_persisted());
    }

    #[tokio::test]
    async fn concurrent_appends_on_one_path_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("race.json");

        let mut handles = Vec::new();
        for i in 0..16 {
            let path = path.clone();
            handles.push(tokio::spawn(async move {
                let file: JsonArrayFile<u32> = JsonArrayFile::new(path);
                file.append(i).await
            }));
        }
        for handle in handles {
            assert!(!handle.await.unwrap().is_degraded());
        }

        let file: JsonArrayFile<u32> = JsonArrayFile::new(path);
        let mut stored = file.load().await.unwrap();
        stored.sort_unstable();
        assert_eq!(stored, (0..16).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn differently_spelled_paths_share_one_lock() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("race.json");
        let dotted = dir.path().join(".").join("race.json");

        let mut handles = Vec::new();
        for i in 0..16u32 {
            let path = if i % 2 == 0 { plain.clone() } else { dotted.clone() };
            handles.push(tokio::spawn(async move {
                JsonArrayFile::<u32>::new(path).append(i).await
            }));
        }
        for handle in handles {
            assert!(!handle.await.unwrap().is_degraded());
        }

        let mut stored = JsonArrayFile::<u32>::new(plain).load().await.unwrap();
        stored.sort_unstable();
        assert_eq!(stored, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn best_effort_into_result() {
        assert_eq!(BestEffort::ok(3).into_result().unwrap(), 3);
        let fault = StoreError::Write {
            path: PathBuf::from("x"),
            source: std::io::Error::other("boom"),
        };
        assert!(BestEffort::degraded(0, fault).into_result().is_err());
    }

    #[test]
    fn read_faults_still_count_as_persisted() {
        let read = StoreError::Read {
            path: PathBuf::from("x"),
            source: std::io::Error::other("boom"),
        };
        assert!(BestEffort::degraded(1, read).is_persisted());
        assert!(BestEffort::ok(1).is_persisted());
    }
}
