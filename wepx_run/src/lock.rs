/*
 * cycle lock files (§3, §4.5, §9 design notes): `O_CREAT | O_EXCL` via
 * `wepx_common::fs::create_exclusive`, path convention from `wepx_stream::path::lock_path`.
 * Content is informational only; existence is the synchronization primitive.
 */
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};

use wepx_common::fs::{create_exclusive, ensure_dir, remove_old_files};
use wepx_stream::lock_path;

use crate::errors::Result;

/// an acquired cycle lock. Removed automatically when dropped (success or failure - §4.5 step 4
/// and §4.7's "encoder failure: ... release lock" both fall out of normal `Drop` semantics here).
pub struct CycleLock {
    path: PathBuf,
}

impl CycleLock {
    /// try to acquire the lock for `model_id`'s cycle at `cycle_time`; `None` means another
    /// worker already holds it (§4.5 step 1, §8 property 7: lock idempotency).
    pub fn try_acquire(lockdir: impl AsRef<Path>, model_id: &str, cycle_time: DateTime<Utc>) -> Result<Option<CycleLock>> {
        ensure_dir(lockdir.as_ref())?;
        let yyyymmdd = wepx_common::datetime::fmt_yyyymmdd(cycle_time);
        let path = lock_path(lockdir.as_ref(), model_id, &yyyymmdd, cycle_time.hour());

        match create_exclusive(&path)? {
            None => Ok(None),
            Some(mut file) => {
                let _ = write!(file, "{}", Utc::now().timestamp());
                Ok(Some(CycleLock { path }))
            }
        }
    }

    /// remove stale lock files (older than `max_age`) left behind by a crashed worker.
    pub fn clean_stale(lockdir: impl AsRef<Path>, max_age: Duration) -> Result<usize> {
        if !lockdir.as_ref().is_dir() {
            return Ok(0);
        }
        Ok(remove_old_files(&lockdir, max_age)?)
    }
}

impl Drop for CycleLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn second_worker_is_locked_out_until_first_drops() {
        let dir = tempfile::tempdir().unwrap();
        let cycle = Utc.with_ymd_and_hms(2026, 7, 28, 12, 0, 0).unwrap();

        let first = CycleLock::try_acquire(dir.path(), "hrdps", cycle).unwrap();
        assert!(first.is_some());

        let second = CycleLock::try_acquire(dir.path(), "hrdps", cycle).unwrap();
        assert!(second.is_none());

        drop(first);
        let third = CycleLock::try_acquire(dir.path(), "hrdps", cycle).unwrap();
        assert!(third.is_some());
    }
}
