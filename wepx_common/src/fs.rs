/*
 * file utilities shared by the wepx crates. Trimmed down from the teacher's fs module to the
 * subset actually used for stream output and lock file handling - path construction, append-mode
 * writers and age-based cleanup.
 */
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::macros::io_error;

type Result<T> = std::result::Result<T, io::Error>;

pub fn ensure_dir(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if !path.is_dir() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

pub fn path_to_lossy_string(path: impl AsRef<Path>) -> String {
    path.as_ref().to_string_lossy().as_ref().to_string()
}

pub fn file_length<P: AsRef<Path>>(path: &P) -> Option<u64> {
    fs::metadata(path).ok().map(|meta| meta.len())
}

pub fn existing_non_empty_file_from_path<P: AsRef<Path>>(path: P) -> Result<File> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    if len > 0 {
        Ok(file)
    } else {
        Err(io_error!(ErrorKind::Other, "file empty: {:?}", file))
    }
}

/// open a file for append, creating it if it does not yet exist. This is the mode used for the
/// append-only `.wepx` stream files (C2) - the file is never truncated while a stream is live.
pub fn append_open(path: impl AsRef<Path>) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .append(true)
        .open(path.as_ref())
}

pub fn get_filename_extension(path: &str) -> Option<&str> {
    if let Some(idx) = path.rfind('.') {
        if idx < path.len() - 1 {
            return Some(&path[idx + 1..]);
        }
    }
    None
}

/// remove files under `dir` that have not been modified within `max_age`. Used by the run
/// orchestrator to clean up stale lock files left behind by crashed workers.
pub fn remove_old_files<T>(dir: &T, max_age: Duration) -> Result<usize>
where
    T: AsRef<Path>,
{
    let dir: &Path = dir.as_ref();
    if !dir.is_dir() {
        return Err(io_error!(ErrorKind::NotFound, "dir {:?}", dir));
    }

    let now = SystemTime::now();
    let mut n_removed = 0;

    for e in fs::read_dir(dir)? {
        let e = e?;
        let path = e.path();
        if path.is_file() {
            let meta = fs::metadata(&path)?;
            if let Ok(last_mod) = meta.modified() {
                if let Ok(age) = now.duration_since(last_mod) {
                    if age > max_age {
                        if fs::remove_file(&path).is_ok() {
                            n_removed += 1;
                        }
                    }
                }
            }
        }
    }

    Ok(n_removed)
}

/// exclusive, race-free creation of a new file. Returns `Ok(None)` (not an error) if the file
/// already exists, which is how lock-file acquisition distinguishes "someone else holds it" from
/// a genuine I/O failure.
pub fn create_exclusive(path: impl AsRef<Path>) -> Result<Option<File>> {
    match OpenOptions::new().write(true).create_new(true).open(path.as_ref()) {
        Ok(f) => Ok(Some(f)),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn write_all(path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    let mut f = File::create(path.as_ref())?;
    f.write_all(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusive_create_only_succeeds_once() {
        let dir = std::env::temp_dir().join(format!("wepx_fs_test_{}", std::process::id()));
        ensure_dir(&dir).unwrap();
        let p = dir.join("lock.test");
        let _ = fs::remove_file(&p);

        let first = create_exclusive(&p).unwrap();
        assert!(first.is_some());

        let second = create_exclusive(&p).unwrap();
        assert!(second.is_none());

        fs::remove_file(&p).unwrap();
    }
}
