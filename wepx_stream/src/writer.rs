/*
 * the stream writer (C2): append frames to a per-stream append-only file with length-prefixed
 * records. One writer per file per cycle is assumed (§4.2) - the design does not coordinate
 * concurrent writers across processes, only the orchestrator's lock file does that.
 */
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use wepx_codec::Record;
use wepx_common::fs::ensure_dir;

use crate::errors::Result;

pub struct StreamWriter {
    path: PathBuf,
    file: File,
}

impl StreamWriter {
    /// open an existing stream file for appending further frames.
    pub fn open_append(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        let file = wepx_common::fs::append_open(&path)?;
        Ok(StreamWriter { path, file })
    }

    /// (re)create a fresh stream file, discarding any prior content. Only ever called for frame 0
    /// (the I-frame that carries the stream's frozen metadata) - an existing stream is otherwise
    /// immutable except by append (§3).
    pub fn create_fresh(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        if path.is_file() {
            std::fs::remove_file(&path)?;
        }
        let file = wepx_common::fs::append_open(&path)?;
        Ok(StreamWriter { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// a single `write_all` of header+payload. With `O_APPEND` this concatenates atomically with
    /// respect to partial reads from concurrent tail readers, as long as this remains the only
    /// writer for the file (true within a cycle worker, §4.2/§5).
    pub fn append_record(&mut self, record: &Record) -> Result<()> {
        self.file.write_all(&record.to_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wepx_codec::frame::{encode_i_frame, FrameType};

    #[test]
    fn create_fresh_truncates_prior_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model").join("123").join("s.wepx");

        let (frame, _) = encode_i_frame(&vec![1.0, 2.0, 3.0, 4.0], 2, 2, None, 0).unwrap();
        let record = Record::from_encoded(frame);

        {
            let mut w = StreamWriter::create_fresh(&path).unwrap();
            w.append_record(&record).unwrap();
            w.append_record(&record).unwrap();
        }
        let first_len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(first_len, record.to_bytes().len() as u64 * 2);

        {
            let mut w = StreamWriter::create_fresh(&path).unwrap();
            w.append_record(&record).unwrap();
        }
        let second_len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(second_len, record.to_bytes().len() as u64);
    }

    #[test]
    fn open_append_preserves_prior_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.wepx");
        let (frame, _) = encode_i_frame(&vec![1.0, 2.0, 3.0, 4.0], 2, 2, None, 0).unwrap();
        let record = Record::from_encoded(frame);

        {
            let mut w = StreamWriter::create_fresh(&path).unwrap();
            w.append_record(&record).unwrap();
        }
        {
            let mut w = StreamWriter::open_append(&path).unwrap();
            w.append_record(&record).unwrap();
        }
        let len = std::fs::metadata(&path).unwrap().len();
        assert_eq!(len, record.to_bytes().len() as u64 * 2);
    }
}
