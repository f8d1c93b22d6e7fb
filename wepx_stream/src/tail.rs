/*
 * partial-read-tolerant tail reader (§4.6, design notes): buffers unread bytes and backs up the
 * read cursor whenever a header or payload is still short, so a concurrent writer's in-flight
 * append never produces a bogus record. Shared by the tail-streaming server and offline readers.
 */
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use wepx_codec::Record;

use crate::errors::Result;

pub struct TailReader {
    path: PathBuf,
    file: Option<File>,
    file_read_pos: u64,
    pending: Vec<u8>,
}

impl TailReader {
    pub fn new(path: impl AsRef<Path>) -> Self {
        TailReader { path: path.as_ref().to_path_buf(), file: None, file_read_pos: 0, pending: Vec::new() }
    }

    pub fn new_from_offset(path: impl AsRef<Path>, offset: u64) -> Self {
        TailReader { path: path.as_ref().to_path_buf(), file: None, file_read_pos: offset, pending: Vec::new() }
    }

    fn ensure_open(&mut self) -> Result<bool> {
        if self.file.is_none() {
            match File::open(&self.path) {
                Ok(f) => self.file = Some(f),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(true)
    }

    /// pull whatever new bytes have been appended since the last poll and return every complete
    /// record found. A trailing partial record is retained for the next call. Returns an empty
    /// vec (not an error) if the file does not exist yet.
    pub fn poll(&mut self) -> Result<Vec<Record>> {
        if !self.ensure_open()? {
            return Ok(Vec::new());
        }
        let file = self.file.as_mut().unwrap();
        file.seek(SeekFrom::Start(self.file_read_pos))?;
        let mut chunk = Vec::new();
        let n = file.read_to_end(&mut chunk)?;
        self.file_read_pos += n as u64;
        self.pending.extend_from_slice(&chunk);

        let mut out = Vec::new();
        loop {
            match Record::parse(&self.pending)? {
                Some((record, consumed)) => {
                    out.push(record);
                    self.pending.drain(0..consumed);
                }
                None => break,
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::StreamWriter;
    use wepx_codec::frame::encode_i_frame;

    #[test]
    fn tail_reader_waits_for_file_then_sees_all_appended_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.wepx");
        let mut tail = TailReader::new(&path);
        assert!(tail.poll().unwrap().is_empty());

        let (frame1, _) = encode_i_frame(&vec![1.0, 2.0, 3.0, 4.0], 2, 2, None, 0).unwrap();
        let (frame2, _) = encode_i_frame(&vec![5.0, 6.0, 7.0, 8.0], 2, 2, None, 1).unwrap();
        {
            let mut w = StreamWriter::create_fresh(&path).unwrap();
            w.append_record(&Record::from_encoded(frame1)).unwrap();
        }
        let first = tail.poll().unwrap();
        assert_eq!(first.len(), 1);

        {
            let mut w = StreamWriter::open_append(&path).unwrap();
            w.append_record(&Record::from_encoded(frame2)).unwrap();
        }
        let second = tail.poll().unwrap();
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn tail_reader_backs_up_on_partial_trailing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.wepx");
        let (frame, _) = encode_i_frame(&vec![1.0, 2.0, 3.0, 4.0], 2, 2, None, 0).unwrap();
        let bytes = Record::from_encoded(frame).to_bytes();

        let split = bytes.len() - 3;
        std::fs::write(&path, &bytes[..split]).unwrap();
        let mut tail = TailReader::new(&path);
        assert!(tail.poll().unwrap().is_empty());

        {
            use std::io::Write;
            let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
            f.write_all(&bytes[split..]).unwrap();
        }
        let records = tail.poll().unwrap();
        assert_eq!(records.len(), 1);
    }
}
