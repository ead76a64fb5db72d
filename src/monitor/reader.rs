use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::Result;

/// Incremental reader over a growing log file.
///
/// Tracks a byte offset between polls and only returns complete lines; a
/// trailing line without a newline is held back until it is completed or
/// [`LogReader::finish`] is called.
pub struct LogReader {
    path: PathBuf,
    offset: u64,
    pending: Vec<u8>,
}

impl LogReader {
    /// Reader positioned at the start of the file
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            offset: 0,
            pending: Vec::new(),
        }
    }

    /// Reader positioned at the current end of the file, skipping history
    pub fn at_end<P: AsRef<Path>>(path: P) -> Self {
        let mut reader = Self::new(path);
        reader.offset = std::fs::metadata(&reader.path)
            .map(|m| m.len())
            .unwrap_or(0);
        reader
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read everything appended since the last call.
    ///
    /// A missing file yields no lines. A file shorter than the stored offset
    /// was truncated or rotated and is read again from the beginning.
    pub fn read_new_lines(&mut self) -> Result<Vec<String>> {
        let len = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Log file not found");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if len < self.offset {
            info!(
                path = %self.path.display(),
                previous_offset = self.offset,
                size = len,
                "Log file truncated or rotated, reading from start"
            );
            self.offset = 0;
            self.pending.clear();
        }

        if len == self.offset {
            return Ok(Vec::new());
        }

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.offset))?;
        let mut buf = Vec::with_capacity((len - self.offset) as usize);
        file.read_to_end(&mut buf)?;
        self.offset += buf.len() as u64;

        self.pending.extend_from_slice(&buf);
        Ok(self.drain_complete_lines())
    }

    /// Flush a buffered partial line, if any
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = decode_line(&self.pending);
        self.pending.clear();
        Some(line)
    }

    fn drain_complete_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        complete[..last_newline]
            .split(|&b| b == b'\n')
            .map(decode_line)
            .collect()
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
