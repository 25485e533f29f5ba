// Log sink tailing (`logs` command)
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Follows a log file by offset, restarting when the file is truncated
/// (a new detached launch recreates the sink).
pub struct LogTail {
    path: PathBuf,
    offset: u64,
}

impl LogTail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            offset: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last `lines` lines of the file; following continues from its end
    pub async fn last_lines(&mut self, lines: usize) -> std::io::Result<Vec<String>> {
        let bytes = fs::read(&self.path).await?;
        self.offset = bytes.len() as u64;

        let text = String::from_utf8_lossy(&bytes);
        let all: Vec<&str> = text.lines().collect();
        let start = all.len().saturating_sub(lines);
        Ok(all[start..].iter().map(|l| l.to_string()).collect())
    }

    /// Bytes appended since the last read, if any
    pub async fn read_new(&mut self) -> std::io::Result<Option<String>> {
        let len = fs::metadata(&self.path).await?.len();
        if len < self.offset {
            self.offset = 0;
        }
        if len == self.offset {
            return Ok(None);
        }

        let mut file = File::open(&self.path).await?;
        file.seek(SeekFrom::Start(self.offset)).await?;
        let mut buf = Vec::with_capacity((len - self.offset) as usize);
        file.read_to_end(&mut buf).await?;
        self.offset += buf.len() as u64;

        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}
