//! JSONL tail source with file rotation detection

use {
    super::{line_to_message, StreamError, StreamSource},
    async_trait::async_trait,
    std::{io::SeekFrom, path::PathBuf, time::Duration},
    tokio::{
        fs::File,
        io::{AsyncBufReadExt, AsyncSeekExt, BufReader},
        time::sleep,
    },
};

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

/// Follows a newline-delimited file the way `tail -F` does.
///
/// Never reports end of stream on its own; the loop stops it through
/// cancellation. A truncated or replaced file is reopened from the start.
pub struct TailSource {
    path: PathBuf,
    file: Option<BufReader<File>>,
    inode: Option<u64>,
    offset: u64,
    pending: Vec<u8>,
    from_start: bool,
    poll_interval: Duration,
}

impl TailSource {
    /// Follow `path`, skipping whatever it already contains
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: None,
            inode: None,
            offset: 0,
            pending: Vec::new(),
            from_start: false,
            poll_interval: Duration::from_millis(100),
        }
    }

    /// Follow `path`, replaying its existing lines first
    pub fn from_start(path: PathBuf) -> Self {
        Self {
            from_start: true,
            ..Self::new(path)
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn open(&mut self, at_end: bool) -> std::io::Result<()> {
        let file = File::open(&self.path).await?;
        let metadata = file.metadata().await?;

        #[cfg(unix)]
        {
            self.inode = Some(metadata.ino());
        }

        let mut reader = BufReader::new(file);
        self.offset = if at_end {
            reader.seek(SeekFrom::End(0)).await?
        } else {
            0
        };
        self.pending.clear();
        self.file = Some(reader);

        log::info!(
            "📖 Following {} from {}",
            self.path.display(),
            if at_end { "end" } else { "start" }
        );
        Ok(())
    }

    /// Detect replacement (inode changed) or truncation (file shorter than what we read)
    async fn detect_rotation(&self) -> std::io::Result<bool> {
        let metadata = tokio::fs::metadata(&self.path).await?;

        #[cfg(unix)]
        {
            if self.inode.map_or(false, |old| old != metadata.ino()) {
                return Ok(true);
            }
        }

        Ok(metadata.len() < self.offset)
    }
}

#[async_trait]
impl StreamSource for TailSource {
    async fn next_message(&mut self) -> Result<Option<String>, StreamError> {
        if self.file.is_none() {
            let at_end = !self.from_start;
            self.open(at_end).await?;
        }

        loop {
            if self.detect_rotation().await? {
                log::info!("🔄 File rotation detected, reopening: {}", self.path.display());
                self.open(false).await?;
            }

            let Some(reader) = self.file.as_mut() else {
                return Err(StreamError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "File not opened",
                )));
            };

            let read = reader.read_until(b'\n', &mut self.pending).await?;
            if read == 0 {
                sleep(self.poll_interval).await;
                continue;
            }
            self.offset += read as u64;

            // Writer is mid-line; wait for the rest
            if self.pending.last() != Some(&b'\n') {
                continue;
            }

            if let Some(line) = line_to_message(std::mem::take(&mut self.pending))? {
                return Ok(Some(line));
            }
        }
    }

    async fn close(&mut self) {
        self.file = None;
        self.pending.clear();
        log::info!("📕 Stopped following {}", self.path.display());
    }

    fn source_type(&self) -> &'static str {
        "file"
    }
}
