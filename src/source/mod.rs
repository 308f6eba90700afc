//! Stream sources - the pull/close contract the control loop consumes
//!
//! ```text
//! ChannelSource (in-process mpsc)   ┐
//! StdinSource   (newline-delimited) ├─→ StreamSource::next_message() → ControlLoop
//! TailSource    (followed JSONL)    │
//! KafkaSource   (feature "kafka")   ┘
//! ```

pub mod channel;
pub mod stdin;
pub mod tail;
#[cfg(feature = "kafka")]
pub mod kafka;

pub use channel::ChannelSource;
pub use stdin::StdinSource;
pub use tail::TailSource;
#[cfg(feature = "kafka")]
pub use kafka::KafkaSource;

use async_trait::async_trait;

#[derive(Debug)]
pub enum StreamError {
    Io(std::io::Error),
    Broker(String),
    /// One message could not be read as text; the stream itself is fine
    InvalidPayload(String),
}

impl StreamError {
    /// Whether the source is unusable after this error
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StreamError::InvalidPayload(_))
    }
}

impl From<std::io::Error> for StreamError {
    fn from(err: std::io::Error) -> Self {
        StreamError::Io(err)
    }
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamError::Io(e) => write!(f, "Stream IO error: {}", e),
            StreamError::Broker(msg) => write!(f, "Broker error: {}", msg),
            StreamError::InvalidPayload(msg) => write!(f, "Unreadable message: {}", msg),
        }
    }
}

impl std::error::Error for StreamError {}

/// Turn one raw line into a message. Blank lines yield `None`.
pub(crate) fn line_to_message(bytes: Vec<u8>) -> Result<Option<String>, StreamError> {
    let line = String::from_utf8(bytes).map_err(|e| {
        StreamError::InvalidPayload(format!("line is not valid UTF-8: {}", e.utf8_error()))
    })?;
    let line = line.trim();
    Ok((!line.is_empty()).then(|| line.to_string()))
}

/// A feed of raw text messages
#[async_trait]
pub trait StreamSource: Send {
    /// Wait for the next message. `Ok(None)` means the stream is exhausted.
    ///
    /// `StreamError::InvalidPayload` covers a single bad message; the caller
    /// may keep pulling after it.
    async fn next_message(&mut self) -> Result<Option<String>, StreamError>;

    /// Release the underlying resource. Called exactly once by the control loop.
    async fn close(&mut self);

    /// Source kind for logging
    fn source_type(&self) -> &'static str;
}

#[async_trait]
impl<T: StreamSource + ?Sized> StreamSource for Box<T> {
    async fn next_message(&mut self) -> Result<Option<String>, StreamError> {
        (**self).next_message().await
    }

    async fn close(&mut self) {
        (**self).close().await
    }

    fn source_type(&self) -> &'static str {
        (**self).source_type()
    }
}
