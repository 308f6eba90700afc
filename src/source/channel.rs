use {
    super::{StreamError, StreamSource},
    async_trait::async_trait,
    tokio::sync::mpsc,
};

/// Messages pushed in-process through a tokio channel.
///
/// The stream ends once every sender has been dropped.
pub struct ChannelSource {
    rx: mpsc::Receiver<String>,
}

impl ChannelSource {
    pub fn new(rx: mpsc::Receiver<String>) -> Self {
        Self { rx }
    }

    /// Bounded channel plus the source reading from it
    pub fn bounded(capacity: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl StreamSource for ChannelSource {
    async fn next_message(&mut self) -> Result<Option<String>, StreamError> {
        Ok(self.rx.recv().await)
    }

    async fn close(&mut self) {
        self.rx.close();
    }

    fn source_type(&self) -> &'static str {
        "channel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_source_ends_when_senders_drop() {
        let (tx, mut source) = ChannelSource::bounded(4);
        tx.send("one".to_string()).await.unwrap();
        tx.send("two".to_string()).await.unwrap();
        drop(tx);

        assert_eq!(source.next_message().await.unwrap().as_deref(), Some("one"));
        assert_eq!(source.next_message().await.unwrap().as_deref(), Some("two"));
        assert!(source.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_close_rejects_further_sends() {
        let (tx, mut source) = ChannelSource::bounded(4);
        source.close().await;
        assert!(tx.send("late".to_string()).await.is_err());
    }
}
