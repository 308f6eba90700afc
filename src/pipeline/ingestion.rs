//! Control loop - pull, process, render, repeat
//!
//! One task owns the source, the engine (and through it the store) and the
//! renderer. Each accepted message is rendered before the next pull, so a
//! fast stream is throttled by render latency. Cancellation is only raced
//! against the pull, never against a render.

use {
    super::{
        engine::{IngestEngine, ProcessError},
        LoopStats,
    },
    crate::{
        source::{StreamError, StreamSource},
        state::AggregationStore,
        ui::Render,
    },
    std::future::Future,
};

#[derive(Debug)]
pub enum ShutdownReason {
    EndOfStream,
    Cancelled,
    StreamFailed(StreamError),
}

/// What the loop hands back once it stops
pub struct LoopReport<R> {
    pub reason: ShutdownReason,
    pub store: AggregationStore,
    pub renderer: R,
    pub stats: LoopStats,
}

pub struct ControlLoop<S, R> {
    source: S,
    renderer: R,
    engine: IngestEngine,
}

impl<S, R> ControlLoop<S, R>
where
    S: StreamSource,
    R: Render,
{
    pub fn new(source: S, renderer: R, engine: IngestEngine) -> Self {
        Self {
            source,
            renderer,
            engine,
        }
    }

    /// Run until the stream ends, fails, or `shutdown` resolves.
    ///
    /// The source is closed on every exit path. The renderer is returned
    /// untouched so its last frame stays visible.
    pub async fn run<F>(mut self, shutdown: F) -> LoopReport<R>
    where
        F: Future<Output = ()>,
    {
        log::info!("📡 Polling messages from {} source...", self.source.source_type());
        tokio::pin!(shutdown);

        let reason = loop {
            let pulled = tokio::select! {
                biased;
                _ = &mut shutdown => break ShutdownReason::Cancelled,
                pulled = self.source.next_message() => pulled,
            };

            match pulled {
                Ok(Some(raw)) => self.handle_message(&raw).await,
                Ok(None) => break ShutdownReason::EndOfStream,
                Err(e) if !e.is_fatal() => {
                    self.engine.skip_unreadable();
                    log::error!("Skipping message: {}", e);
                }
                Err(e) => {
                    log::error!("❌ Error while consuming messages: {}", e);
                    break ShutdownReason::StreamFailed(e);
                }
            }
        };

        match &reason {
            ShutdownReason::EndOfStream => log::info!("Stream exhausted"),
            ShutdownReason::Cancelled => log::warn!("Consumer interrupted by user."),
            ShutdownReason::StreamFailed(_) => log::warn!("Stopping after stream failure"),
        }

        self.source.close().await;
        log::info!("{} source closed", self.source.source_type());

        let (store, stats) = self.engine.into_parts();
        log::info!(
            "Processed {} messages: {} inserted, {} skipped, {} categories",
            stats.received,
            stats.inserted,
            stats.skipped,
            store.len()
        );

        LoopReport {
            reason,
            store,
            renderer: self.renderer,
            stats,
        }
    }

    async fn handle_message(&mut self, raw: &str) {
        match self.engine.process(raw) {
            Ok(()) => {
                let snapshot = self.engine.store().snapshot();
                if let Err(e) = self.renderer.render(&snapshot, self.engine.stats()).await {
                    self.engine.stats_mut().render_failures += 1;
                    log::error!("Chart render error: {}", e);
                }
            }
            Err(ProcessError::Store(e)) => {
                log::warn!("Skipping message '{}': {}", raw, e);
            }
            Err(e) => {
                log::error!("Skipping message '{}': {}", raw, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decoder::Decoder, source::ChannelSource, state::Snapshot, ui::RenderError};
    use async_trait::async_trait;

    #[derive(Default)]
    struct CountingRenderer {
        frames: Vec<usize>,
        fail: bool,
    }

    #[async_trait]
    impl Render for CountingRenderer {
        async fn render(&mut self, snapshot: &Snapshot, _stats: &LoopStats) -> Result<(), RenderError> {
            self.frames.push(snapshot.len());
            if self.fail {
                return Err(RenderError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "terminal gone",
                )));
            }
            Ok(())
        }
    }

    fn engine() -> IngestEngine {
        IngestEngine::new(Decoder::default(), AggregationStore::new())
    }

    #[tokio::test]
    async fn test_skipped_messages_are_not_rendered() {
        let (tx, source) = ChannelSource::bounded(8);
        for line in [
            r#"{"category":"Fog","metric_a":1,"metric_b":2}"#,
            r#"{"category":"Fog"}"#,
            "{{{",
            r#"{"category":"Rain","metric_a":3,"metric_b":4}"#,
        ] {
            tx.send(line.to_string()).await.unwrap();
        }
        drop(tx);

        let report = ControlLoop::new(source, CountingRenderer::default(), engine())
            .run(std::future::pending())
            .await;

        assert!(matches!(report.reason, ShutdownReason::EndOfStream));
        assert_eq!(report.renderer.frames, vec![1, 2]);
        assert_eq!(report.stats.received, 4);
        assert_eq!(report.stats.skipped, 2);
    }

    #[tokio::test]
    async fn test_render_failure_does_not_stop_loop() {
        let (tx, source) = ChannelSource::bounded(8);
        tx.send(r#"{"category":"Fog","metric_a":1,"metric_b":2}"#.to_string())
            .await
            .unwrap();
        tx.send(r#"{"category":"Fog","metric_a":3,"metric_b":4}"#.to_string())
            .await
            .unwrap();
        drop(tx);

        let renderer = CountingRenderer {
            fail: true,
            ..CountingRenderer::default()
        };
        let report = ControlLoop::new(source, renderer, engine())
            .run(std::future::pending())
            .await;

        assert_eq!(report.stats.render_failures, 2);
        assert_eq!(report.store.get("Fog").unwrap().count, 2);
    }

    #[tokio::test]
    async fn test_ready_shutdown_wins_over_ready_message() {
        let (tx, source) = ChannelSource::bounded(8);
        tx.send(r#"{"category":"Fog","metric_a":1,"metric_b":2}"#.to_string())
            .await
            .unwrap();

        let report = ControlLoop::new(source, CountingRenderer::default(), engine())
            .run(std::future::ready(()))
            .await;

        assert!(matches!(report.reason, ShutdownReason::Cancelled));
        assert!(report.store.is_empty());
        assert!(report.renderer.frames.is_empty());
        // Source was closed on the way out
        assert!(tx.send("late".to_string()).await.is_err());
    }
}
