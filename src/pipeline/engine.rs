//! Ingest engine - decode, validate and fold one message into the store
//!
//! ```text
//! raw payload
//!     ↓
//! Decoder::decode()          → MessageError (skip)
//!     ↓
//! AggregationStore::insert() → StoreError (skip)
//!     ↓
//! LoopStats updated
//! ```
//!
//! The engine never renders; `ControlLoop` decides when a frame is due.

use {
    super::LoopStats,
    crate::{
        decoder::{Decoder, MessageError},
        state::{AggregationStore, StoreError},
    },
};

/// Why a message did not reach the store
#[derive(Debug)]
pub enum ProcessError {
    Message(MessageError),
    Store(StoreError),
}

impl From<MessageError> for ProcessError {
    fn from(err: MessageError) -> Self {
        ProcessError::Message(err)
    }
}

impl From<StoreError> for ProcessError {
    fn from(err: StoreError) -> Self {
        ProcessError::Store(err)
    }
}

impl std::fmt::Display for ProcessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessError::Message(e) => write!(f, "{}", e),
            ProcessError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProcessError {}

pub struct IngestEngine {
    decoder: Decoder,
    store: AggregationStore,
    stats: LoopStats,
}

impl IngestEngine {
    pub fn new(decoder: Decoder, store: AggregationStore) -> Self {
        Self {
            decoder,
            store,
            stats: LoopStats::default(),
        }
    }

    /// Decode one payload and fold it into the store.
    ///
    /// On error the store is untouched and the message counts as skipped.
    pub fn process(&mut self, raw: &str) -> Result<(), ProcessError> {
        self.stats.received += 1;
        log::debug!("Raw message: {}", raw);

        match self.decode_and_insert(raw) {
            Ok(()) => {
                self.stats.inserted += 1;
                self.stats.last_insert = Some(chrono::Utc::now());
                Ok(())
            }
            Err(e) => {
                self.stats.skipped += 1;
                Err(e)
            }
        }
    }

    /// Count a message the source could not hand over as text
    pub fn skip_unreadable(&mut self) {
        self.stats.received += 1;
        self.stats.skipped += 1;
    }

    fn decode_and_insert(&mut self, raw: &str) -> Result<(), ProcessError> {
        let observation = self.decoder.decode(raw)?;
        log::debug!(
            "Observation: category={} a={} b={}",
            observation.category,
            observation.metric_a,
            observation.metric_b
        );
        self.store.insert(observation)?;
        Ok(())
    }

    pub fn store(&self) -> &AggregationStore {
        &self.store
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut LoopStats {
        &mut self.stats
    }

    pub fn into_parts(self) -> (AggregationStore, LoopStats) {
        (self.store, self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::{DecodeError, FieldProblem};

    fn engine() -> IngestEngine {
        IngestEngine::new(Decoder::default(), AggregationStore::new())
    }

    #[test]
    fn test_valid_message_is_inserted() {
        let mut engine = engine();
        engine
            .process(r#"{"category":"Fog","metric_a":101.24,"metric_b":4}"#)
            .unwrap();

        assert_eq!(engine.store().len(), 1);
        assert_eq!(engine.stats().received, 1);
        assert_eq!(engine.stats().inserted, 1);
        assert!(engine.stats().last_insert.is_some());
    }

    #[test]
    fn test_missing_metrics_leave_store_unchanged() {
        let mut engine = engine();
        let err = engine.process(r#"{"category":"Fog"}"#).unwrap_err();

        match err {
            ProcessError::Message(MessageError::Validation(v)) => {
                assert_eq!(v.problem, FieldProblem::Missing)
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(engine.store().is_empty());
        assert_eq!(engine.stats().skipped, 1);
        assert_eq!(engine.stats().inserted, 0);
        assert!(engine.stats().last_insert.is_none());
    }

    #[test]
    fn test_malformed_payload_leaves_store_unchanged() {
        let mut engine = engine();
        engine
            .process(r#"{"category":"Rain","metric_a":1,"metric_b":2}"#)
            .unwrap();
        let before = engine.store().snapshot();

        let err = engine.process("not json at all").unwrap_err();
        assert!(matches!(
            err,
            ProcessError::Message(MessageError::Decode(DecodeError::Malformed(_)))
        ));
        assert_eq!(engine.store().snapshot(), before);
    }

    #[test]
    fn test_category_limit_counts_as_skip() {
        let mut engine = IngestEngine::new(Decoder::default(), AggregationStore::with_category_limit(1));
        engine
            .process(r#"{"category":"Fog","metric_a":1,"metric_b":2}"#)
            .unwrap();
        let err = engine
            .process(r#"{"category":"Hail","metric_a":1,"metric_b":2}"#)
            .unwrap_err();

        assert!(matches!(err, ProcessError::Store(StoreError::CategoryLimit { .. })));
        let (store, stats) = engine.into_parts();
        assert_eq!(store.len(), 1);
        assert_eq!(stats.received, 2);
        assert_eq!(stats.skipped, 1);
    }
}
