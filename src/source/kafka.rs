use {
    super::{StreamError, StreamSource},
    async_trait::async_trait,
    rdkafka::{
        config::ClientConfig,
        consumer::{Consumer, StreamConsumer},
        error::KafkaError,
        Message,
    },
};

impl From<KafkaError> for StreamError {
    fn from(err: KafkaError) -> Self {
        StreamError::Broker(err.to_string())
    }
}

/// Topic subscription on a Kafka consumer group
pub struct KafkaSource {
    consumer: Option<StreamConsumer>,
    topic: String,
}

impl KafkaSource {
    pub fn connect(brokers: &str, topic: &str, group_id: &str) -> Result<Self, StreamError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.partition.eof", "false")
            .create()?;
        consumer.subscribe(&[topic])?;

        log::info!(
            "🔌 Kafka consumer subscribed: brokers={} topic={} group={}",
            brokers,
            topic,
            group_id
        );

        Ok(Self {
            consumer: Some(consumer),
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl StreamSource for KafkaSource {
    async fn next_message(&mut self) -> Result<Option<String>, StreamError> {
        let Some(consumer) = self.consumer.as_ref() else {
            return Ok(None);
        };

        loop {
            let message = consumer.recv().await?;
            log::debug!(
                "Received message at partition {} offset {}",
                message.partition(),
                message.offset()
            );

            match message.payload_view::<str>() {
                Some(Ok(payload)) => return Ok(Some(payload.to_string())),
                Some(Err(e)) => {
                    return Err(StreamError::InvalidPayload(format!(
                        "non UTF-8 payload at offset {}: {}",
                        message.offset(),
                        e
                    )))
                }
                // Tombstones carry no observation
                None => continue,
            }
        }
    }

    async fn close(&mut self) {
        if let Some(consumer) = self.consumer.take() {
            consumer.unsubscribe();
            log::info!("Kafka consumer for topic '{}' closed.", self.topic);
        }
    }

    fn source_type(&self) -> &'static str {
        "kafka"
    }
}
