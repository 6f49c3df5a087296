//! Cinevault Events Library
//!
//! Best-effort analytics event emission to Kafka. Emission never fails the
//! caller: serialization, broker, and timeout errors are logged and swallowed
//! here. Delivery is at-least-once attempted; loss under broker outage and
//! duplicates after producer retries are both acceptable for usage analytics.

use async_trait::async_trait;
use cinevault_core::models::AnalyticsEvent;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::time::Duration;

/// Sink for analytics events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emit one event, waiting at most the configured send timeout for the
    /// broker to accept it. Failures are logged and absorbed.
    async fn emit(&self, event: &AnalyticsEvent);

    /// Drain buffered events with a short grace timeout. Called once during
    /// graceful shutdown to bound event loss across restarts.
    async fn shutdown(&self);
}

/// Kafka-backed sink using a `FutureProducer`.
#[derive(Clone)]
pub struct KafkaSink {
    producer: FutureProducer,
    topic: String,
    send_timeout: Duration,
    flush_timeout: Duration,
}

impl KafkaSink {
    pub fn new(
        brokers: &str,
        topic: &str,
        send_timeout: Duration,
        flush_timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        // message.timeout.ms caps how long librdkafka waits for a delivery
        // report; without it an unreachable broker holds the send future open
        // for the 5 minute default.
        let producer = rdkafka::config::ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("client.id", "cinevault-api")
            .set("acks", "all")
            .set("message.timeout.ms", send_timeout.as_millis().to_string())
            .create::<FutureProducer>()
            .map_err(|e| anyhow::anyhow!("Failed to create Kafka producer: {}", e))?;

        Ok(Self {
            producer,
            topic: topic.to_string(),
            send_timeout,
            flush_timeout,
        })
    }
}

#[async_trait]
impl EventSink for KafkaSink {
    async fn emit(&self, event: &AnalyticsEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize analytics event");
                return;
            }
        };

        let key = event.movie_id.to_string();
        let record = FutureRecord::to(&self.topic).key(&key).payload(&payload);

        // The second send argument only bounds enqueueing into the local
        // queue; the future itself resolves on the delivery report. The outer
        // timeout is what guarantees emit never holds up a request past the
        // configured bound.
        let send = self.producer.send(record, Duration::ZERO);
        match tokio::time::timeout(self.send_timeout, send).await {
            Ok(Ok(_)) => {
                tracing::debug!(
                    topic = %self.topic,
                    event = ?event.event,
                    movie_id = event.movie_id,
                    "Analytics event sent"
                );
            }
            Ok(Err((e, _))) => {
                tracing::warn!(
                    error = %e,
                    topic = %self.topic,
                    event = ?event.event,
                    movie_id = event.movie_id,
                    "Failed to send analytics event, dropping"
                );
            }
            Err(_) => {
                tracing::warn!(
                    topic = %self.topic,
                    event = ?event.event,
                    movie_id = event.movie_id,
                    timeout_ms = self.send_timeout.as_millis() as u64,
                    "Analytics event send timed out, dropping"
                );
            }
        }
    }

    async fn shutdown(&self) {
        if let Err(e) = self.producer.flush(Timeout::After(self.flush_timeout)) {
            tracing::warn!(error = %e, "Kafka producer flush failed during shutdown");
        }
    }
}

/// No-op sink, used when analytics are disabled and in tests.
#[derive(Default, Clone)]
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn emit(&self, _event: &AnalyticsEvent) {}

    async fn shutdown(&self) {}
}

/// In-memory sink for asserting on emitted events in tests.
#[derive(Default)]
pub struct MemorySink {
    events: std::sync::Mutex<Vec<AnalyticsEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn emit(&self, event: &AnalyticsEvent) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(event.clone());
        }
    }

    async fn shutdown(&self) {}
}
