//! Analytics sink setup

use anyhow::{Context, Result};
use cinevault_core::Config;
use cinevault_events::{EventSink, KafkaSink};
use std::sync::Arc;
use std::time::Duration;

/// Construct the Kafka analytics sink. Producer creation does not contact
/// the broker, so an unavailable broker shows up as dropped events at emit
/// time rather than a startup failure.
pub fn setup_events(config: &Config) -> Result<Arc<dyn EventSink>> {
    let sink = KafkaSink::new(
        &config.kafka_brokers,
        &config.kafka_topic,
        Duration::from_secs(config.kafka_send_timeout_secs),
        Duration::from_secs(config.kafka_flush_timeout_secs),
    )
    .context("Failed to create Kafka producer")?;

    tracing::info!(
        brokers = %config.kafka_brokers,
        topic = %config.kafka_topic,
        "Analytics sink initialized"
    );

    Ok(Arc::new(sink))
}
