//! Delivery of domain events raised by aggregates.

use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::events::DomainEvent;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("event encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("nats publish failed: {0}")]
    Nats(String),
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError>;
}

/// Publishes every event, logging failures. Events are fire-and-forget: a
/// failed publish never fails the operation that raised it.
pub async fn publish_all(publisher: &dyn EventPublisher, events: Vec<DomainEvent>) {
    for event in events {
        if let Err(e) = publisher.publish(&event).await {
            warn!(subject = %event.subject(), error = %e, "Failed to publish domain event");
        }
    }
}

pub struct NatsPublisher { client: async_nats::Client }

impl NatsPublisher {
    pub fn new(client: async_nats::Client) -> Self { Self { client } }
}

#[async_trait]
impl EventPublisher for NatsPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_vec(event)?;
        self.client.publish(event.subject(), payload.into()).await.map_err(|e| PublishError::Nats(e.to_string()))
    }
}

/// Used when no broker is configured.
pub struct LogPublisher;

#[async_trait]
impl EventPublisher for LogPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        debug!(subject = %event.subject(), ?event, "Domain event");
        Ok(())
    }
}

/// Keeps published events so tests can inspect them.
#[derive(Default)]
pub struct RecordingPublisher { events: Mutex<Vec<DomainEvent>> }

impl RecordingPublisher {
    pub fn new() -> Self { Self::default() }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &DomainEvent) -> Result<(), PublishError> {
        if let Ok(mut events) = self.events.lock() { events.push(event.clone()); }
        Ok(())
    }
}
