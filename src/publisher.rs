//! Domain event publishing over NATS.
//!
//! Publishing is best-effort: failures are logged and never fail the
//! request that raised the event.

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::events::DomainEvent;

const SUBJECT_PREFIX: &str = "storefront";

#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
    recorded: Option<Arc<Mutex<Vec<DomainEvent>>>>,
}

impl EventPublisher {
    /// Publisher that drops every event.
    pub fn disabled() -> Self { Self::default() }

    /// Publisher that keeps events in memory; see [`EventPublisher::recorded`].
    pub fn recording() -> Self {
        Self { nats: None, recorded: Some(Arc::new(Mutex::new(Vec::new()))) }
    }

    /// Connects to NATS; on failure logs and falls back to a disabled publisher.
    pub async fn connect(url: &str) -> Self {
        match async_nats::connect(url).await {
            Ok(client) => {
                tracing::info!(%url, "publishing domain events to NATS");
                Self { nats: Some(client), recorded: None }
            }
            Err(e) => {
                tracing::warn!(%url, error = %e, "NATS unavailable, domain events disabled");
                Self::disabled()
            }
        }
    }

    pub async fn publish(&self, event: DomainEvent) {
        if let Some(client) = &self.nats {
            let subject = format!("{SUBJECT_PREFIX}.{}", event.kind());
            match serde_json::to_vec(&event) {
                Ok(payload) => {
                    if let Err(e) = client.publish(subject.clone(), payload.into()).await {
                        tracing::warn!(%subject, error = %e, "failed to publish domain event");
                    }
                }
                Err(e) => tracing::error!(%subject, error = %e, "failed to encode domain event"),
            }
        }
        if let Some(recorded) = &self.recorded {
            recorded.lock().await.push(event);
        }
    }

    /// Events captured by a [`EventPublisher::recording`] publisher.
    pub async fn recorded(&self) -> Vec<DomainEvent> {
        match &self.recorded {
            Some(recorded) => recorded.lock().await.clone(),
            None => Vec::new(),
        }
    }
}
