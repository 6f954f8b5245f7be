/// Real-time event publisher
///
/// Pushes lead events to connected clients. Delivery is best-effort and
/// fire-and-forget: the lifecycle manager logs and swallows publish
/// failures, and nothing is queued for disconnected recipients. Durable
/// notifications carry the same information for later reading.
///
/// Two backends, selected by configuration:
///
/// - [`RedisEventPublisher`]: PUBLISH on a per-user channel; a socket
///   gateway subscribed to those channels forwards events to browsers
/// - [`NoopEventPublisher`]: used when Redis is not configured

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;

use leadflow_shared::events::LeadEvent;

/// Publisher errors
#[derive(Debug, Error)]
pub enum PublishError {
    /// Redis connection or command failure
    #[error("Redis error: {0}")]
    Redis(String),

    /// Event could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Contract the lifecycle manager expects from a real-time backend
///
/// `publish` is fire-and-forget from the caller's perspective: the manager
/// never fails an operation because of a publish error.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes one event on the given channel
    async fn publish(&self, channel: &str, event: &LeadEvent) -> Result<(), PublishError>;
}

/// Redis PUB/SUB event publisher
///
/// Uses a `ConnectionManager` which multiplexes and reconnects
/// automatically; cloning it is cheap.
pub struct RedisEventPublisher {
    conn: ConnectionManager,
}

impl RedisEventPublisher {
    /// Connects to Redis and builds the publisher
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Redis`] if the URL is invalid or the initial
    /// connection fails.
    pub async fn connect(url: &str) -> Result<Self, PublishError> {
        let client = redis::Client::open(url).map_err(|e| PublishError::Redis(e.to_string()))?;

        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| PublishError::Redis(e.to_string()))?;

        tracing::info!("Connected to Redis for real-time events");

        Ok(Self { conn })
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, channel: &str, event: &LeadEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_string(event)?;

        let mut conn = self.conn.clone();
        let _receivers: i64 = conn
            .publish(channel, payload)
            .await
            .map_err(|e| PublishError::Redis(e.to_string()))?;

        Ok(())
    }
}

/// Publisher used when Redis is not configured
///
/// Logs at debug level and reports success, so deployments without a
/// real-time tier behave identically minus the push.
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(&self, channel: &str, event: &LeadEvent) -> Result<(), PublishError> {
        tracing::debug!(
            channel = %channel,
            kind = event.kind.as_str(),
            "Real-time events disabled, dropping event"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use leadflow_shared::events::LeadEventKind;
    use leadflow_shared::models::lead::{Lead, LeadStatus};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_noop_publisher_always_succeeds() {
        let lead = Lead {
            id: Uuid::new_v4(),
            first_name: "Ana".to_string(),
            last_name: "Ruiz".to_string(),
            email: "ana@x.com".to_string(),
            phone: None,
            company: "Acme".to_string(),
            position: None,
            description: None,
            status: LeadStatus::Pending,
            submitted_by_id: Uuid::new_v4(),
            approved_by_id: None,
            remote_crm_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let event = LeadEvent::new(
            LeadEventKind::NewLead,
            &lead,
            "t".to_string(),
            "m".to_string(),
        );

        assert!(NoopEventPublisher
            .publish("user:abc", &event)
            .await
            .is_ok());
    }
}
