/// CRM connector
///
/// Abstracts the external CRM that becomes system-of-record for approved
/// leads. The lifecycle manager only depends on the [`CrmConnector`] trait;
/// the concrete backend is selected by configuration:
///
/// - [`HttpCrmConnector`]: REST connector with a bounded per-request timeout
/// - [`DisabledCrmConnector`]: used when no CRM is configured; every sync
///   attempt reports unsynced without failing the approval
///
/// CRM failures never block a local approval. The manager logs the failure
/// and records the lead with a null remote ID.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::config::CrmConfig;
use leadflow_shared::models::lead::Lead;

/// CRM connector errors
#[derive(Debug, Error)]
pub enum CrmError {
    /// No CRM configured for this deployment
    #[error("CRM connector is not configured")]
    NotConfigured,

    /// Transport-level failure (connect, timeout, TLS)
    #[error("CRM request failed: {0}")]
    Unreachable(String),

    /// The CRM answered but refused the operation
    #[error("CRM rejected the request: {0}")]
    Rejected(String),
}

/// Record created in the external CRM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRecord {
    /// Identifier assigned by the CRM
    pub id: String,
}

/// Identity reported by the CRM health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrmIdentity {
    /// Display name of the integration account
    pub display_name: String,

    /// Organization the account belongs to, if reported
    pub organization: Option<String>,
}

/// Contract the lifecycle manager expects from a CRM backend
#[async_trait]
pub trait CrmConnector: Send + Sync {
    /// Mirrors an approved lead into the CRM, returning the remote ID
    async fn create_remote_record(&self, lead: &Lead) -> Result<RemoteRecord, CrmError>;

    /// Verifies connectivity and reports the integration identity
    async fn test_connection(&self) -> Result<CrmIdentity, CrmError>;
}

/// REST CRM connector
///
/// Speaks a small JSON contract: `POST {base}/leads` creates a record and
/// answers `{"id": "..."}`; `GET {base}/identity` answers
/// `{"display_name": "...", "organization": "..."}`. Requests carry a Bearer
/// token and the configured timeout.
pub struct HttpCrmConnector {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

#[derive(Debug, Deserialize)]
struct CreateRecordResponse {
    id: String,
}

impl HttpCrmConnector {
    /// Builds a connector from configuration
    ///
    /// # Errors
    ///
    /// Returns [`CrmError::Unreachable`] if the HTTP client cannot be built.
    pub fn new(config: &CrmConfig) -> Result<Self, CrmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CrmError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl CrmConnector for HttpCrmConnector {
    async fn create_remote_record(&self, lead: &Lead) -> Result<RemoteRecord, CrmError> {
        let body = json!({
            "first_name": lead.first_name,
            "last_name": lead.last_name,
            "company": lead.company,
            "email": lead.email,
            "phone": lead.phone.as_deref().unwrap_or(""),
            "title": lead.position.as_deref().unwrap_or(""),
            "description": lead.description.as_deref().unwrap_or(""),
            "source": "web",
        });

        let response = self
            .client
            .post(self.url("leads"))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| CrmError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(CrmError::Rejected(format!("{status}: {detail}")));
        }

        let created: CreateRecordResponse = response
            .json()
            .await
            .map_err(|e| CrmError::Rejected(format!("Malformed response: {e}")))?;

        tracing::info!(lead_id = %lead.id, remote_id = %created.id, "Lead mirrored to CRM");

        Ok(RemoteRecord { id: created.id })
    }

    async fn test_connection(&self) -> Result<CrmIdentity, CrmError> {
        let response = self
            .client
            .get(self.url("identity"))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| CrmError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(CrmError::Rejected(format!("{status}: {detail}")));
        }

        response
            .json::<CrmIdentity>()
            .await
            .map_err(|e| CrmError::Rejected(format!("Malformed response: {e}")))
    }
}

/// Connector used when no CRM is configured
///
/// Approvals proceed locally; every sync attempt reports
/// [`CrmError::NotConfigured`] which the lifecycle manager records as
/// `crm_synced = false`.
pub struct DisabledCrmConnector;

#[async_trait]
impl CrmConnector for DisabledCrmConnector {
    async fn create_remote_record(&self, _lead: &Lead) -> Result<RemoteRecord, CrmError> {
        Err(CrmError::NotConfigured)
    }

    async fn test_connection(&self) -> Result<CrmIdentity, CrmError> {
        Err(CrmError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let connector = HttpCrmConnector::new(&CrmConfig {
            base_url: "https://crm.example.com/api/".to_string(),
            api_token: "token".to_string(),
            timeout_secs: 10,
        })
        .unwrap();

        assert_eq!(connector.url("leads"), "https://crm.example.com/api/leads");
    }

    #[tokio::test]
    async fn test_disabled_connector_reports_not_configured() {
        let err = DisabledCrmConnector.test_connection().await.unwrap_err();
        assert!(matches!(err, CrmError::NotConfigured));
    }
}
