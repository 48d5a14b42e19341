//! Wire operations for the moderation workflow.

use async_trait::async_trait;
use serde_json::json;

use crate::errors::ApiError;
use crate::gateway::ApiClient;
use crate::models::job::{DraftJob, ScrapeRun, ScrapeSource, TriggerReceipt};
use crate::session::Session;

/// Server operations the moderation store depends on. The production
/// implementation talks HTTP through the gateway; tests substitute an
/// in-memory fake.
#[async_trait]
pub trait ScrapingApi: Send + Sync {
    async fn trigger(&self, source: ScrapeSource) -> Result<TriggerReceipt, ApiError>;
    async fn pending_jobs(&self) -> Result<Vec<DraftJob>, ApiError>;
    async fn history(&self) -> Result<Vec<ScrapeRun>, ApiError>;
    async fn approve(&self, id: &str) -> Result<(), ApiError>;
    async fn reject(&self, id: &str) -> Result<(), ApiError>;
    async fn bulk_approve(&self, ids: &[String]) -> Result<(), ApiError>;
    async fn bulk_reject(&self, ids: &[String]) -> Result<(), ApiError>;
}

/// HTTP implementation over the request gateway.
pub struct HttpScrapingApi {
    gateway: ApiClient,
    session: Session,
}

impl HttpScrapingApi {
    pub fn new(gateway: ApiClient, session: Session) -> Self {
        Self { gateway, session }
    }
}

#[async_trait]
impl ScrapingApi for HttpScrapingApi {
    async fn trigger(&self, source: ScrapeSource) -> Result<TriggerReceipt, ApiError> {
        let body = json!({ "source": source.as_str() });
        let value = self
            .gateway
            .post_json(&self.session, "/admin/scraping/trigger", &body)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn pending_jobs(&self) -> Result<Vec<DraftJob>, ApiError> {
        let value = self
            .gateway
            .get_json(&self.session, "/admin/scraping/jobs", &[])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn history(&self) -> Result<Vec<ScrapeRun>, ApiError> {
        let value = self
            .gateway
            .get_json(&self.session, "/admin/scraping/history", &[])
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn approve(&self, id: &str) -> Result<(), ApiError> {
        self.gateway
            .put_json(
                &self.session,
                &format!("/admin/scraping/jobs/{id}/approve"),
                &json!({}),
            )
            .await?;
        Ok(())
    }

    async fn reject(&self, id: &str) -> Result<(), ApiError> {
        self.gateway
            .delete(&self.session, &format!("/admin/scraping/jobs/{id}/reject"))
            .await?;
        Ok(())
    }

    async fn bulk_approve(&self, ids: &[String]) -> Result<(), ApiError> {
        self.gateway
            .post_json(
                &self.session,
                "/admin/scraping/jobs/bulk-approve",
                &json!({ "jobIds": ids }),
            )
            .await?;
        Ok(())
    }

    async fn bulk_reject(&self, ids: &[String]) -> Result<(), ApiError> {
        self.gateway
            .post_json(
                &self.session,
                "/admin/scraping/jobs/bulk-reject",
                &json!({ "jobIds": ids }),
            )
            .await?;
        Ok(())
    }
}
