//! Match Retrieval Service: CV upload-and-match and saved-match retrieval.
//!
//! The service validates documents client-side before any network traffic,
//! sends the request through the gateway, and normalizes whatever envelope
//! the server answers with into a [`MatchResult`].

pub mod normalize;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::debug;

use crate::errors::ApiError;
use crate::gateway::{ApiClient, UPLOAD_TIMEOUT};
use crate::models::matching::MatchResult;
use crate::session::Session;

/// Default number of matches requested.
pub const DEFAULT_MATCH_LIMIT: usize = 20;

/// Client-side size cap. A fast reject, not a security boundary: the server
/// re-validates.
pub const MAX_CV_BYTES: usize = 5 * 1024 * 1024;

/// Document formats the backend's CV extractor understands.
pub const ALLOWED_CV_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// An in-memory CV document ready for upload.
#[derive(Debug, Clone)]
pub struct CvUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Rejects documents the server would refuse anyway, before any request is
/// issued.
pub fn validate_cv(upload: &CvUpload) -> Result<(), ApiError> {
    if upload.bytes.len() > MAX_CV_BYTES {
        return Err(ApiError::InvalidFile(format!(
            "'{}' is {} bytes; the limit is {} MB",
            upload.file_name,
            upload.bytes.len(),
            MAX_CV_BYTES / (1024 * 1024)
        )));
    }
    if !ALLOWED_CV_TYPES.contains(&upload.content_type.as_str()) {
        return Err(ApiError::InvalidFile(format!(
            "unsupported file type '{}'; upload a PDF or Word document",
            upload.content_type
        )));
    }
    Ok(())
}

/// Transport seam between the match service and the HTTP gateway. Tests
/// substitute a canned transport to observe exactly which calls are made.
#[async_trait]
pub trait MatchTransport: Send + Sync {
    async fn upload_cv(&self, upload: &CvUpload, limit: usize) -> Result<Value, ApiError>;
    async fn saved_matches(&self, limit: usize) -> Result<Value, ApiError>;
}

/// Production transport: multipart upload and saved-match retrieval through
/// the request gateway.
pub struct HttpMatchTransport {
    gateway: ApiClient,
    session: Session,
}

impl HttpMatchTransport {
    pub fn new(gateway: ApiClient, session: Session) -> Self {
        Self { gateway, session }
    }
}

#[async_trait]
impl MatchTransport for HttpMatchTransport {
    async fn upload_cv(&self, upload: &CvUpload, limit: usize) -> Result<Value, ApiError> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)?;
        let form = Form::new()
            .part("cv", part)
            .text("limit", limit.to_string());
        self.gateway
            .post_multipart(&self.session, "/cv/upload", form, UPLOAD_TIMEOUT)
            .await
    }

    async fn saved_matches(&self, limit: usize) -> Result<Value, ApiError> {
        self.gateway
            .get_json(&self.session, "/cv/matches", &[("limit", limit.to_string())])
            .await
    }
}

/// CV-to-job match retrieval over any [`MatchTransport`].
pub struct MatchService<T> {
    transport: T,
}

impl<T: MatchTransport> MatchService<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Uploads a CV and returns the normalized match result. Size and type
    /// are checked before any network traffic.
    pub async fn upload_and_match(
        &self,
        upload: &CvUpload,
        limit: usize,
    ) -> Result<MatchResult, ApiError> {
        validate_cv(upload)?;
        let raw = self.transport.upload_cv(upload, limit).await?;
        let result = normalize::match_result(&raw)?;
        debug!(
            matches = result.matches.len(),
            semantic = result.semantic_count,
            fallback = result.fallback,
            "CV matched"
        );
        Ok(result)
    }

    /// Retrieves matches for the most recently uploaded CV held server-side.
    /// No upload happens.
    pub async fn saved_matches(&self, limit: usize) -> Result<MatchResult, ApiError> {
        let raw = self.transport.saved_matches(limit).await?;
        normalize::match_result(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct CountingTransport {
        uploads: Arc<AtomicUsize>,
        fetches: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl MatchTransport for CountingTransport {
        async fn upload_cv(&self, _upload: &CvUpload, limit: usize) -> Result<Value, ApiError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(json!({
                "data": {
                    "matches": [{ "_id": "j1", "title": "Data Engineer", "similarityScore": 88 }],
                    "semanticCount": 1,
                    "total": limit
                }
            }))
        }

        async fn saved_matches(&self, _limit: usize) -> Result<Value, ApiError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(json!({ "matches": [{ "_id": "j1" }], "semanticCount": 0 }))
        }
    }

    fn upload(content_type: &str, size: usize) -> CvUpload {
        CvUpload {
            file_name: "cv.pdf".to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0u8; size],
        }
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_without_a_request() {
        let transport = CountingTransport::default();
        let service = MatchService::new(transport.clone());

        let err = service
            .upload_and_match(&upload("application/pdf", 6 * 1024 * 1024), DEFAULT_MATCH_LIMIT)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidFile(_)));
        assert_eq!(transport.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn disallowed_type_is_rejected_without_a_request() {
        let transport = CountingTransport::default();
        let service = MatchService::new(transport.clone());

        let err = service
            .upload_and_match(&upload("text/plain", 1024), DEFAULT_MATCH_LIMIT)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidFile(_)));
        assert_eq!(transport.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_pdf_uploads_and_normalizes() {
        let transport = CountingTransport::default();
        let service = MatchService::new(transport.clone());

        let result = service
            .upload_and_match(&upload("application/pdf", 2 * 1024 * 1024), DEFAULT_MATCH_LIMIT)
            .await
            .unwrap();

        assert_eq!(transport.uploads.load(Ordering::SeqCst), 1);
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.semantic_count, 1);
        assert!(!result.fallback);
    }

    #[tokio::test]
    async fn docx_is_on_the_allow_list() {
        let service = MatchService::new(CountingTransport::default());
        let docx = upload(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            1024,
        );
        assert!(service.upload_and_match(&docx, 5).await.is_ok());
    }

    #[tokio::test]
    async fn saved_matches_derive_fallback_from_the_count() {
        let transport = CountingTransport::default();
        let service = MatchService::new(transport.clone());

        let result = service.saved_matches(DEFAULT_MATCH_LIMIT).await.unwrap();

        assert_eq!(transport.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(result.semantic_count, 0);
        assert!(result.fallback);
    }
}
