//! HTTP gateway for the document-processing API.
//!
//! One method per remote operation; every call carries a caller-supplied
//! user session as a bearer token. Wire structs live next to the gateway
//! that owns them; the caller-facing model is built here and handed up.

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use docside_core::{
    defaults, Document, DocumentLinks, DocumentTypeHint, Error, ProcessingState, Result, Session,
    SourceClassification,
};

use crate::extractions::ExtractionsResponse;

/// Configuration for the documents gateway.
#[derive(Debug, Clone)]
pub struct DocumentsConfig {
    /// Base URL of the document-processing API.
    pub base_url: String,
    /// Timeout for metadata requests in seconds.
    pub timeout_seconds: u64,
    /// Timeout for uploads in seconds.
    pub upload_timeout_seconds: u64,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::API_BASE_URL.to_string(),
            timeout_seconds: defaults::HTTP_TIMEOUT_SECS,
            upload_timeout_seconds: defaults::UPLOAD_TIMEOUT_SECS,
        }
    }
}

impl DocumentsConfig {
    /// Create from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DOCSIDE_API_URL` | production endpoint | Document API base URL |
    /// | `DOCSIDE_HTTP_TIMEOUT_SECS` | `30` | Metadata request timeout |
    /// | `DOCSIDE_UPLOAD_TIMEOUT_SECS` | `90` | Upload timeout |
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("DOCSIDE_API_URL").unwrap_or_else(|_| defaults::API_BASE_URL.to_string());

        let timeout_seconds = std::env::var("DOCSIDE_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::HTTP_TIMEOUT_SECS);

        let upload_timeout_seconds = std::env::var("DOCSIDE_UPLOAD_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::UPLOAD_TIMEOUT_SECS);

        Self {
            base_url,
            timeout_seconds,
            upload_timeout_seconds,
        }
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the metadata request timeout.
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }
}

/// Wire shape of a document metadata response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentResponse {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    page_count: u32,
    /// Epoch milliseconds.
    creation_date: i64,
    progress: String,
    #[serde(default)]
    source_classification: Option<SourceClassification>,
    #[serde(default, rename = "_links")]
    links: LinksResponse,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default)]
    partner_documents: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LinksResponse {
    #[serde(default)]
    document: String,
    #[serde(default)]
    extractions: String,
}

impl DocumentResponse {
    fn into_document(self) -> Document {
        Document {
            state: ProcessingState::from_progress(&self.progress),
            id: self.id,
            filename: self.name,
            page_count: self.page_count,
            creation_date: DateTime::from_timestamp_millis(self.creation_date)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            source_classification: self
                .source_classification
                .unwrap_or(SourceClassification::Unknown),
            links: DocumentLinks {
                document: self.links.document,
                extractions: self.links.extractions,
            },
            parent_uris: self.parents,
            partner_uris: self.partner_documents,
        }
    }
}

/// Wire shape of an error-report response.
#[derive(Debug, Deserialize)]
struct ErrorReportResponse {
    #[serde(rename = "errorId")]
    error_id: String,
}

/// HTTP gateway to the document-processing API.
pub struct DocumentsClient {
    client: Client,
    config: DocumentsConfig,
}

impl DocumentsClient {
    /// Create a new gateway with the given configuration.
    pub fn new(config: DocumentsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!("Initializing documents gateway: url={}", config.base_url);

        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &DocumentsConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Resolve a bare document id or a full self URI to a request URL.
    /// Parents in a cascading delete are addressed by their full URIs.
    fn document_url(&self, id_or_uri: &str) -> String {
        if id_or_uri.starts_with("http://") || id_or_uri.starts_with("https://") {
            id_or_uri.to_string()
        } else {
            self.url(&format!("/documents/{}", id_or_uri))
        }
    }

    /// The trailing path segment of an id-or-URI, for error reporting.
    fn short_id(id_or_uri: &str) -> &str {
        id_or_uri
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(id_or_uri)
    }

    /// Upload raw document bytes.
    ///
    /// Returns only the created-resource URI from the `Location` header;
    /// full metadata requires a second round trip via [`get_document`].
    ///
    /// [`get_document`]: DocumentsClient::get_document
    #[instrument(skip(self, session, bytes), fields(subsystem = "documents", component = "documents_client", op = "upload", byte_count = bytes.len()))]
    pub async fn upload_document(
        &self,
        session: &Session,
        bytes: Vec<u8>,
        content_type: &str,
        filename: Option<&str>,
        doctype: Option<DocumentTypeHint>,
    ) -> Result<String> {
        let start = Instant::now();

        let mut request = self
            .client
            .post(self.url("/documents/"))
            .timeout(Duration::from_secs(self.config.upload_timeout_seconds))
            .bearer_auth(session.access_token())
            .header("Accept", defaults::ACCEPT_JSON)
            .header("Content-Type", content_type);

        if let Some(filename) = filename {
            request = request.query(&[("filename", filename)]);
        }
        if let Some(doctype) = doctype {
            request = request.query(&[("doctype", doctype.as_str())]);
        }

        let response = request
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::status_error("Upload", response).await);
        }

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .ok_or_else(|| Error::Request("Upload response carried no Location header".into()))?;

        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Upload accepted"
        );
        Ok(location)
    }

    /// Fetch a document's metadata by id or full URI.
    #[instrument(skip(self, session), fields(subsystem = "documents", component = "documents_client", op = "get_document"))]
    pub async fn get_document(&self, session: &Session, id_or_uri: &str) -> Result<Document> {
        let response = self
            .client
            .get(self.document_url(id_or_uri))
            .bearer_auth(session.access_token())
            .header("Accept", defaults::ACCEPT_JSON)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Document fetch failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::DocumentNotFound(Self::short_id(id_or_uri).to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::status_error("Document fetch", response).await);
        }

        let wire: DocumentResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse document: {}", e)))?;

        Ok(wire.into_document())
    }

    /// Delete a document by id or full URI.
    #[instrument(skip(self, session), fields(subsystem = "documents", component = "documents_client", op = "delete_document"))]
    pub async fn delete_document(&self, session: &Session, id_or_uri: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.document_url(id_or_uri))
            .bearer_auth(session.access_token())
            .header("Accept", defaults::ACCEPT_JSON)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Document delete failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::DocumentNotFound(Self::short_id(id_or_uri).to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::status_error("Document delete", response).await);
        }

        debug!("Document deleted");
        Ok(())
    }

    /// Fetch a document's extractions in wire form.
    #[instrument(skip(self, session), fields(subsystem = "documents", component = "documents_client", op = "get_extractions", document_id))]
    pub async fn get_extractions(
        &self,
        session: &Session,
        document_id: &str,
    ) -> Result<ExtractionsResponse> {
        let response = self
            .client
            .get(self.url(&format!("/documents/{}/extractions", document_id)))
            .bearer_auth(session.access_token())
            .header("Accept", defaults::ACCEPT_JSON)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Extractions fetch failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::DocumentNotFound(document_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::status_error("Extractions fetch", response).await);
        }

        response
            .json::<ExtractionsResponse>()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse extractions: {}", e)))
    }

    /// Submit an extraction feedback payload.
    #[instrument(skip(self, session, payload), fields(subsystem = "documents", component = "documents_client", op = "put_feedback", document_id))]
    pub async fn put_feedback(
        &self,
        session: &Session,
        document_id: &str,
        payload: &serde_json::Value,
    ) -> Result<()> {
        let response = self
            .client
            .put(self.url(&format!("/documents/{}/extractions", document_id)))
            .bearer_auth(session.access_token())
            .header("Accept", defaults::ACCEPT_JSON)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Feedback submission failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::status_error("Feedback submission", response).await);
        }

        debug!("Feedback accepted");
        Ok(())
    }

    /// File an error report for a document. Returns the server-issued id.
    #[instrument(skip(self, session), fields(subsystem = "documents", component = "documents_client", op = "report_error", document_id))]
    pub async fn post_error_report(
        &self,
        session: &Session,
        document_id: &str,
        summary: Option<&str>,
        description: Option<&str>,
    ) -> Result<String> {
        let mut request = self
            .client
            .post(self.url(&format!("/documents/{}/errorreport", document_id)))
            .bearer_auth(session.access_token())
            .header("Accept", defaults::ACCEPT_JSON);

        if let Some(summary) = summary {
            request = request.query(&[("summary", summary)]);
        }
        if let Some(description) = description {
            request = request.query(&[("description", description)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Request(format!("Error report failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Self::status_error("Error report", response).await);
        }

        let report: ErrorReportResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse error report: {}", e)))?;

        info!(error_id = %report.error_id, "Error report filed");
        Ok(report.error_id)
    }

    /// Map a non-success response to an error, consuming the body.
    async fn status_error(operation: &str, response: reqwest::Response) -> Error {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        warn!(http_status = status.as_u16(), "{} rejected", operation);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Error::Unauthorized(format!("{} returned {}: {}", operation, status, body))
            }
            _ => Error::Request(format!("{} returned {}: {}", operation, status, body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DocumentsConfig::default();
        assert_eq!(config.base_url, defaults::API_BASE_URL);
        assert_eq!(config.timeout_seconds, defaults::HTTP_TIMEOUT_SECS);
        assert_eq!(config.upload_timeout_seconds, defaults::UPLOAD_TIMEOUT_SECS);
    }

    #[test]
    fn test_config_builder() {
        let config = DocumentsConfig::default()
            .with_base_url("http://localhost:8000")
            .with_timeout(3);
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_seconds, 3);
    }

    #[test]
    fn test_document_url_from_bare_id() {
        let client = DocumentsClient::new(
            DocumentsConfig::default().with_base_url("http://localhost:8000/"),
        )
        .unwrap();
        assert_eq!(
            client.document_url("doc-1"),
            "http://localhost:8000/documents/doc-1"
        );
    }

    #[test]
    fn test_document_url_passes_full_uri_through() {
        let client = DocumentsClient::new(DocumentsConfig::default()).unwrap();
        let uri = "https://api.docside.io/documents/doc-1";
        assert_eq!(client.document_url(uri), uri);
    }

    #[test]
    fn test_short_id_from_uri() {
        assert_eq!(
            DocumentsClient::short_id("https://api.docside.io/documents/doc-1"),
            "doc-1"
        );
        assert_eq!(DocumentsClient::short_id("doc-1"), "doc-1");
    }

    #[test]
    fn test_document_response_mapping() {
        let json = serde_json::json!({
            "id": "doc-1",
            "name": "invoice.pdf",
            "pageCount": 3,
            "creationDate": 1_700_000_000_000i64,
            "progress": "COMPLETED",
            "sourceClassification": "SCANNED",
            "_links": {
                "document": "https://api.docside.io/documents/doc-1",
                "extractions": "https://api.docside.io/documents/doc-1/extractions",
            },
            "parents": ["https://api.docside.io/documents/parent-1"],
            "partnerDocuments": [],
        });

        let wire: DocumentResponse = serde_json::from_value(json).unwrap();
        let document = wire.into_document();

        assert_eq!(document.id, "doc-1");
        assert_eq!(document.state, ProcessingState::Completed);
        assert_eq!(document.filename.as_deref(), Some("invoice.pdf"));
        assert_eq!(document.page_count, 3);
        assert_eq!(document.source_classification, SourceClassification::Scanned);
        assert_eq!(document.parent_uris.len(), 1);
        assert_eq!(document.self_uri(), "https://api.docside.io/documents/doc-1");
    }

    #[test]
    fn test_document_response_minimal_fields() {
        let json = serde_json::json!({
            "id": "doc-2",
            "creationDate": 0,
            "progress": "PENDING",
        });

        let wire: DocumentResponse = serde_json::from_value(json).unwrap();
        let document = wire.into_document();

        assert_eq!(document.state, ProcessingState::Pending);
        assert!(document.filename.is_none());
        assert_eq!(document.page_count, 0);
        assert_eq!(document.source_classification, SourceClassification::Unknown);
        assert!(document.parent_uris.is_empty());
    }

    #[test]
    fn test_error_report_response_wire_name() {
        let report: ErrorReportResponse =
            serde_json::from_str(r#"{"errorId": "err-7"}"#).unwrap();
        assert_eq!(report.error_id, "err-7");
    }
}
