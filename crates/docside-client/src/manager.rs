//! Document processing orchestrator.
//!
//! The primary façade of the SDK. Every operation acquires a user session
//! from the session manager before touching the network, then runs its
//! chain of remote calls strictly in sequence: upload then metadata fetch,
//! parents then child on delete, feedback then dirty-flag clearing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use docside_auth::SessionManager;
use docside_core::{
    defaults, Document, DocumentTypeHint, Error, ExtractionBundle, ProcessingState, Result,
    SpecificExtraction,
};

use crate::api::DocumentsClient;
use crate::extractions::{bundle_feedback_payload, feedback_payload, parse_extractions};
use crate::polling::PollingCoordinator;

/// Normalize an arbitrary integer rotation into `[0, 360)` degrees.
pub fn normalize_rotation(degrees: i32) -> i32 {
    ((degrees % 360) + 360) % 360
}

/// Orchestrates document workflows against the remote service.
pub struct DocumentManager {
    api: Arc<DocumentsClient>,
    sessions: Arc<SessionManager>,
    coordinator: PollingCoordinator,
    poll_interval: Duration,
}

impl DocumentManager {
    /// Create a manager with the default poll interval.
    pub fn new(api: Arc<DocumentsClient>, sessions: Arc<SessionManager>) -> Self {
        Self {
            api,
            sessions,
            coordinator: PollingCoordinator::new(),
            poll_interval: Duration::from_millis(defaults::POLL_INTERVAL_MS),
        }
    }

    /// Override the fixed interval between poll iterations.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The cancellation registry for in-flight polls.
    pub fn polling(&self) -> &PollingCoordinator {
        &self.coordinator
    }

    /// Upload raw bytes as a partial document and return its metadata.
    ///
    /// The upload response yields only a location reference, so the created
    /// document's metadata is fetched in a chained second round trip.
    #[instrument(skip(self, bytes), fields(subsystem = "documents", component = "manager", op = "create_partial"))]
    pub async fn create_partial_document(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
        filename: Option<&str>,
        doctype: Option<DocumentTypeHint>,
    ) -> Result<Document> {
        if bytes.is_empty() {
            return Err(Error::InvalidInput("document bytes must not be empty".into()));
        }
        if content_type.is_empty() {
            return Err(Error::InvalidInput("content type must not be empty".into()));
        }

        let session = self.sessions.get_session().await?;
        let partial_type = format!("{}{}", defaults::PARTIAL_CONTENT_TYPE_PREFIX, content_type);

        let location = self
            .api
            .upload_document(&session, bytes, &partial_type, filename, doctype)
            .await?;
        let document = self.api.get_document(&session, &location).await?;

        info!(document_id = %document.id, "Created partial document");
        Ok(document)
    }

    /// Assemble partial documents into a composite document.
    ///
    /// `parts` pairs each partial document with its rotation in degrees;
    /// input order is preserved as page order in the manifest, and rotations
    /// are normalized into `[0, 360)`.
    #[instrument(skip(self, parts), fields(subsystem = "documents", component = "manager", op = "create_composite", part_count = parts.len()))]
    pub async fn create_composite_document(
        &self,
        parts: &[(Document, i32)],
        doctype: Option<DocumentTypeHint>,
    ) -> Result<Document> {
        if parts.is_empty() {
            return Err(Error::InvalidInput(
                "a composite document needs at least one partial document".into(),
            ));
        }

        let subdocuments: Vec<serde_json::Value> = parts
            .iter()
            .map(|(document, rotation)| {
                serde_json::json!({
                    "document": document.self_uri(),
                    "rotationDelta": normalize_rotation(*rotation),
                })
            })
            .collect();
        let manifest = serde_json::json!({ "subdocuments": subdocuments });
        let bytes = serde_json::to_vec(&manifest)?;

        let session = self.sessions.get_session().await?;
        let location = self
            .api
            .upload_document(&session, bytes, defaults::COMPOSITE_CONTENT_TYPE, None, doctype)
            .await?;
        let document = self.api.get_document(&session, &location).await?;

        info!(document_id = %document.id, "Created composite document");
        Ok(document)
    }

    /// Wait for a document to leave the `Pending` state.
    ///
    /// Returns immediately when the document is already terminal. Otherwise
    /// the document is re-fetched at the fixed poll interval until a
    /// terminal state is observed or [`PollingCoordinator::cancel`] resolves
    /// the poll as [`Error::Cancelled`]. A terminal `Error` or `Unknown`
    /// state resolves the poll successfully; callers inspect the state.
    #[instrument(skip(self, document), fields(subsystem = "polling", component = "manager", op = "poll", document_id = %document.id))]
    pub async fn poll_document(&self, document: &Document) -> Result<Document> {
        if document.state != ProcessingState::Pending {
            debug!("Document already terminal, nothing to poll");
            return Ok(document.clone());
        }

        let cancelled = self.coordinator.register(&document.id);
        let result = self.poll_loop(document, &cancelled).await;
        // Entry removal must happen on every exit: success, error, or cancel.
        self.coordinator.finish(&document.id);
        result
    }

    async fn poll_loop(&self, document: &Document, cancelled: &AtomicBool) -> Result<Document> {
        let mut attempts: u32 = 0;
        loop {
            sleep(self.poll_interval).await;

            if cancelled.load(Ordering::SeqCst) {
                info!(poll_attempts = attempts, "Poll cancelled");
                return Err(Error::Cancelled(document.id.clone()));
            }

            let session = self.sessions.get_session().await?;
            let fetched = self.api.get_document(&session, &document.id).await?;
            attempts += 1;

            if fetched.state.is_terminal() {
                info!(
                    poll_attempts = attempts,
                    state = ?fetched.state,
                    "Polling finished"
                );
                return Ok(fetched);
            }
            debug!(poll_attempts = attempts, "Document still pending");
        }
    }

    /// Delete a partial document together with every composite built from it.
    ///
    /// Parents are deleted oldest-first before the document itself; the
    /// server rejects deleting a partial that is still referenced by a
    /// composite. Any parent failure aborts the cascade.
    #[instrument(skip(self), fields(subsystem = "documents", component = "manager", op = "delete_cascade", document_id))]
    pub async fn delete_partial_document_and_parents(&self, document_id: &str) -> Result<()> {
        if document_id.is_empty() {
            return Err(Error::InvalidInput("document id must not be empty".into()));
        }

        let session = self.sessions.get_session().await?;
        let document = self.api.get_document(&session, document_id).await?;

        debug!(parent_count = document.parent_uris.len(), "Starting cascade");
        for parent_uri in &document.parent_uris {
            self.api.delete_document(&session, parent_uri).await?;
        }
        self.api.delete_document(&session, &document.id).await?;

        info!(
            parent_count = document.parent_uris.len(),
            "Deleted document and parents"
        );
        Ok(())
    }

    /// Fetch the named extractions of a processed document.
    ///
    /// Extractions whose declared candidate group is missing are included
    /// with an empty candidate list.
    pub async fn get_extractions(
        &self,
        document: &Document,
    ) -> Result<HashMap<String, SpecificExtraction>> {
        Ok(self.get_all_extractions(document).await?.specific)
    }

    /// Fetch named and compound (table-shaped) extractions together.
    #[instrument(skip(self, document), fields(subsystem = "documents", component = "manager", op = "get_extractions", document_id = %document.id))]
    pub async fn get_all_extractions(&self, document: &Document) -> Result<ExtractionBundle> {
        let session = self.sessions.get_session().await?;
        let response = self.api.get_extractions(&session, &document.id).await?;
        let bundle = parse_extractions(response);

        debug!(
            extraction_count = bundle.specific.len(),
            "Extractions parsed"
        );
        Ok(bundle)
    }

    /// Submit the current values of the given extractions as feedback.
    ///
    /// On success the dirty flag is cleared on every submitted extraction.
    /// On failure the flags are left untouched so a retry resubmits exactly
    /// the extractions that still need confirming.
    #[instrument(skip(self, document, extractions), fields(subsystem = "documents", component = "manager", op = "send_feedback", document_id = %document.id, extraction_count = extractions.len()))]
    pub async fn send_feedback_for_extractions(
        &self,
        document: &Document,
        extractions: &mut HashMap<String, SpecificExtraction>,
    ) -> Result<Document> {
        if extractions.is_empty() {
            return Err(Error::InvalidInput(
                "feedback needs at least one extraction".into(),
            ));
        }

        let session = self.sessions.get_session().await?;
        let payload = feedback_payload(extractions);

        match self.api.put_feedback(&session, &document.id, &payload).await {
            Ok(()) => {
                for extraction in extractions.values_mut() {
                    extraction.extraction.clear_dirty();
                }
                info!("Feedback accepted, extractions marked clean");
                Ok(document.clone())
            }
            Err(e) => {
                warn!("Feedback rejected, dirty flags kept");
                Err(e)
            }
        }
    }

    /// Submit feedback for a whole bundle, compound extractions included.
    ///
    /// Same dirty-flag contract as [`send_feedback_for_extractions`]; on
    /// success every extraction in the bundle is marked clean, compound row
    /// fields included.
    ///
    /// [`send_feedback_for_extractions`]: DocumentManager::send_feedback_for_extractions
    #[instrument(skip(self, document, bundle), fields(subsystem = "documents", component = "manager", op = "send_feedback", document_id = %document.id, extraction_count = bundle.specific.len()))]
    pub async fn send_feedback_for_bundle(
        &self,
        document: &Document,
        bundle: &mut ExtractionBundle,
    ) -> Result<Document> {
        if bundle.specific.is_empty() && bundle.compound.is_empty() {
            return Err(Error::InvalidInput(
                "feedback needs at least one extraction".into(),
            ));
        }

        let session = self.sessions.get_session().await?;
        let payload = bundle_feedback_payload(bundle);

        match self.api.put_feedback(&session, &document.id, &payload).await {
            Ok(()) => {
                for extraction in bundle.specific.values_mut() {
                    extraction.extraction.clear_dirty();
                }
                for table in bundle.compound.values_mut() {
                    for row in &mut table.rows {
                        for field in row.values_mut() {
                            field.extraction.clear_dirty();
                        }
                    }
                }
                info!("Feedback accepted, extractions marked clean");
                Ok(document.clone())
            }
            Err(e) => {
                warn!("Feedback rejected, dirty flags kept");
                Err(e)
            }
        }
    }

    /// File an error report for a document. Returns the server-issued id.
    #[instrument(skip(self, document), fields(subsystem = "documents", component = "manager", op = "report", document_id = %document.id))]
    pub async fn report_document(
        &self,
        document: &Document,
        summary: Option<&str>,
        description: Option<&str>,
    ) -> Result<String> {
        let session = self.sessions.get_session().await?;
        self.api
            .post_error_report(&session, &document.id, summary, description)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rotation_identity() {
        assert_eq!(normalize_rotation(0), 0);
        assert_eq!(normalize_rotation(90), 90);
        assert_eq!(normalize_rotation(359), 359);
    }

    #[test]
    fn test_normalize_rotation_wraps_positive() {
        assert_eq!(normalize_rotation(360), 0);
        assert_eq!(normalize_rotation(450), 90);
        assert_eq!(normalize_rotation(720), 0);
    }

    #[test]
    fn test_normalize_rotation_wraps_negative() {
        assert_eq!(normalize_rotation(-90), 270);
        assert_eq!(normalize_rotation(-360), 0);
        assert_eq!(normalize_rotation(-450), 270);
    }
}
