//! Core data model for the Docside SDK.
//!
//! These types are the language the session manager and the document
//! orchestrator speak to each other and to callers. Wire-format structs
//! (request/response JSON) live next to the HTTP gateways that own them;
//! this module only carries the caller-facing model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::defaults;

// =============================================================================
// SESSIONS & CREDENTIALS
// =============================================================================

/// A bearer session for the remote API.
///
/// Immutable once created. Expiry is evaluated lazily at acquisition time;
/// a session within [`defaults::EXPIRY_SLACK_SECS`] of its expiry is
/// already treated as expired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Create a session with an absolute expiry instant.
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Create a session from a token and a server-reported lifetime in
    /// seconds (the OAuth `expires_in` field).
    pub fn with_expires_in(access_token: impl Into<String>, expires_in_secs: i64) -> Self {
        Self::new(access_token, Utc::now() + Duration::seconds(expires_in_secs))
    }

    /// The bearer token value.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Absolute expiry instant.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the session counts as expired at the given instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(defaults::EXPIRY_SLACK_SECS) >= self.expires_at
    }

    /// Whether the session counts as expired right now.
    pub fn has_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Stored credentials of the SDK-owned anonymous user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredentials {
    /// Generated email-like username, `<localId>@<emailDomain>`.
    pub username: String,
    /// Generated secret.
    pub password: String,
}

impl UserCredentials {
    /// Create a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The email domain embedded in the username, if any.
    ///
    /// Used to detect stale per-installation domains after a configuration
    /// change (email-domain migration).
    pub fn email_domain(&self) -> Option<&str> {
        self.username.rsplit_once('@').map(|(_, domain)| domain)
    }
}

// =============================================================================
// DOCUMENTS
// =============================================================================

/// Server-side processing state of a document.
///
/// Transitions are monotonic toward a terminal state; `Pending` is the only
/// non-terminal state and polling stops on the first non-`Pending` read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingState {
    /// Upload accepted, extraction still running.
    Pending,
    /// Processing finished, extractions available.
    Completed,
    /// Processing failed on the server side.
    Error,
    /// State reported by the server was not recognized.
    Unknown,
}

impl ProcessingState {
    /// Map the wire `progress` field onto a state.
    ///
    /// Unrecognized values map to `Unknown` rather than failing the parse;
    /// a new server-side state must not break existing clients.
    pub fn from_progress(progress: &str) -> Self {
        match progress {
            "PENDING" => Self::Pending,
            "COMPLETED" => Self::Completed,
            "ERROR" => Self::Error,
            _ => Self::Unknown,
        }
    }

    /// Whether polling must stop at this state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// How the uploaded source was produced, as classified by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceClassification {
    Composite,
    Native,
    Scanned,
    SandwichScan,
    Text,
    #[serde(other)]
    Unknown,
}

/// Optional classification submitted at upload time to improve server-side
/// extraction accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentTypeHint {
    BankStatement,
    Contract,
    Invoice,
    Reminder,
    RemittanceSlip,
    TravelExpenseReport,
    Other,
}

impl DocumentTypeHint {
    /// Value sent in the upload `doctype` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BankStatement => "BankStatement",
            Self::Contract => "Contract",
            Self::Invoice => "Invoice",
            Self::Reminder => "Reminder",
            Self::RemittanceSlip => "RemittanceSlip",
            Self::TravelExpenseReport => "TravelExpenseReport",
            Self::Other => "Other",
        }
    }
}

/// Resource links reported by the server for a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentLinks {
    /// The document's own URI.
    pub document: String,
    /// URI of the document's extractions resource.
    pub extractions: String,
}

/// A document known to the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Server-issued identifier.
    pub id: String,
    /// Point-in-time processing state at fetch time.
    pub state: ProcessingState,
    /// Original filename, if one was supplied at upload.
    pub filename: Option<String>,
    /// Number of pages the server detected.
    pub page_count: u32,
    /// Creation instant reported by the server.
    pub creation_date: DateTime<Utc>,
    /// How the source was produced.
    pub source_classification: SourceClassification,
    /// Resource links (self, extractions).
    pub links: DocumentLinks,
    /// Composite documents that include this partial document as a page,
    /// ordered oldest-first. Required for cascading delete.
    pub parent_uris: Vec<String>,
    /// Partial documents composed into this composite document, in page order.
    pub partner_uris: Vec<String>,
}

impl Document {
    /// The document's own URI as reported by the server.
    pub fn self_uri(&self) -> &str {
        &self.links.document
    }
}

// =============================================================================
// EXTRACTIONS
// =============================================================================

/// Location of an extracted value on a document page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// 1-based page number.
    pub page: u32,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// A single extracted value with its semantic entity type.
///
/// Mutating the value or the bounding box marks the extraction dirty; the
/// flag is cleared only by a successful feedback submission covering it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    entity: String,
    value: String,
    bounding_box: Option<BoundingBox>,
    dirty: bool,
}

impl Extraction {
    /// Create an extraction as parsed from the server (clean).
    pub fn new(
        entity: impl Into<String>,
        value: impl Into<String>,
        bounding_box: Option<BoundingBox>,
    ) -> Self {
        Self {
            entity: entity.into(),
            value: value.into(),
            bounding_box,
            dirty: false,
        }
    }

    /// Semantic entity type, e.g. `amount` or `iban`.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    /// Current value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Bounding box, if the server located the value on a page.
    pub fn bounding_box(&self) -> Option<&BoundingBox> {
        self.bounding_box.as_ref()
    }

    /// Whether the extraction carries caller modifications not yet confirmed
    /// by a feedback submission.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the value, marking the extraction dirty.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.dirty = true;
    }

    /// Replace the bounding box, marking the extraction dirty.
    pub fn set_bounding_box(&mut self, bounding_box: Option<BoundingBox>) {
        self.bounding_box = bounding_box;
        self.dirty = true;
    }

    /// Clear the dirty flag. Called by the orchestrator after the feedback
    /// submission covering this extraction succeeded; not meant for callers.
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

/// A named extraction with alternative candidates and nested fields.
///
/// Composition over subtyping: the base [`Extraction`] record is embedded,
/// and candidates share the same entity as the parent by server contract.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecificExtraction {
    /// Name of the extracted field, e.g. `amountToPay`.
    pub name: String,
    /// The primary extracted value.
    pub extraction: Extraction,
    /// Alternative values, in server order. Empty when the server declared
    /// no candidate group for this extraction.
    pub candidates: Vec<Extraction>,
    /// Nested sub-fields, e.g. the parts of a payment recipient.
    pub nested: Vec<SpecificExtraction>,
}

impl SpecificExtraction {
    /// Create a specific extraction without candidates or nested fields.
    pub fn new(name: impl Into<String>, extraction: Extraction) -> Self {
        Self {
            name: name.into(),
            extraction,
            candidates: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Current value of the primary extraction.
    pub fn value(&self) -> &str {
        self.extraction.value()
    }

    /// Entity type of the primary extraction.
    pub fn entity(&self) -> &str {
        self.extraction.entity()
    }

    /// Whether the primary extraction is dirty.
    pub fn is_dirty(&self) -> bool {
        self.extraction.is_dirty()
    }

    /// Replace the primary value, marking the extraction dirty.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.extraction.set_value(value);
    }
}

/// A table-shaped extraction composed of repeated rows of specific
/// extractions, e.g. invoice line items.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundExtraction {
    /// Name of the compound field, e.g. `lineItems`.
    pub name: String,
    /// Ordered rows; each row maps field names to their extraction.
    pub rows: Vec<HashMap<String, SpecificExtraction>>,
}

/// All extractions of a document: named fields plus table-shaped compounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionBundle {
    /// Named field extractions keyed by field name.
    pub specific: HashMap<String, SpecificExtraction>,
    /// Compound extractions keyed by compound name.
    pub compound: HashMap<String, CompoundExtraction>,
}
