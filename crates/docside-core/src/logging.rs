//! Structured logging schema and field name constants for the Docside SDK.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized field names across
//! every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Operation failed and is surfaced to the caller |
//! | WARN  | Recoverable issue, automatic recovery applied (e.g. invalid grant) |
//! | INFO  | Lifecycle events (user creation, login), operation completions |
//! | DEBUG | Decision points, cache hits, poll iterations |
//! | TRACE | Per-field extraction parsing, wire payloads |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "auth", "documents", "polling"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "session_manager", "user_center", "documents_client", "coordinator"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "get_session", "upload", "poll", "delete_cascade"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Document identifier being operated on.
pub const DOCUMENT_ID: &str = "document_id";

/// Number of parent URIs involved in a cascading delete.
pub const PARENT_COUNT: &str = "parent_count";

/// Number of named extractions parsed from a response.
pub const EXTRACTION_COUNT: &str = "extraction_count";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of poll iterations performed before termination.
pub const POLL_ATTEMPTS: &str = "poll_attempts";

/// HTTP status code returned by the remote API.
pub const HTTP_STATUS: &str = "http_status";
