//! Centralized default constants for the Docside SDK.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates should reference these constants instead of defining
//! their own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// ENDPOINTS
// =============================================================================

/// Default base URL of the document-processing API.
pub const API_BASE_URL: &str = "https://api.docside.io";

/// Default base URL of the user-center API (anonymous user accounts, OAuth).
pub const USER_CENTER_BASE_URL: &str = "https://user.docside.io";

/// Default email domain for generated anonymous-user usernames.
pub const EMAIL_DOMAIN: &str = "docside.io";

// =============================================================================
// SESSIONS
// =============================================================================

/// Seconds subtracted from a session's server-reported lifetime.
///
/// A session within this window of its expiry is treated as already expired
/// so an in-flight request never carries a token that lapses mid-call.
pub const EXPIRY_SLACK_SECS: i64 = 15;

/// Length of generated anonymous-user passwords.
pub const GENERATED_PASSWORD_LEN: usize = 24;

// =============================================================================
// POLLING
// =============================================================================

/// Fixed interval between document poll iterations (milliseconds).
pub const POLL_INTERVAL_MS: u64 = 1000;

// =============================================================================
// HTTP
// =============================================================================

/// Timeout for metadata and token requests (seconds).
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Timeout for document uploads (seconds). Uploads carry page images and
/// need more headroom than metadata round trips.
pub const UPLOAD_TIMEOUT_SECS: u64 = 90;

// =============================================================================
// CONTENT TYPES
// =============================================================================

/// Accept header value for all document API responses.
pub const ACCEPT_JSON: &str = "application/vnd.docside.v1+json";

/// Content-type prefix for partial document uploads. The source media type
/// is appended, e.g. `application/vnd.docside.v1.partial+image/jpeg`.
pub const PARTIAL_CONTENT_TYPE_PREFIX: &str = "application/vnd.docside.v1.partial+";

/// Content type of the composite-document manifest upload.
pub const COMPOSITE_CONTENT_TYPE: &str = "application/vnd.docside.v1.composite+json";
