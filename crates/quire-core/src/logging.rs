//! Structured logging schema and field name constants for quire.
//!
//! All crates use these constants for consistent structured logging fields so
//! log aggregation can query by the same field names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, item skipped or fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), completed mutations |
//! | DEBUG | Decision points (search mode, sort fallback), config choices |
//! | TRACE | Per-item iteration (import files, search hits) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across a request.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "render", "import"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "note_search", "tags", "reconciler"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "search", "create", "toggle_archive", "reconcile"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Note UUID being operated on.
pub const NOTE_ID: &str = "note_id";

/// Tag id being operated on.
pub const TAG_ID: &str = "tag_id";

/// Acting or affected user UUID.
pub const USER_ID: &str = "user_id";

/// Search query text.
pub const QUERY: &str = "query";

/// Import source path.
pub const SOURCE_PATH: &str = "source_path";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search or query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of tags involved in an operation.
pub const TAG_COUNT: &str = "tag_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

/// Whether the operation ran without persisting (import dry run).
pub const DRY_RUN: &str = "dry_run";
