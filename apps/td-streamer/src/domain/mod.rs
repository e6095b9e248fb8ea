//! Domain Layer - Protocol types and translation logic.
//!
//! Pure Rust with no I/O: field schemas, the session context, and request
//! envelopes.

/// Per-service field tables and the name/index registry.
pub mod schema;

/// Principals bundle and the derived session context.
pub mod session;

/// Commands, request envelopes and QOS levels.
pub mod request;
