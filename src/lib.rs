//! # Claude Quota
//!
//! Plan usage (5-hour and 7-day windows) for Claude Code statuslines,
//! fetched from the OAuth usage endpoint and cached per workspace.
//!
//! ## Overview
//!
//! The statusline process is short-lived and runs on every refresh, so this
//! crate never fails loudly:
//! - A bearer token is resolved from the platform secure store, falling back
//!   to `~/.claude/.credentials.json`
//! - One bounded HTTP request fetches the usage buckets
//! - Successful fetches are written to a per-workspace JSON cache
//! - When the API is unreachable the last cached snapshot is served, marked stale
//!
//! Only a missing credential or a first run with no cache yields an error,
//! and even that is typed so the caller can render nothing.
//!
//! ## Features
//!
//! - `colors` (default): Enables terminal color output via owo-colors

/// Usage cache contract and the in-memory cache
pub mod cache;

/// Command-line arguments and resolved configuration
pub mod cli;

/// OAuth token resolution from secure stores and the credentials file
pub mod credentials;

/// Text and JSON rendering of usage segments
pub mod display;

/// Error taxonomy
pub mod error;

/// Persistent per-workspace cache
pub mod file_cache;

/// Data models for hook input and usage snapshots
pub mod models;

/// Fetch orchestration with stale fallback
pub mod usage;

/// Client for the Claude OAuth usage API
pub mod usage_api;

/// Paths, stdin and duration strings
pub mod utils;

pub use error::UsageError;
pub use models::UsageSnapshot;
pub use usage::fetch_usage;
