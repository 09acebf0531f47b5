//! # Usage Module
//!
//! Fetch orchestration: fresh data when the API answers, the last cached
//! snapshot (flagged stale) when it does not.
//!
//! 1. Resolve a token. Without one there is nothing to do.
//! 2. Ask the API.
//! 3. On success, clear the stale flag, cache the snapshot and return it.
//! 4. On any fetch failure, serve the cached copy for `key` marked stale,
//!    or report `NoDataAvailable` on a first run.

use tracing::debug;

use crate::cache::UsageCache;
use crate::credentials::TokenSource;
use crate::error::UsageError;
use crate::models::UsageSnapshot;
use crate::usage_api::UsageFetcher;

pub fn fetch_usage(
    tokens: &impl TokenSource,
    fetcher: &impl UsageFetcher,
    cache: &impl UsageCache,
    key: &str,
) -> Result<UsageSnapshot, UsageError> {
    let token = tokens.resolve()?;

    let err = match fetcher.fetch(&token) {
        Ok(mut snapshot) => {
            snapshot.is_stale = false;
            cache.store(key, &snapshot);
            return Ok(snapshot);
        }
        Err(err) => err,
    };
    debug!(error = %err, "usage fetch failed, trying cache");

    match cache.get(key) {
        Some(mut cached) => {
            cached.is_stale = true;
            Ok(cached)
        }
        None => Err(UsageError::NoDataAvailable),
    }
}
