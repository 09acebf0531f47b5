use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::io::{self, Read};
use std::time::Duration;
use tracing::debug;

use crate::error::UsageError;
use crate::models::UsageSnapshot;

pub const USAGE_ENDPOINT: &str = "https://api.anthropic.com/api/oauth/usage";
pub const ANTHROPIC_BETA: &str = "oauth-2025-04-20";
pub const USER_AGENT: &str = concat!("claude-quota/", env!("CARGO_PKG_VERSION"));
/// Bodies are cut off here; anything longer fails to decode
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Fetches one usage snapshot for a bearer token
pub trait UsageFetcher {
    fn fetch(&self, token: &str) -> Result<UsageSnapshot, UsageError>;
}

/// Blocking client for the OAuth usage endpoint
pub struct UsageClient {
    endpoint: String,
    agent: ureq::Agent,
}

impl UsageClient {
    /// `timeout` bounds the whole request: resolve, connect, send and read
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            endpoint: endpoint.into(),
            agent,
        }
    }
}

impl UsageFetcher for UsageClient {
    fn fetch(&self, token: &str) -> Result<UsageSnapshot, UsageError> {
        debug!(endpoint = %self.endpoint, "GET usage");
        let mut response = self
            .agent
            .get(&self.endpoint)
            .header("Authorization", format!("Bearer {token}"))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .header("anthropic-beta", ANTHROPIC_BETA)
            .call()
            .map_err(transport_error)?;

        let status = response.status().as_u16();
        debug!(status, "usage response");
        if status != 200 {
            return Err(UsageError::HttpStatus(status));
        }

        let mut body = Vec::new();
        response
            .body_mut()
            .as_reader()
            .take(MAX_BODY_BYTES)
            .read_to_end(&mut body)
            .map_err(read_error)?;
        debug!(bytes = body.len(), "usage body read");

        parse_usage_body(&body, Utc::now())
    }
}

fn transport_error(err: ureq::Error) -> UsageError {
    match err {
        ureq::Error::Timeout(_) => UsageError::Timeout,
        ureq::Error::Io(e) if e.kind() == io::ErrorKind::TimedOut => UsageError::Timeout,
        other => UsageError::Network(other.to_string()),
    }
}

fn read_error(err: io::Error) -> UsageError {
    if err.kind() == io::ErrorKind::TimedOut {
        UsageError::Timeout
    } else {
        UsageError::Network(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct UsageBucketDto {
    #[serde(default)]
    utilization: Option<f64>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    resets_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct UsageResponseDto {
    #[serde(default)]
    five_hour: Option<UsageBucketDto>,
    #[serde(default)]
    seven_day: Option<UsageBucketDto>,
    #[serde(default)]
    seven_day_opus: Option<UsageBucketDto>,
    #[serde(default)]
    seven_day_sonnet: Option<UsageBucketDto>,
}

impl UsageBucketDto {
    fn split(bucket: Option<Self>) -> (f64, Option<DateTime<Utc>>) {
        match bucket {
            Some(b) => (b.utilization.unwrap_or(0.0), b.resets_at),
            None => (0.0, None),
        }
    }
}

/// Decode a usage body. Absent buckets read as zero; a bucket whose
/// `resets_at` does not parse keeps its utilization and loses the reset time.
pub fn parse_usage_body(body: &[u8], fetched_at: DateTime<Utc>) -> Result<UsageSnapshot, UsageError> {
    let dto: UsageResponseDto =
        serde_json::from_slice(body).map_err(|e| UsageError::Parse(e.to_string()))?;

    let (block_percentage, block_reset_time) = UsageBucketDto::split(dto.five_hour);
    let (weekly_percentage, week_reset_time) = UsageBucketDto::split(dto.seven_day);
    let (opus_percentage, _) = UsageBucketDto::split(dto.seven_day_opus);
    let (sonnet_percentage, _) = UsageBucketDto::split(dto.seven_day_sonnet);

    Ok(UsageSnapshot {
        block_percentage,
        block_reset_time,
        weekly_percentage,
        opus_percentage,
        sonnet_percentage,
        week_reset_time,
        is_stale: false,
        fetched_at,
    })
}

// Any value that is not an RFC 3339 string becomes None instead of an error
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let parsed = value.as_ref().and_then(|v| v.as_str()).and_then(|s| {
        match DateTime::parse_from_rfc3339(s) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(err) => {
                debug!(value = s, error = %err, "unparsable resets_at");
                None
            }
        }
    });
    Ok(parsed)
}
