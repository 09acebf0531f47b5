use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::utils::{default_cache_dir, parse_duration};

pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(clap::Parser, Debug)]
#[command(name = "claude-quota", version, about = "Claude plan usage for the statusline")]
pub struct Args {
    /// Timeout for the usage request, e.g. 5s or 1500ms
    #[arg(long, env = "CLAUDE_QUOTA_API_TIMEOUT", default_value = "5s")]
    pub api_timeout: String,

    /// How long a cached snapshot counts as fresh, e.g. 30s or 2m
    #[arg(long, env = "CLAUDE_QUOTA_CACHE_TTL", default_value = "30s")]
    pub cache_ttl: String,

    /// Cache directory (defaults to $XDG_CACHE_HOME/claude-quota or ~/.cache/claude-quota)
    #[arg(long, env = "CLAUDE_QUOTA_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Workspace key for the cache; defaults to the hook's project dir, then the cwd
    #[arg(long)]
    pub workspace: Option<String>,

    /// Emit JSON instead of colored text
    #[arg(long)]
    pub json: bool,

    /// Debug mode: log resolution, fetch and cache decisions to stderr
    #[arg(long, env = "CLAUDE_QUOTA_DEBUG")]
    pub debug: bool,
}

/// Plain values the usage subsystem consumes
#[derive(Debug, Clone, PartialEq)]
pub struct UsageConfig {
    pub api_timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_dir: PathBuf,
}

impl Args {
    pub fn parse() -> Self {
        <Args as clap::Parser>::parse()
    }

    /// Resolve durations and paths. Unparsable or zero durations fall back to defaults.
    pub fn usage_config(&self) -> UsageConfig {
        UsageConfig {
            api_timeout: duration_or("api-timeout", &self.api_timeout, DEFAULT_API_TIMEOUT),
            cache_ttl: duration_or("cache-ttl", &self.cache_ttl, DEFAULT_CACHE_TTL),
            cache_dir: self
                .cache_dir
                .clone()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(default_cache_dir),
        }
    }
}

fn duration_or(name: &str, raw: &str, default: Duration) -> Duration {
    match parse_duration(raw) {
        Ok(d) if !d.is_zero() => d,
        Ok(_) => default,
        Err(err) => {
            warn!(option = name, value = raw, error = %err, "invalid duration, using default");
            default
        }
    }
}
