use anyhow::{Context, Result};
use std::env;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use claude_quota::cli::Args;
use claude_quota::credentials::CredentialResolver;
use claude_quota::display::{print_json_output, print_text_output};
use claude_quota::fetch_usage;
use claude_quota::file_cache::FileCache;
use claude_quota::models::HookJson;
use claude_quota::usage_api::{USAGE_ENDPOINT, UsageClient};
use claude_quota::utils::read_stdin;

fn main() {
    let args = Args::parse();
    if args.debug {
        setup_logging();
    }
    // A statusline must not exit non-zero or print to stderr; errors only reach the debug log
    if let Err(err) = run(&args) {
        debug!("run failed: {err:#}");
    }
}

fn setup_logging() {
    let filter = EnvFilter::try_from_env("CLAUDE_QUOTA_LOG")
        .unwrap_or_else(|_| EnvFilter::new("claude_quota=debug"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(args: &Args) -> Result<()> {
    let stdin = read_stdin()?;
    let hook: HookJson = if stdin.iter().all(u8::is_ascii_whitespace) {
        HookJson::default()
    } else {
        serde_json::from_slice(&stdin).context("parse hook json")?
    };

    let config = args.usage_config();
    debug!(
        timeout = ?config.api_timeout,
        ttl = ?config.cache_ttl,
        cache_dir = %config.cache_dir.display(),
        "config resolved"
    );

    let workspace = args
        .workspace
        .clone()
        .or_else(|| hook.workspace_path().map(str::to_owned))
        .or_else(|| {
            env::current_dir()
                .ok()
                .map(|p| p.to_string_lossy().into_owned())
        })
        .unwrap_or_default();

    let resolver = CredentialResolver::for_current_platform();
    let client = UsageClient::new(USAGE_ENDPOINT, config.api_timeout);
    let cache = FileCache::new(&config.cache_dir, config.cache_ttl);
    debug!(key_path = %cache.key_path(&workspace).display(), "cache entry");

    let usage = match fetch_usage(&resolver, &client, &cache, &workspace) {
        Ok(snapshot) => {
            debug!(
                block = snapshot.block_percentage,
                weekly = snapshot.weekly_percentage,
                stale = snapshot.is_stale,
                "usage available"
            );
            Some(snapshot)
        }
        Err(err) => {
            debug!(error = %err, "usage unavailable");
            None
        }
    };

    if args.json {
        print_json_output(usage.as_ref(), &workspace)?;
    } else {
        print_text_output(usage.as_ref());
    }
    Ok(())
}
