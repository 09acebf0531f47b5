//! # Credentials
//!
//! Resolves the OAuth bearer token used for the usage endpoint.
//!
//! The host platform picks one secure-store adapter (macOS Keychain, Linux
//! secret-tool, Windows Credential Manager). Whatever that adapter does, a
//! failure only rules out that source: the `~/.claude/.credentials.json`
//! reader is always tried as the single fallback. Tokens are never cached
//! and never logged; only their length shows up in debug output.

pub mod credfile;
pub mod keychain;
pub mod secret_tool;
pub mod wincred;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::Value;
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::debug;

use crate::error::UsageError;

pub use credfile::CredentialFileAdapter;
pub use keychain::KeychainAdapter;
pub use secret_tool::SecretToolAdapter;
pub use wincred::WincredAdapter;

/// Anything that can hand out a bearer token
pub trait TokenSource {
    fn resolve(&self) -> Result<String, UsageError>;
}

/// One credential store. `token` returns a trimmed, non-empty token or fails.
pub trait CredentialAdapter: Send + Sync {
    fn name(&self) -> &'static str;
    fn token(&self) -> Result<String>;
}

/// Runs an external lookup command and returns its stdout
pub trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[&str]) -> Result<String>;
}

/// [`CommandRunner`] backed by `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<String> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("spawn {program}"))?;
        if !output.status.success() {
            bail!("{program} exited with {}", output.status);
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Darwin,
    Windows,
    Linux,
    Unknown,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Darwin
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else {
            Platform::Unknown
        }
    }

    /// Secure-store adapter for this platform, if it has one
    pub fn adapter(self, runner: Arc<dyn CommandRunner>) -> Option<Box<dyn CredentialAdapter>> {
        match self {
            Platform::Darwin => Some(Box::new(KeychainAdapter::new(runner))),
            Platform::Windows => Some(Box::new(WincredAdapter::new(runner))),
            Platform::Linux => Some(Box::new(SecretToolAdapter::new(runner))),
            Platform::Unknown => None,
        }
    }
}

/// Platform store first, credential file second, nothing else
pub struct CredentialResolver {
    platform: Platform,
    primary: Option<Box<dyn CredentialAdapter>>,
    fallback: Box<dyn CredentialAdapter>,
}

impl CredentialResolver {
    pub fn new(
        platform: Platform,
        primary: Option<Box<dyn CredentialAdapter>>,
        fallback: Box<dyn CredentialAdapter>,
    ) -> Self {
        Self {
            platform,
            primary,
            fallback,
        }
    }

    /// Resolver wired to the real platform commands and the default credential file
    pub fn for_current_platform() -> Self {
        let platform = Platform::current();
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
        Self::new(
            platform,
            platform.adapter(runner),
            Box::new(CredentialFileAdapter::default_location()),
        )
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}

impl TokenSource for CredentialResolver {
    fn resolve(&self) -> Result<String, UsageError> {
        match &self.primary {
            Some(adapter) => match adapter.token() {
                Ok(token) => {
                    debug!(source = adapter.name(), len = token.len(), "token resolved");
                    return Ok(token);
                }
                Err(err) => debug!(source = adapter.name(), error = %err, "token source failed"),
            },
            None => debug!(platform = ?self.platform, "no secure-store adapter for platform"),
        }

        match self.fallback.token() {
            Ok(token) => {
                debug!(source = self.fallback.name(), len = token.len(), "token resolved");
                Ok(token)
            }
            Err(err) => {
                debug!(source = self.fallback.name(), error = %err, "token source failed");
                Err(UsageError::NoCredential)
            }
        }
    }
}

#[derive(Deserialize, Debug)]
struct OAuthEntry {
    #[serde(rename = "accessToken", default)]
    access_token: Option<String>,
}

/// Credentials JSON as written by Claude Code (`claudeAiOauth.accessToken`)
/// or the older flat layouts (`oauthToken`, `token`).
#[derive(Deserialize, Debug, Default)]
pub(crate) struct CredentialDocument {
    #[serde(rename = "claudeAiOauth", default)]
    claude_ai_oauth: Option<OAuthEntry>,
    #[serde(rename = "oauthToken", default)]
    oauth_token: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

impl CredentialDocument {
    /// First non-empty of `claudeAiOauth.accessToken`, `oauthToken`, `token`
    pub(crate) fn access_token(self) -> Option<String> {
        self.claude_ai_oauth
            .and_then(|entry| non_empty(entry.access_token))
            .or_else(|| non_empty(self.oauth_token))
            .or_else(|| non_empty(self.token))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Decode secure-store output: a JSON string, a credentials JSON object,
/// or the raw token text. Other JSON values are rejected.
pub fn parse_secret_output(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("empty secret");
    }

    let value = match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => value,
        Err(err) if trimmed.starts_with('{') || trimmed.starts_with('[') => {
            return Err(err).context("malformed credentials JSON in secret");
        }
        Err(_) => return Ok(trimmed.to_string()),
    };

    match value {
        Value::String(token) => non_empty(Some(token)).context("empty token in secret"),
        Value::Object(map) => serde_json::from_value::<CredentialDocument>(Value::Object(map))
            .context("unexpected credentials layout in secret")?
            .access_token()
            .context("no access token in stored credentials"),
        other => bail!("secret is JSON but not a token: {}", json_kind(&other)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Object(_) => "object",
    }
}
