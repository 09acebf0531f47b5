use anyhow::{Context, Result};
use std::sync::Arc;

use super::{CommandRunner, CredentialAdapter, parse_secret_output};

/// Generic-password service Claude Code stores its credentials under
pub const KEYCHAIN_SERVICE: &str = "Claude Code-credentials";

/// macOS Keychain via `security find-generic-password`
pub struct KeychainAdapter {
    runner: Arc<dyn CommandRunner>,
}

impl KeychainAdapter {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl CredentialAdapter for KeychainAdapter {
    fn name(&self) -> &'static str {
        "keychain"
    }

    fn token(&self) -> Result<String> {
        // -w prints only the password, which is the full credentials JSON
        let output = self
            .runner
            .run(
                "security",
                &["find-generic-password", "-s", KEYCHAIN_SERVICE, "-w"],
            )
            .context("keychain lookup")?;
        parse_secret_output(&output).context("keychain entry")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::test_support::FakeRunner;

    #[test]
    fn extracts_nested_access_token() {
        let runner = FakeRunner::ok(
            "{\"claudeAiOauth\":{\"accessToken\":\"sk-ant-oat01-kc\",\"expiresAt\":1}}\n",
        );
        let adapter = KeychainAdapter::new(runner.clone());
        assert_eq!(adapter.token().unwrap(), "sk-ant-oat01-kc");

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls[0].0, "security");
        assert_eq!(
            calls[0].1,
            ["find-generic-password", "-s", KEYCHAIN_SERVICE, "-w"]
        );
    }

    #[test]
    fn accepts_raw_token() {
        let adapter = KeychainAdapter::new(FakeRunner::ok("sk-ant-oat01-raw\n"));
        assert_eq!(adapter.token().unwrap(), "sk-ant-oat01-raw");
    }

    #[test]
    fn command_failure_is_an_error() {
        let adapter = KeychainAdapter::new(FakeRunner::failing("item not found"));
        assert!(adapter.token().is_err());
    }

    #[test]
    fn object_without_token_is_an_error() {
        let adapter = KeychainAdapter::new(FakeRunner::ok(r#"{"claudeAiOauth":{}}"#));
        assert!(adapter.token().is_err());
    }
}
