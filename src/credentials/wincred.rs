use anyhow::{Context, Result};
use std::sync::Arc;

use super::{CommandRunner, CredentialAdapter, parse_secret_output};

/// Needs the CredentialManager PowerShell module
const LOOKUP_SCRIPT: &str =
    "(Get-StoredCredential -Target 'claude.ai').Password | ConvertFrom-SecureString -AsPlainText";

/// Windows Credential Manager through PowerShell
pub struct WincredAdapter {
    runner: Arc<dyn CommandRunner>,
}

impl WincredAdapter {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl CredentialAdapter for WincredAdapter {
    fn name(&self) -> &'static str {
        "wincred"
    }

    fn token(&self) -> Result<String> {
        let output = self
            .runner
            .run("powershell", &["-NoProfile", "-Command", LOOKUP_SCRIPT])
            .context("credential manager lookup")?;
        parse_secret_output(&output).context("credential manager entry")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::test_support::FakeRunner;

    #[test]
    fn reads_token_from_powershell() {
        let runner = FakeRunner::ok("sk-ant-oat01-win\r\n");
        let adapter = WincredAdapter::new(runner.clone());
        assert_eq!(adapter.token().unwrap(), "sk-ant-oat01-win");
        assert_eq!(runner.calls.lock().unwrap()[0].0, "powershell");
    }

    #[test]
    fn blank_output_is_an_error() {
        let adapter = WincredAdapter::new(FakeRunner::ok("\r\n"));
        assert!(adapter.token().is_err());
    }
}
