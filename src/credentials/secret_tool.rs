use anyhow::{Context, Result};
use std::sync::Arc;

use super::{CommandRunner, CredentialAdapter, parse_secret_output};

/// libsecret attributes the token is stored under
const SECRET_ATTRIBUTES: [&str; 4] = ["service", "claude.ai", "type", "oauth_token"];

/// Linux Secret Service (GNOME Keyring, KWallet) via `secret-tool lookup`
pub struct SecretToolAdapter {
    runner: Arc<dyn CommandRunner>,
}

impl SecretToolAdapter {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl CredentialAdapter for SecretToolAdapter {
    fn name(&self) -> &'static str {
        "secret-tool"
    }

    fn token(&self) -> Result<String> {
        let mut args = vec!["lookup"];
        args.extend(SECRET_ATTRIBUTES);
        let output = self
            .runner
            .run("secret-tool", &args)
            .context("secret-tool lookup")?;
        parse_secret_output(&output).context("secret-tool entry")
    }
}
