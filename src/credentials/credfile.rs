use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use super::{CredentialAdapter, CredentialDocument};

/// Reads the token from Claude Code's credentials file
pub struct CredentialFileAdapter {
    path: Option<PathBuf>,
}

impl CredentialFileAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// `~/.claude/.credentials.json`
    pub fn default_location() -> Self {
        Self {
            path: crate::utils::credentials_path(),
        }
    }
}

impl CredentialAdapter for CredentialFileAdapter {
    fn name(&self) -> &'static str {
        "credentials-file"
    }

    fn token(&self) -> Result<String> {
        let path = self.path.as_ref().context("no home directory")?;
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?;
        let doc: CredentialDocument = serde_json::from_str(&raw)
            .with_context(|| format!("parse {}", path.display()))?;
        doc.access_token().context("empty token in credentials file")
    }
}
