//! OAuth client secrets, as downloaded from the Google Cloud console.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
}

/// The console wraps the secrets in `installed` or `web` depending on the
/// application type. A flat object is accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum SecretsFile {
    Installed { installed: ClientSecrets },
    Web { web: ClientSecrets },
    Flat(ClientSecrets),
}

impl ClientSecrets {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Google credentials file {} not found.\n\n\
                Download an OAuth client (Desktop app) JSON from\n\
                https://console.cloud.google.com/apis/credentials\n\
                and save it there, or point CREDENTIALS_FILE at it.",
                path.display()
            );
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials from {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse credentials from {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let secrets = match serde_json::from_str::<SecretsFile>(contents)? {
            SecretsFile::Installed { installed } => installed,
            SecretsFile::Web { web } => web,
            SecretsFile::Flat(secrets) => secrets,
        };
        Ok(secrets)
    }
}
