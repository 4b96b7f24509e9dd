//! Cached OAuth tokens, stored as JSON at the configured token file.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use google_calendar::{AccessToken, Client};
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::credentials::ClientSecrets;

/// Also reads the authorized-user files written by Google's Python client
/// (`token` and `expiry` keys).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tokens {
    #[serde(alias = "token")]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default, alias = "expiry", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Tokens {
    /// Build from a token response. Google usually omits the refresh token
    /// on refresh, in which case `previous_refresh` is kept.
    pub fn from_access_token(token: AccessToken, previous_refresh: &str) -> Self {
        let expires_at = (token.expires_in > 0)
            .then(|| Utc::now() + Duration::seconds(token.expires_in));

        let refresh_token = if token.refresh_token.is_empty() {
            previous_refresh.to_string()
        } else {
            token.refresh_token
        };

        Tokens {
            access_token: token.access_token,
            refresh_token,
            expires_at,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read Google OAuth tokens from {}", path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse Google OAuth tokens from {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize tokens")?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write tokens to {}", path.display()))?;

        // Set to owner-only (0600) since file contains OAuth tokens:
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }

        Ok(())
    }

    /// Tokens without an expiry are treated as valid until a request says otherwise.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }

    /// Calendar API client authorized with these tokens.
    pub fn client(&self, secrets: &ClientSecrets) -> Client {
        Client::new(
            secrets.client_id.clone(),
            secrets.client_secret.clone(),
            auth::redirect_uri(),
            self.access_token.clone(),
            self.refresh_token.clone(),
        )
    }

    pub async fn refresh(&self, secrets: &ClientSecrets) -> Result<Tokens> {
        let token = self
            .client(secrets)
            .refresh_access_token()
            .await
            .context("Failed to refresh token")?;

        Ok(Tokens::from_access_token(token, &self.refresh_token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tokens(expires_at: Option<DateTime<Utc>>) -> Tokens {
        Tokens {
            access_token: "ya29.access".into(),
            refresh_token: "1//refresh".into(),
            expires_at,
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("token.json");
        let saved = tokens(Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()));

        saved.save(&path).unwrap();

        assert_eq!(Tokens::load(&path).unwrap(), saved);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn reads_python_authorized_user_file() {
        let json = r#"{"token": "ya29.access", "refresh_token": "1//refresh",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "x", "client_secret": "y",
            "scopes": ["https://www.googleapis.com/auth/calendar.events"],
            "expiry": "2030-01-01T00:00:00.000000Z"}"#;
        let parsed: Tokens = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed,
            tokens(Some(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()))
        );
    }

    #[test]
    fn expiry() {
        assert!(tokens(Some(Utc::now() - Duration::minutes(1))).is_expired());
        assert!(!tokens(Some(Utc::now() + Duration::minutes(30))).is_expired());
        assert!(!tokens(None).is_expired());
    }

    #[test]
    fn refresh_keeps_previous_refresh_token() {
        let response = AccessToken {
            access_token: "ya29.new".into(),
            expires_in: 3599,
            ..Default::default()
        };
        let refreshed = Tokens::from_access_token(response, "1//refresh");
        assert_eq!(refreshed.access_token, "ya29.new");
        assert_eq!(refreshed.refresh_token, "1//refresh");
        assert!(refreshed.expires_at.is_some_and(|at| at > Utc::now()));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Tokens::load(Path::new("/nonexistent/token.json")).is_err());
    }
}
