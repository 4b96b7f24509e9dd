//! Process-wide configuration, read once at startup.

use std::fmt;
use std::path::PathBuf;

pub static DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.1";
pub static DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";
pub static DEFAULT_CREDENTIALS_FILE: &str = "Credentials.json";
pub static DEFAULT_TOKEN_FILE: &str = "token.json";
pub static DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";

/// Model, endpoint and calendar credential settings.
///
/// Every field can be overridden from the environment:
///
/// | Field              | Variable           |
/// |--------------------|--------------------|
/// | `model`            | `LLM_MODEL`        |
/// | `inference_url`    | `LLM_ENDPOINT`     |
/// | `inference_token`  | `HF_TOKEN`         |
/// | `credentials_file` | `CREDENTIALS_FILE` |
/// | `token_file`       | `TOKEN_FILE`       |
/// | `scopes`           | `GOOGLE_SCOPES` (comma or whitespace separated) |
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub model: String,
    pub inference_url: String,
    pub inference_token: Option<String>,
    pub credentials_file: PathBuf,
    pub token_file: PathBuf,
    pub scopes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            inference_token: None,
            credentials_file: PathBuf::from(DEFAULT_CREDENTIALS_FILE),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            scopes: vec![DEFAULT_SCOPE.to_string()],
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Config::default();

        let scopes = var("GOOGLE_SCOPES")
            .map(|raw| {
                raw.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|scopes| !scopes.is_empty())
            .unwrap_or(defaults.scopes);

        Self {
            model: var("LLM_MODEL").unwrap_or(defaults.model),
            inference_url: var("LLM_ENDPOINT").unwrap_or(defaults.inference_url),
            inference_token: var("HF_TOKEN"),
            credentials_file: var("CREDENTIALS_FILE")
                .map(|p| expand_path(&p))
                .unwrap_or(defaults.credentials_file),
            token_file: var("TOKEN_FILE")
                .map(|p| expand_path(&p))
                .unwrap_or(defaults.token_file),
            scopes,
        }
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("model", &self.model)
            .field("inference_url", &self.inference_url)
            .field(
                "inference_token",
                &self.inference_token.as_ref().map(|_| "<redacted>"),
            )
            .field("credentials_file", &self.credentials_file)
            .field("token_file", &self.token_file)
            .field("scopes", &self.scopes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(Config::from_lookup(lookup(&[])), Config::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("LLM_MODEL", "org/other-model"),
            ("LLM_ENDPOINT", "http://localhost:8080/models"),
            ("HF_TOKEN", "hf_secret"),
            ("CREDENTIALS_FILE", "/etc/nlcal/client.json"),
            ("TOKEN_FILE", "/var/lib/nlcal/token.json"),
        ]));

        assert_eq!(config.model, "org/other-model");
        assert_eq!(config.inference_url, "http://localhost:8080/models");
        assert_eq!(config.inference_token.as_deref(), Some("hf_secret"));
        assert_eq!(
            config.credentials_file,
            PathBuf::from("/etc/nlcal/client.json")
        );
        assert_eq!(config.token_file, PathBuf::from("/var/lib/nlcal/token.json"));
    }

    #[test]
    fn blank_scopes_fall_back_to_default() {
        let config = Config::from_lookup(lookup(&[("GOOGLE_SCOPES", "  ")]));
        assert_eq!(config.scopes, vec![DEFAULT_SCOPE.to_string()]);

        let config = Config::from_lookup(lookup(&[("GOOGLE_SCOPES", " , ")]));
        assert_eq!(config.scopes, vec![DEFAULT_SCOPE.to_string()]);
    }

    #[test]
    fn scopes_split_on_commas_and_spaces() {
        let config = Config::from_lookup(lookup(&[(
            "GOOGLE_SCOPES",
            "scope.a, scope.b scope.c",
        )]));
        assert_eq!(config.scopes, vec!["scope.a", "scope.b", "scope.c"]);
    }

    #[test]
    fn tilde_paths_are_expanded() {
        let config = Config::from_lookup(lookup(&[("TOKEN_FILE", "~/nlcal/token.json")]));
        assert!(!config.token_file.to_string_lossy().starts_with('~'));
        assert!(config.token_file.ends_with("nlcal/token.json"));
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = Config::from_lookup(lookup(&[("HF_TOKEN", "hf_secret")]));
        let debug = format!("{config:?}");
        assert!(!debug.contains("hf_secret"));
        assert!(debug.contains("<redacted>"));
    }
}
