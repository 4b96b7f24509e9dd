//! Getting a usable access token at startup.
//!
//! Cached tokens are used when valid, refreshed when expired, and the
//! installed-app consent flow runs when neither works.

use std::path::Path;

use anyhow::{Context, Result};
use google_calendar::Client;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::credentials::ClientSecrets;
use crate::session::Tokens;

const REDIRECT_PORT: u16 = 8085;

pub fn redirect_uri() -> String {
    format!("http://localhost:{}/callback", REDIRECT_PORT)
}

pub fn redirect_address() -> String {
    format!("127.0.0.1:{}", REDIRECT_PORT)
}

/// Load, refresh or obtain tokens, and write them back to `token_file`
/// whenever they change.
pub async fn authorize(
    secrets: &ClientSecrets,
    token_file: &Path,
    scopes: &[String],
) -> Result<Tokens> {
    if let Some(tokens) = cached_tokens(secrets, token_file).await {
        return Ok(tokens);
    }

    info!("Running Google OAuth consent flow");
    let tokens = consent(secrets, scopes).await?;
    tokens.save(token_file)?;
    eprintln!("Credentials saved to {}", token_file.display());

    Ok(tokens)
}

/// Tokens from the cache, refreshed if needed. `None` means the consent
/// flow has to run.
async fn cached_tokens(secrets: &ClientSecrets, token_file: &Path) -> Option<Tokens> {
    if !token_file.exists() {
        debug!(path = %token_file.display(), "No cached Google tokens");
        return None;
    }

    let tokens = match Tokens::load(token_file) {
        Ok(tokens) => tokens,
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable token file");
            return None;
        }
    };

    if !tokens.is_expired() {
        return Some(tokens);
    }

    if !tokens.can_refresh() {
        warn!("Cached Google token expired and has no refresh token");
        return None;
    }

    warn!("Refreshing expired Google API token");
    match tokens.refresh(secrets).await {
        Ok(refreshed) => {
            if let Err(e) = refreshed.save(token_file) {
                warn!(error = %e, "Could not save refreshed token");
            }
            Some(refreshed)
        }
        Err(e) => {
            warn!(error = %e, "Token refresh failed, re-authenticating");
            None
        }
    }
}

async fn consent(secrets: &ClientSecrets, scopes: &[String]) -> Result<Tokens> {
    let mut client = Client::new(
        secrets.client_id.clone(),
        secrets.client_secret.clone(),
        redirect_uri(),
        String::new(),
        String::new(),
    );

    let listener = TcpListener::bind(redirect_address())
        .await
        .with_context(|| format!("Could not listen on {}", redirect_address()))?;

    let auth_url = client.user_consent_url(scopes);
    eprintln!("\nAuthorize nlcal to add events to your calendar:\n\n  {auth_url}\n");
    if let Err(e) = open::that(&auth_url) {
        debug!(error = %e, "Browser did not open");
        eprintln!("Copy the URL above into a browser to continue.");
    }

    let (code, state) = wait_for_callback(listener).await?;
    info!("Exchanging authorization code for tokens");

    let access_token = client
        .get_access_token(&code, &state)
        .await
        .context("Failed to exchange authorization code")?;

    Ok(Tokens::from_access_token(access_token, ""))
}

/// What the browser sent to the loopback listener.
#[derive(Debug, PartialEq, Eq)]
enum Callback {
    Granted { code: String, state: String },
    Denied(String),
    /// Anything else the browser asks for, such as `/favicon.ico`.
    Unrelated,
}

/// Serve the loopback redirect until the consent screen reports back.
async fn wait_for_callback(listener: TcpListener) -> Result<(String, String)> {
    loop {
        let (mut stream, peer) = listener
            .accept()
            .await
            .context("Could not accept a connection on the redirect listener")?;

        let line = read_request_line(&mut stream).await?;
        let callback = parse_callback(&line)?;
        debug!(%peer, "Redirect request received");

        let (status, page) = match &callback {
            Callback::Granted { .. } => ("200 OK", GRANTED_PAGE),
            Callback::Denied(_) => ("200 OK", DENIED_PAGE),
            Callback::Unrelated => ("404 Not Found", ""),
        };
        stream
            .write_all(http_response(status, page).as_bytes())
            .await
            .context("Could not answer the browser")?;
        stream.shutdown().await.ok();

        match callback {
            Callback::Granted { code, state } => return Ok((code, state)),
            Callback::Denied(reason) => anyhow::bail!("Authorization was denied: {reason}"),
            Callback::Unrelated => continue,
        }
    }
}

const GRANTED_PAGE: &str = "<html><body><h1>nlcal can now add events</h1>\
    <p>Return to the terminal to continue.</p></body></html>";

const DENIED_PAGE: &str = "<html><body><h1>nlcal was not authorized</h1>\
    <p>Return to the terminal for details.</p></body></html>";

async fn read_request_line(stream: &mut TcpStream) -> Result<String> {
    let mut line = String::new();
    BufReader::new(stream)
        .read_line(&mut line)
        .await
        .context("Could not read the redirect request")?;
    Ok(line)
}

fn http_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Classify the redirect from its HTTP request line.
fn parse_callback(request_line: &str) -> Result<Callback> {
    let target = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Malformed redirect request: {request_line:?}"))?;

    let url = url::Url::parse("http://localhost")?.join(target)?;
    if url.path() != "/callback" {
        return Ok(Callback::Unrelated);
    }

    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    };

    if let Some(reason) = param("error") {
        return Ok(Callback::Denied(reason));
    }

    match (param("code"), param("state")) {
        (Some(code), Some(state)) => Ok(Callback::Granted { code, state }),
        _ => anyhow::bail!("Redirect is missing the authorization code or state"),
    }
}
