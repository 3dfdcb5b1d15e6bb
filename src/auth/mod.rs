use crate::{
    errors::AuthError,
    files,
    google_drive::{Client, Session},
    log, parse_url, paths, redirect_listener,
};
use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const SCOPE: &str = "https://www.googleapis.com/auth/drive.file";
const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080";

// Tokens this close to expiry are refreshed up front instead of failing
// mid-upload.
const EXPIRY_SLACK_MS: i64 = 60_000;

#[derive(Deserialize, Clone)]
pub struct Creds {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

#[derive(Deserialize)]
struct CredsFile {
    installed: Option<Creds>,
    web: Option<Creds>,
}

/// Saved authorization grant. Carries the client id and secret so the fast
/// path never needs the credentials file again.
#[derive(Serialize, Deserialize, Clone)]
pub struct StoredToken {
    #[serde(rename = "type")]
    pub kind: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: Option<String>,
    pub access_token: String,
    pub expiry_date: Option<i64>,
}

impl StoredToken {
    pub fn is_expired(&self, now_ms: i64) -> bool {
        match self.expiry_date {
            Some(expiry) => now_ms + EXPIRY_SLACK_MS >= expiry,
            None => false,
        }
    }

    fn session(&self) -> Session {
        Session {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
            expiry_date: self.expiry_date,
        }
    }
}

/// Produces an authorized Drive client. A valid saved token is the fast
/// path; anything else falls back to the interactive consent flow.
pub fn authorize() -> Result<Client> {
    let token_path = paths::token_file()?;

    if token_path.exists() {
        match files::read_json::<StoredToken>(token_path.clone()) {
            Ok(token) => match client_from_token(token, &token_path) {
                Ok(client) => return Ok(client),
                Err(e) => log::warn(format!(
                    "Saved authorization is unusable, starting a new one.\nDetails: {}",
                    e
                )),
            },
            Err(e) => log::warn(format!(
                "Unable to read saved token file, starting a new authorization.\nDetails: {}",
                e
            )),
        }
    }

    interactive_authorize(&token_path)
}

fn client_from_token(token: StoredToken, token_path: &Path) -> Result<Client> {
    let mut client = Client::new(
        token.client_id.clone(),
        token.client_secret.clone(),
        DEFAULT_REDIRECT_URI.to_string(),
    );
    client.set_session(token.session());

    if token.is_expired(chrono::Utc::now().timestamp_millis()) {
        let session = client
            .refresh_session()
            .map_err(|e| anyhow!("Unable to refresh access token.\nDetails: {}", e))?;
        let updated = StoredToken {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            expiry_date: session.expiry_date,
            ..token
        };
        files::write_json(&updated, token_path.to_path_buf())?;
        log::info("Refreshed access token.".to_string());
    }

    Ok(client)
}

fn interactive_authorize(token_path: &Path) -> Result<Client> {
    let creds = read_creds(find_credentials_file()?)?;
    let redirect_uri = redirect_uri_for(&creds);
    let (host, port) = parse_url::host_and_port(&redirect_uri)?;

    let mut client = Client::new(
        creds.client_id.clone(),
        creds.client_secret.clone(),
        redirect_uri.clone(),
    );
    let consent_url = client.get_user_authorization_url(SCOPE);

    println!("Authorize this app by visiting this url:\n  {}", consent_url);
    if webbrowser::open(&consent_url).is_err() {
        log::warn("Could not open browser automatically. Please visit the URL above.".to_string());
    }

    log::info(format!("Waiting for authorization on {}...", redirect_uri));
    let query = redirect_listener::get_callback(&host, port)?;

    if let Some(err) = query.get("error") {
        return Err(AuthError::ConsentDenied(err.clone()).into());
    }
    let code = match query.get("code") {
        Some(c) => c,
        None => bail!("Redirect carried neither a `code` nor an `error` parameter"),
    };

    let session = client
        .get_session_with_code(code)
        .map_err(|e| anyhow!("Failed to exchange authorization code for tokens.\nDetails: {}", e))?;

    let token = StoredToken {
        kind: "authorized_user".to_string(),
        client_id: creds.client_id,
        client_secret: creds.client_secret,
        refresh_token: session.refresh_token.clone(),
        access_token: session.access_token.clone(),
        expiry_date: session.expiry_date,
    };
    files::write_json(&token, token_path.to_path_buf())?;
    log::success(format!(
        "Authorization complete. Tokens saved to {}",
        token_path.display()
    ));

    Ok(client)
}

fn find_credentials_file() -> Result<PathBuf> {
    let hidden = paths::hidden_credentials_file()?;
    let visible = paths::visible_credentials_file()?;

    if hidden.exists() {
        return Ok(hidden);
    }
    if visible.exists() {
        return Ok(visible);
    }

    log::error("Credentials file not found.".to_string());
    eprintln!("   Checked: {}", hidden.display());
    eprintln!("   Checked: {}", visible.display());
    eprintln!("\nPlease follow these steps:");
    eprintln!("1. Go to https://console.cloud.google.com/");
    eprintln!("2. Create a new project or select an existing one");
    eprintln!("3. Enable the Google Drive API");
    eprintln!("4. Go to 'Credentials' -> 'Create Credentials' -> 'OAuth client ID'");
    eprintln!("5. Choose 'Desktop app' as the application type");
    eprintln!("6. Download the JSON file and save it as: {}", visible.display());
    eprintln!("   (Or {} if you prefer a hidden file)", hidden.display());

    Err(AuthError::MissingCredentials {
        hidden: hidden.display().to_string(),
        visible: visible.display().to_string(),
    }
    .into())
}

fn read_creds(path: PathBuf) -> Result<Creds> {
    let parsed = files::read_json::<CredsFile>(path.clone())?;

    match parsed.installed.or(parsed.web) {
        Some(creds) => Ok(creds),
        None => bail!(
            "Credentials file '{}' has neither an `installed` nor a `web` client descriptor",
            path.display()
        ),
    }
}

fn redirect_uri_for(creds: &Creds) -> String {
    let uri = creds
        .redirect_uris
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());

    if uri == "http://localhost" {
        log::warn(
            "Redirect URI has no port, using http://localhost:8080. Make sure it is listed as an authorized redirect URI."
                .to_string(),
        );
        return DEFAULT_REDIRECT_URI.to_string();
    }

    uri
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn token(expiry: Option<i64>) -> StoredToken {
        StoredToken {
            kind: "authorized_user".to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: Some("refresh".to_string()),
            access_token: "access".to_string(),
            expiry_date: expiry,
        }
    }

    #[test]
    fn token_expiry_honors_slack() {
        let now = 1_000_000;
        assert!(token(Some(now - 1)).is_expired(now));
        assert!(token(Some(now + EXPIRY_SLACK_MS)).is_expired(now));
        assert!(!token(Some(now + EXPIRY_SLACK_MS + 1)).is_expired(now));
        assert!(!token(None).is_expired(now));
    }

    #[test]
    fn reads_installed_client_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(
            br#"{"installed": {"client_id": "abc", "client_secret": "xyz", "redirect_uris": ["http://localhost:9191"]}}"#,
        )
        .unwrap();

        let creds = read_creds(path).unwrap();
        assert_eq!(creds.client_id, "abc");
        assert_eq!(redirect_uri_for(&creds), "http://localhost:9191");
    }

    #[test]
    fn reads_web_client_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(br#"{"web": {"client_id": "abc", "client_secret": "xyz"}}"#)
            .unwrap();

        let creds = read_creds(path).unwrap();
        assert_eq!(creds.client_secret, "xyz");
        // no redirect URIs listed, the default applies
        assert_eq!(redirect_uri_for(&creds), DEFAULT_REDIRECT_URI);
    }

    #[test]
    fn rejects_descriptor_without_client() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(br#"{"other": {}}"#).unwrap();

        assert!(read_creds(path).is_err());
    }

    #[test]
    fn portless_localhost_uri_gets_default_port() {
        let creds = Creds {
            client_id: "a".to_string(),
            client_secret: "b".to_string(),
            redirect_uris: vec!["http://localhost".to_string()],
        };
        assert_eq!(redirect_uri_for(&creds), "http://localhost:8080");
    }
}
