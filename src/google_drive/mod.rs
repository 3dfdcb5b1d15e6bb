pub mod errors;
mod types;

pub use errors::DriveError;
pub use types::{File, FileList, FileUploadBody};

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

const AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const FILES_URI: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URI: &str = "https://www.googleapis.com/upload/drive/v3/files";
const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

#[derive(Serialize, Deserialize, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry_date: Option<i64>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

enum ApiFailure {
    Unauthorized,
    Other(String),
}

impl ApiFailure {
    fn folder(self) -> DriveError {
        match self {
            ApiFailure::Unauthorized => DriveError::Unauthorized,
            ApiFailure::Other(msg) => DriveError::Folder(msg),
        }
    }

    fn upload(self) -> DriveError {
        match self {
            ApiFailure::Unauthorized => DriveError::Unauthorized,
            ApiFailure::Other(msg) => DriveError::Upload(msg),
        }
    }
}

fn check_status(resp: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, ApiFailure> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ApiFailure::Unauthorized);
    }
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        return Err(ApiFailure::Other(format!(
            "API returned status {}: {}",
            status, body
        )));
    }

    Ok(resp)
}

fn expiry_from_now(expires_in: i64) -> i64 {
    chrono::Utc::now().timestamp_millis() + expires_in * 1000
}

pub struct Client {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth: Option<Session>,
    http: reqwest::blocking::Client,
}

impl Client {
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self {
            client_id,
            client_secret,
            redirect_uri,
            auth: None,
            http: reqwest::blocking::Client::new(),
        }
    }

    pub fn set_session(&mut self, s: Session) {
        self.auth = Some(s);
    }

    pub fn get_user_authorization_url(&self, scope: &str) -> String {
        format!(
            "{}?client_id={}&response_type=code&redirect_uri={}&scope={}&access_type=offline",
            AUTH_URI,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(scope)
        )
    }

    pub fn get_session_with_code(&mut self, code: &str) -> Result<Session, String> {
        let session_data = format!(
            "client_id={}&client_secret={}&redirect_uri={}&code={}&grant_type=authorization_code",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.client_secret),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(code)
        );
        let tok = self.post_token_form(session_data)?;

        let session = Session {
            access_token: tok.access_token,
            refresh_token: tok.refresh_token,
            expiry_date: tok.expires_in.map(expiry_from_now),
        };
        self.auth = Some(session.clone());

        Ok(session)
    }

    pub fn refresh_session(&mut self) -> Result<Session, String> {
        let refresh_token = match self.auth.as_ref().and_then(|s| s.refresh_token.clone()) {
            Some(t) => t,
            None => return Err("No refresh token available for this session".to_string()),
        };

        let refresh_data = format!(
            "client_id={}&client_secret={}&grant_type=refresh_token&refresh_token={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.client_secret),
            urlencoding::encode(&refresh_token)
        );
        let tok = self.post_token_form(refresh_data)?;

        // Google does not resend the refresh token, keep the one we have.
        let session = Session {
            access_token: tok.access_token,
            refresh_token: Some(refresh_token),
            expiry_date: tok.expires_in.map(expiry_from_now),
        };
        self.auth = Some(session.clone());

        Ok(session)
    }

    fn post_token_form(&self, body: String) -> Result<TokenResponse, String> {
        let resp = self
            .http
            .post(TOKEN_URI)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .map_err(|e| format!("Failed to POST '{}'.\n{}", TOKEN_URI, e))?;

        if !resp.status().is_success() {
            return Err(format!(
                "Token endpoint returned status {}: {}",
                resp.status(),
                resp.text().unwrap_or_default()
            ));
        }

        resp.json::<TokenResponse>()
            .map_err(|e| format!("Unable to deserialize HTTP response.\n{}", e))
    }

    fn access_token(&self) -> Result<String, DriveError> {
        match &self.auth {
            Some(s) => Ok(s.access_token.clone()),
            None => Err(DriveError::Unauthorized),
        }
    }

    /// Returns the id of a non-trashed folder with this exact name, creating
    /// it first when none exists. When several match, the first item of the
    /// provider's response order wins.
    pub fn find_or_create_folder(&self, name: &str) -> Result<String, DriveError> {
        let token = self.access_token()?;
        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            name.replace('\'', "\\'"),
            FOLDER_MIME
        );

        let resp = self
            .http
            .get(FILES_URI)
            .query(&[
                ("q", query.as_str()),
                ("spaces", "drive"),
                ("fields", "files(id, name)"),
            ])
            .bearer_auth(&token)
            .send()
            .map_err(|e| DriveError::Folder(format!("{}", e)))?;
        let resp = check_status(resp).map_err(ApiFailure::folder)?;
        let list: FileList = resp
            .json()
            .map_err(|e| DriveError::Folder(format!("Unable to deserialize HTTP response.\n{}", e)))?;

        if let Some(found) = list.files.into_iter().next() {
            if let Some(id) = found.id {
                return Ok(id);
            }
        }

        let body = FileUploadBody {
            name: name.to_string(),
            parents: Vec::new(),
            mime_type: Some(FOLDER_MIME.to_string()),
        };
        let resp = self
            .http
            .post(FILES_URI)
            .query(&[("fields", "id")])
            .bearer_auth(&token)
            .json(&body)
            .send()
            .map_err(|e| DriveError::Folder(format!("{}", e)))?;
        let resp = check_status(resp).map_err(ApiFailure::folder)?;
        let created: File = resp
            .json()
            .map_err(|e| DriveError::Folder(format!("Unable to deserialize HTTP response.\n{}", e)))?;

        created
            .id
            .ok_or_else(|| DriveError::Folder("API response had no folder id".to_string()))
    }

    /// Uploads a local file into `folder_id` with the two step resumable
    /// protocol: metadata POST first, then the file bytes streamed against
    /// the session URI from the `Location` header.
    pub fn upload_file(
        &self,
        local_path: &Path,
        remote_name: &str,
        folder_id: &str,
        mime_type: &str,
    ) -> Result<File, DriveError> {
        let token = self.access_token()?;
        let body = FileUploadBody {
            name: remote_name.to_string(),
            parents: vec![folder_id.to_string()],
            mime_type: None,
        };

        let resp = self
            .http
            .post(UPLOAD_URI)
            .query(&[
                ("uploadType", "resumable"),
                ("fields", "id, name, webViewLink"),
            ])
            .bearer_auth(&token)
            .header("X-Upload-Content-Type", mime_type)
            .json(&body)
            .send()
            .map_err(|e| DriveError::Upload(format!("{}", e)))?;
        let resp = check_status(resp).map_err(ApiFailure::upload)?;

        let upload_url = resp
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or_else(|| {
                DriveError::Upload("unexpected response with no `Location` header".to_string())
            })?;

        let file = fs::File::open(local_path).map_err(|e| {
            DriveError::Upload(format!("Unable to open '{}': {}", local_path.display(), e))
        })?;

        let resp = self
            .http
            .put(&upload_url)
            .bearer_auth(&token)
            .header("Content-Type", mime_type)
            .body(reqwest::blocking::Body::from(file))
            .send()
            .map_err(|e| DriveError::Upload(format!("{}", e)))?;
        let resp = check_status(resp).map_err(ApiFailure::upload)?;

        resp.json::<File>()
            .map_err(|e| DriveError::Upload(format!("Unable to deserialize HTTP response.\n{}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_url_encodes_parts() {
        let client = Client::new(
            "id 1".to_string(),
            "secret".to_string(),
            "http://localhost:8080".to_string(),
        );
        let url = client.get_user_authorization_url("https://www.googleapis.com/auth/drive.file");

        assert!(url.starts_with(AUTH_URI));
        assert!(url.contains("client_id=id%201"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080"));
        assert!(url.contains("access_type=offline"));
    }

    #[test]
    fn drive_calls_without_session_are_unauthorized() {
        let client = Client::new("id".to_string(), "s".to_string(), "r".to_string());

        match client.find_or_create_folder("Shots") {
            Err(DriveError::Unauthorized) => {}
            other => panic!("expected Unauthorized, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn expiry_is_in_the_future() {
        let now = chrono::Utc::now().timestamp_millis();
        let expiry = expiry_from_now(3600);
        assert!(expiry >= now + 3_600_000);
    }
}
