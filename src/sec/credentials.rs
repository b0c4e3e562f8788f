//! oauth access tokens for the remote store.
//!
//! only the authorized user flow is supported: a token previously issued
//! through an interactive consent is loaded and refreshed with its refresh
//! token. refresh and persist happen under a single write lock so
//! concurrent requests never race on the token state.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Deserialize};
use tokio::sync::RwLock;

use crate::config;
use crate::error::{self as app_error, Context};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

pub const SCOPES: [&str; 4] = [
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/documents",
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/presentations",
];

/// tokens expiring within this window are refreshed early
const EXPIRY_SLACK_SECS: i64 = 60;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("token has expired and no refresh token is available")]
    NoRefreshToken,

    #[error("client id and secret are required to refresh the token")]
    NoClient,

    #[error("token refresh rejected ({status}): {body}")]
    Refresh {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error(transparent)]
    Request(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// a bearer token valid for at least the next few seconds
    async fn access_token(&self) -> Result<String, Error>;
}

fn default_token_uri() -> String {
    String::from(DEFAULT_TOKEN_URI)
}

/// the token file layout written by the google auth libraries. unknown
/// fields are kept so a persisted file stays readable by them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizedUserToken {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AuthorizedUserToken {
    /// a token without an expiry is treated as valid until rejected
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        if self.token.is_none() {
            return false;
        }

        match self.expiry {
            Some(expiry) => expiry > now + Duration::seconds(EXPIRY_SLACK_SECS),
            None => true,
        }
    }

    fn apply_refresh(&mut self, refreshed: RefreshResponse, now: DateTime<Utc>) {
        self.token = Some(refreshed.access_token);
        self.expiry = refreshed.expires_in.map(|secs| now + Duration::seconds(secs));

        if let Some(refresh_token) = refreshed.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClientInfo {
    client_id: String,
    client_secret: String,

    #[serde(default)]
    token_uri: Option<String>,
}

/// oauth client secrets as downloaded from the cloud console
#[derive(Debug, Deserialize)]
struct ClientSecrets {
    installed: Option<ClientInfo>,
    web: Option<ClientInfo>,
}

impl ClientSecrets {
    fn into_info(self) -> Option<ClientInfo> {
        self.installed.or(self.web)
    }
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,

    #[serde(default)]
    expires_in: Option<i64>,

    #[serde(default)]
    refresh_token: Option<String>,
}

pub struct AuthorizedUser {
    client: reqwest::Client,
    persist: Option<PathBuf>,
    state: RwLock<AuthorizedUserToken>,
}

impl AuthorizedUser {
    pub fn new(client: reqwest::Client, token: AuthorizedUserToken, persist: Option<PathBuf>) -> Self {
        AuthorizedUser {
            client,
            persist,
            state: RwLock::new(token),
        }
    }

    /// loads the token from inline json or the token file, filling in the
    /// oauth client from the client secrets when the token lacks one
    pub fn from_config(client: reqwest::Client, google: &config::Google) -> app_error::Result<Self> {
        let (mut token, persist) = if let Some(inline) = &google.token_json {
            let token: AuthorizedUserToken = serde_json::from_str(inline.expose())
                .map_err(|err| app_error::Error::config(format!(
                    "{} is set but invalid. paste the full contents of token.json",
                    config::ENV_TOKEN_JSON
                )).source(err))?;

            (token, None)
        } else if google.token_file.is_file() {
            let contents = std::fs::read_to_string(&google.token_file).context(format!(
                "failed to read token file: \"{}\"", google.token_file.display()
            ))?;
            let token: AuthorizedUserToken = serde_json::from_str(&contents).context(format!(
                "failed to parse token file: \"{}\"", google.token_file.display()
            ))?;

            (token, Some(google.token_file.clone()))
        } else {
            return Err(app_error::Error::config(format!(
                "google oauth token not found. set {} to the contents of token.json \
                 or place the file at \"{}\". interactive authorization is not supported",
                config::ENV_TOKEN_JSON,
                google.token_file.display()
            )));
        };

        if token.client_id.is_none() || token.client_secret.is_none() {
            if let Some(info) = load_client_info(google)? {
                token.client_id = Some(info.client_id);
                token.client_secret = Some(info.client_secret);

                if let Some(token_uri) = info.token_uri {
                    token.token_uri = token_uri;
                }
            }
        }

        if token.token.is_none() && token.refresh_token.is_none() {
            return Err(app_error::Error::config(
                "google oauth token has neither an access token nor a refresh token"
            ));
        }

        if token.scopes.is_empty() {
            token.scopes = SCOPES.iter().map(|s| s.to_string()).collect();
        }

        Ok(AuthorizedUser::new(client, token, persist))
    }

    async fn refresh(&self, token: &mut AuthorizedUserToken) -> Result<(), Error> {
        let refresh_token = token.refresh_token.as_deref()
            .ok_or(Error::NoRefreshToken)?;
        let (Some(client_id), Some(client_secret)) = (
            token.client_id.as_deref(),
            token.client_secret.as_deref()
        ) else {
            return Err(Error::NoClient);
        };

        tracing::debug!("refreshing google access token");

        let response = self.client.post(&token.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await?;

            return Err(Error::Refresh { status, body });
        }

        let refreshed: RefreshResponse = response.json().await?;

        token.apply_refresh(refreshed, Utc::now());

        if let Some(path) = &self.persist {
            persist_token(path, token).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl TokenProvider for AuthorizedUser {
    async fn access_token(&self) -> Result<String, Error> {
        {
            let reader = self.state.read().await;

            if reader.is_fresh(Utc::now()) {
                if let Some(token) = &reader.token {
                    return Ok(token.clone());
                }
            }
        }

        let mut writer = self.state.write().await;

        // another request may have refreshed while this one waited
        if !writer.is_fresh(Utc::now()) {
            if let Err(err) = self.refresh(&mut writer).await {
                tracing::warn!("google access token refresh failed: {err}");

                return Err(err);
            }
        }

        writer.token.clone().ok_or(Error::NoRefreshToken)
    }
}

fn load_client_info(google: &config::Google) -> app_error::Result<Option<ClientInfo>> {
    let secrets: ClientSecrets = if let Some(inline) = &google.credentials_json {
        serde_json::from_str(inline.expose()).map_err(|err| app_error::Error::config(format!(
            "{} is set but invalid. paste the full contents of credentials.json",
            config::ENV_CREDENTIALS_JSON
        )).source(err))?
    } else if google.credentials_file.is_file() {
        let contents = std::fs::read_to_string(&google.credentials_file).context(format!(
            "failed to read credentials file: \"{}\"", google.credentials_file.display()
        ))?;

        serde_json::from_str(&contents).context(format!(
            "failed to parse credentials file: \"{}\"", google.credentials_file.display()
        ))?
    } else {
        return Ok(None);
    };

    Ok(secrets.into_info())
}

/// writes next to the destination and renames so a crash never leaves a
/// truncated token file
async fn persist_token(path: &Path, token: &AuthorizedUserToken) -> Result<(), Error> {
    let contents = serde_json::to_vec_pretty(token)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");

    tokio::fs::write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path).await?;

    tracing::debug!("persisted refreshed token to \"{}\"", path.display());

    Ok(())
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::{Form, State};
    use axum::http::StatusCode;

    use super::*;

    #[derive(Clone)]
    struct TokenEndpoint {
        status: StatusCode,
        hits: Arc<AtomicUsize>,
        forms: Arc<std::sync::Mutex<Vec<HashMap<String, String>>>>,
    }

    async fn issue_token(
        State(endpoint): State<TokenEndpoint>,
        Form(form): Form<HashMap<String, String>>,
    ) -> (StatusCode, axum::Json<serde_json::Value>) {
        endpoint.hits.fetch_add(1, Ordering::SeqCst);
        endpoint.forms.lock().unwrap().push(form);

        // keeps the other callers queued on the lock while this one refreshes
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        if endpoint.status.is_success() {
            (endpoint.status, axum::Json(serde_json::json!({
                "access_token": "ya29.fresh",
                "expires_in": 3599,
                "refresh_token": "1//rotated",
                "token_type": "Bearer",
            })))
        } else {
            (endpoint.status, axum::Json(serde_json::json!({
                "error": "invalid_grant",
            })))
        }
    }

    /// serves a token endpoint on an ephemeral port, returning its uri
    async fn token_endpoint(status: StatusCode) -> (String, TokenEndpoint) {
        let endpoint = TokenEndpoint {
            status,
            hits: Arc::new(AtomicUsize::new(0)),
            forms: Arc::new(std::sync::Mutex::new(Vec::new())),
        };
        let app = axum::Router::new()
            .route("/token", axum::routing::post(issue_token))
            .with_state(endpoint.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/token"), endpoint)
    }

    fn stale_token(token_uri: &str) -> AuthorizedUserToken {
        let mut token: AuthorizedUserToken = serde_json::from_str(
            &token_json("2020-01-01T00:00:00Z")
        ).unwrap();
        token.token_uri = token_uri.to_owned();
        token
    }

    fn token_json(expiry: &str) -> String {
        format!(r#"{{
            "token": "ya29.cached",
            "refresh_token": "1//refresh",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "client.apps.googleusercontent.com",
            "client_secret": "shh",
            "scopes": ["https://www.googleapis.com/auth/drive"],
            "universe_domain": "googleapis.com",
            "account": "",
            "expiry": "{expiry}"
        }}"#)
    }

    #[test]
    fn parses_token_file_layout() {
        let token: AuthorizedUserToken = serde_json::from_str(
            &token_json("2030-01-01T00:00:00.123456Z")
        ).unwrap();

        assert_eq!(token.token.as_deref(), Some("ya29.cached"));
        assert_eq!(token.extra.get("universe_domain"), Some(&serde_json::json!("googleapis.com")));
        assert!(token.is_fresh(Utc::now()));

        let round = serde_json::to_value(&token).unwrap();

        assert_eq!(round["universe_domain"], serde_json::json!("googleapis.com"));
        assert_eq!(round["refresh_token"], serde_json::json!("1//refresh"));
    }

    #[test]
    fn freshness() {
        let now = Utc::now();
        let mut token: AuthorizedUserToken = serde_json::from_str(
            &token_json("2020-01-01T00:00:00Z")
        ).unwrap();

        assert!(!token.is_fresh(now));

        token.expiry = Some(now + Duration::seconds(30));
        assert!(!token.is_fresh(now), "token inside slack window is stale");

        token.expiry = Some(now + Duration::minutes(10));
        assert!(token.is_fresh(now));

        token.expiry = None;
        assert!(token.is_fresh(now));

        token.token = None;
        assert!(!token.is_fresh(now));
    }

    #[test]
    fn refresh_updates_token() {
        let now = Utc::now();
        let mut token: AuthorizedUserToken = serde_json::from_str(
            &token_json("2020-01-01T00:00:00Z")
        ).unwrap();

        token.apply_refresh(RefreshResponse {
            access_token: String::from("ya29.new"),
            expires_in: Some(3599),
            refresh_token: None,
        }, now);

        assert_eq!(token.token.as_deref(), Some("ya29.new"));
        assert_eq!(token.refresh_token.as_deref(), Some("1//refresh"));
        assert_eq!(token.expiry, Some(now + Duration::seconds(3599)));
    }

    #[tokio::test]
    async fn fresh_token_skips_refresh() {
        let token: AuthorizedUserToken = serde_json::from_str(
            &token_json("2099-01-01T00:00:00Z")
        ).unwrap();
        let provider = AuthorizedUser::new(reqwest::Client::new(), token, None);

        assert_eq!(provider.access_token().await.unwrap(), "ya29.cached");
    }

    #[tokio::test]
    async fn stale_token_without_refresh_fails() {
        let mut token: AuthorizedUserToken = serde_json::from_str(
            &token_json("2020-01-01T00:00:00Z")
        ).unwrap();
        token.refresh_token = None;

        let provider = AuthorizedUser::new(reqwest::Client::new(), token, None);

        assert!(matches!(provider.access_token().await, Err(Error::NoRefreshToken)));
    }

    #[test]
    fn loads_from_file_with_client_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let token_file = dir.path().join("token.json");
        let credentials_file = dir.path().join("credentials.json");

        std::fs::write(&token_file, r#"{"refresh_token":"1//refresh"}"#).unwrap();
        std::fs::write(&credentials_file, r#"{"installed":{
            "client_id":"desktop.apps.googleusercontent.com",
            "client_secret":"desk",
            "token_uri":"https://oauth2.example.test/token"
        }}"#).unwrap();

        let google = config::Google {
            token_json: None,
            token_file: token_file.clone(),
            credentials_file,
            credentials_json: None,
        };

        let provider = AuthorizedUser::from_config(reqwest::Client::new(), &google).unwrap();
        let token = provider.state.try_read().unwrap();

        assert_eq!(provider.persist.as_deref(), Some(token_file.as_path()));
        assert_eq!(token.client_id.as_deref(), Some("desktop.apps.googleusercontent.com"));
        assert_eq!(token.token_uri, "https://oauth2.example.test/token");
        assert_eq!(token.scopes.len(), SCOPES.len());
    }

    #[test]
    fn missing_token_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let google = config::Google {
            token_json: None,
            token_file: dir.path().join("token.json"),
            credentials_file: dir.path().join("credentials.json"),
            credentials_json: None,
        };

        assert!(AuthorizedUser::from_config(reqwest::Client::new(), &google).is_err());
    }

    #[tokio::test]
    async fn persist_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let token: AuthorizedUserToken = serde_json::from_str(
            &token_json("2099-01-01T00:00:00Z")
        ).unwrap();

        std::fs::write(&path, "{}").unwrap();
        persist_token(&path, &token).await.unwrap();

        let written: AuthorizedUserToken = serde_json::from_str(
            &std::fs::read_to_string(&path).unwrap()
        ).unwrap();

        assert_eq!(written.token.as_deref(), Some("ya29.cached"));
        assert!(!dir.path().join("token.json.tmp").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_refresh() {
        let (token_uri, endpoint) = token_endpoint(StatusCode::OK).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let token = stale_token(&token_uri);

        std::fs::write(&path, serde_json::to_vec(&token).unwrap()).unwrap();

        let provider = Arc::new(AuthorizedUser::new(
            reqwest::Client::new(),
            token,
            Some(path.clone())
        ));
        let callers = (0..8).map(|_| {
            let provider = provider.clone();

            tokio::spawn(async move { provider.access_token().await })
        });

        for result in futures::future::join_all(callers).await {
            assert_eq!(result.unwrap().unwrap(), "ya29.fresh");
        }

        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 1);

        let form = endpoint.forms.lock().unwrap().remove(0);

        assert_eq!(form.get("grant_type").map(String::as_str), Some("refresh_token"));
        assert_eq!(form.get("refresh_token").map(String::as_str), Some("1//refresh"));
        assert_eq!(form.get("client_id").map(String::as_str), Some("client.apps.googleusercontent.com"));
        assert_eq!(form.get("client_secret").map(String::as_str), Some("shh"));

        let written: AuthorizedUserToken = serde_json::from_str(
            &std::fs::read_to_string(&path).unwrap()
        ).unwrap();

        assert_eq!(written.token.as_deref(), Some("ya29.fresh"));
        assert_eq!(written.refresh_token.as_deref(), Some("1//rotated"));
        assert!(written.is_fresh(Utc::now()));
        assert_eq!(written.extra.get("universe_domain"), Some(&serde_json::json!("googleapis.com")));

        // the refreshed token is now served from memory
        assert_eq!(provider.access_token().await.unwrap(), "ya29.fresh");
        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_refresh_keeps_file() {
        let (token_uri, endpoint) = token_endpoint(StatusCode::BAD_REQUEST).await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let token = stale_token(&token_uri);
        let original = serde_json::to_string(&token).unwrap();

        std::fs::write(&path, &original).unwrap();

        let provider = AuthorizedUser::new(reqwest::Client::new(), token, Some(path.clone()));

        match provider.access_token().await {
            Err(Error::Refresh { status, body }) => {
                assert_eq!(status.as_u16(), 400);
                assert!(body.contains("invalid_grant"));
            }
            other => panic!("expected refresh rejection: {other:?}"),
        }

        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }
}
