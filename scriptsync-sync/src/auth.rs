//! Delegated credential lifecycle.
//!
//! ```text
//! NoCredential ──load ok──▶ Authorized ──stale──▶ Refreshing ──ok──▶ Authorized
//!      │                                               │
//!      └──────────── missing / corrupt ──▶ PendingConsent ◀── refresh failed
//!                                               │
//!                                          code exchange ──▶ Authorized
//! ```
//!
//! The consent step is the only place a run waits on a human; it goes through
//! the injected [`CodePrompt`].

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use scriptsync_core::{Config, Credential, CredentialStore, StoreError};

use crate::error::{AuthError, HttpError};
use crate::http::HttpClient;

/// Access the tool requests at consent time.
pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/script.projects",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/spreadsheets.readonly",
];

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NoCredential,
    PendingConsent,
    Authorized,
    Refreshing,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthState::NoCredential => "no-credential",
            AuthState::PendingConsent => "pending-consent",
            AuthState::Authorized => "authorized",
            AuthState::Refreshing => "refreshing",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Token endpoint
// ---------------------------------------------------------------------------

/// Successful answer of the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Build the credential to persist. A refresh answer usually carries no
    /// refresh token; the previous one is kept in that case.
    pub fn into_credential(self, previous: Option<&Credential>, now: DateTime<Utc>) -> Credential {
        let refresh_token = match self.refresh_token.filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => previous.map(|p| p.refresh_token.clone()).unwrap_or_default(),
        };
        Credential {
            access_token: self.access_token,
            refresh_token,
            expiry: self.expires_in.and_then(|secs| expiry_after(now, secs)),
            scope: self.scope.or_else(|| previous.and_then(|p| p.scope.clone())),
            token_type: self
                .token_type
                .or_else(|| previous.and_then(|p| p.token_type.clone())),
        }
    }
}

/// `now + secs`, or `None` when the result is not representable. A missing
/// expiry makes the credential usable until a call is rejected.
fn expiry_after(now: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    let expiry = Duration::try_seconds(secs).and_then(|lifetime| now.checked_add_signed(lifetime));
    if expiry.is_none() {
        tracing::warn!(expires_in = secs, "token lifetime out of range; ignoring expiry");
    }
    expiry
}

/// The identity provider's token exchange.
pub trait TokenEndpoint {
    /// URL the operator opens to grant consent.
    fn authorization_url(&self) -> Result<String, AuthError>;

    fn exchange_code(&self, code: &str) -> Result<TokenResponse, HttpError>;

    fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, HttpError>;
}

/// Google OAuth 2.0 client for installed applications.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: HttpClient,
    token_url: String,
    auth_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl OAuthClient {
    pub fn from_config(config: &Config, http: HttpClient) -> Self {
        Self {
            http,
            token_url: config.endpoints.token.clone(),
            auth_url: config.endpoints.auth.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }
}

impl TokenEndpoint for OAuthClient {
    fn authorization_url(&self) -> Result<String, AuthError> {
        let scope = SCOPES.join(" ");
        let url = url::Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("scope", scope.as_str()),
            ],
        )
        .map_err(|e| AuthError::AuthorizationUrl {
            endpoint: self.auth_url.clone(),
            message: e.to_string(),
        })?;
        Ok(url.into())
    }

    fn exchange_code(&self, code: &str) -> Result<TokenResponse, HttpError> {
        // Authorization codes are single-use; a replay only yields invalid_grant.
        self.http.post_form_once(
            &self.token_url,
            &[
                ("code", code),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("redirect_uri", &self.redirect_uri),
                ("grant_type", "authorization_code"),
            ],
        )
    }

    fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, HttpError> {
        self.http.post_form(
            &self.token_url,
            &[
                ("refresh_token", refresh_token),
                ("client_id", &self.client_id),
                ("client_secret", &self.client_secret),
                ("grant_type", "refresh_token"),
            ],
        )
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// Obtains an authorization code from the operator.
pub trait CodePrompt {
    fn prompt_for_authorization_code(&self, auth_url: &str) -> Result<String, AuthError>;
}

/// Uses a code supplied up front through configuration.
#[derive(Debug, Clone)]
pub struct EnvPrompt {
    code: String,
}

impl EnvPrompt {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl CodePrompt for EnvPrompt {
    fn prompt_for_authorization_code(&self, auth_url: &str) -> Result<String, AuthError> {
        tracing::debug!(auth_url, "using configured authorization code");
        Ok(self.code.clone())
    }
}

/// Refuses to start a consent flow.
#[derive(Debug, Clone)]
pub struct NoPrompt {
    store_path: std::path::PathBuf,
}

impl NoPrompt {
    pub fn new(store_path: impl Into<std::path::PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
        }
    }
}

impl CodePrompt for NoPrompt {
    fn prompt_for_authorization_code(&self, _auth_url: &str) -> Result<String, AuthError> {
        Err(AuthError::ConsentRequired {
            path: self.store_path.clone(),
            reason: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Authenticator
// ---------------------------------------------------------------------------

pub struct Authenticator<E, P> {
    store: CredentialStore,
    endpoint: E,
    prompt: P,
    state: AuthState,
}

impl<E: TokenEndpoint, P: CodePrompt> Authenticator<E, P> {
    pub fn new(store: CredentialStore, endpoint: E, prompt: P) -> Self {
        Self {
            store,
            endpoint,
            prompt,
            state: AuthState::NoCredential,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn endpoint(&self) -> &E {
        &self.endpoint
    }

    pub fn prompt(&self) -> &P {
        &self.prompt
    }

    /// Return a credential valid for API calls, refreshing or running consent
    /// as needed. Any returned credential has been persisted when it changed.
    pub fn obtain_credential(&mut self) -> Result<Credential, AuthError> {
        self.transition(AuthState::NoCredential);

        let mut refresh_failure = None;
        if let Some(stored) = self.load_stored() {
            self.transition(AuthState::Authorized);
            if stored.is_fresh() {
                tracing::debug!("stored credential is fresh");
                return Ok(stored);
            }

            if stored.can_refresh() {
                self.transition(AuthState::Refreshing);
                match self.endpoint.refresh(&stored.refresh_token) {
                    Ok(response) => {
                        let refreshed = response.into_credential(Some(&stored), Utc::now());
                        self.persist(&refreshed);
                        self.transition(AuthState::Authorized);
                        return Ok(refreshed);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "token refresh failed; consent required");
                        refresh_failure = Some(format!("refresh failed: {err}"));
                    }
                }
            } else {
                tracing::debug!("stored credential has no refresh token");
            }
        }

        self.transition(AuthState::PendingConsent);
        let auth_url = self.endpoint.authorization_url()?;
        let code = match self.prompt.prompt_for_authorization_code(&auth_url) {
            Ok(code) => code,
            Err(AuthError::ConsentRequired { path, reason: None }) => {
                return Err(AuthError::ConsentRequired {
                    path,
                    reason: refresh_failure,
                })
            }
            Err(err) => return Err(err),
        };
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::Prompt("empty authorization code".to_string()));
        }

        let response = self
            .endpoint
            .exchange_code(code)
            .map_err(|source| AuthError::Exchange {
                stage: "authorization code",
                source,
            })?;
        let credential = response.into_credential(None, Utc::now());
        if !credential.can_refresh() {
            tracing::warn!("no refresh token issued; the next expiry will need consent again");
        }
        self.persist(&credential);
        self.transition(AuthState::Authorized);
        Ok(credential)
    }

    /// Renew `rejected` after the remote API answered 401 although its expiry
    /// had not passed. One refresh exchange, persisted on success. Never
    /// starts consent: that would suspend a run halfway through.
    pub fn refresh_rejected(&mut self, rejected: &Credential) -> Result<Credential, AuthError> {
        if !rejected.can_refresh() {
            return Err(AuthError::ConsentRequired {
                path: self.store.path().to_path_buf(),
                reason: Some("access token rejected and no refresh token stored".to_string()),
            });
        }
        self.transition(AuthState::Refreshing);
        let response = self
            .endpoint
            .refresh(&rejected.refresh_token)
            .map_err(|source| AuthError::Exchange {
                stage: "token refresh",
                source,
            })?;
        let refreshed = response.into_credential(Some(rejected), Utc::now());
        self.persist(&refreshed);
        self.transition(AuthState::Authorized);
        Ok(refreshed)
    }

    fn load_stored(&self) -> Option<Credential> {
        match self.store.load() {
            Ok(credential) => Some(credential),
            Err(StoreError::NotFound { path }) => {
                tracing::debug!(path = %path.display(), "no stored credential");
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "stored credential unusable");
                None
            }
        }
    }

    fn persist(&self, credential: &Credential) {
        if let Err(err) = self.store.save(credential) {
            tracing::warn!(error = %err, "could not persist credential; continuing");
        }
    }

    fn transition(&mut self, next: AuthState) {
        if self.state != next {
            tracing::debug!(from = %self.state, to = %next, "auth state");
        }
        self.state = next;
    }
}
