//! Blocking HTTP transport shared by every remote call.
//!
//! Each request has a bounded timeout. Transport failures, `429` and `5xx`
//! answers are retried with exponential backoff; every other status is
//! returned to the caller on the first attempt. Requests that must not be
//! replayed go through the `_once` variants.

use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::HttpError;

/// Retry schedule for idempotent requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Never below 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Single attempt, no backoff.
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    fn delay_before(&self, attempt: u32) -> Duration {
        // attempt is 1-based; the first retry (attempt 2) waits base_delay.
        let exp = attempt.saturating_sub(2).min(16);
        self.base_delay.saturating_mul(1 << exp)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Thin wrapper over a `ureq::Agent` with a fixed timeout and retry policy.
#[derive(Debug, Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("scriptsync/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// `GET url`, optionally with a bearer token. Returns the body as text.
    pub fn get_text(&self, url: &str, bearer: Option<&str>) -> Result<String, HttpError> {
        let response = self.execute("GET", url, || {
            authorize(self.agent.get(url), bearer).call()
        })?;
        response
            .into_string()
            .map_err(|e| HttpError::Decode(e.to_string()))
    }

    /// `GET url` with a bearer token, decoding a JSON body.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str, bearer: &str) -> Result<T, HttpError> {
        let response = self.execute("GET", url, || {
            authorize(self.agent.get(url), Some(bearer)).call()
        })?;
        decode(response)
    }

    /// `PUT url` with a JSON body and a bearer token, decoding a JSON answer.
    pub fn put_json<T: DeserializeOwned>(
        &self,
        url: &str,
        bearer: &str,
        body: &serde_json::Value,
    ) -> Result<T, HttpError> {
        let response = self.execute("PUT", url, || {
            authorize(self.agent.put(url), Some(bearer)).send_json(body)
        })?;
        decode(response)
    }

    /// `POST url` with an `application/x-www-form-urlencoded` body.
    pub fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<T, HttpError> {
        let response = self.execute("POST", url, || self.agent.post(url).send_form(form))?;
        decode(response)
    }

    /// [`post_form`](Self::post_form) with a single attempt, for bodies that
    /// carry a single-use value.
    pub fn post_form_once<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<T, HttpError> {
        let response = self.execute_with(RetryPolicy::none(), "POST", url, || {
            self.agent.post(url).send_form(form)
        })?;
        decode(response)
    }

    fn execute<F>(&self, method: &str, url: &str, send: F) -> Result<ureq::Response, HttpError>
    where
        F: Fn() -> Result<ureq::Response, ureq::Error>,
    {
        self.execute_with(self.retry, method, url, send)
    }

    fn execute_with<F>(
        &self,
        retry: RetryPolicy,
        method: &str,
        url: &str,
        send: F,
    ) -> Result<ureq::Response, HttpError>
    where
        F: Fn() -> Result<ureq::Response, ureq::Error>,
    {
        let attempts = retry.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let err = match send() {
                Ok(response) => return Ok(response),
                Err(ureq::Error::Status(status, response)) => {
                    let body = response.into_string().unwrap_or_default();
                    HttpError::Status {
                        status,
                        message: error_message(&body).unwrap_or_else(|| summarize(&body, status)),
                    }
                }
                Err(ureq::Error::Transport(transport)) => {
                    HttpError::Transport(transport.to_string())
                }
            };

            if attempt >= attempts || !is_retryable(&err) {
                tracing::debug!(method, url, attempt, error = %err, "request failed");
                return Err(err);
            }
            attempt += 1;
            let delay = retry.delay_before(attempt);
            tracing::warn!(method, url, attempt, ?delay, error = %err, "retrying request");
            thread::sleep(delay);
        }
    }
}

fn authorize(request: ureq::Request, bearer: Option<&str>) -> ureq::Request {
    match bearer {
        Some(token) => request.set("Authorization", &format!("Bearer {token}")),
        None => request,
    }
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> Result<T, HttpError> {
    response
        .into_json::<T>()
        .map_err(|e| HttpError::Decode(e.to_string()))
}

fn is_retryable(err: &HttpError) -> bool {
    match err {
        HttpError::Transport(_) => true,
        HttpError::Status { status, .. } => *status == 429 || *status >= 500,
        HttpError::Decode(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Error bodies
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorBody {
    /// `{"error": {"code": 404, "message": "...", "status": "NOT_FOUND"}}`
    Api { error: ApiErrorDetail },
    /// `{"error": "invalid_grant", "error_description": "..."}`
    OAuth {
        error: String,
        #[serde(default)]
        error_description: Option<String>,
    },
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

/// Extract the human-readable message from a Google API or OAuth error body.
pub fn error_message(body: &str) -> Option<String> {
    match serde_json::from_str::<ErrorBody>(body).ok()? {
        ErrorBody::Api { error } => error.message.or(error.status),
        ErrorBody::OAuth {
            error,
            error_description: Some(description),
        } => Some(format!("{error}: {description}")),
        ErrorBody::OAuth { error, .. } => Some(error),
    }
}

fn summarize(body: &str, status: u16) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return format!("empty response (status {status})");
    }
    let mut out: String = trimmed.chars().take(200).collect();
    if trimmed.chars().count() > 200 {
        out.push('…');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_message_is_extracted() {
        let body = r#"{"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("Requested entity was not found.")
        );
    }

    #[test]
    fn oauth_error_includes_description() {
        let body = r#"{"error": "invalid_grant", "error_description": "Bad Request"}"#;
        assert_eq!(
            error_message(body).as_deref(),
            Some("invalid_grant: Bad Request")
        );
    }

    #[test]
    fn non_json_body_has_no_message() {
        assert_eq!(error_message("<html>502</html>"), None);
    }

    #[test]
    fn backoff_doubles_after_first_retry() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before(2), Duration::from_millis(500));
        assert_eq!(policy.delay_before(3), Duration::from_millis(1000));
    }

    #[test]
    fn retryable_statuses() {
        let status = |s| HttpError::Status {
            status: s,
            message: String::new(),
        };
        assert!(is_retryable(&status(429)));
        assert!(is_retryable(&status(503)));
        assert!(!is_retryable(&status(404)));
        assert!(!is_retryable(&status(401)));
        assert!(is_retryable(&HttpError::Transport("reset".into())));
    }

    #[test]
    fn retries_server_errors_then_gives_up() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/flaky")
            .with_status(503)
            .expect(3)
            .create();

        let client = HttpClient::new(Duration::from_secs(5)).with_retry(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
        });
        let err = client
            .get_text(&format!("{}/flaky", server.url()), None)
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        mock.assert();
    }

    #[test]
    fn single_use_form_is_posted_once_even_on_server_error() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/token")
            .with_status(503)
            .expect(1)
            .create();

        let client = HttpClient::new(Duration::from_secs(5)).with_retry(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
        });
        let err = client
            .post_form_once::<serde_json::Value>(
                &format!("{}/token", server.url()),
                &[("code", "4/single-use")],
            )
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
        mock.assert();
    }

    #[test]
    fn client_errors_are_not_retried() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .with_body(r#"{"error": {"message": "nope"}}"#)
            .expect(1)
            .create();

        let client = HttpClient::new(Duration::from_secs(5));
        let err = client
            .get_text(&format!("{}/missing", server.url()), None)
            .unwrap_err();
        assert_eq!(
            err,
            HttpError::Status {
                status: 404,
                message: "nope".into()
            }
        );
        mock.assert();
    }
}
