// API client module: a small blocking HTTP client that talks to a wiki's
// `api.php` endpoint. Every call is a POST to the same URL with an `action`
// discriminator; the session cookies set by `action=login` live in the
// client's cookie store for the lifetime of the process.

use crate::error::{ApiError, AuthError};
use reqwest::blocking::{multipart, Client};
use serde_json::Value;
use std::fs::File;
use std::time::Duration;
use tracing::debug;

/// Form parameters for a single API request, in the order they are sent.
pub type Params = Vec<(&'static str, String)>;

/// The two request shapes the uploader needs. `ApiClient` implements this
/// over HTTP; tests substitute a scripted transport.
pub trait ApiTransport {
    /// POST url-encoded form parameters and decode the JSON reply.
    fn post_form(&self, params: Params) -> Result<Value, ApiError>;

    /// POST multipart form parameters with `file` attached under the
    /// `file` field, and decode the JSON reply.
    fn post_upload(&self, params: Params, file_name: &str, file: File) -> Result<Value, ApiError>;
}

/// Kind of short-lived token requested from `meta=tokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Login,
    /// Action token authorizing state-changing requests such as uploads.
    Csrf,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::Login => "login",
            TokenKind::Csrf => "csrf",
        }
    }
}

/// Blocking client holding the authenticated session (cookie store) and
/// the endpoint URL.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    url: String,
}

impl ApiClient {
    /// Build a client with a cookie store so that the login session carries
    /// over to later requests. No request timeout: large media uploads may
    /// take minutes.
    pub fn new(url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(None::<Duration>)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(ApiClient {
            client,
            url: url.to_string(),
        })
    }
}

impl ApiTransport for ApiClient {
    fn post_form(&self, params: Params) -> Result<Value, ApiError> {
        let res = self
            .client
            .post(&self.url)
            .form(&params)
            .send()?
            .error_for_status()?;
        let body = res.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    fn post_upload(&self, params: Params, file_name: &str, file: File) -> Result<Value, ApiError> {
        let mut form = multipart::Form::new();
        for (key, value) in params {
            form = form.text(key, value);
        }
        // Sized part so the body goes out with Content-Length, not chunked.
        let len = file.metadata()?.len();
        let part = multipart::Part::reader_with_length(file, len).file_name(file_name.to_string());
        form = form.part("file", part);

        let res = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()?
            .error_for_status()?;
        let body = res.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Fetch a fresh token of the given kind. Tokens are never cached: call
/// this immediately before the request that consumes the token.
pub fn fetch_token(api: &impl ApiTransport, kind: TokenKind) -> Result<String, AuthError> {
    let params = vec![
        ("action", "query".to_string()),
        ("meta", "tokens".to_string()),
        ("type", kind.as_str().to_string()),
        ("format", "json".to_string()),
    ];
    let res = api.post_form(params)?;
    extract_token(&res, kind)
}

fn extract_token(res: &Value, kind: TokenKind) -> Result<String, AuthError> {
    let key = format!("{}token", kind.as_str());
    res.pointer("/query/tokens")
        .and_then(|tokens| tokens.get(&key))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AuthError::MissingToken {
            kind: kind.as_str().to_string(),
        })
}

/// Perform the `action=login` handshake. Anything but a `Success` result is
/// reported as `AuthError::LoginRejected`.
pub fn login(api: &impl ApiTransport, username: &str, password: &str) -> Result<(), AuthError> {
    let token = fetch_token(api, TokenKind::Login)?;
    let params = vec![
        ("action", "login".to_string()),
        ("lgname", username.to_string()),
        ("lgpassword", password.to_string()),
        ("lgtoken", token),
        ("format", "json".to_string()),
    ];
    let res = api.post_form(params)?;
    check_login(&res)?;
    debug!(user = %username, "login accepted");
    Ok(())
}

fn check_login(res: &Value) -> Result<(), AuthError> {
    if let Some(err) = res.get("error") {
        return Err(AuthError::LoginRejected {
            result: field_str(err, "code"),
            reason: field_str(err, "info"),
        });
    }
    let result = res
        .pointer("/login/result")
        .and_then(Value::as_str)
        .unwrap_or("missing");
    if result == "Success" {
        return Ok(());
    }
    Err(AuthError::LoginRejected {
        result: result.to_string(),
        reason: res
            .pointer("/login/reason")
            .and_then(Value::as_str)
            .unwrap_or("no reason given")
            .to_string(),
    })
}

/// Read a string field, falling back to the raw JSON of the value.
pub(crate) fn field_str(obj: &Value, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
