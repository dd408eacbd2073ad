// Error taxonomy shared by the API client and the upload engine.
//
// Library code returns these typed errors; the binary converts them into
// `anyhow::Error` at the UI boundary.

use thiserror::Error;

/// Failure talking to the wiki endpoint or reading a local file for it.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not read local file: {0}")]
    Io(#[from] std::io::Error),
    #[error("response was not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure obtaining a token or completing the login handshake.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("response did not contain a {kind}token")]
    MissingToken { kind: String },
    #[error("login rejected ({result}): {reason}")]
    LoginRejected { result: String, reason: String },
    #[error(transparent)]
    Api(#[from] ApiError),
}
