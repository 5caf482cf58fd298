// Error type shared by the library modules. The binary wraps these in
// `anyhow` so it can attach context before printing them.

use thiserror::Error;

/// Everything that can go wrong while talking to the API, reading the
/// configuration or persisting results.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure (DNS, connect, timeout, body decoding).
    #[error("error making request: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a status >= 400.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid API key")]
    InvalidApiKey,

    #[error("invalid request: {0}")]
    BadRequest(String),

    /// The API reported an error inside an otherwise successful body.
    #[error("{0}")]
    Api(String),

    #[error("API key is required. Set CLISCORE_API_KEY environment variable or use --api-key flag")]
    MissingApiKey,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("error parsing JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_shows_code_and_body() {
        let err = Error::Status {
            status: 503,
            body: "maintenance".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503: maintenance");
    }

    #[test]
    fn missing_key_points_at_env_var() {
        assert!(Error::MissingApiKey.to_string().contains("CLISCORE_API_KEY"));
    }
}
