use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("API key not found. Set {env_var} environment variable.")]
    MissingApiKey { env_var: &'static str },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// `retry_after` is in seconds, taken from `Retry-After` in either its
    /// delay-seconds or HTTP-date form.
    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("API error (HTTP {status}){}: {message}", .kind.as_ref().map(|k| format!(" [{}]", k)).unwrap_or_default())]
    Api {
        status: u16,
        message: String,
        kind: Option<String>,
    },

    #[error("Failed to parse response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image object carries neither a url nor b64_json payload")]
    MissingImageData,
}

pub type Result<T> = std::result::Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_message_includes_retry_after() {
        let err = SdkError::RateLimited {
            retry_after: Some(20),
        };
        assert_eq!(err.to_string(), "Rate limit exceeded. Retry after 20 seconds");

        let err = SdkError::RateLimited { retry_after: None };
        assert_eq!(err.to_string(), "Rate limit exceeded");
    }

    #[test]
    fn api_error_message_includes_kind() {
        let err = SdkError::Api {
            status: 400,
            message: "bad prompt".to_string(),
            kind: Some("invalid_request_error".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "API error (HTTP 400) [invalid_request_error]: bad prompt"
        );
    }
}
