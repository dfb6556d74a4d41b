use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapyError>;

#[derive(Debug, Error)]
pub enum ScrapyError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ScrapyError {
    /// HTTP status of an API error, `None` for transport and parse failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ScrapyError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<reqwest::Error> for ScrapyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ScrapyError::Parse(err.to_string());
        }
        ScrapyError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for ScrapyError {
    fn from(err: serde_json::Error) -> Self {
        ScrapyError::Parse(err.to_string())
    }
}

/// Pull the `{"error": "..."}` message out of a failed response body.
/// Falls back to `{"detail": "..."}` and then the raw body.
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "detail", "message"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    body.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_error_field_verbatim() {
        let body = r#"{"error": "Invalid platform: myspace"}"#;
        assert_eq!(error_message(body), "Invalid platform: myspace");
    }

    #[test]
    fn falls_back_to_drf_detail() {
        let body = r#"{"detail": "Not found."}"#;
        assert_eq!(error_message(body), "Not found.");
    }

    #[test]
    fn non_json_body_is_returned_raw() {
        assert_eq!(error_message("  Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn status_only_for_api_errors() {
        let api = ScrapyError::Api {
            status: 404,
            message: "gone".into(),
        };
        assert!(api.is_not_found());
        assert_eq!(ScrapyError::Network("reset".into()).status(), None);
    }
}
