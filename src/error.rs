use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Request failed with status {status}: {reason}")]
    Request { status: u16, reason: String },
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    #[error("Unknown market data key: {0}")]
    UnknownMarketDataKey(String),
    #[error("Invalid chart type: {0}")]
    InvalidChartType(i32),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BackendError {
    /// Text carried by a `RequestError` event; `None` for failures that
    /// never reached the network or got a successful response.
    pub fn request_message(&self) -> Option<String> {
        match self {
            BackendError::Request { status, reason } => {
                Some(format!("Return code: {status} - {reason}"))
            }
            // no response at all (refused, timed out, ...)
            BackendError::Transport(e) => {
                let status = e.status().map(|s| s.as_u16()).unwrap_or(0);
                Some(format!("Return code: {status} - {e}"))
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_message_format() {
        let err = BackendError::Request {
            status: 500,
            reason: "Internal Server Error".to_string(),
        };
        assert_eq!(
            err.request_message().as_deref(),
            Some("Return code: 500 - Internal Server Error")
        );
    }

    #[test]
    fn non_request_kinds_have_no_request_message() {
        let errors = [
            BackendError::MalformedResponse("not a json array".to_string()),
            BackendError::UnknownMarketDataKey("NOPE".to_string()),
            BackendError::InvalidChartType(9),
        ];
        for err in errors {
            assert_eq!(err.request_message(), None, "{err}");
        }
    }
}
