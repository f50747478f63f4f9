use tokio::sync::mpsc;

use crate::error::BackendError;

/// Notifications for the presentation layer. Payloads are JSON text.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    SearchResultAvailable(String),
    QuoteResultAvailable(String),
    MarketDataResultAvailable(String),
    ChartPricesAvailable { json: String, chart_type: i32 },
    /// `Return code: <status> - <reason>`
    RequestError(String),
    ResponseMalformed(String),
    /// A symbolic key with no registered extRefId; nothing was requested.
    MarketDataKeyUnknown(String),
    ChartTypeInvalid(i32),
}

impl BackendEvent {
    /// The single failure event for a call chain.
    pub fn from_error(error: &BackendError) -> Self {
        match error {
            BackendError::Request { .. } | BackendError::Transport(_) => {
                BackendEvent::RequestError(error.request_message().unwrap_or_default())
            }
            BackendError::MalformedResponse(_) | BackendError::Json(_) => {
                BackendEvent::ResponseMalformed(error.to_string())
            }
            BackendError::UnknownMarketDataKey(key) => {
                BackendEvent::MarketDataKeyUnknown(key.clone())
            }
            BackendError::InvalidChartType(code) => BackendEvent::ChartTypeInvalid(*code),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            BackendEvent::RequestError(_)
                | BackendEvent::ResponseMalformed(_)
                | BackendEvent::MarketDataKeyUnknown(_)
                | BackendEvent::ChartTypeInvalid(_)
        )
    }
}

pub type EventSender = mpsc::UnboundedSender<BackendEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<BackendEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_one_event_kind_each() {
        let status = BackendError::Request {
            status: 404,
            reason: "Not Found".to_string(),
        };
        assert_eq!(
            BackendEvent::from_error(&status),
            BackendEvent::RequestError("Return code: 404 - Not Found".to_string())
        );

        let malformed = BackendError::MalformedResponse("expected a JSON array".to_string());
        assert!(matches!(
            BackendEvent::from_error(&malformed),
            BackendEvent::ResponseMalformed(_)
        ));
        assert!(BackendEvent::from_error(&malformed).is_error());
        assert!(!BackendEvent::QuoteResultAvailable("[]".to_string()).is_error());
    }

    #[test]
    fn lookup_failures_are_not_request_errors() {
        assert_eq!(
            BackendEvent::from_error(&BackendError::UnknownMarketDataKey("NOPE".to_string())),
            BackendEvent::MarketDataKeyUnknown("NOPE".to_string())
        );
        assert_eq!(
            BackendEvent::from_error(&BackendError::InvalidChartType(7)),
            BackendEvent::ChartTypeInvalid(7)
        );
    }
}
