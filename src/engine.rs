use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use std::time::Duration;

use crate::config::Config;
use crate::error::{BackendError, Result};

pub const MIME_TYPE_JSON: &str = "application/json";

// GENERALISED FUNCTIONS

/// Thin GET-only wrapper over [`reqwest::Client`], shared by every backend.
///
/// Cloning is cheap; the connection pool lives behind the inner client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()?;
        Ok(HttpClient {
            client,
            user_agent: config.user_agent(),
        })
    }

    /// GET `url` with `query` appended, JSON content-type set.
    pub async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<Bytes> {
        log::debug!("GET {url} {query:?}");
        let request = self
            .client
            .get(with_query(url, query))
            .header(CONTENT_TYPE, MIME_TYPE_JSON);
        Self::send(request).await
    }

    /// Same as [`get`](Self::get), but also identifies the application via user-agent.
    pub async fn get_identified(&self, url: &str, query: &[(&str, &str)]) -> Result<Bytes> {
        log::debug!("GET {url} {query:?} as {}", self.user_agent);
        let request = self
            .client
            .get(with_query(url, query))
            .header(CONTENT_TYPE, MIME_TYPE_JSON)
            .header(USER_AGENT, &self.user_agent);
        Self::send(request).await
    }

    async fn send(request: reqwest::RequestBuilder) -> Result<Bytes> {
        let response = request.send().await.map_err(|e| {
            log::warn!("request failed before a response arrived: {e}");
            BackendError::from(e)
        })?;

        // status has to be read before the body consumes the response
        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
            let url = response.url().clone();
            let body = response.text().await.unwrap_or_default();
            log::warn!("{url} returned {status}: {}", truncate(&body, 200));
            return Err(BackendError::Request {
                status: status.as_u16(),
                reason,
            });
        }

        Ok(response.bytes().await?)
    }
}

/// Append `query` to `url`, keeping commas literal so id lists go out as
/// `ids=42,7` rather than form-encoded `ids=42%2C7`.
pub fn with_query(url: &str, query: &[(&str, &str)]) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let pairs: Vec<String> = query
        .iter()
        .map(|(key, value)| {
            let value: Vec<_> = value.split(',').map(urlencoding::encode).collect();
            format!("{}={}", urlencoding::encode(key), value.join(","))
        })
        .collect();
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{}", pairs.join("&"))
}

// provider error pages can be whole HTML documents
fn truncate(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_keeps_commas_literal() {
        assert_eq!(
            with_query("https://api.example/instruments", &[("ids", "42,7")]),
            "https://api.example/instruments?ids=42,7"
        );
        assert_eq!(
            with_query("https://search.example/instruments", &[("q", "A&B Co")]),
            "https://search.example/instruments?q=A%26B%20Co"
        );
        assert_eq!(
            with_query("https://api.example/x?lang=da", &[("fromDate", "2024-03-01")]),
            "https://api.example/x?lang=da&fromDate=2024-03-01"
        );
        assert_eq!(with_query("https://api.example/x", &[]), "https://api.example/x");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abc", 200), "abc");
        assert_eq!(truncate("æøåæøå", 3), "æøå");
    }
}
