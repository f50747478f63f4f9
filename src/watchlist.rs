use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};

use crate::config::Config;
use crate::engine::HttpClient;
use crate::error::Result;
use crate::euroinvestor::{ChartType, EuroinvestorBackend};
use crate::events::{self, BackendEvent, EventReceiver, EventSender};
use crate::marketdata::{MarketDataBackend, MarketDataTable};

/// Entry point for a presentation layer.
///
/// Every call is spawned as its own task: the returned [`JoinHandle`] carries
/// that call's result, and exactly one [`BackendEvent`] is sent on the channel
/// when it finishes. Must be used from within a tokio runtime.
pub struct Watchlist {
    quotes: EuroinvestorBackend,
    market_data: MarketDataBackend,
    events: EventSender,
}

impl Watchlist {
    pub fn new(config: &Config) -> Result<(Self, EventReceiver)> {
        // one client (and connection pool) shared by all backends
        let client = HttpClient::new(config)?;
        let table = Arc::new(MarketDataTable::euroinvestor());
        let (sender, receiver) = events::channel();

        let watchlist = Watchlist {
            quotes: EuroinvestorBackend::new(client.clone(), config),
            market_data: MarketDataBackend::new(client, config, table),
            events: sender,
        };
        Ok((watchlist, receiver))
    }

    pub fn market_data(&self) -> &MarketDataBackend {
        &self.market_data
    }

    pub fn resolve_market_data_id(&self, key: &str) -> Option<&'static str> {
        self.market_data.resolve(key)
    }

    pub fn search_name(&self, query: &str) -> JoinHandle<Result<String>> {
        let backend = self.quotes.clone();
        let query = query.to_string();
        self.dispatch(
            async move { backend.search_name(&query).await },
            BackendEvent::SearchResultAvailable,
        )
    }

    pub fn search_quote(&self, ids: &str) -> JoinHandle<Result<String>> {
        let backend = self.quotes.clone();
        let ids = ids.to_string();
        self.dispatch(
            async move { backend.search_quote(&ids).await },
            BackendEvent::QuoteResultAvailable,
        )
    }

    pub fn lookup_market_data(&self, ids: &str) -> JoinHandle<Result<String>> {
        let backend = self.market_data.clone();
        let ids = ids.to_string();
        self.dispatch(
            async move { backend.lookup(&ids).await },
            BackendEvent::MarketDataResultAvailable,
        )
    }

    pub fn lookup_market_data_keys(&self, keys: &[String]) -> JoinHandle<Result<String>> {
        let backend = self.market_data.clone();
        let keys = keys.to_vec();
        self.dispatch(
            async move { backend.lookup_keys(keys.as_slice()).await },
            BackendEvent::MarketDataResultAvailable,
        )
    }

    pub fn fetch_prices_for_chart(
        &self,
        ext_ref_id: &str,
        chart_type: ChartType,
    ) -> JoinHandle<Result<String>> {
        let backend = self.quotes.clone();
        let ext_ref_id = ext_ref_id.to_string();
        let code = chart_type.code();
        self.dispatch(
            async move { backend.fetch_prices_for_chart(&ext_ref_id, chart_type).await },
            move |json| BackendEvent::ChartPricesAvailable {
                json,
                chart_type: code,
            },
        )
    }

    fn dispatch<F, E>(&self, call: F, on_success: E) -> JoinHandle<Result<String>>
    where
        F: Future<Output = Result<String>> + Send + 'static,
        E: FnOnce(String) -> BackendEvent + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = call.await;
            let event = match &result {
                Ok(json) => on_success(json.clone()),
                Err(e) => {
                    log::warn!("request chain failed: {e}");
                    BackendEvent::from_error(e)
                }
            };
            // receiver gone means nobody is listening any more; the handle still has the result
            if events.send(event).is_err() {
                log::debug!("event receiver dropped");
            }
            result
        })
    }
}

/// Await up to `max_in_flight` handles at a time, in completion order.
///
/// A panicked task sent no event, so its `JoinError` fails the whole batch.
pub async fn join_buffered<I>(
    handles: I,
    max_in_flight: usize,
) -> std::result::Result<Vec<Result<String>>, JoinError>
where
    I: IntoIterator<Item = JoinHandle<Result<String>>>,
{
    futures::stream::iter(handles)
        .buffer_unordered(max_in_flight)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn join_buffered_collects_every_result() {
        let handles = (0..3).map(|i| tokio::spawn(async move { Ok(i.to_string()) }));
        let mut results: Vec<String> = join_buffered(handles, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|result| result.unwrap())
            .collect();
        results.sort();
        assert_eq!(results, vec!["0", "1", "2"]);
    }

    async fn explode() -> Result<String> {
        panic!("task blew up")
    }

    #[tokio::test]
    async fn join_buffered_surfaces_panicked_tasks() {
        let handles = vec![
            tokio::spawn(async { Ok("[]".to_string()) }),
            tokio::spawn(explode()),
        ];
        let joined = join_buffered(handles, 8).await;
        assert!(joined.unwrap_err().is_panic());
    }
}
