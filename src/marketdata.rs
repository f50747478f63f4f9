use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::engine::HttpClient;
use crate::error::{BackendError, Result};
use crate::normalize;

// symbolic key -> extRefId
static MARKET_DATA_IDS: &[(&str, &str)] = &[
    // Index
    // DE
    ("INDEX_DAX", "11876"),
    ("INDEX_MDAX", "12036"),
    ("INDEX_SDAX", "12100"),
    ("INDEX_TECDAX", "12101"),
    // US
    ("INDEX_S&P500", "15326"),
    ("INDEX_NASDAQ", "74288"),
    ("INDEX_DOWJONES", "9703"),
    // France
    ("INDEX_CN20", "78560"),
    ("INDEX_CAC40", "73594"),
    ("INDEX_SFB120", "70498"),
    // Other
    ("INDEX_OMXS30", "78541"),
    ("INDEX_OSEBX", "69309"),
    ("INDEX_OMC_C25", "64283"),
    // Commodities
    ("COM_GOLD", "8352"),
    // Currencies
    ("CUR_SEK_DKK", "36399"),
    ("CUR_EUR_USD", "36278"),
    ("CUR_GBP_DKK", "36274"),
];

/// Immutable lookup from symbolic market data keys to provider extRefIds.
///
/// Built once and shared behind an [`Arc`]; there are no mutating methods.
#[derive(Debug)]
pub struct MarketDataTable {
    ids: HashMap<&'static str, &'static str>,
}

impl MarketDataTable {
    pub fn euroinvestor() -> Self {
        MarketDataTable {
            ids: MARKET_DATA_IDS.iter().copied().collect(),
        }
    }

    pub fn resolve(&self, key: &str) -> Option<&'static str> {
        self.ids.get(key).copied()
    }

    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<_> = self.ids.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct MarketDataBackend {
    client: HttpClient,
    url: String,
    table: Arc<MarketDataTable>,
}

impl MarketDataBackend {
    pub fn new(client: HttpClient, config: &Config, table: Arc<MarketDataTable>) -> Self {
        log::debug!("Initializing Euroinvestor market data backend ...");
        MarketDataBackend {
            client,
            url: config.endpoints.market_data.clone(),
            table,
        }
    }

    pub fn table(&self) -> &MarketDataTable {
        &self.table
    }

    pub fn resolve(&self, key: &str) -> Option<&'static str> {
        self.table.resolve(key)
    }

    /// Market data for a comma-separated list of extRefIds.
    pub async fn lookup(&self, ids: &str) -> Result<String> {
        log::debug!("lookup market data: {ids}");
        let body = self.client.get_identified(&self.url, &[("ids", ids)]).await?;

        normalize::normalize_market_data(&body, &Utc::now())
    }

    /// Resolve every key first; nothing is requested if any key is unknown.
    pub async fn lookup_keys<S: AsRef<str>>(&self, keys: &[S]) -> Result<String> {
        let ids = keys
            .iter()
            .map(|key| {
                let key = key.as_ref();
                self.resolve(key)
                    .ok_or_else(|| BackendError::UnknownMarketDataKey(key.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        self.lookup(&ids.join(",")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_keys_resolve() {
        let table = MarketDataTable::euroinvestor();
        for (key, id) in MARKET_DATA_IDS {
            assert_eq!(table.resolve(key), Some(*id));
        }
        assert_eq!(table.len(), MARKET_DATA_IDS.len());
    }

    #[test]
    fn unknown_keys_are_not_found() {
        let table = MarketDataTable::euroinvestor();
        assert_eq!(table.resolve("INDEX_NIKKEI"), None);
        assert_eq!(table.resolve(""), None);
        assert_eq!(table.resolve("index_dax"), None);
    }

    #[test]
    fn keys_are_unique_and_sorted() {
        let table = MarketDataTable::euroinvestor();
        let keys = table.keys();
        assert_eq!(keys.len(), MARKET_DATA_IDS.len());
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn table_is_shareable_across_threads() {
        let table = Arc::new(MarketDataTable::euroinvestor());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let table = table.clone();
                std::thread::spawn(move || table.resolve("COM_GOLD"))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some("8352"));
        }
    }
}
