use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/*  PROVIDER QUIRKS
    ===============

    1) Any field can be missing or null; the provider is inconsistent between
       stocks, indices & currencies
        => everything stays a serde_json::Value and falls through as null

    2) "exchange" is sometimes null instead of an object
        => de_lenient() swaps anything that isn't an object for the default

    3) search ids come as numbers, occasionally as numeric strings
        => SearchSource::ext_ref_id() handles both
*/

// RAW PROVIDER SHAPES
// ============================================

// i64::MAX isn't representable as f64; 2^63 is the first value out of range
const I64_MIN_F: f64 = i64::MIN as f64;
const I64_MAX_EXCLUSIVE_F: f64 = 9_223_372_036_854_775_808.0;

// search endpoint: one hit per instrument
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchHit {
    #[serde(rename = "_source", deserialize_with = "de_lenient")]
    pub source: SearchSource,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchSource {
    pub id: Value,
}

impl SearchSource {
    pub fn ext_ref_id(&self) -> Option<i64> {
        match &self.id {
            // whole floats only, and only inside i64; `as` would saturate
            Value::Number(num) => num.as_i64().or_else(|| {
                num.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= I64_MIN_F && *f < I64_MAX_EXCLUSIVE_F)
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

// quote & market data endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderQuote {
    pub id: Value,
    pub name: Value,
    pub currency: Value,
    pub last: Value,
    pub symbol: Value,
    pub isin: Value,
    pub change: Value,
    pub change_in_percentage: Value,
    pub high: Value,
    pub low: Value,
    pub ask: Value,
    pub bid: Value,
    pub volume: Value,
    pub number_of_stocks: Value,
    pub updated_at: Value,
    #[serde(deserialize_with = "de_lenient")]
    pub exchange: Exchange,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Exchange {
    pub name: Value,
}

// close price & intraday endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderPrice {
    pub timestamp: Value,
    pub close: Value,
    pub price: Value,
}

// NORMALIZED OUTPUT
// ============================================

/// Canonical record emitted by the quote backend.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    pub ext_ref_id: Value,
    pub name: Value,
    pub currency: Value,
    pub price: Value,
    pub symbol: Value,
    pub isin: Value,
    pub stock_market_name: Value,
    pub change_absolute: Value,
    pub change_relative: Value,
    pub high: Value,
    pub low: Value,
    pub ask: Value,
    pub bid: Value,
    pub volume: Value,
    pub number_of_stocks: Value,
    pub quote_timestamp: String,
    pub last_change_timestamp: String,
}

/// Narrower record emitted by the market data backend: no isin, no
/// high/low/ask/bid/volume/numberOfStocks.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDataRecord {
    pub ext_ref_id: Value,
    pub name: Value,
    pub currency: Value,
    pub last: Value,
    pub symbol: Value,
    pub stock_market_name: Value,
    pub change_absolute: Value,
    pub change_relative: Value,
    pub quote_timestamp: String,
    pub last_change_timestamp: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ChartPoint {
    pub x: i64,
    pub y: f64,
}

// Functions for error handling
// ============================

// anything that isn't the expected object becomes T::default()
fn de_lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + serde::de::DeserializeOwned,
{
    let value: Value = Deserialize::deserialize(deserializer)?;
    match value {
        Value::Object(_) => Ok(serde_json::from_value(value).unwrap_or_default()),
        _ => Ok(T::default()),
    }
}
