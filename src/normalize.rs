//! Projection of provider responses onto the canonical output schema.
//!
//! Every function here is pure: bytes in, JSON text out. The caller supplies
//! the processing time so that `lastChangeTimestamp` stays testable.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::error::{BackendError, Result};
use crate::schema::{
    ChartPoint, MarketDataRecord, ProviderPrice, ProviderQuote, QuoteRecord, SearchHit,
};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a response body that must be a top-level JSON array.
pub fn parse_array(body: &[u8]) -> Result<Vec<Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Array(items)) => {
            log::debug!("array size: {}", items.len());
            Ok(items)
        }
        Ok(other) => Err(BackendError::MalformedResponse(format!(
            "expected a JSON array, found {}",
            kind(&other)
        ))),
        Err(e) => Err(BackendError::MalformedResponse(format!("not JSON: {e}"))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// elements that aren't objects become all-null records rather than aborting the batch
fn element<T: Default + serde::de::DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).unwrap_or_default()
}

/// Render a time as `yyyy-MM-dd hh:mm:ss` (UTC, 24 hour).
pub fn render_timestamp(time: &DateTime<Utc>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

/// Reformat an ISO-8601 string; anything unparseable yields `""`.
pub fn format_timestamp(iso: &str) -> String {
    parse_iso(iso)
        .map(|time| render_timestamp(&time))
        .unwrap_or_default()
}

// offsets are normalised to UTC, naive values are taken as UTC already
fn parse_iso(iso: &str) -> Option<DateTime<Utc>> {
    let iso = iso.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(iso) {
        return Some(time.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn quote_timestamp(updated_at: &Value) -> String {
    updated_at.as_str().map(format_timestamp).unwrap_or_default()
}

/// Comma-joined extRefIds from a search response, order preserved.
pub fn collect_ids(body: &[u8]) -> Result<String> {
    let ids: Vec<String> = parse_array(body)?
        .into_iter()
        .map(element::<SearchHit>)
        .filter_map(|hit| match hit.source.ext_ref_id() {
            Some(id) => Some(id.to_string()),
            None => {
                log::warn!("search hit without a usable id: {:?}", hit.source.id);
                None
            }
        })
        .collect();
    Ok(ids.join(","))
}

/// Full quote schema, one record per provider element.
pub fn normalize_quotes(body: &[u8], now: &DateTime<Utc>) -> Result<String> {
    let processed_at = render_timestamp(now);
    let records: Vec<QuoteRecord> = parse_array(body)?
        .into_iter()
        .map(element::<ProviderQuote>)
        .map(|quote| QuoteRecord {
            quote_timestamp: quote_timestamp(&quote.updated_at),
            last_change_timestamp: processed_at.clone(),
            ext_ref_id: quote.id,
            name: quote.name,
            currency: quote.currency,
            price: quote.last,
            symbol: quote.symbol,
            isin: quote.isin,
            stock_market_name: quote.exchange.name,
            change_absolute: quote.change,
            change_relative: quote.change_in_percentage,
            high: quote.high,
            low: quote.low,
            ask: quote.ask,
            bid: quote.bid,
            volume: quote.volume,
            number_of_stocks: quote.number_of_stocks,
        })
        .collect();
    Ok(serde_json::to_string(&records)?)
}

/// Market data schema: same source fields, narrower output.
pub fn normalize_market_data(body: &[u8], now: &DateTime<Utc>) -> Result<String> {
    let processed_at = render_timestamp(now);
    let records: Vec<MarketDataRecord> = parse_array(body)?
        .into_iter()
        .map(element::<ProviderQuote>)
        .map(|quote| MarketDataRecord {
            quote_timestamp: quote_timestamp(&quote.updated_at),
            last_change_timestamp: processed_at.clone(),
            ext_ref_id: quote.id,
            name: quote.name,
            currency: quote.currency,
            last: quote.last,
            symbol: quote.symbol,
            stock_market_name: quote.exchange.name,
            change_absolute: quote.change,
            change_relative: quote.change_in_percentage,
        })
        .collect();
    Ok(serde_json::to_string(&records)?)
}

/// Chart points `{x: unix seconds, y: price}`; incomplete samples are dropped.
pub fn chart_points(body: &[u8]) -> Result<String> {
    let points: Vec<ChartPoint> = parse_array(body)?
        .into_iter()
        .map(element::<ProviderPrice>)
        .filter_map(|sample| {
            let time = sample.timestamp.as_str().and_then(parse_iso)?;
            let price = sample.close.as_f64().or_else(|| sample.price.as_f64())?;
            Some(ChartPoint {
                x: time.timestamp(),
                y: price,
            })
        })
        .collect();
    Ok(serde_json::to_string(&points)?)
}
