//! TwelveData time-series client.

use super::{QuoteError, QuoteSource};
use crate::domain::{Decimal, OhlcvCandle, TimeMs};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// Transient failures (network errors, 5xx, 429) are retried at most this
/// many times; the next one surfaces to the caller.
const MAX_RETRIES: u32 = 3;

/// Quote source backed by the TwelveData `time_series` endpoint.
#[derive(Debug, Clone)]
pub struct TwelveDataSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl TwelveDataSource {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url,
            api_key,
        }
    }

    async fn get_time_series(
        &self,
        symbol: &str,
        interval: &str,
        count: u32,
    ) -> Result<serde_json::Value, QuoteError> {
        let url = format!("{}/time_series", self.base_url);
        let outputsize = count.to_string();
        let backoff = ExponentialBackoff {
            // The retry budget is the attempt counter below, not wall time.
            max_elapsed_time: None,
            ..Default::default()
        };
        let attempts = AtomicU32::new(0);

        retry(backoff, || async {
            // Exhausting the retry budget turns transient errors permanent.
            let transient = |err: QuoteError| {
                if attempts.fetch_add(1, Ordering::Relaxed) < MAX_RETRIES {
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                }
            };

            let response = self
                .client
                .get(&url)
                .query(&[
                    ("symbol", symbol),
                    ("interval", interval),
                    ("outputsize", outputsize.as_str()),
                    ("apikey", self.api_key.as_str()),
                ])
                .send()
                .await
                .map_err(|e| transient(QuoteError::Network(e.to_string())))?;

            let status = response.status();
            if status == 429 {
                return Err(transient(QuoteError::RateLimited));
            }
            if status.is_server_error() {
                return Err(transient(QuoteError::Http {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(QuoteError::Http {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(QuoteError::Parse(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl QuoteSource for TwelveDataSource {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: &str,
        count: u32,
    ) -> Result<Vec<OhlcvCandle>, QuoteError> {
        debug!(
            "Fetching candles for symbol={}, interval={}, count={}",
            symbol, interval, count
        );

        let response = self.get_time_series(symbol, interval, count).await?;

        // The vendor signals errors inside a 200 body.
        if response.get("status").and_then(|v| v.as_str()) == Some("error") {
            let message = response
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown vendor error");
            return Err(QuoteError::Vendor(message.to_string()));
        }

        let values = response
            .get("values")
            .and_then(|v| v.as_array())
            .ok_or_else(|| QuoteError::Parse("Missing values array".to_string()))?;

        let mut candles = Vec::with_capacity(values.len());
        for value in values {
            match parse_candle(value) {
                Ok(candle) => candles.push(candle),
                Err(e) => {
                    warn!("Failed to parse candle for {}: {}", symbol, e);
                }
            }
        }

        candles.truncate(count as usize);
        Ok(candles)
    }
}

fn parse_candle(value: &serde_json::Value) -> Result<OhlcvCandle, QuoteError> {
    let datetime = value
        .get("datetime")
        .and_then(|v| v.as_str())
        .ok_or_else(|| QuoteError::Parse("Missing datetime field".to_string()))?;
    let open_time = parse_datetime(datetime)?;

    let open = parse_price(value, "open")?;
    let high = parse_price(value, "high")?;
    let low = parse_price(value, "low")?;
    let close = parse_price(value, "close")?;

    // Volume is absent for FX/metals pairs; treat missing as zero.
    let volume = match value.get("volume").and_then(|v| v.as_str()) {
        Some(raw) => raw
            .parse::<i64>()
            .or_else(|_| raw.parse::<f64>().map(|f| f as i64))
            .map_err(|_| QuoteError::Parse(format!("Invalid volume: {}", raw)))?,
        None => 0,
    };

    Ok(OhlcvCandle {
        open_time,
        open,
        high,
        low,
        close,
        volume,
    })
}

fn parse_price(value: &serde_json::Value, field: &str) -> Result<Decimal, QuoteError> {
    let raw = value
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| QuoteError::Parse(format!("Missing {} field", field)))?;
    Decimal::parse(raw).map_err(|e| QuoteError::Parse(format!("Invalid {}: {}", field, e)))
}

/// Vendor timestamps are "YYYY-MM-DD HH:MM:SS" for intraday intervals and
/// "YYYY-MM-DD" for daily ones, both UTC.
fn parse_datetime(raw: &str) -> Result<TimeMs, QuoteError> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(TimeMs::new(dt.and_utc().timestamp_millis()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let dt = date.and_hms_opt(0, 0, 0).expect("midnight is valid");
        return Ok(TimeMs::new(dt.and_utc().timestamp_millis()));
    }
    Err(QuoteError::Parse(format!("Invalid datetime: {}", raw)))
}
