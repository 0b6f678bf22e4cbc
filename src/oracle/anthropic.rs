//! Anthropic Messages API oracle.
//!
//! Composes a system prompt plus a user prompt enumerating the alert and a
//! compact OHLCV table per timeframe, then parses exactly one JSON object out
//! of the model's reply.

use super::{OracleError, VerdictOracle};
use crate::config::OracleConfig;
use crate::domain::{Alert, Decimal, TimeMs, TimeframeData, TradeDirection, Verdict};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

/// API version header value.
const API_VERSION: &str = "2023-06-01";

/// Rows per timeframe table; bounds prompt size.
const MAX_PROMPT_CANDLES: usize = 30;

const SYSTEM_PROMPT: &str = "You are a disciplined technical analyst for leveraged \
paper trading. Evaluate the alert against the multi-timeframe OHLCV data and decide \
whether a trade is warranted. Respond with a single JSON object and nothing else, \
using exactly these fields: symbol (string), direction (\"Long\", \"Short\" or \
\"NoTrade\"), confidence (integer 0-100), entryPrice (number or null), stopLoss \
(number or null), takeProfit (number or null), riskRewardRatio (string or null), \
reasoning (string). Prefer NoTrade when the timeframes disagree.";

/// Verdict oracle backed by the Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicOracle {
    client: Client,
    config: OracleConfig,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl AnthropicOracle {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .unwrap_or_else(|_| Client::new()),
            config,
        }
    }
}

#[async_trait]
impl VerdictOracle for AnthropicOracle {
    async fn analyze(
        &self,
        alert: &Alert,
        market_data: &[TimeframeData],
    ) -> Result<Verdict, OracleError> {
        let request = MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            system: SYSTEM_PROMPT.to_string(),
            messages: vec![Message {
                role: "user",
                content: build_user_prompt(alert, market_data),
            }],
        };

        let url = format!("{}/v1/messages", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?
            .error_for_status()
            .map_err(|e| OracleError::Transport(e.to_string()))?
            .json::<MessagesResponse>()
            .await
            .map_err(|e| OracleError::Parse(e.to_string()))?;

        let text = response
            .content
            .first()
            .map(|block| block.text.as_str())
            .unwrap_or("");
        if text.trim().is_empty() {
            return Err(OracleError::Empty);
        }

        parse_verdict_reply(text, &alert.symbol)
    }
}

/// Enumerate the alert plus one compact candle table per timeframe.
fn build_user_prompt(alert: &Alert, market_data: &[TimeframeData]) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Alert received:");
    let _ = writeln!(prompt, "- symbol: {}", alert.symbol);
    if let Some(exchange) = &alert.exchange {
        let _ = writeln!(prompt, "- exchange: {}", exchange);
    }
    if let Some(action) = &alert.action {
        let _ = writeln!(prompt, "- action hint: {}", action);
    }
    if let Some(price) = &alert.price {
        let _ = writeln!(prompt, "- alert price: {}", price);
    }
    if let Some(interval) = &alert.interval {
        let _ = writeln!(prompt, "- alert interval: {}", interval);
    }
    if let Some(message) = &alert.message {
        let _ = writeln!(prompt, "- message: {}", message);
    }

    for timeframe in market_data {
        let _ = writeln!(
            prompt,
            "\n{} candles (newest first, time|open|high|low|close|volume):",
            timeframe.interval
        );
        for candle in timeframe.candles.iter().take(MAX_PROMPT_CANDLES) {
            let _ = writeln!(
                prompt,
                "{}|{}|{}|{}|{}|{}",
                candle.open_time.as_ms(),
                candle.open,
                candle.high,
                candle.low,
                candle.close,
                candle.volume
            );
        }
    }

    prompt
}

/// Parse the model reply: locate one JSON object (tolerating a code fence)
/// and map it onto the verdict schema.
pub(crate) fn parse_verdict_reply(text: &str, fallback_symbol: &str) -> Result<Verdict, OracleError> {
    let object = extract_json_object(text)
        .ok_or_else(|| OracleError::Parse("No JSON object in reply".to_string()))?;
    let value: serde_json::Value = serde_json::from_str(&object)
        .map_err(|e| OracleError::Parse(format!("Invalid JSON object: {}", e)))?;

    let direction = value
        .get("direction")
        .and_then(|v| v.as_str())
        .map(TradeDirection::parse_lenient)
        .unwrap_or(TradeDirection::NoTrade);

    let confidence = parse_confidence(&value)?;

    let symbol = value
        .get("symbol")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(fallback_symbol)
        .to_string();

    Ok(Verdict {
        symbol,
        direction,
        confidence,
        entry_price: parse_optional_price(&value, "entryPrice")?,
        stop_loss: parse_optional_price(&value, "stopLoss")?,
        take_profit: parse_optional_price(&value, "takeProfit")?,
        risk_reward_ratio: value
            .get("riskRewardRatio")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()),
        reasoning: value
            .get("reasoning")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        analyzed_at: TimeMs::now(),
    })
}

fn parse_confidence(value: &serde_json::Value) -> Result<u8, OracleError> {
    let confidence = value
        .get("confidence")
        .ok_or_else(|| OracleError::Parse("Missing confidence field".to_string()))?;
    let number = confidence
        .as_f64()
        .or_else(|| confidence.as_str().and_then(|s| s.parse::<f64>().ok()))
        .ok_or_else(|| OracleError::Parse(format!("Unparseable confidence: {}", confidence)))?;
    if !number.is_finite() || number < 0.0 {
        return Err(OracleError::Parse(format!(
            "Confidence out of range: {}",
            number
        )));
    }
    Ok(number.min(100.0) as u8)
}

/// Price levels may arrive as JSON numbers, numeric strings, or null.
fn parse_optional_price(
    value: &serde_json::Value,
    field: &str,
) -> Result<Option<Decimal>, OracleError> {
    match value.get(field) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Decimal::parse(&n.to_string())
            .map(Some)
            .map_err(|e| OracleError::Parse(format!("Invalid {}: {}", field, e))),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => Decimal::parse(s.trim())
            .map(Some)
            .map_err(|e| OracleError::Parse(format!("Invalid {}: {}", field, e))),
        Some(other) => Err(OracleError::Parse(format!(
            "Invalid {}: {}",
            field, other
        ))),
    }
}

/// Extract the first complete JSON object from free-form model text,
/// tolerating surrounding prose and Markdown code fences.
fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + offset + ch.len_utf8()].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
