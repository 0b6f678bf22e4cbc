//! Webhook card notifier.
//!
//! Posts `{username, embeds: [...]}` payloads to the configured sink so a
//! chat channel renders a readable card per event.

use super::{Notifier, NotifyOutcome};
use crate::domain::{Alert, CloseReason, Position, Verdict, Wallet};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::warn;

/// Free-text reasoning is truncated to this many characters per card.
const MAX_REASONING_CHARS: usize = 1000;

const USERNAME: &str = "TradeSmart";

// Embed accent colors.
const COLOR_ANALYSIS: u32 = 0x3498db;
const COLOR_OPEN: u32 = 0xf1c40f;
const COLOR_WIN: u32 = 0x2ecc71;
const COLOR_LOSS: u32 = 0xe74c3c;

/// Notifier that POSTs formatted cards to a webhook URL.
///
/// With no URL configured every call reports `Skipped`.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(url: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            url,
        }
    }

    async fn post(&self, payload: serde_json::Value) -> NotifyOutcome {
        let Some(url) = &self.url else {
            return NotifyOutcome::Skipped;
        };

        match self.client.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => NotifyOutcome::Sent,
            Ok(response) => {
                warn!("Notification rejected with status {}", response.status());
                NotifyOutcome::Failed
            }
            Err(e) => {
                warn!("Notification delivery failed: {}", e);
                NotifyOutcome::Failed
            }
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn alert_analyzed(&self, alert: &Alert, verdict: &Verdict) -> NotifyOutcome {
        let mut fields = vec![
            field("Direction", verdict.direction.to_string()),
            field("Confidence", format!("{}%", verdict.confidence)),
        ];
        if let Some(entry) = &verdict.entry_price {
            fields.push(field("Entry", entry.to_string()));
        }
        if let Some(sl) = &verdict.stop_loss {
            fields.push(field("Stop loss", sl.to_string()));
        }
        if let Some(tp) = &verdict.take_profit {
            fields.push(field("Take profit", tp.to_string()));
        }
        if let Some(rr) = &verdict.risk_reward_ratio {
            fields.push(field("R:R", rr.clone()));
        }

        self.post(json!({
            "username": USERNAME,
            "embeds": [{
                "title": format!("Alert analyzed: {}", verdict.symbol),
                "description": truncate_reasoning(&verdict.reasoning),
                "color": COLOR_ANALYSIS,
                "fields": fields,
                "footer": { "text": format!("alert via {}", alert.exchange.as_deref().unwrap_or("unknown exchange")) },
            }]
        }))
        .await
    }

    async fn position_opened(&self, position: &Position, wallet: &Wallet) -> NotifyOutcome {
        self.post(json!({
            "username": USERNAME,
            "embeds": [{
                "title": format!("Opened {} {} {}x", position.direction, position.symbol, position.leverage),
                "description": truncate_reasoning(&position.reasoning),
                "color": COLOR_OPEN,
                "fields": [
                    field("Entry", position.entry_price.to_string()),
                    field("Stop loss", position.stop_loss.to_string()),
                    field("Take profit", position.take_profit.to_string()),
                    field("Collateral", format!("${}", position.position_size_usd)),
                    field("Confidence", format!("{}%", position.confidence)),
                    field("Balance", format!("${}", wallet.available_balance)),
                ],
            }]
        }))
        .await
    }

    async fn position_closed(&self, position: &Position, wallet: &Wallet) -> NotifyOutcome {
        let pnl = position.realized_pnl.unwrap_or_default();
        let color = if pnl.is_negative() { COLOR_LOSS } else { COLOR_WIN };
        let reason = position
            .close_reason
            .map(|r| r.to_string())
            .unwrap_or_else(|| CloseReason::Manual.to_string());
        let exit = position
            .exit_price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());

        self.post(json!({
            "username": USERNAME,
            "embeds": [{
                "title": format!("Closed {} {} ({})", position.direction, position.symbol, reason),
                "color": color,
                "fields": [
                    field("Entry", position.entry_price.to_string()),
                    field("Exit", exit),
                    field("PnL", format!("${}", pnl)),
                    field("Held", format_duration(position)),
                    field("Balance", format!("${}", wallet.available_balance)),
                    field(
                        "Record",
                        format!("{}W / {}L", wallet.winning_trades, wallet.losing_trades),
                    ),
                ],
            }]
        }))
        .await
    }
}

fn field(name: &str, value: String) -> serde_json::Value {
    json!({ "name": name, "value": value, "inline": true })
}

fn truncate_reasoning(reasoning: &str) -> String {
    if reasoning.chars().count() <= MAX_REASONING_CHARS {
        return reasoning.to_string();
    }
    let truncated: String = reasoning.chars().take(MAX_REASONING_CHARS).collect();
    format!("{}…", truncated)
}

fn format_duration(position: &Position) -> String {
    let Some(closed_at) = position.closed_at else {
        return "-".to_string();
    };
    let minutes = position.opened_at.elapsed_until(closed_at) / 60_000;
    if minutes < 60 {
        format!("{}m", minutes)
    } else {
        format!("{}h {}m", minutes / 60, minutes % 60)
    }
}
