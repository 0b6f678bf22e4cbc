use crate::domain::Decimal;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default multi-resolution ladder submitted to the oracle.
pub const DEFAULT_TIMEFRAMES: [&str; 6] = ["1min", "5min", "15min", "1h", "4h", "1day"];

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub paper_trading: PaperTradingConfig,
    pub oracle: OracleConfig,
    pub quotes: QuoteConfig,
    /// Notification sink; None disables delivery.
    pub notify_webhook_url: Option<String>,
    /// Shared secret for the inbound webhook; None disables authentication.
    pub webhook_secret: Option<String>,
    /// Timeframes fetched per alert, vendor interval tags.
    pub analysis_timeframes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PaperTradingConfig {
    pub enabled: bool,
    pub initial_balance: Decimal,
    /// Minimum oracle confidence for admission, 0-100.
    pub confidence_threshold: u8,
    /// Fraction of available balance locked per position (e.g. 0.10).
    pub max_position_size_percent: Decimal,
    pub max_concurrent_positions: usize,
    pub leverage: u32,
    /// Maximum stop-loss distance as a fraction of entry (e.g. 0.20).
    pub max_stop_loss_percent: Decimal,
    pub monitor_interval: Duration,
    pub state_file_path: PathBuf,
    /// Base assets admitted for paper execution.
    pub allowed_base_symbols: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct QuoteConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

fn get_or<'a>(env_map: &'a HashMap<String, String>, key: &str, default: &'a str) -> &'a str {
    env_map.get(key).map(|s| s.as_str()).unwrap_or(default)
}

fn required(env_map: &HashMap<String, String>, key: &str) -> Result<String, ConfigError> {
    env_map
        .get(key)
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnv(key.to_string()))
}

fn parse_with<T, F>(key: &str, raw: &str, expect: &str, parse: F) -> Result<T, ConfigError>
where
    F: FnOnce(&str) -> Option<T>,
{
    parse(raw).ok_or_else(|| ConfigError::InvalidValue(key.to_string(), expect.to_string()))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_with(
            "PORT",
            get_or(&env_map, "PORT", "8080"),
            "must be a valid u16",
            |s| s.parse::<u16>().ok(),
        )?;

        let enabled = parse_with(
            "PAPER_TRADING_ENABLED",
            get_or(&env_map, "PAPER_TRADING_ENABLED", "true"),
            "must be true or false",
            |s| s.parse::<bool>().ok(),
        )?;

        let initial_balance = parse_with(
            "INITIAL_BALANCE",
            get_or(&env_map, "INITIAL_BALANCE", "1000"),
            "must be a positive decimal",
            |s| Decimal::parse(s).ok().filter(|d| d.is_positive()),
        )?;

        let confidence_threshold = parse_with(
            "CONFIDENCE_THRESHOLD",
            get_or(&env_map, "CONFIDENCE_THRESHOLD", "80"),
            "must be an integer 0-100",
            |s| s.parse::<u8>().ok().filter(|v| *v <= 100),
        )?;

        let max_position_size_percent = parse_with(
            "MAX_POSITION_SIZE_PERCENT",
            get_or(&env_map, "MAX_POSITION_SIZE_PERCENT", "0.10"),
            "must be a decimal in (0, 1]",
            |s| {
                Decimal::parse(s)
                    .ok()
                    .filter(|d| d.is_positive() && *d <= Decimal::from_i64(1))
            },
        )?;

        let max_concurrent_positions = parse_with(
            "MAX_CONCURRENT_POSITIONS",
            get_or(&env_map, "MAX_CONCURRENT_POSITIONS", "2"),
            "must be a positive integer",
            |s| s.parse::<usize>().ok().filter(|v| *v > 0),
        )?;

        let leverage = parse_with(
            "LEVERAGE",
            get_or(&env_map, "LEVERAGE", "2"),
            "must be a positive integer",
            |s| s.parse::<u32>().ok().filter(|v| *v > 0),
        )?;

        let max_stop_loss_percent = parse_with(
            "MAX_STOP_LOSS_PERCENT",
            get_or(&env_map, "MAX_STOP_LOSS_PERCENT", "0.20"),
            "must be a decimal in (0, 1]",
            |s| {
                Decimal::parse(s)
                    .ok()
                    .filter(|d| d.is_positive() && *d <= Decimal::from_i64(1))
            },
        )?;

        let monitor_interval_seconds = parse_with(
            "MONITOR_INTERVAL_SECONDS",
            get_or(&env_map, "MONITOR_INTERVAL_SECONDS", "60"),
            "must be a positive integer",
            |s| s.parse::<u64>().ok().filter(|v| *v > 0),
        )?;

        let state_file_path = PathBuf::from(get_or(
            &env_map,
            "STATE_FILE_PATH",
            "paper-trading-state.json",
        ));

        let allowed_base_symbols = get_or(&env_map, "ALLOWED_BASE_SYMBOLS", "BTC,XAU,XAG,XPT")
            .split(',')
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        let oracle = OracleConfig {
            base_url: get_or(&env_map, "ANTHROPIC_API_URL", "https://api.anthropic.com")
                .trim_end_matches('/')
                .to_string(),
            model: get_or(&env_map, "ANTHROPIC_MODEL", "claude-sonnet-4-5").to_string(),
            max_tokens: parse_with(
                "ANTHROPIC_MAX_TOKENS",
                get_or(&env_map, "ANTHROPIC_MAX_TOKENS", "1024"),
                "must be a positive integer",
                |s| s.parse::<u32>().ok().filter(|v| *v > 0),
            )?,
            api_key: required(&env_map, "ANTHROPIC_API_KEY")?,
        };

        let quotes = QuoteConfig {
            base_url: get_or(&env_map, "TWELVEDATA_API_URL", "https://api.twelvedata.com")
                .trim_end_matches('/')
                .to_string(),
            api_key: required(&env_map, "TWELVEDATA_API_KEY")?,
        };

        let analysis_timeframes = match env_map.get("ANALYSIS_TIMEFRAMES") {
            Some(raw) => {
                let timeframes: Vec<String> = raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if timeframes.is_empty() {
                    return Err(ConfigError::InvalidValue(
                        "ANALYSIS_TIMEFRAMES".to_string(),
                        "must list at least one interval".to_string(),
                    ));
                }
                timeframes
            }
            None => DEFAULT_TIMEFRAMES.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Config {
            port,
            paper_trading: PaperTradingConfig {
                enabled,
                initial_balance,
                confidence_threshold,
                max_position_size_percent,
                max_concurrent_positions,
                leverage,
                max_stop_loss_percent,
                monitor_interval: Duration::from_secs(monitor_interval_seconds),
                state_file_path,
                allowed_base_symbols,
            },
            oracle,
            quotes,
            notify_webhook_url: env_map.get("NOTIFY_WEBHOOK_URL").cloned(),
            webhook_secret: env_map.get("WEBHOOK_SECRET").cloned(),
            analysis_timeframes,
        })
    }
}
