//! Mapping from exchange-native tickers to vendor tickers.
//!
//! Charting alerts carry tickers like "BTCUSDT.P" or "XAUUSD"; the quote
//! vendor wants "BTC/USD" / "XAU/USD". Deterministic, total, no I/O.

/// Normalize a raw exchange ticker to the vendor's canonical form.
///
/// Rules, applied in order to the uppercased trimmed input:
/// 1. strip any trailing `.XXXX` marker (perpetual/spot variants),
/// 2. a `USDT`/`BUSD` suffix becomes `/USD`,
/// 3. a plain `USD` suffix after a 2-5 letter base gets a `/` inserted,
/// 4. anything else passes through unchanged.
pub fn normalize_symbol(raw: &str) -> String {
    let mut symbol = raw.trim().to_ascii_uppercase();

    if let Some(dot) = symbol.find('.') {
        symbol.truncate(dot);
    }

    if symbol.ends_with("USDT") || symbol.ends_with("BUSD") {
        let base = &symbol[..symbol.len() - 4];
        return format!("{}/USD", base);
    }

    if symbol.ends_with("USD") && symbol.len() >= 6 {
        let base = &symbol[..symbol.len() - 3];
        if base.len() <= 5 && base.chars().all(|c| c.is_ascii_uppercase()) {
            return format!("{}/USD", base);
        }
    }

    symbol
}
