//! Durable engine-state persistence.
//!
//! The whole engine state is one JSON document. Saves go through a sibling
//! temp file and an atomic rename, so a crash mid-write leaves the previous
//! good file intact. A file that fails to parse on load is backed up under a
//! timestamped name and replaced with a fresh default state.

use crate::domain::{Decimal, EngineState};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

/// Error type for persistence operations. Only `save` surfaces errors;
/// `load` always produces a usable state.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// Loads and saves the engine state file.
///
/// Never called concurrently: the engine invokes it under its write lock.
#[derive(Debug, Clone)]
pub struct StatePersistor {
    path: PathBuf,
    initial_balance: Decimal,
}

impl StatePersistor {
    pub fn new(path: impl Into<PathBuf>, initial_balance: Decimal) -> Self {
        Self {
            path: path.into(),
            initial_balance,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted state.
    ///
    /// Absent file yields a default state. A corrupt file is renamed to
    /// `<path>.corrupted.<yyyymmddhhmmss>` and a default state is returned;
    /// this is logged at error but is not fatal.
    pub async fn load(&self) -> EngineState {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "No state file at {}, starting fresh",
                    self.path.display()
                );
                return EngineState::new(self.initial_balance);
            }
            Err(e) => {
                error!("Failed to read state file {}: {}", self.path.display(), e);
                return EngineState::new(self.initial_balance);
            }
        };

        match serde_json::from_slice::<EngineState>(&bytes) {
            Ok(state) => {
                info!(
                    "Loaded state: {} open, {} closed, balance {}",
                    state.open_positions.len(),
                    state.closed_positions.len(),
                    state.wallet.available_balance
                );
                state
            }
            Err(e) => {
                self.backup_corrupt_file(&e.to_string()).await;
                EngineState::new(self.initial_balance)
            }
        }
    }

    /// Serialize the full state and atomically replace the target file.
    pub async fn save(&self, state: &EngineState) -> Result<(), PersistError> {
        let json = serde_json::to_vec_pretty(state)?;
        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut os = self.path.as_os_str().to_owned();
        os.push(".tmp");
        PathBuf::from(os)
    }

    async fn backup_corrupt_file(&self, parse_error: &str) {
        let timestamp = chrono::Utc::now().format("%Y%m%d%H%M%S");
        let mut os = self.path.as_os_str().to_owned();
        os.push(format!(".corrupted.{}", timestamp));
        let backup_path = PathBuf::from(os);

        match tokio::fs::rename(&self.path, &backup_path).await {
            Ok(()) => error!(
                "State file {} is corrupt ({}); backed up to {} and starting fresh",
                self.path.display(),
                parse_error,
                backup_path.display()
            ),
            Err(e) => error!(
                "State file {} is corrupt ({}) and backup failed ({}); starting fresh",
                self.path.display(),
                parse_error,
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CloseReason, Position, TimeMs, TradeDirection};
    use tempfile::TempDir;

    fn persistor_in(dir: &TempDir) -> StatePersistor {
        StatePersistor::new(
            dir.path().join("state.json"),
            Decimal::parse("1000").unwrap(),
        )
    }

    fn sample_state() -> EngineState {
        let mut state = EngineState::new(Decimal::parse("1000").unwrap());
        let position = Position {
            position_id: "abc-123".to_string(),
            symbol: "BTC/USD".to_string(),
            direction: TradeDirection::Long,
            entry_price: Decimal::parse("100").unwrap(),
            position_size_usd: Decimal::parse("100").unwrap(),
            quantity: Decimal::parse("2").unwrap(),
            leverage: 2,
            stop_loss: Decimal::parse("95").unwrap(),
            take_profit: Decimal::parse("110").unwrap(),
            confidence: 85,
            opened_at: TimeMs::new(1000),
            reasoning: "momentum".to_string(),
            closed_at: None,
            exit_price: None,
            realized_pnl: None,
            close_reason: None,
        };
        state.open_positions.push(position.clone());
        state.closed_positions.push(position.into_closed(
            Decimal::parse("110").unwrap(),
            CloseReason::TakeProfit,
            TimeMs::new(2000),
        ));
        state.wallet = state.wallet.after_open(Decimal::parse("100").unwrap());
        state
    }

    #[tokio::test]
    async fn test_load_absent_file_returns_default() {
        let dir = TempDir::new().unwrap();
        let persistor = persistor_in(&dir);
        let state = persistor.load().await;
        assert_eq!(
            state.wallet.available_balance,
            Decimal::parse("1000").unwrap()
        );
        assert!(state.open_positions.is_empty());
        assert!(state.closed_positions.is_empty());
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let persistor = persistor_in(&dir);
        let state = sample_state();

        persistor.save(&state).await.unwrap();
        let loaded = persistor.load().await;
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_save_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let persistor = persistor_in(&dir);
        persistor.save(&sample_state()).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["state.json"]);
    }

    #[tokio::test]
    async fn test_corrupt_file_backed_up_and_reset() {
        let dir = TempDir::new().unwrap();
        let persistor = persistor_in(&dir);
        std::fs::write(persistor.path(), b"{ not json").unwrap();

        let state = persistor.load().await;
        assert_eq!(
            state.wallet.available_balance,
            Decimal::parse("1000").unwrap()
        );

        let backups: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|n| n.contains(".corrupted."))
            .collect();
        assert_eq!(backups.len(), 1, "corrupt file should be renamed");
        assert!(!persistor.path().exists());
    }

    #[tokio::test]
    async fn test_save_overwrites_previous_state() {
        let dir = TempDir::new().unwrap();
        let persistor = persistor_in(&dir);

        let first = EngineState::new(Decimal::parse("1000").unwrap());
        persistor.save(&first).await.unwrap();
        let second = sample_state();
        persistor.save(&second).await.unwrap();

        assert_eq!(persistor.load().await, second);
    }
}
