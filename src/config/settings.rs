use crate::core::mining::DEFAULT_PROGRESS_INTERVAL;
use crate::core::{MiningControl, ProofOfWork, DEFAULT_GENESIS_PAYLOAD, MAX_DIFFICULTY, MIN_DIFFICULTY};
use crate::error::{BlockchainError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DIFFICULTY: u32 = 4;
const DEFAULT_WORKERS: usize = 1;

const DIFFICULTY_KEY: &str = "LEDGER_DIFFICULTY";
const GENESIS_PAYLOAD_KEY: &str = "LEDGER_GENESIS_PAYLOAD";
const PROGRESS_INTERVAL_KEY: &str = "LEDGER_PROGRESS_INTERVAL";
const MINING_TIMEOUT_KEY: &str = "LEDGER_MINING_TIMEOUT_MS";
const WORKERS_KEY: &str = "LEDGER_WORKERS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Leading zero hex digits a mined hash must have
    pub difficulty: u32,
    pub genesis_payload: String,
    /// Attempts between two progress reports while mining
    pub progress_interval: u64,
    /// Give up on a single block after this many milliseconds
    pub mining_timeout_ms: Option<u64>,
    /// Threads used to search for a nonce
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            difficulty: DEFAULT_DIFFICULTY,
            genesis_payload: String::from(DEFAULT_GENESIS_PAYLOAD),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            mining_timeout_ms: None,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl Config {
    /// Defaults, then the optional TOML file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Config::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Config> {
        let config: Config = toml::from_str(text)?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Config> {
        let text = fs::read_to_string(path).map_err(|e| {
            BlockchainError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        info!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&text)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any key/value source shaped like the environment
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(DIFFICULTY_KEY) {
            self.difficulty = parse_value(DIFFICULTY_KEY, &value)?;
        }
        if let Some(value) = lookup(GENESIS_PAYLOAD_KEY) {
            self.genesis_payload = value;
        }
        if let Some(value) = lookup(PROGRESS_INTERVAL_KEY) {
            self.progress_interval = parse_value(PROGRESS_INTERVAL_KEY, &value)?;
        }
        if let Some(value) = lookup(MINING_TIMEOUT_KEY) {
            self.mining_timeout_ms = Some(parse_value(MINING_TIMEOUT_KEY, &value)?);
        }
        if let Some(value) = lookup(WORKERS_KEY) {
            self.workers = parse_value(WORKERS_KEY, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.difficulty) {
            return Err(BlockchainError::Config(format!(
                "difficulty must be between {MIN_DIFFICULTY} and {MAX_DIFFICULTY}, got {}",
                self.difficulty
            )));
        }
        if self.progress_interval == 0 {
            return Err(BlockchainError::Config(
                "progress_interval must be positive".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(BlockchainError::Config(
                "workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn mining_timeout(&self) -> Option<Duration> {
        self.mining_timeout_ms.map(Duration::from_millis)
    }

    /// Engine configured with this difficulty and progress cadence
    pub fn engine(&self) -> Result<ProofOfWork> {
        Ok(ProofOfWork::new(self.difficulty)?.with_progress_interval(self.progress_interval))
    }

    /// Fresh control for one mining attempt; the timeout starts now
    pub fn mining_control(&self) -> MiningControl {
        MiningControl::from_timeout(self.mining_timeout())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| BlockchainError::Config(format!("Invalid {key} value '{value}': {e}")))
}
