use crate::domain::{parse_amount, Amount};
use crate::engine::price::spirit_fdv_from_usd;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_CHAIN_ID: u64 = 84532;
pub const DEFAULT_SPIRIT_PRICE_USD: &str = "0.00004";
pub const DEFAULT_CHILD_FDV: u64 = 40_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub transfer_log_path: PathBuf,
    pub total_supply: Amount,
    pub chain_id: u64,
    /// Explicit `SPIRIT_FDV`, or the manual USD price times the spirit supply.
    pub spirit_fdv: Amount,
    pub child_fdv: Amount,
    /// When set, leaves are pro-rata shares of this amount instead of raw
    /// balances.
    pub total_airdrop: Option<Amount>,
    pub archive_dir: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let transfer_log_path = env_map
            .get("TRANSFER_LOG_PATH")
            .map(PathBuf::from)
            .ok_or_else(|| ConfigError::MissingEnv("TRANSFER_LOG_PATH".to_string()))?;

        let total_supply = env_map
            .get("TOTAL_SUPPLY")
            .ok_or_else(|| ConfigError::MissingEnv("TOTAL_SUPPLY".to_string()))
            .and_then(|s| amount_value("TOTAL_SUPPLY", s))?;
        if total_supply.is_zero() {
            return Err(ConfigError::InvalidValue(
                "TOTAL_SUPPLY".to_string(),
                "must be positive".to_string(),
            ));
        }

        let chain_id = match env_map.get("CHAIN_ID") {
            Some(s) => s.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue("CHAIN_ID".to_string(), "must be a valid u64".to_string())
            })?,
            None => DEFAULT_CHAIN_ID,
        };

        let spirit_fdv = match env_map.get("SPIRIT_FDV") {
            Some(s) => amount_value("SPIRIT_FDV", s)?,
            None => {
                let raw = env_map
                    .get("MANUAL_SPIRIT_PRICE")
                    .map(|s| s.as_str())
                    .unwrap_or(DEFAULT_SPIRIT_PRICE_USD);
                let price = Decimal::from_str(raw.trim()).map_err(|_| {
                    ConfigError::InvalidValue(
                        "MANUAL_SPIRIT_PRICE".to_string(),
                        "must be a decimal number".to_string(),
                    )
                })?;
                spirit_fdv_from_usd(price).map_err(|e| {
                    ConfigError::InvalidValue("MANUAL_SPIRIT_PRICE".to_string(), e.to_string())
                })?
            }
        };

        let child_fdv = match env_map.get("CHILD_FDV") {
            Some(s) => amount_value("CHILD_FDV", s)?,
            None => Amount::from(DEFAULT_CHILD_FDV),
        };

        let total_airdrop = env_map
            .get("TOTAL_AIRDROP")
            .map(|s| amount_value("TOTAL_AIRDROP", s))
            .transpose()?;

        let archive_dir = env_map
            .get("ARCHIVE_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Config {
            transfer_log_path,
            total_supply,
            chain_id,
            spirit_fdv,
            child_fdv,
            total_airdrop,
            archive_dir,
        })
    }
}

fn amount_value(key: &str, raw: &str) -> Result<Amount, ConfigError> {
    parse_amount(raw).map_err(|_| {
        ConfigError::InvalidValue(key.to_string(), "must be a base-10 uint256".to_string())
    })
}
