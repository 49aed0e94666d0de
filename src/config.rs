use crate::domain::{parse_address, Address};
use alloy_primitives::address;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub rpc_url: String,
    pub dedup_events: bool,
    pub contracts: ContractsConfig,
}

/// Well-known protocol contracts, fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractsConfig {
    /// vVSP: neither withdraw fees nor deposit interest on this pool are counted.
    pub fee_exempt_pool: Address,
    /// V2 controller mapping pools to their strategy.
    pub controller: Address,
    /// Uniswap V2 style router used for USD quotes.
    pub price_router: Address,
    pub usd_token: Address,
    pub usd_token_decimals: u32,
    /// Intermediate token for multi-hop quotes (WETH).
    pub routing_hop: Address,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            fee_exempt_pool: address!("bA4cFE5741b357FA371b506e5db0774aBFeCf8Fc"),
            controller: address!("a4F1671d3Aee73C05b552d57f2d16d3cfcBd0217"),
            price_router: address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D"),
            usd_token: address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"),
            usd_token_decimals: 6,
            routing_hop: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
        }
    }
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
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let rpc_url = env_map
            .get("RPC_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("RPC_URL".to_string()))?;

        let dedup_events = match env_map
            .get("DEDUP_EVENTS")
            .map(|s| s.as_str())
            .unwrap_or("false")
        {
            "true" | "1" => true,
            "false" | "0" => false,
            other => {
                return Err(ConfigError::InvalidValue(
                    "DEDUP_EVENTS".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        let defaults = ContractsConfig::default();
        let usd_token_decimals = match env_map.get("USD_TOKEN_DECIMALS") {
            Some(raw) => raw.parse::<u32>().ok().filter(|d| *d <= 28).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "USD_TOKEN_DECIMALS".to_string(),
                    "must be an integer between 0 and 28".to_string(),
                )
            })?,
            None => defaults.usd_token_decimals,
        };

        let contracts = ContractsConfig {
            fee_exempt_pool: address_or(&env_map, "FEE_EXEMPT_POOL", defaults.fee_exempt_pool)?,
            controller: address_or(&env_map, "CONTROLLER_ADDRESS", defaults.controller)?,
            price_router: address_or(&env_map, "PRICE_ROUTER_ADDRESS", defaults.price_router)?,
            usd_token: address_or(&env_map, "USD_TOKEN_ADDRESS", defaults.usd_token)?,
            usd_token_decimals,
            routing_hop: address_or(&env_map, "ROUTING_HOP_ADDRESS", defaults.routing_hop)?,
        };

        Ok(Config {
            port,
            database_path,
            rpc_url,
            dedup_events,
            contracts,
        })
    }
}

fn address_or(
    env_map: &HashMap<String, String>,
    key: &str,
    default: Address,
) -> Result<Address, ConfigError> {
    match env_map.get(key) {
        Some(raw) => parse_address(raw).map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), format!("not a valid address: {}", raw))
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map.insert("RPC_URL".to_string(), "http://localhost:8545".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.port, 8080);
        assert!(!config.dedup_events);
        assert_eq!(config.contracts, ContractsConfig::default());
        assert_eq!(config.contracts.usd_token_decimals, 6);
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_missing_rpc_url() {
        let mut env_map = setup_required_env();
        env_map.remove("RPC_URL");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "RPC_URL"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = setup_required_env();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_dedup_flag() {
        let mut env_map = setup_required_env();
        env_map.insert("DEDUP_EVENTS".to_string(), "sometimes".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "DEDUP_EVENTS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_contract_overrides() {
        let mut env_map = setup_required_env();
        env_map.insert(
            "USD_TOKEN_ADDRESS".to_string(),
            "0x6b175474e89094c44da98b954eedeac495271d0f".to_string(),
        );
        env_map.insert("USD_TOKEN_DECIMALS".to_string(), "18".to_string());
        env_map.insert("DEDUP_EVENTS".to_string(), "true".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(
            config.contracts.usd_token,
            address!("6B175474E89094C44Da98b954EedeAC495271d0F")
        );
        assert_eq!(config.contracts.usd_token_decimals, 18);
        assert!(config.dedup_events);
        assert_eq!(config.contracts.controller, ContractsConfig::default().controller);
    }

    #[test]
    fn test_invalid_contract_address() {
        let mut env_map = setup_required_env();
        env_map.insert("CONTROLLER_ADDRESS".to_string(), "0x123".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "CONTROLLER_ADDRESS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_usd_decimals_out_of_range() {
        let mut env_map = setup_required_env();
        env_map.insert("USD_TOKEN_DECIMALS".to_string(), "40".to_string());
        assert!(matches!(
            Config::from_env_map(env_map),
            Err(ConfigError::InvalidValue(_, _))
        ));
    }
}
