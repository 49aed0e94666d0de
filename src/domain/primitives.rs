//! Domain primitives: addresses, pool generations, tokens.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use alloy_primitives::{Address, B256, U256};

/// Lowercase `0x`-prefixed hex form of an address, used as the entity key.
pub fn address_key(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_slice()))
}

/// Parse an address from user input, accepting any hex casing.
pub fn parse_address(s: &str) -> Result<Address, AddressParseError> {
    Address::from_str(s.trim()).map_err(|_| AddressParseError(s.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address: {0}")]
pub struct AddressParseError(pub String);

/// Pool contract generation.
///
/// V2 is the elder generation (strategy resolved through the controller, deposits
/// from the strategy carry interest fees). V3 pools list their strategies directly
/// and pay interest fees by minting shares to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolVersion {
    V2,
    V3,
}

impl PoolVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolVersion::V2 => "v2",
            PoolVersion::V3 => "v3",
        }
    }
}

impl fmt::Display for PoolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoolVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "v2" => Ok(PoolVersion::V2),
            "v3" => Ok(PoolVersion::V3),
            other => Err(format!("unknown pool version: {}", other)),
        }
    }
}

/// An ERC-20 token together with its decimal precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub address: Address,
    pub decimals: u32,
}

impl Token {
    pub fn new(address: Address, decimals: u32) -> Self {
        Self { address, decimals }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    #[test]
    fn test_address_key_is_lowercase() {
        let addr = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
        assert_eq!(
            address_key(&addr),
            "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"
        );
    }

    #[test]
    fn test_parse_address_any_case() {
        let lower = parse_address("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap();
        let upper = parse_address("0xA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48").unwrap();
        assert_eq!(lower, upper);
        assert!(parse_address("0x1234").is_err());
        assert!(parse_address("not-an-address").is_err());
    }

    #[test]
    fn test_pool_version_serialization() {
        assert_eq!(serde_json::to_string(&PoolVersion::V2).unwrap(), "\"v2\"");
        let parsed: PoolVersion = serde_json::from_str("\"v3\"").unwrap();
        assert_eq!(parsed, PoolVersion::V3);
        assert_eq!("v2".parse::<PoolVersion>().unwrap(), PoolVersion::V2);
        assert!("v4".parse::<PoolVersion>().is_err());
    }
}
