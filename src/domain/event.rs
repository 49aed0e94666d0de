//! Decoded host payloads: block ticks and pool contract logs.

use super::primitives::{address_key, Address, PoolVersion, B256, U256};
use serde::{Deserialize, Serialize};

/// Position of a log inside the chain, shared by every log-derived event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMeta {
    pub tx_hash: B256,
    pub log_index: u64,
    pub block_number: u64,
}

impl LogMeta {
    /// Stable identity of the log: lowercase tx hash and log index.
    pub fn event_key(&self) -> String {
        format!("0x{}:{}", hex::encode(self.tx_hash.as_slice()), self.log_index)
    }
}

/// One unit of work delivered by the indexing host, routed to a watched pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChainEvent {
    #[serde(rename_all = "camelCase")]
    Block {
        pool: Address,
        version: PoolVersion,
        block_number: u64,
    },
    #[serde(rename_all = "camelCase")]
    Withdraw {
        pool: Address,
        version: PoolVersion,
        owner: Address,
        shares: U256,
        #[serde(flatten)]
        meta: LogMeta,
    },
    /// V2 only: the underlying amount deposited by `owner`.
    #[serde(rename_all = "camelCase")]
    Deposit {
        pool: Address,
        version: PoolVersion,
        owner: Address,
        amount: U256,
        #[serde(flatten)]
        meta: LogMeta,
    },
    /// V3 only: share transfer, a mint when `from` is the zero address.
    #[serde(rename_all = "camelCase")]
    Transfer {
        pool: Address,
        version: PoolVersion,
        from: Address,
        to: Address,
        value: U256,
        #[serde(flatten)]
        meta: LogMeta,
    },
}

impl ChainEvent {
    pub fn pool(&self) -> Address {
        match self {
            ChainEvent::Block { pool, .. }
            | ChainEvent::Withdraw { pool, .. }
            | ChainEvent::Deposit { pool, .. }
            | ChainEvent::Transfer { pool, .. } => *pool,
        }
    }

    pub fn version(&self) -> PoolVersion {
        match self {
            ChainEvent::Block { version, .. }
            | ChainEvent::Withdraw { version, .. }
            | ChainEvent::Deposit { version, .. }
            | ChainEvent::Transfer { version, .. } => *version,
        }
    }

    pub fn block_number(&self) -> u64 {
        match self {
            ChainEvent::Block { block_number, .. } => *block_number,
            ChainEvent::Withdraw { meta, .. }
            | ChainEvent::Deposit { meta, .. }
            | ChainEvent::Transfer { meta, .. } => meta.block_number,
        }
    }

    /// Log position for log-derived events; `None` for block ticks.
    pub fn log_meta(&self) -> Option<&LogMeta> {
        match self {
            ChainEvent::Block { .. } => None,
            ChainEvent::Withdraw { meta, .. }
            | ChainEvent::Deposit { meta, .. }
            | ChainEvent::Transfer { meta, .. } => Some(meta),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChainEvent::Block { .. } => "block",
            ChainEvent::Withdraw { .. } => "withdraw",
            ChainEvent::Deposit { .. } => "deposit",
            ChainEvent::Transfer { .. } => "transfer",
        }
    }

    pub fn pool_key(&self) -> String {
        address_key(&self.pool())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256};

    #[test]
    fn test_block_event_from_json() {
        let json = r#"{"type":"block","pool":"0xbA4cFE5741b357FA371b506e5db0774aBFeCf8Fc","version":"v2","blockNumber":12000000}"#;
        let event: ChainEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.block_number(), 12_000_000);
        assert_eq!(event.version(), PoolVersion::V2);
        assert_eq!(event.pool_key(), "0xba4cfe5741b357fa371b506e5db0774abfecf8fc");
        assert!(event.log_meta().is_none());
    }

    #[test]
    fn test_transfer_event_roundtrips_through_json() {
        let event = ChainEvent::Transfer {
            pool: address!("1111111111111111111111111111111111111111"),
            version: PoolVersion::V3,
            from: Address::ZERO,
            to: address!("2222222222222222222222222222222222222222"),
            value: U256::from(100u64),
            meta: LogMeta {
                tx_hash: b256!("00000000000000000000000000000000000000000000000000000000000000ab"),
                log_index: 7,
                block_number: 15,
            },
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"transfer\""));
        assert!(json.contains("\"logIndex\":7"));
        let parsed: ChainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
        assert_eq!(parsed.kind(), "transfer");
    }

    #[test]
    fn test_event_key_uses_tx_hash_and_log_index() {
        let meta = LogMeta {
            tx_hash: b256!("ABCDEF0000000000000000000000000000000000000000000000000000000001"),
            log_index: 3,
            block_number: 1,
        };
        assert_eq!(
            meta.event_key(),
            "0xabcdef0000000000000000000000000000000000000000000000000000000001:3"
        );
    }
}
