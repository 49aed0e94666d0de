//! `eth_call` implementation of [`ChainReader`] over an alloy HTTP provider.

use super::bindings::{IAddressList, IController, IErc20, IPoolV2, IPoolV3, IPriceRouter, IStrategyV2};
use super::{ChainReader, ReadError};
use crate::domain::{Address, PoolVersion, U256};
use alloy_eips::BlockId;
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::SolCall;
use alloy_transport::{RpcError, TransportError};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// JSON-RPC error code geth uses for `execution reverted`.
const REVERT_ERROR_CODE: i64 = 3;

/// Chain reader backed by an Ethereum JSON-RPC endpoint.
///
/// Transport failures and node-side error responses are retried with exponential
/// backoff. A revert is returned immediately.
#[derive(Clone)]
pub struct RpcChainReader {
    provider: DynProvider,
    block: BlockId,
}

impl fmt::Debug for RpcChainReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcChainReader")
            .field("block", &self.block)
            .finish_non_exhaustive()
    }
}

impl RpcChainReader {
    /// Reader evaluating calls at the latest block.
    ///
    /// # Errors
    /// Returns [`ReadError::Transport`] if `url` is not a valid URL.
    pub fn new(url: &str) -> Result<Self, ReadError> {
        let url = url
            .parse()
            .map_err(|e| ReadError::Transport(format!("invalid RPC url {:?}: {}", url, e)))?;
        let provider = ProviderBuilder::new().connect_http(url).erased();
        Ok(Self {
            provider,
            block: BlockId::latest(),
        })
    }

    fn pinned(&self, block_number: u64) -> Self {
        Self {
            provider: self.provider.clone(),
            block: BlockId::number(block_number),
        }
    }

    async fn eth_call<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return, ReadError> {
        let method = C::SIGNATURE;
        debug!(contract = %to, method, block = ?self.block, "eth_call");

        let request = TransactionRequest::default()
            .to(to)
            .input(call.abi_encode().into());
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let output = retry(backoff, || async {
            self.provider
                .call(request.clone())
                .block(self.block)
                .await
                .map_err(|e| classify_call_error(e, to, method))
        })
        .await?;

        // Calls to an address without code succeed with empty return data.
        if output.is_empty() {
            return Err(ReadError::Reverted {
                contract: to,
                method,
                reason: "empty return data".to_string(),
            });
        }

        C::abi_decode_returns(&output).map_err(|e| ReadError::Decode {
            method,
            message: e.to_string(),
        })
    }
}

/// Whether a JSON-RPC error response reports a revert rather than a node failure.
fn is_revert_response(code: i64, message: &str) -> bool {
    code == REVERT_ERROR_CODE || message.to_ascii_lowercase().contains("revert")
}

/// Reverts are permanent; transport failures and other error responses are retried.
fn classify_call_error(
    error: TransportError,
    contract: Address,
    method: &'static str,
) -> backoff::Error<ReadError> {
    match &error {
        RpcError::ErrorResp(payload) if is_revert_response(payload.code, &payload.message) => {
            backoff::Error::permanent(ReadError::Reverted {
                contract,
                method,
                reason: payload.message.to_string(),
            })
        }
        RpcError::ErrorResp(payload) => backoff::Error::transient(ReadError::Rpc {
            code: payload.code,
            message: payload.message.to_string(),
        }),
        RpcError::Transport(kind) => {
            backoff::Error::transient(ReadError::Transport(kind.to_string()))
        }
        RpcError::NullResp | RpcError::DeserError { .. } => {
            backoff::Error::permanent(ReadError::Decode {
                method,
                message: error.to_string(),
            })
        }
        _ => backoff::Error::permanent(ReadError::Transport(error.to_string())),
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    fn at_block(&self, block_number: u64) -> Arc<dyn ChainReader> {
        Arc::new(self.pinned(block_number))
    }

    async fn token(&self, pool: Address) -> Result<Address, ReadError> {
        self.eth_call(pool, IPoolV2::tokenCall {}).await
    }

    async fn decimals(&self, contract: Address) -> Result<u8, ReadError> {
        self.eth_call(contract, IErc20::decimalsCall {}).await
    }

    async fn total_supply(&self, pool: Address) -> Result<U256, ReadError> {
        self.eth_call(pool, IErc20::totalSupplyCall {}).await
    }

    async fn total_debt(&self, pool: Address) -> Result<U256, ReadError> {
        self.eth_call(pool, IPoolV3::totalDebtCall {}).await
    }

    async fn withdraw_fee(&self, pool: Address) -> Result<U256, ReadError> {
        self.eth_call(pool, IPoolV2::withdrawFeeCall {}).await
    }

    async fn fee_whitelist(
        &self,
        pool: Address,
        version: PoolVersion,
    ) -> Result<Address, ReadError> {
        match version {
            PoolVersion::V2 => self.eth_call(pool, IPoolV2::feeWhiteListCall {}).await,
            PoolVersion::V3 => self.eth_call(pool, IPoolV3::feeWhitelistCall {}).await,
        }
    }

    async fn price_per_share(
        &self,
        pool: Address,
        version: PoolVersion,
    ) -> Result<U256, ReadError> {
        match version {
            PoolVersion::V2 => self.eth_call(pool, IPoolV2::getPricePerShareCall {}).await,
            PoolVersion::V3 => self.eth_call(pool, IPoolV3::pricePerShareCall {}).await,
        }
    }

    async fn strategies(&self, pool: Address) -> Result<Vec<Address>, ReadError> {
        self.eth_call(pool, IPoolV3::getStrategiesCall {}).await
    }

    async fn controller_strategy(
        &self,
        controller: Address,
        pool: Address,
    ) -> Result<Address, ReadError> {
        self.eth_call(controller, IController::strategyCall { pool })
            .await
    }

    async fn total_locked(&self, strategy: Address) -> Result<U256, ReadError> {
        self.eth_call(strategy, IStrategyV2::totalLockedCall {}).await
    }

    async fn list_contains(&self, list: Address, account: Address) -> Result<bool, ReadError> {
        self.eth_call(list, IAddressList::containsCall { account })
            .await
    }

    async fn amounts_out(
        &self,
        router: Address,
        amount_in: U256,
        path: Vec<Address>,
    ) -> Result<Vec<U256>, ReadError> {
        self.eth_call(
            router,
            IPriceRouter::getAmountsOutCall {
                amountIn: amount_in,
                path,
            },
        )
        .await
    }
}
