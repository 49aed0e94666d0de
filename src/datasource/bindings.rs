//! ABI bindings for the view functions the revenue engine reads.

use alloy_sol_types::sol;

sol! {
    /// ERC-20 metadata
    #[derive(Debug)]
    interface IErc20 {
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
    }

    /// V2 pool (elder generation)
    #[derive(Debug)]
    interface IPoolV2 {
        function token() external view returns (address);
        function withdrawFee() external view returns (uint256);
        function feeWhiteList() external view returns (address);
        function getPricePerShare() external view returns (uint256);
    }

    /// V3 pool (newer generation)
    #[derive(Debug)]
    interface IPoolV3 {
        function token() external view returns (address);
        function totalDebt() external view returns (uint256);
        function withdrawFee() external view returns (uint256);
        function feeWhitelist() external view returns (address);
        function pricePerShare() external view returns (uint256);
        function getStrategies() external view returns (address[] memory);
    }

    /// V2 controller: pool -> strategy registry
    #[derive(Debug)]
    interface IController {
        function strategy(address pool) external view returns (address);
    }

    /// V2 strategy
    #[derive(Debug)]
    interface IStrategyV2 {
        function totalLocked() external view returns (uint256);
    }

    /// Fee whitelist registry
    #[derive(Debug)]
    interface IAddressList {
        function contains(address account) external view returns (bool);
    }

    /// Uniswap V2 style router
    #[derive(Debug)]
    interface IPriceRouter {
        function getAmountsOut(uint256 amountIn, address[] memory path)
            external
            view
            returns (uint256[] memory amounts);
    }
}
