use super::connection::Connection;
use crate::errors::RpcError;
use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolValue, sol};

sol! {
    /// Mento broker: routes quotes and swaps to the exchange providers
    interface IBroker {
        function getExchangeProviders() external view returns (address[] memory);
        function getAmountOut(address exchangeProvider, bytes32 exchangeId, address tokenIn, address tokenOut, uint256 amountIn) external view returns (uint256 amountOut);
        function swapIn(address exchangeProvider, bytes32 exchangeId, address tokenIn, address tokenOut, uint256 amountIn, uint256 amountOutMin) external returns (uint256 amountOut);
    }

    interface IExchangeProvider {
        struct Exchange {
            bytes32 exchangeId;
            address[] assets;
        }

        function getExchanges() external view returns (Exchange[] memory exchanges);
    }

    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address to, uint256 amount) external returns (bool);
    }
}

pub async fn erc20_allowance(connection: &Connection, token: Address, owner: Address, spender: Address) -> Result<U256, RpcError> {
    let data = connection.call_contract(token, IERC20::allowanceCall { owner, spender }.abi_encode()).await?;
    Ok(U256::abi_decode(&data)?)
}

pub async fn erc20_balance_of(
    connection: &Connection,
    token: Address,
    owner: Address,
    block: Option<u64>,
) -> Result<U256, RpcError> {
    let data = connection.call_contract_at(token, IERC20::balanceOfCall { owner }.abi_encode(), block).await?;
    Ok(U256::abi_decode(&data)?)
}
