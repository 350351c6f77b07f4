use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

use super::ExecutionError;
use crate::arb::opportunity::{Direction, OpportunityCandidate};

sol! {
    interface IBundleExecutor {
        function uniswapWethV3(
            uint256 _wethAmountToCoinbase,
            address[] memory _targets,
            bytes[] memory _payloads
        ) external payable;
        function uniswapWethV3_ZeroForOne(
            address _v3Pool,
            address _v2Pair,
            uint256 _amountIn,
            address _weth
        ) external;
        function uniswapWethV3_OneForZero(
            address _v3Pool,
            address _v2Pair,
            uint256 _amountIn,
            address _weth
        ) external;
    }

    interface IUniswapV2Pair {
        function swap(
            uint256 amount0Out,
            uint256 amount1Out,
            address to,
            bytes calldata data
        ) external;
    }
}

/// Executor call buying the candidate's token from its fee tier with `amount_in` native.
///
/// The native asset is token1 of the tier pool when the token sorts below it,
/// so the buy swaps one-for-zero; otherwise zero-for-one.
///
/// # Errors
///
/// Returns [`ExecutionError::InvariantViolation`] for a direction other than
/// tier-to-pool or a candidate without a tier pool.
pub fn build_buy_call(
    candidate: &OpportunityCandidate<'_>,
    native: Address,
    amount_in: U256,
) -> Result<Bytes, ExecutionError> {
    if candidate.direction != Direction::TierToPool {
        return Err(ExecutionError::InvariantViolation(format!(
            "no buy call for direction {}",
            candidate.direction
        )));
    }
    if candidate.buy_from.is_zero() {
        return Err(ExecutionError::InvariantViolation(format!(
            "candidate for {} has no tier pool",
            candidate.token
        )));
    }

    let pair = candidate.sell_to.id.address();
    let data = if candidate.token.address() < native {
        IBundleExecutor::uniswapWethV3_OneForZeroCall {
            _v3Pool: candidate.buy_from,
            _v2Pair: pair,
            _amountIn: amount_in,
            _weth: native,
        }
        .abi_encode()
    } else {
        IBundleExecutor::uniswapWethV3_ZeroForOneCall {
            _v3Pool: candidate.buy_from,
            _v2Pair: pair,
            _amountIn: amount_in,
            _weth: native,
        }
        .abi_encode()
    };
    Ok(data.into())
}

/// Pair `swap` selling the candidate's intermediate tokens for native, paid to `recipient`
///
/// # Errors
///
/// Returns [`ExecutionError::InvariantViolation`] if the pool does not trade the
/// token or the sale cannot be priced on its cached reserves.
pub fn build_sell_call(
    candidate: &OpportunityCandidate<'_>,
    recipient: Address,
) -> Result<Bytes, ExecutionError> {
    let pool = candidate.sell_to;
    let amount_out = pool
        .amount_out(candidate.token, candidate.intermediate)
        .map_err(|e| {
            ExecutionError::InvariantViolation(format!("pricing sale into {}: {e}", pool.id))
        })?;

    // the pool trades the token, so the native side is the other one
    let (amount0_out, amount1_out) = if candidate.token == pool.token0 {
        (U256::ZERO, amount_out)
    } else {
        (amount_out, U256::ZERO)
    };

    Ok(IUniswapV2Pair::swapCall {
        amount0Out: amount0_out,
        amount1Out: amount1_out,
        to: recipient,
        data: Bytes::new(),
    }
    .abi_encode()
    .into())
}

/// Executor call running every `(target, payload)` and paying `miner_reward` to the block producer
#[must_use]
pub fn build_executor_call(
    miner_reward: U256,
    targets: Vec<Address>,
    payloads: Vec<Bytes>,
) -> Bytes {
    IBundleExecutor::uniswapWethV3Call {
        _wethAmountToCoinbase: miner_reward,
        _targets: targets,
        _payloads: payloads,
    }
    .abi_encode()
    .into()
}
