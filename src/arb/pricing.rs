//! Constant-product pricing with the 0.3% pool fee.
//!
//! Both quotes reproduce the pair contract's integer math: every division
//! truncates and every intermediate product is checked, so a quote either
//! matches what the chain computes or fails the way the chain would revert.

use alloy::primitives::U256;
use thiserror::Error;

/// Numerator of the fee multiplier (0.997)
const FEE_NUMERATOR: U256 = U256::from_limbs([997, 0, 0, 0]);
/// Denominator of the fee multiplier
const FEE_DENOMINATOR: U256 = U256::from_limbs([1000, 0, 0, 0]);

/// Failure of a constant-product quote.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// The requested output cannot be taken from the pool
    #[error("amount out {amount_out} must be below reserve out {reserve_out}")]
    InsufficientReserve {
        /// Requested output
        amount_out: U256,
        /// Reserve of the output token
        reserve_out: U256,
    },
    /// One side of the pool is empty
    #[error("insufficient liquidity: reserves {reserve_in} / {reserve_out}")]
    InsufficientLiquidity {
        /// Reserve of the input token
        reserve_in: U256,
        /// Reserve of the output token
        reserve_out: U256,
    },
    /// An intermediate product does not fit in 256 bits
    #[error("arithmetic overflow while quoting")]
    Overflow,
    /// The quote denominator is zero
    #[error("division by zero while quoting")]
    DivisionByZero,
}

/// Amount received for selling `amount_in` into a pool holding
/// `reserve_in`/`reserve_out`.
///
/// `floor(amount_in * 997 * reserve_out / (reserve_in * 1000 + amount_in * 997))`
///
/// # Errors
///
/// [`PricingError::InsufficientLiquidity`] if either reserve is zero,
/// [`PricingError::Overflow`] if an intermediate product exceeds 256 bits.
pub fn quote_output(
    reserve_in: U256,
    reserve_out: U256,
    amount_in: U256,
) -> Result<U256, PricingError> {
    ensure_liquidity(reserve_in, reserve_out)?;
    let amount_in_with_fee = amount_in
        .checked_mul(FEE_NUMERATOR)
        .ok_or(PricingError::Overflow)?;
    let numerator = amount_in_with_fee
        .checked_mul(reserve_out)
        .ok_or(PricingError::Overflow)?;
    let denominator = reserve_in
        .checked_mul(FEE_DENOMINATOR)
        .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
        .ok_or(PricingError::Overflow)?;
    numerator
        .checked_div(denominator)
        .ok_or(PricingError::DivisionByZero)
}

/// Amount that must be sold into the pool to receive exactly `amount_out`.
///
/// `floor(reserve_in * amount_out * 1000 / ((reserve_out - amount_out) * 997)) + 1`
///
/// # Errors
///
/// [`PricingError::InsufficientLiquidity`] if either reserve is zero,
/// [`PricingError::InsufficientReserve`] if `amount_out >= reserve_out`,
/// [`PricingError::Overflow`] if an intermediate product exceeds 256 bits.
pub fn quote_input(
    reserve_in: U256,
    reserve_out: U256,
    amount_out: U256,
) -> Result<U256, PricingError> {
    ensure_liquidity(reserve_in, reserve_out)?;
    if amount_out >= reserve_out {
        return Err(PricingError::InsufficientReserve {
            amount_out,
            reserve_out,
        });
    }
    let numerator = reserve_in
        .checked_mul(amount_out)
        .and_then(|product| product.checked_mul(FEE_DENOMINATOR))
        .ok_or(PricingError::Overflow)?;
    let denominator = (reserve_out - amount_out)
        .checked_mul(FEE_NUMERATOR)
        .ok_or(PricingError::Overflow)?;
    numerator
        .checked_div(denominator)
        .ok_or(PricingError::DivisionByZero)?
        .checked_add(U256::from(1))
        .ok_or(PricingError::Overflow)
}

/// The pair contract refuses to quote against an empty side
fn ensure_liquidity(reserve_in: U256, reserve_out: U256) -> Result<(), PricingError> {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(PricingError::InsufficientLiquidity {
            reserve_in,
            reserve_out,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::utils::constants::ETHER;

    fn u(value: u128) -> U256 {
        U256::from(value)
    }

    #[test]
    fn test_quote_output_small_reserves() {
        for (reserve_in, reserve_out, amount_in, expected) in &[
            // reserve_in, reserve_out, amount_in, out
            (10, 1000, 1, 90),
            (1000, 12, 90, 0),
            (100, 200, 10, 18),
            (100, 100, 0, 0),
            (1000, 100, 20, 1),
        ] {
            assert_eq!(
                quote_output(u(*reserve_in), u(*reserve_out), u(*amount_in)).unwrap(),
                u(*expected)
            );
        }
    }

    #[test]
    fn test_two_leg_scenario_matches_integer_formulas() {
        // pool A: 10 native / 1000 X, pool B: 12 native / 1000 X
        let native_a = ETHER * u(10);
        let token_a = ETHER * u(1000);
        let native_b = ETHER * u(12);
        let token_b = ETHER * u(1000);

        let intermediate = quote_output(native_a, token_a, ETHER).unwrap();
        assert_eq!(intermediate, U256::from(90_661_089_388_014_913_158_u128));

        let back = quote_output(token_b, native_b, intermediate).unwrap();
        assert_eq!(back, U256::from(994_754_319_674_015_756_u128));
        // 1 native in, slightly less than 1 native out: not crossed
        assert!(back < ETHER);
    }

    #[test]
    fn test_quote_output_is_monotonic_and_bounded() {
        let mut rng = fastrand::Rng::with_seed(7);
        for _ in 0..200 {
            let reserve_in = u(rng.u128(1..1_000_000_000_000_000_000_000));
            let reserve_out = u(rng.u128(1..1_000_000_000_000_000_000_000));
            let mut previous = U256::ZERO;
            for step in 0..20_u128 {
                let amount_in = reserve_in * u(step) / u(4);
                let out = quote_output(reserve_in, reserve_out, amount_in).unwrap();
                assert!(out >= previous);
                assert!(out < reserve_out);
                previous = out;
            }
        }
    }

    #[test]
    fn test_quote_input_is_sufficient_and_tight() {
        let mut rng = fastrand::Rng::with_seed(42);
        for _ in 0..500 {
            let reserve_in = u(rng.u128(1_000..1_000_000_000_000_000_000_000));
            let reserve_out = u(rng.u128(1_000..1_000_000_000_000_000_000_000));
            let amount_in = u(rng.u128(1..1_000_000_000_000_000_000));
            let out = quote_output(reserve_in, reserve_out, amount_in).unwrap();
            let needed = quote_input(reserve_in, reserve_out, out).unwrap();
            // the quoted input always buys at least `out`
            assert!(quote_output(reserve_in, reserve_out, needed).unwrap() >= out);
            // and never asks for more than one unit above what was actually sold
            assert!(needed <= amount_in + U256::from(1));
        }
    }

    #[test]
    fn test_quote_input_round_trip_on_fine_grained_pools() {
        // when every extra unit in moves the output, the round trip recovers at least x
        for (reserve_in, reserve_out, x) in &[
            (100, 200, 10),
            (100, 200, 11),
            (1000, 1000, 1),
            (5, 1_000_000, 3),
        ] {
            let out = quote_output(u(*reserve_in), u(*reserve_out), u(*x)).unwrap();
            let back = quote_input(u(*reserve_in), u(*reserve_out), out).unwrap();
            assert!(back >= u(*x), "{reserve_in}/{reserve_out}: {x} -> {out} -> {back}");
        }
    }

    #[test]
    fn test_quote_input_known_values() {
        assert_eq!(quote_input(u(100), u(200), u(18)).unwrap(), u(10));
        assert_eq!(quote_input(u(1000), u(1000), u(1)).unwrap(), u(2));
    }

    #[test]
    fn test_quote_input_rejects_draining_the_pool() {
        for amount_out in [200, 201, 10_000] {
            assert_eq!(
                quote_input(u(100), u(200), u(amount_out)),
                Err(PricingError::InsufficientReserve {
                    amount_out: u(amount_out),
                    reserve_out: u(200),
                })
            );
        }
    }

    #[test]
    fn test_overflow() {
        assert_eq!(
            quote_output(U256::MAX, U256::MAX, U256::MAX),
            Err(PricingError::Overflow)
        );
    }

    #[test]
    fn test_empty_side_is_insufficient_liquidity() {
        for (reserve_in, reserve_out) in [(0, 100), (100, 0), (0, 0)] {
            let expected = Err(PricingError::InsufficientLiquidity {
                reserve_in: u(reserve_in),
                reserve_out: u(reserve_out),
            });
            // an empty input side would otherwise hand out the whole output reserve
            assert_eq!(quote_output(u(reserve_in), u(reserve_out), u(1)), expected);
            assert_eq!(quote_output(u(reserve_in), u(reserve_out), U256::ZERO), expected);
            assert_eq!(quote_input(u(reserve_in), u(reserve_out), U256::ZERO), expected);
        }
    }
}
