//! Crossed-market search.
//!
//! For every token, each fee tier quoted how much token the probe buys. Selling
//! that amount back into the tier's pool prices the round trip; a round trip
//! returning more native than the probe is a crossed market.

use alloy::primitives::U256;
use log::debug;

use super::market::MarketsByToken;
use super::opportunity::{Direction, OpportunityCandidate};
use super::pool::Pool;
use super::token::TokenId;
use crate::utils::constants::MIN_PROFIT;

/// Best crossed market of every token, most profitable first.
///
/// Tokens whose best profit does not exceed [`MIN_PROFIT`] are dropped. Equal
/// profits keep the order the tokens appear in `markets`.
#[must_use]
pub fn find_best<'a>(
    markets: &MarketsByToken<'a>,
    probe_amount_in: U256,
) -> Vec<OpportunityCandidate<'a>> {
    let mut best: Vec<OpportunityCandidate<'a>> = markets
        .iter()
        .filter_map(|(token, pools)| best_for_token(token, pools, probe_amount_in))
        .filter(|candidate| {
            let keep = candidate.profit > MIN_PROFIT;
            if !keep {
                debug!(
                    "finder::find_best: {} profit {} below minimum",
                    candidate.token, candidate.profit
                );
            }
            keep
        })
        .collect();

    // stable: ties keep token order
    best.sort_by(|a, b| b.profit.cmp(&a.profit));
    best
}

/// Most profitable (pool, tier) round trip for one token, first one wins ties
fn best_for_token<'a>(
    token: TokenId,
    pools: &[&'a Pool],
    probe_amount_in: U256,
) -> Option<OpportunityCandidate<'a>> {
    let mut best: Option<OpportunityCandidate<'a>> = None;

    for pool in pools {
        for tier in pool.tiers() {
            let Some(tier_address) = tier.address else {
                continue;
            };
            if tier.quoted_out.is_zero() {
                continue;
            }

            let amount_out = match pool.native_out(tier.quoted_out) {
                Ok(amount_out) => amount_out,
                Err(e) => {
                    debug!("finder::best_for_token: {token} on {}: {e}", pool.id);
                    continue;
                }
            };
            if amount_out <= probe_amount_in {
                continue;
            }
            if let Some(current) = &best {
                if amount_out - probe_amount_in <= current.profit {
                    continue;
                }
            }

            match OpportunityCandidate::new(
                token,
                probe_amount_in,
                amount_out,
                tier_address,
                pool,
                tier.quoted_out,
                Direction::TierToPool,
            ) {
                Ok(candidate) => best = Some(candidate),
                Err(e) => debug!("finder::best_for_token: {e}"),
            }
        }
    }

    best
}
