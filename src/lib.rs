/*!
 * # Crossmarket - crossed-market searcher
 *
 * Crossmarket watches constant-product pairs that trade a token against the
 * native-wrapped asset, compares them with the concentrated-liquidity fee tiers
 * quoting the same token, and takes the difference with a two-leg bundle sent
 * privately to a block-builder relay.
 *
 * ## Module Structure
 *
 * - `arb`: Pricing, pools, market grouping and the crossed-market search
 * - `bootstrap`: Pool discovery and the initial registry snapshot
 * - `bot`: The per-block refresh, search and execute cycle
 * - `chain`: Chain access behind the `ChainClient` trait
 * - `config`: Configuration from the environment
 * - `execution`: Calldata, gating, simulation and bundle submission
 * - `notify`: Health-check ping
 * - `sync`: Reserve refresh and block subscription
 * - `utils`: Logger, constants, providers and app context
 */

/// Pricing, pools and the crossed-market search
pub mod arb;
/// Pool discovery and the initial registry snapshot
pub mod bootstrap;
/// Per-block cycle driver
pub mod bot;
/// Chain access
pub mod chain;
/// Configuration management for the system
pub mod config;
/// Bundle construction and submission
pub mod execution;
/// Notifications
pub mod notify;
/// Reserve refresh and block subscription
pub mod sync;
/// Utility functions and helpers
pub mod utils;

#[cfg(test)]
pub(crate) mod test_helpers;
