//! # Arbitrage Module
//!
//! Pricing, the pool registry and the crossed-market search. Everything in
//! here is pure over the cached reserve snapshot; chain reads live in
//! `bootstrap` and `sync`, transaction building in `execution`.

/// Crossed-market search over the registry snapshot
pub mod finder;
/// Pool registry keyed by token
pub mod market;
/// Ranked arbitrage candidates
pub mod opportunity;
/// Pool and fee-tier state
pub mod pool;
/// Constant-product quotes
pub mod pricing;
/// Test helpers and utilities
#[cfg(test)]
pub(crate) mod test_helpers;
/// Token identifiers
pub mod token;
