/// Per-block reserve and quote refresh
///
/// Reads every pool's state through the lookup contract and writes it into the
/// registry only when the whole read succeeded.
pub mod reserves;
/// Block subscription
///
/// Forwards new block numbers from a websocket `newHeads` subscription.
pub mod subscriber;

pub use reserves::refresh_reserves;
pub use subscriber::subscribe_to_blocks;
