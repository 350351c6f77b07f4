/// App context
pub mod app_context;
/// Constants
pub mod constants;
/// Logger
pub mod logger;
/// Providers and signers
pub mod providers;
