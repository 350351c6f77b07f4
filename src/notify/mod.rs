/// Health-check ping
pub mod healthcheck;

pub use healthcheck::HealthCheck;
