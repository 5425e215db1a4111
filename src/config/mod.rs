/// Database configuration and connection management
pub mod database;

/// Marketplace settings loaded from market.toml
pub mod market;
