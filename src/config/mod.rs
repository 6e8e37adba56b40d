/// Bot access control from environment variables
pub mod admins;

/// Database configuration and connection management
pub mod database;

/// Application settings loading from config.toml
pub mod settings;
