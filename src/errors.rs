//! Unified error types for the commission network viewer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Member '{uid}' not found")]
    MemberNotFound { uid: String },

    #[error("Network node '{id}' not found")]
    NodeNotFound { id: String },

    #[error("No network view is open, use `/network show` first")]
    NoOpenView,

    #[error("Node '{node_id}' is still loading its next level")]
    LoadPending { node_id: String },

    #[error("Failed to load level {level} for node '{node_id}': {message}")]
    LevelLoad {
        level: u32,
        node_id: String,
        message: String,
    },

    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<sea_orm::DbErr> for Error {
    fn from(value: sea_orm::DbErr) -> Self {
        Self::Database(value.to_string())
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
