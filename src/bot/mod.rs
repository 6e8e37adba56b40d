//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for the commission network viewer,
//! including all slash commands, autocomplete handlers, the per-user network views,
//! and the poise framework setup.

/// Discord command implementations (commissions, network, general)
pub mod commands;
/// Discord interaction handlers (autocomplete, etc.)
pub mod handlers;

use crate::{
    config::{admins, settings::AppConfig},
    core::view::NetworkTreeView,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

/// Shared data available to all bot commands.
/// This structure holds the database connection, the loaded settings, and the
/// network view each Discord user currently has open.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Application settings from config.toml
    pub config: Arc<AppConfig>,
    /// Discord user ids allowed to run commands; empty means everyone
    pub admins: HashSet<u64>,
    /// Open network views keyed by Discord user id
    pub sessions: Mutex<HashMap<u64, NetworkTreeView>>,
}

impl BotData {
    /// Creates a new `BotData` instance with no open views.
    #[must_use]
    pub fn new(database: DatabaseConnection, config: Arc<AppConfig>, admins: HashSet<u64>) -> Self {
        Self {
            database,
            config,
            admins,
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {:?}", ctx.command().name, error);
            if let Err(e) = ctx.say(format!("⚠️ {error}")).await {
                error!("Failed to send error message: {}", e);
            }
        }
        poise::FrameworkError::CommandCheckFailed { ctx, .. } => {
            warn!(user = %ctx.author().id, "Rejected command from a non-admin user");
            if let Err(e) = ctx.say("⛔ You are not allowed to use this bot.").await {
                error!("Failed to send error message: {}", e);
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

async fn admin_check(ctx: poise::Context<'_, BotData, Error>) -> Result<bool> {
    Ok(admins::is_allowed(&ctx.data().admins, ctx.author().id.get()))
}

/// Builds the poise framework and runs the Discord client until it stops.
///
/// # Errors
/// Returns an error if the client cannot be created or stops with an error.
#[instrument(skip(token, config, database))]
pub async fn run_bot(
    token: String,
    config: Arc<AppConfig>,
    database: DatabaseConnection,
) -> Result<()> {
    let admin_ids = admins::get_admin_ids();
    if admin_ids.is_empty() {
        warn!("ADMIN_USER_IDS is not set, every Discord user can run commands");
    }

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::commissions(),
                commands::network(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            command_check: Some(|ctx| Box::pin(admin_check(ctx))),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(BotData::new(database, config, admin_ids))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))?;
    Ok(())
}

pub use commands::*;
pub use handlers::*;
