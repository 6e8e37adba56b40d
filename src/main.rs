use commission_network::{
    bot,
    config::{database, settings},
    core::{commission, member, records},
    errors::{Error, Result},
};
use dotenvy::dotenv;
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load settings from config.toml
    let config = settings::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect to the database and create missing tables
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed configured members and import the snapshot, if any
    member::seed_members(&db, &config.members)
        .await
        .inspect_err(|e| error!("Failed to seed members: {}", e))?;
    if let Some(path) = &config.snapshot
        && commission::count_commissions(&db).await? == 0
    {
        let json = std::fs::read_to_string(path)
            .inspect_err(|e| error!("Failed to read snapshot {}: {}", path.display(), e))?;
        let records = records::parse_commission_records(&json)?;
        commission::import_snapshot(&db, &records)
            .await
            .inspect(|summary| info!("Snapshot import: {:?}", summary))
            .inspect_err(|e| error!("Failed to import snapshot: {}", e))?;
    }

    // 6. Run the bot; the token is read directly before use, not stored in settings
    let token = env::var("DISCORD_BOT_TOKEN")
        .inspect_err(|e| error!("DISCORD_BOT_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    bot::run_bot(token, Arc::new(config), db).await
}
