//! Database configuration module.
//!
//! This module handles the `SQLite` connection for the local mirror of the commission
//! backend and creates its tables from the entity definitions using `SeaORM`'s
//! `Schema::create_table_from_entity`, so the schema always matches the Rust models.

use crate::entities::{Commission, Member, Purchase};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/commission_network.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or the default
/// local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    info!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates the members, purchases, and commissions tables if they do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut member_table = schema.create_table_from_entity(Member);
    let mut purchase_table = schema.create_table_from_entity(Purchase);
    let mut commission_table = schema.create_table_from_entity(Commission);

    member_table.if_not_exists();
    purchase_table.if_not_exists();
    commission_table.if_not_exists();

    db.execute(builder.build(&member_table)).await?;
    db.execute(builder.build(&purchase_table)).await?;
    db.execute(builder.build(&commission_table)).await?;

    Ok(())
}
