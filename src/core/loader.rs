//! Level loading backed by the local member store.

use crate::{
    core::{member::fetch_level_batch, tree::LevelBatch, view::LevelLoader},
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use tracing::debug;

/// Loads the next network level below a fixed root from the database.
#[derive(Debug, Clone)]
pub struct DbLevelLoader<'a> {
    db: &'a DatabaseConnection,
    root_uid: String,
}

impl<'a> DbLevelLoader<'a> {
    /// Creates a loader for the network below `root_uid`.
    #[must_use]
    pub fn new(db: &'a DatabaseConnection, root_uid: impl Into<String>) -> Self {
        Self {
            db,
            root_uid: root_uid.into(),
        }
    }
}

impl LevelLoader for DbLevelLoader<'_> {
    async fn load_level(&self, next_level: u32, node_id: &str) -> Result<LevelBatch> {
        debug!(root = %self.root_uid, next_level, node_id, "Loading network level");
        fetch_level_batch(self.db, &self.root_uid, next_level)
            .await
            .map_err(|e| Error::LevelLoad {
                level: next_level,
                node_id: node_id.to_string(),
                message: e.to_string(),
            })
    }
}
