//! Driving port for catalog maintenance.
//!
//! Every operation here is reserved for administrators; the inbound adapter
//! enforces the role before calling in.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{Error, Game, GameDraft, GameId};

/// Pages requested from the upstream feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRequest {
    pub pages: u32,
    pub page_size: u32,
}

impl Default for SyncRequest {
    fn default() -> Self {
        Self {
            pages: 1,
            page_size: 40,
        }
    }
}

/// Counts reported after a catalog sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub fetched: u64,
    pub imported: u64,
    /// Games skipped because their RAWG id was already present.
    pub skipped: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogCommand: Send + Sync {
    async fn create_game(&self, draft: GameDraft) -> Result<Game, Error>;

    /// Remove a game. Ledger rows that reference it are kept.
    async fn delete_game(&self, id: &GameId) -> Result<(), Error>;

    /// Import games from the upstream feed, skipping known RAWG ids.
    async fn sync(&self, request: SyncRequest) -> Result<SyncReport, Error>;
}
