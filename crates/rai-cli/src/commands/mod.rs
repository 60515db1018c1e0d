//! CLI commands.

pub mod cache;
pub mod chat;
pub mod info;
pub mod model;
pub mod models;

use rai_coach::{CoachConfig, CoachSession, SessionParts};
use rai_local_ai::DirCacheStorage;
use std::sync::Arc;

/// Open a session whose cache view is the on-disk artifact cache.
///
/// Catalog and cache commands inspect what is stored on disk regardless of
/// which engine a chat would use.
pub(crate) async fn open_disk_session(config: CoachConfig) -> miette::Result<CoachSession> {
    let mut parts = SessionParts::from_config(&config);
    parts.cache = Arc::new(DirCacheStorage::new(config.cache_dir()));
    CoachSession::with_parts(config, parts)
        .await
        .map_err(|e| miette::miette!("{}", e))
}
