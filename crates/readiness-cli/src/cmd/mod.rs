pub mod assess;
pub mod catalog;
pub mod config;
pub mod init;
pub mod serve;
pub mod session;

use anyhow::Context;
use readiness_core::config::Config;
use readiness_core::repository::JsonFileRepository;
use readiness_core::store::SessionStore;
use std::path::Path;
use std::sync::Arc;

/// File-backed store for an initialized project. Sessions load lazily on
/// first access, so separate invocations continue the same session.
pub fn open_store(root: &Path) -> anyhow::Result<SessionStore> {
    let config = Config::load(root)?;
    let catalog = Arc::new(config.load_catalog(root).context("failed to load catalog")?);
    let bands = config.bands(&catalog)?;
    Ok(SessionStore::with_bands(catalog, bands)
        .with_repository(Arc::new(JsonFileRepository::new(root))))
}
