use readiness_core::config::{Config, GuidanceBackend};
use readiness_core::repository::JsonFileRepository;
use readiness_core::store::SessionStore;
use readiness_guide::{ChatCompletionsProvider, FallbackProvider, GuidanceProvider, RubricProvider};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub store: Arc<SessionStore>,
    pub guide: Arc<dyn GuidanceProvider>,
}

impl AppState {
    pub fn new(root: PathBuf, store: Arc<SessionStore>, guide: Arc<dyn GuidanceProvider>) -> Self {
        Self { root, store, guide }
    }

    /// Wire the project at `root`: config, catalog, bands, file-backed
    /// store with previously stored sessions, and the configured guidance
    /// backend.
    pub fn load(root: PathBuf) -> anyhow::Result<Self> {
        let config = Config::load_or_default(&root)?;
        let catalog = Arc::new(config.load_catalog(&root)?);
        let bands = config.bands(&catalog)?;
        let store = SessionStore::with_bands(catalog, bands)
            .with_repository(Arc::new(JsonFileRepository::new(root.clone())));
        store.hydrate()?;
        let guide = guidance_provider(&config.guidance)?;
        tracing::info!(
            questions = store.catalog().len(),
            sessions = store.len(),
            guidance = guide.name(),
            "project loaded"
        );
        Ok(Self::new(root, Arc::new(store), guide))
    }
}

/// Build the provider selected by `backend`. A chat backend with fallback
/// enabled degrades to the rubric when its API key is missing.
pub fn guidance_provider(backend: &GuidanceBackend) -> anyhow::Result<Arc<dyn GuidanceProvider>> {
    match backend {
        GuidanceBackend::Rubric => Ok(Arc::new(RubricProvider::new())),
        GuidanceBackend::ChatCompletions {
            base_url,
            model,
            api_key_env,
            timeout_secs,
            fallback,
        } => {
            let chat = ChatCompletionsProvider::from_env(
                base_url,
                api_key_env,
                model.clone(),
                Duration::from_secs(*timeout_secs),
            );
            match (chat, *fallback) {
                (Ok(chat), true) => Ok(Arc::new(FallbackProvider::new(Box::new(chat)))),
                (Ok(chat), false) => Ok(Arc::new(chat)),
                (Err(e), true) => {
                    tracing::warn!(error = %e, "chat guidance unavailable, using rubric");
                    Ok(Arc::new(RubricProvider::new()))
                }
                (Err(e), false) => Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uninitialized_root_uses_builtin_catalog() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = AppState::load(dir.path().to_path_buf()).unwrap();
        assert_eq!(state.store.catalog().len(), 21);
        assert_eq!(state.guide.name(), "rubric");
    }

    #[test]
    fn chat_backend_without_key_falls_back_or_fails() {
        let backend = |fallback| GuidanceBackend::ChatCompletions {
            base_url: "http://localhost:1".into(),
            model: "m".into(),
            api_key_env: "READINESS_SERVER_TEST_UNSET_KEY".into(),
            timeout_secs: 1,
            fallback,
        };
        assert_eq!(guidance_provider(&backend(true)).unwrap().name(), "rubric");
        assert!(guidance_provider(&backend(false)).is_err());
    }
}
