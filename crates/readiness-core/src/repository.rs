use crate::error::{ReadinessError, Result};
use crate::io::{atomic_write, ensure_dir, remove_if_exists};
use crate::paths;
use crate::session::AssessmentSession;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Durable home for session records.
///
/// `save` is a compare-and-swap on the record version: it succeeds only
/// when the stored copy is exactly one version behind (or absent for a
/// fresh session), and fails with [`ReadinessError::Conflict`] otherwise.
/// Stores in separate processes sharing one repository therefore accept at
/// most one answer per question.
pub trait SessionRepository: Send + Sync {
    fn save(&self, session: &AssessmentSession) -> Result<()>;
    fn load(&self, id: &str) -> Result<AssessmentSession>;
    /// Every stored record, one per id, in no particular order.
    fn list(&self) -> Result<Vec<AssessmentSession>>;
}

// ---------------------------------------------------------------------------
// JsonFileRepository
// ---------------------------------------------------------------------------

/// One pretty-printed JSON file per session:
///
/// ```text
/// .readiness/sessions/active/<id>.json      in progress
/// .readiness/sessions/completed/<id>.json   complete
/// ```
///
/// When both files exist for an id (a completion whose cleanup failed), the
/// completed copy wins.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    root: PathBuf,
    /// Serializes version check and write for handles cloned from this one.
    save_lock: Arc<Mutex<()>>,
}

impl JsonFileRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            save_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file currently holding `id`, if any.
    pub fn locate(&self, id: &str) -> Result<Option<PathBuf>> {
        paths::validate_session_id(id)?;
        let completed = paths::completed_session_path(&self.root, id);
        if completed.exists() {
            return Ok(Some(completed));
        }
        let active = paths::active_session_path(&self.root, id);
        if active.exists() {
            return Ok(Some(active));
        }
        Ok(None)
    }

    fn stored_version(&self, id: &str) -> Result<Option<u64>> {
        let Some(path) = self.locate(id)? else {
            return Ok(None);
        };
        let stored: AssessmentSession = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        Ok(Some(stored.version()))
    }
}

impl SessionRepository for JsonFileRepository {
    fn save(&self, session: &AssessmentSession) -> Result<()> {
        paths::validate_session_id(session.id())?;
        let _guard = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let expected = session.version().checked_sub(1);
        let stored = self.stored_version(session.id())?;
        if stored != expected {
            return Err(ReadinessError::Conflict(format!(
                "assessment {} changed since it was read (stored version {}, saving {})",
                session.id(),
                stored.map_or_else(|| "none".to_string(), |v| v.to_string()),
                session.version()
            )));
        }

        let data = serde_json::to_string_pretty(session)?;
        let active = paths::active_session_path(&self.root, session.id());

        if session.is_complete() {
            let completed = paths::completed_session_path(&self.root, session.id());
            atomic_write(&completed, data.as_bytes())?;
            if remove_if_exists(&active)? {
                tracing::debug!(id = session.id(), "moved session to completed");
            }
        } else {
            atomic_write(&active, data.as_bytes())?;
        }
        Ok(())
    }

    fn load(&self, id: &str) -> Result<AssessmentSession> {
        let path = self
            .locate(id)?
            .ok_or_else(|| ReadinessError::SessionNotFound(id.to_string()))?;
        let data = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn list(&self) -> Result<Vec<AssessmentSession>> {
        let mut sessions: HashMap<String, AssessmentSession> = HashMap::new();
        // Completed last, so a leftover active copy never shadows it.
        for dir in [
            paths::active_dir(&self.root),
            paths::completed_dir(&self.root),
        ] {
            if !dir.exists() {
                continue;
            }
            for entry in std::fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let data = std::fs::read_to_string(&path)?;
                match serde_json::from_str::<AssessmentSession>(&data) {
                    Ok(session) => {
                        sessions.insert(session.id().to_string(), session);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "skipping unreadable session file");
                    }
                }
            }
        }
        Ok(sessions.into_values().collect())
    }
}

/// Create the session directories under `root`.
pub fn init_dirs(root: &Path) -> Result<()> {
    ensure_dir(&paths::active_dir(root))?;
    ensure_dir(&paths::completed_dir(root))?;
    ensure_dir(&paths::exports_dir(root))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
