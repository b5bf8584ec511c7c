use crate::error::{ReadinessError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const READINESS_DIR: &str = ".readiness";
pub const SESSIONS_DIR: &str = ".readiness/sessions";
pub const ACTIVE_DIR: &str = "active";
pub const COMPLETED_DIR: &str = "completed";
pub const EXPORTS_DIR: &str = ".readiness/exports";

pub const CONFIG_FILE: &str = ".readiness/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn readiness_dir(root: &Path) -> PathBuf {
    root.join(READINESS_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn sessions_dir(root: &Path) -> PathBuf {
    root.join(SESSIONS_DIR)
}

pub fn active_dir(root: &Path) -> PathBuf {
    sessions_dir(root).join(ACTIVE_DIR)
}

pub fn completed_dir(root: &Path) -> PathBuf {
    sessions_dir(root).join(COMPLETED_DIR)
}

pub fn exports_dir(root: &Path) -> PathBuf {
    root.join(EXPORTS_DIR)
}

pub fn active_session_path(root: &Path, id: &str) -> PathBuf {
    active_dir(root).join(format!("{id}.json"))
}

pub fn completed_session_path(root: &Path, id: &str) -> PathBuf {
    completed_dir(root).join(format!("{id}.json"))
}

// ---------------------------------------------------------------------------
// Session id validation
// ---------------------------------------------------------------------------

static SESSION_ID_RE: OnceLock<Regex> = OnceLock::new();

fn session_id_re() -> &'static Regex {
    SESSION_ID_RE.get_or_init(|| {
        Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$")
            .expect("session id pattern is valid")
    })
}

/// Reject anything that is not a lowercase hyphenated UUID before it is
/// joined onto a path. A malformed id can never name a stored session, so
/// it is reported as not found.
pub fn validate_session_id(id: &str) -> Result<()> {
    if !session_id_re().is_match(id) {
        return Err(ReadinessError::SessionNotFound(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
