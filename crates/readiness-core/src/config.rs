use crate::catalog::Catalog;
use crate::error::{ReadinessError, Result};
use crate::paths;
use crate::score::ReadinessBands;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// GuidanceBackend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GuidanceBackend {
    /// Offline explanation built from the rubric.
    #[default]
    Rubric,
    /// Any OpenAI-compatible `/chat/completions` endpoint.
    ChatCompletions {
        #[serde(default = "default_base_url")]
        base_url: String,
        #[serde(default = "default_model")]
        model: String,
        /// Environment variable holding the API key.
        #[serde(default = "default_api_key_env")]
        api_key_env: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
        /// Fall back to the rubric backend when the endpoint fails.
        #[serde(default = "default_true")]
        fallback: bool,
    },
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ReadinessConfig {
    /// Inclusive lower bounds of levels two to five. Rescaled from the
    /// reference cutoffs when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutoffs: Option<[u32; 4]>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub project: ProjectConfig,
    /// Catalog YAML, relative to the project root. Built-in when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub guidance: GuidanceBackend,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: ProjectConfig {
                name: project_name.into(),
            },
            catalog: None,
            readiness: ReadinessConfig::default(),
            server: ServerConfig::default(),
            guidance: GuidanceBackend::default(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(ReadinessError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Like [`Config::load`], but an uninitialized root yields defaults.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(ReadinessError::NotInitialized) => Ok(Self::new(default_project_name(root))),
            other => other,
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn load_catalog(&self, root: &Path) -> Result<Catalog> {
        match &self.catalog {
            Some(rel) => Catalog::load(&root.join(rel)),
            None => Catalog::builtin(),
        }
    }

    pub fn bands(&self, catalog: &Catalog) -> Result<ReadinessBands> {
        ReadinessBands::for_catalog_with(catalog, self.readiness.cutoffs)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Problems worth reporting before serving. Errors make `serve` refuse
    /// to start; warnings are informational.
    pub fn validate(&self, root: &Path) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.project.name.trim().is_empty() {
            warnings.push(warning("project.name is empty"));
        }

        match self.load_catalog(root) {
            Ok(catalog) => {
                if let Err(e) = self.bands(&catalog) {
                    warnings.push(error(format!("readiness.cutoffs: {e}")));
                }
            }
            Err(e) => warnings.push(error(format!("catalog: {e}"))),
        }

        if self.server.port == 0 {
            warnings.push(warning("server.port is 0; an ephemeral port will be used"));
        }

        if let GuidanceBackend::ChatCompletions {
            base_url,
            model,
            api_key_env,
            timeout_secs,
            ..
        } = &self.guidance
        {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                warnings.push(error(format!(
                    "guidance.base_url '{base_url}' is not an http(s) URL"
                )));
            }
            if model.trim().is_empty() {
                warnings.push(error("guidance.model is empty"));
            }
            if std::env::var(api_key_env).map(|v| v.is_empty()).unwrap_or(true) {
                warnings.push(warning(format!(
                    "environment variable {api_key_env} is not set; guidance will use the rubric fallback"
                )));
            }
            if *timeout_secs == 0 || *timeout_secs > 300 {
                warnings.push(warning(format!(
                    "guidance.timeout_secs={timeout_secs} is outside 1-300"
                )));
            }
        }

        warnings
    }
}

fn default_project_name(root: &Path) -> String {
    root.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("readiness")
        .to_string()
}

fn warning(message: impl Into<String>) -> ConfigWarning {
    ConfigWarning {
        level: WarnLevel::Warning,
        message: message.into(),
    }
}

fn error(message: impl Into<String>) -> ConfigWarning {
    ConfigWarning {
        level: WarnLevel::Error,
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
