use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Profile of the business taking the assessment, passed through as prompt
/// context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessContext {
    pub name: String,
    pub industry: String,
    pub size: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidanceRequest {
    pub question_id: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub section_name: String,
    pub rubric: BTreeMap<u8, String>,
    /// What the user typed into the help panel, if anything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business: Option<BusinessContext>,
}

impl GuidanceRequest {
    /// Trimmed user message; `None` when blank.
    pub fn user_message(&self) -> Option<&str> {
        self.user_message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guidance {
    pub question_id: String,
    pub explanation: String,
    pub scoring_guidance: BTreeMap<u8, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tips: Vec<String>,
    /// Name of the provider that produced the text.
    pub provider: String,
    pub llm_powered: bool,
}
