use crate::error::{ReadinessError, Result};
use crate::types::{MAX_SCORE, MIN_SCORE};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../content/catalog.yaml");

// ---------------------------------------------------------------------------
// Definitions (input format)
// ---------------------------------------------------------------------------

/// On-disk shape of a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDef {
    pub sections: Vec<SectionDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionDef {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<QuestionDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDef {
    pub id: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub rubric: BTreeMap<u8, String>,
}

// ---------------------------------------------------------------------------
// Question / Section
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: String,
    pub section_id: String,
    pub section_name: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Score (1-5) to rubric text.
    pub rubric: BTreeMap<u8, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Flattened positions owned by this section.
    #[serde(skip)]
    range: Range<usize>,
}

impl Section {
    pub fn question_count(&self) -> usize {
        self.range.len()
    }

    pub fn first_position(&self) -> usize {
        self.range.start
    }

    pub fn max_points(&self) -> u32 {
        self.question_count() as u32 * MAX_SCORE as u32
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Read-only question catalog: sections in fixed order, questions flattened
/// into one linear sequence.
#[derive(Debug, Clone)]
pub struct Catalog {
    sections: Vec<Section>,
    questions: Vec<Question>,
    positions: HashMap<String, usize>,
    section_of: Vec<usize>,
}

impl Catalog {
    /// Build and validate a catalog from section definitions.
    pub fn new(defs: Vec<SectionDef>) -> Result<Self> {
        if defs.is_empty() {
            return Err(invalid("catalog has no sections"));
        }

        let mut sections = Vec::with_capacity(defs.len());
        let mut questions = Vec::new();
        let mut positions = HashMap::new();
        let mut section_of = Vec::new();
        let mut section_ids = std::collections::HashSet::new();

        for (section_idx, def) in defs.into_iter().enumerate() {
            let section_id = def.id.trim().to_string();
            let section_name = def.name.trim().to_string();
            if section_id.is_empty() || section_name.is_empty() {
                return Err(invalid(format!(
                    "section #{} needs a non-empty id and name",
                    section_idx + 1
                )));
            }
            if !section_ids.insert(section_id.clone()) {
                return Err(invalid(format!("duplicate section id '{section_id}'")));
            }
            if def.questions.is_empty() {
                return Err(invalid(format!("section '{section_id}' has no questions")));
            }

            let start = questions.len();
            for q in def.questions {
                let id = q.id.trim().to_string();
                if id.is_empty() {
                    return Err(invalid(format!(
                        "section '{section_id}' has a question with an empty id"
                    )));
                }
                if q.prompt.trim().is_empty() {
                    return Err(invalid(format!("question '{id}' has an empty prompt")));
                }
                check_rubric(&id, &q.rubric)?;
                if positions.insert(id.clone(), questions.len()).is_some() {
                    return Err(invalid(format!("duplicate question id '{id}'")));
                }
                section_of.push(section_idx);
                questions.push(Question {
                    id,
                    section_id: section_id.clone(),
                    section_name: section_name.clone(),
                    prompt: q.prompt,
                    description: q.description,
                    rubric: q.rubric,
                });
            }

            sections.push(Section {
                id: section_id,
                name: section_name,
                description: def.description,
                range: start..questions.len(),
            });
        }

        Ok(Self {
            sections,
            questions,
            positions,
            section_of,
        })
    }

    /// The six-section, 21-question catalog shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let def: CatalogDef = serde_yaml::from_str(yaml)?;
        Self::new(def.sections)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&data)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Number of questions in the flattened sequence.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always false for a validated catalog.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn question_at(&self, position: usize) -> Option<&Question> {
        self.questions.get(position)
    }

    pub fn position_of(&self, question_id: &str) -> Option<usize> {
        self.positions.get(question_id).copied()
    }

    pub fn question(&self, question_id: &str) -> Option<&Question> {
        self.position_of(question_id).map(|p| &self.questions[p])
    }

    /// Index into [`Catalog::sections`] of the section owning `position`.
    pub fn section_index_at(&self, position: usize) -> Option<usize> {
        self.section_of.get(position).copied()
    }

    pub fn section_questions(&self, section: &Section) -> &[Question] {
        &self.questions[section.range.clone()]
    }

    /// Lowest achievable total: every question answered with the minimum score.
    pub fn min_total(&self) -> u32 {
        self.len() as u32 * MIN_SCORE as u32
    }

    /// Highest achievable total: every question answered with the maximum score.
    pub fn max_total(&self) -> u32 {
        self.len() as u32 * MAX_SCORE as u32
    }
}

fn check_rubric(question_id: &str, rubric: &BTreeMap<u8, String>) -> Result<()> {
    let expected: Vec<u8> = (MIN_SCORE..=MAX_SCORE).collect();
    let keys: Vec<u8> = rubric.keys().copied().collect();
    if keys != expected {
        return Err(invalid(format!(
            "question '{question_id}' rubric must have exactly the scores {MIN_SCORE}-{MAX_SCORE}, got {keys:?}"
        )));
    }
    if let Some((score, _)) = rubric.iter().find(|(_, text)| text.trim().is_empty()) {
        return Err(invalid(format!(
            "question '{question_id}' rubric text for score {score} is empty"
        )));
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> ReadinessError {
    ReadinessError::InvalidCatalog(msg.into())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
