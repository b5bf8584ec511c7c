use crate::catalog::{Catalog, Section};
use crate::error::{ReadinessError, Result};
use crate::score::ReadinessBands;
use crate::types::{validate_score, BusinessProfile, ReadinessLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Read models
// ---------------------------------------------------------------------------

/// The question at the cursor, with enough section context to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub question_id: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub rubric: BTreeMap<u8, String>,
    pub section_id: String,
    pub section_name: String,
    /// Zero-based index of the section in catalog order.
    pub section_index: usize,
    pub section_count: usize,
    /// One-based position of the question within its section.
    pub position_in_section: usize,
    pub section_question_count: usize,
    pub cursor: usize,
    pub total_questions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NextQuestion {
    Question(QuestionView),
    Complete { total_questions: usize },
}

impl NextQuestion {
    pub fn is_complete(&self) -> bool {
        matches!(self, NextQuestion::Complete { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub question_id: String,
    pub score: u8,
    pub cursor: usize,
    pub complete: bool,
}

// ---------------------------------------------------------------------------
// AssessmentSession
// ---------------------------------------------------------------------------

/// One business's run through the catalog.
///
/// Two states: in progress (`cursor < catalog.len()`) and complete
/// (`cursor == catalog.len()`). The only transition is
/// [`AssessmentSession::submit_answer`], which moves the cursor forward by
/// exactly one. `answers` always holds exactly the ids at flattened
/// positions `[0, cursor)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentSession {
    id: String,
    profile: BusinessProfile,
    cursor: usize,
    answers: BTreeMap<String, u8>,
    completed: bool,
    /// Bumps on every mutation; the repository rejects saves that skip one.
    #[serde(default)]
    version: u64,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

impl AssessmentSession {
    /// Begin a new session with a fresh UUID and a trimmed profile.
    pub fn start(profile: BusinessProfile) -> Result<Self> {
        let profile = profile.normalized()?;
        let now = Utc::now();
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            profile,
            cursor: 0,
            answers: BTreeMap::new(),
            completed: false,
            version: 0,
            started_at: now,
            updated_at: now,
            completed_at: None,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn profile(&self) -> &BusinessProfile {
        &self.profile
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn answers(&self) -> &BTreeMap<String, u8> {
        &self.answers
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// The question at the cursor, or the completion signal. Pure read.
    pub fn next_question(&self, catalog: &Catalog) -> NextQuestion {
        let Some(question) = catalog.question_at(self.cursor) else {
            return NextQuestion::Complete {
                total_questions: catalog.len(),
            };
        };
        let section_index = catalog.section_index_at(self.cursor).unwrap_or_default();
        let section = &catalog.sections()[section_index];

        NextQuestion::Question(QuestionView {
            question_id: question.id.clone(),
            prompt: question.prompt.clone(),
            description: question.description.clone(),
            rubric: question.rubric.clone(),
            section_id: section.id.clone(),
            section_name: section.name.clone(),
            section_index,
            section_count: catalog.sections().len(),
            position_in_section: self.cursor - section.first_position() + 1,
            section_question_count: section.question_count(),
            cursor: self.cursor,
            total_questions: catalog.len(),
        })
    }

    /// Set the completion flag if the cursor has reached the end and the flag
    /// is not yet set. Returns true when the flag changed.
    pub fn mark_complete_if_exhausted(&mut self, catalog: &Catalog) -> bool {
        if self.completed || self.cursor < catalog.len() {
            return false;
        }
        let now = Utc::now();
        self.completed = true;
        self.completed_at = Some(now);
        self.version += 1;
        self.updated_at = now;
        true
    }

    /// Record `score` for the question at the cursor and advance.
    ///
    /// Nothing is mutated unless every check passes: the score must be in
    /// range, and `question_id` must be the question at the cursor.
    pub fn submit_answer(
        &mut self,
        catalog: &Catalog,
        question_id: &str,
        score: i64,
    ) -> Result<SubmitOutcome> {
        let score = validate_score(score)?;

        let Some(current) = catalog.question_at(self.cursor) else {
            return Err(ReadinessError::Conflict(format!(
                "assessment {} is already complete",
                self.id
            )));
        };
        if current.id != question_id {
            return Err(ReadinessError::Conflict(format!(
                "question '{question_id}' is not the current question; expected '{}'",
                current.id
            )));
        }

        let now = Utc::now();
        self.answers.insert(current.id.clone(), score);
        self.cursor += 1;
        self.version += 1;
        self.updated_at = now;
        if self.cursor == catalog.len() {
            self.completed = true;
            self.completed_at = Some(now);
        }

        Ok(SubmitOutcome {
            question_id: question_id.to_string(),
            score,
            cursor: self.cursor,
            complete: self.completed,
        })
    }

    /// Readiness classification of the total score. Only defined once the
    /// session is complete.
    pub fn readiness_level(&self, bands: &ReadinessBands) -> Result<ReadinessLevel> {
        if !self.completed {
            return Err(ReadinessError::Conflict(format!(
                "assessment {} is not complete ({} answered)",
                self.id,
                self.answers.len()
            )));
        }
        bands.classify(self.total_score())
    }

    // -----------------------------------------------------------------------
    // Derived values
    // -----------------------------------------------------------------------

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn total_score(&self) -> u32 {
        self.answers.values().map(|&s| s as u32).sum()
    }

    pub fn section_subtotal(&self, catalog: &Catalog, section: &Section) -> u32 {
        catalog
            .section_questions(section)
            .iter()
            .filter_map(|q| self.answers.get(&q.id))
            .map(|&s| s as u32)
            .sum()
    }

    /// Answered share of the catalog, 0.0 to 100.0.
    pub fn completion_percentage(&self, catalog: &Catalog) -> f64 {
        if catalog.is_empty() {
            return 0.0;
        }
        round1(self.answered_count() as f64 / catalog.len() as f64 * 100.0)
    }

    /// Index of the section holding the current question; `None` once complete.
    pub fn current_section_index(&self, catalog: &Catalog) -> Option<usize> {
        catalog.section_index_at(self.cursor)
    }

    // -----------------------------------------------------------------------
    // Integrity
    // -----------------------------------------------------------------------

    /// Check a loaded record against the catalog it will be served with.
    pub fn check_against(&self, catalog: &Catalog) -> Result<()> {
        if self.cursor > catalog.len() {
            return Err(mismatch(
                &self.id,
                format!("cursor {} is past the end ({})", self.cursor, catalog.len()),
            ));
        }
        if self.answers.len() != self.cursor {
            return Err(mismatch(
                &self.id,
                format!(
                    "{} answers recorded for cursor {}",
                    self.answers.len(),
                    self.cursor
                ),
            ));
        }
        for q in &catalog.questions()[..self.cursor] {
            match self.answers.get(&q.id) {
                Some(&s) if validate_score(s as i64).is_ok() => {}
                Some(&s) => {
                    return Err(mismatch(&self.id, format!("score {s} for '{}'", q.id)));
                }
                None => {
                    return Err(mismatch(&self.id, format!("missing answer for '{}'", q.id)));
                }
            }
        }
        if self.completed && self.cursor < catalog.len() {
            return Err(mismatch(&self.id, "marked complete before the last question"));
        }
        Ok(())
    }
}

fn mismatch(id: &str, detail: impl std::fmt::Display) -> ReadinessError {
    ReadinessError::InvalidCatalog(format!("session {id} does not match the catalog: {detail}"))
}

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
