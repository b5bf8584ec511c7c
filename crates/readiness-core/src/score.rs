use crate::catalog::Catalog;
use crate::error::{ReadinessError, Result};
use crate::session::{round1, AssessmentSession};
use crate::types::{PerformanceLevel, ReadinessLevel, MAX_SCORE};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ReadinessBands
// ---------------------------------------------------------------------------

/// Achievable range of the built-in catalog (21 questions, 1-5 each).
pub const REFERENCE_MIN: u32 = 21;
pub const REFERENCE_MAX: u32 = 105;
/// Inclusive lower bounds of Foundation Building, Ready for Pilots, AI Ready
/// and AI Advanced over the reference range.
pub const REFERENCE_CUTOFFS: [u32; 4] = [41, 61, 76, 86];

/// One contiguous score range mapped to a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub level: ReadinessLevel,
    /// Inclusive.
    pub lower: u32,
    /// Exclusive.
    pub upper: u32,
}

/// Five ordered bands partitioning `[min, max]` with no gap or overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessBands {
    min: u32,
    max: u32,
    cutoffs: [u32; 4],
}

impl ReadinessBands {
    /// Explicit cutoffs; they must satisfy `min < c1 < c2 < c3 < c4 <= max`.
    pub fn new(min: u32, max: u32, cutoffs: [u32; 4]) -> Result<Self> {
        let mut lower = min;
        for c in cutoffs {
            if c <= lower {
                return Err(ReadinessError::Validation(format!(
                    "readiness cutoffs {cutoffs:?} must be strictly increasing and above {min}"
                )));
            }
            lower = c;
        }
        if cutoffs[3] > max {
            return Err(ReadinessError::Validation(format!(
                "readiness cutoff {} exceeds the maximum achievable total {max}",
                cutoffs[3]
            )));
        }
        Ok(Self { min, max, cutoffs })
    }

    /// Rescale the reference cutoffs linearly onto `[min, max]`.
    pub fn rescaled(min: u32, max: u32) -> Result<Self> {
        if max < min || max - min + 1 < 5 {
            return Err(ReadinessError::InvalidCatalog(format!(
                "achievable score range {min}-{max} is too narrow for five readiness levels"
            )));
        }
        let span = (max - min) as u64;
        let ref_span = (REFERENCE_MAX - REFERENCE_MIN) as u64;

        let mut cutoffs = REFERENCE_CUTOFFS.map(|c| {
            let offset = ((c - REFERENCE_MIN) as u64 * span + ref_span / 2) / ref_span;
            min + offset as u32
        });
        // Rounding can collapse neighbours on small ranges; push them apart
        // upward first, then pull back under `max`.
        for i in 0..4 {
            let floor = if i == 0 { min + 1 } else { cutoffs[i - 1] + 1 };
            cutoffs[i] = cutoffs[i].max(floor);
        }
        for i in (0..4).rev() {
            let ceiling = if i == 3 { max } else { cutoffs[i + 1] - 1 };
            cutoffs[i] = cutoffs[i].min(ceiling);
        }
        Self::new(min, max, cutoffs)
    }

    pub fn for_catalog(catalog: &Catalog) -> Result<Self> {
        Self::rescaled(catalog.min_total(), catalog.max_total())
    }

    /// Configured cutoffs when present, otherwise the rescaled reference ones.
    pub fn for_catalog_with(catalog: &Catalog, cutoffs: Option<[u32; 4]>) -> Result<Self> {
        match cutoffs {
            Some(c) => Self::new(catalog.min_total(), catalog.max_total(), c),
            None => Self::for_catalog(catalog),
        }
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn cutoffs(&self) -> [u32; 4] {
        self.cutoffs
    }

    pub fn bands(&self) -> Vec<Band> {
        let mut bounds = vec![self.min];
        bounds.extend(self.cutoffs);
        bounds.push(self.max + 1);
        ReadinessLevel::all()
            .iter()
            .zip(bounds.windows(2))
            .map(|(&level, w)| Band {
                level,
                lower: w[0],
                upper: w[1],
            })
            .collect()
    }

    pub fn band_for(&self, level: ReadinessLevel) -> Band {
        let idx = ReadinessLevel::all()
            .iter()
            .position(|&l| l == level)
            .unwrap_or_default();
        self.bands()[idx]
    }

    /// Pure function of the total.
    pub fn classify(&self, total: u32) -> Result<ReadinessLevel> {
        if total < self.min || total > self.max {
            return Err(ReadinessError::Validation(format!(
                "total {total} is outside the achievable range {}-{}",
                self.min, self.max
            )));
        }
        let idx = self.cutoffs.iter().filter(|&&c| c <= total).count();
        Ok(ReadinessLevel::all()[idx])
    }
}

// ---------------------------------------------------------------------------
// Summary types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionScore {
    pub section_id: String,
    pub name: String,
    pub answered: usize,
    pub question_count: usize,
    pub subtotal: u32,
    pub max_points: u32,
    pub percentage: f64,
    pub performance: PerformanceLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    Strength,
    Critical,
    Moderate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub question_id: String,
    pub section_id: String,
    pub description: String,
    pub score: u8,
    pub kind: FindingKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadinessResult {
    pub level: ReadinessLevel,
    pub label: &'static str,
    pub description: &'static str,
    pub timeline: &'static str,
    pub total: u32,
    pub band: Band,
}

impl ReadinessResult {
    pub fn new(level: ReadinessLevel, total: u32, bands: &ReadinessBands) -> Self {
        Self {
            level,
            label: level.label(),
            description: level.description(),
            timeline: level.timeline(),
            total,
            band: bands.band_for(level),
        }
    }
}

/// Everything derivable from a session's answers. Readiness is present only
/// for complete sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub assessment_id: String,
    pub sections: Vec<SectionScore>,
    pub total: u32,
    pub min_total: u32,
    pub max_total: u32,
    pub answered: usize,
    pub total_questions: usize,
    pub completion_percentage: f64,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readiness: Option<ReadinessResult>,
    pub strengths: Vec<Finding>,
    pub improvement_areas: Vec<Finding>,
}

impl ScoreSummary {
    pub fn compute(
        session: &AssessmentSession,
        catalog: &Catalog,
        bands: &ReadinessBands,
    ) -> Result<Self> {
        let sections = catalog
            .sections()
            .iter()
            .map(|section| {
                let questions = catalog.section_questions(section);
                let answered = questions
                    .iter()
                    .filter(|q| session.answers().contains_key(&q.id))
                    .count();
                let subtotal = session.section_subtotal(catalog, section);
                let max_points = section.max_points();
                let percentage = if max_points == 0 {
                    0.0
                } else {
                    round1(subtotal as f64 / max_points as f64 * 100.0)
                };
                SectionScore {
                    section_id: section.id.clone(),
                    name: section.name.clone(),
                    answered,
                    question_count: questions.len(),
                    subtotal,
                    max_points,
                    percentage,
                    performance: PerformanceLevel::from_percentage(percentage),
                }
            })
            .collect();

        let mut strengths = Vec::new();
        let mut improvement_areas = Vec::new();
        // Catalog order, not answer-map order.
        for q in catalog.questions() {
            let Some(&score) = session.answers().get(&q.id) else {
                continue;
            };
            let kind = match score {
                s if s >= MAX_SCORE - 1 => FindingKind::Strength,
                3 => FindingKind::Moderate,
                _ => FindingKind::Critical,
            };
            let finding = Finding {
                question_id: q.id.clone(),
                section_id: q.section_id.clone(),
                description: q.description.clone().unwrap_or_else(|| q.prompt.clone()),
                score,
                kind,
            };
            if kind == FindingKind::Strength {
                strengths.push(finding);
            } else {
                improvement_areas.push(finding);
            }
        }

        let total = session.total_score();
        let readiness = if session.is_complete() {
            let level = session.readiness_level(bands)?;
            Some(ReadinessResult::new(level, total, bands))
        } else {
            None
        };

        Ok(Self {
            assessment_id: session.id().to_string(),
            sections,
            total,
            min_total: catalog.min_total(),
            max_total: catalog.max_total(),
            answered: session.answered_count(),
            total_questions: catalog.len(),
            completion_percentage: session.completion_percentage(catalog),
            complete: session.is_complete(),
            readiness,
            strengths,
            improvement_areas,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::two_by_one;
    use crate::types::BusinessProfile;

    fn builtin_bands() -> ReadinessBands {
        ReadinessBands::for_catalog(&Catalog::builtin().unwrap()).unwrap()
    }

    fn assert_partition(bands: &ReadinessBands) {
        let parts = bands.bands();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0].lower, bands.min());
        assert_eq!(parts[4].upper, bands.max() + 1);
        for w in parts.windows(2) {
            assert_eq!(w[0].upper, w[1].lower, "gap or overlap in {parts:?}");
        }
        for b in &parts {
            assert!(b.lower < b.upper, "empty band {b:?}");
        }
        for total in bands.min()..=bands.max() {
            let level = bands.classify(total).unwrap();
            let owning: Vec<_> = parts
                .iter()
                .filter(|b| b.lower <= total && total < b.upper)
                .collect();
            assert_eq!(owning.len(), 1);
            assert_eq!(owning[0].level, level);
        }
    }

    #[test]
    fn builtin_cutoffs_match_reference() {
        assert_eq!(builtin_bands().cutoffs(), REFERENCE_CUTOFFS);
    }

    #[test]
    fn builtin_classification_edges() {
        let b = builtin_bands();
        assert_eq!(b.classify(21).unwrap(), ReadinessLevel::NotReady);
        assert_eq!(b.classify(40).unwrap(), ReadinessLevel::NotReady);
        assert_eq!(b.classify(41).unwrap(), ReadinessLevel::FoundationBuilding);
        assert_eq!(b.classify(60).unwrap(), ReadinessLevel::FoundationBuilding);
        assert_eq!(b.classify(61).unwrap(), ReadinessLevel::ReadyForPilots);
        assert_eq!(b.classify(75).unwrap(), ReadinessLevel::ReadyForPilots);
        assert_eq!(b.classify(76).unwrap(), ReadinessLevel::AiReady);
        assert_eq!(b.classify(85).unwrap(), ReadinessLevel::AiReady);
        assert_eq!(b.classify(86).unwrap(), ReadinessLevel::AiAdvanced);
        assert_eq!(b.classify(105).unwrap(), ReadinessLevel::AiAdvanced);
    }

    #[test]
    fn totals_outside_range_are_rejected() {
        let b = builtin_bands();
        assert!(b.classify(20).is_err());
        assert!(b.classify(106).is_err());
    }

    #[test]
    fn builtin_bands_partition_range() {
        assert_partition(&builtin_bands());
    }

    #[test]
    fn rescaled_bands_partition_every_small_range() {
        for questions in 1..=30u32 {
            let bands = ReadinessBands::rescaled(questions, questions * 5).unwrap();
            assert_partition(&bands);
        }
    }

    #[test]
    fn two_question_catalog_bands() {
        let bands = ReadinessBands::for_catalog(&two_by_one()).unwrap();
        assert_eq!(bands.min(), 2);
        assert_eq!(bands.max(), 10);
        assert_eq!(bands.classify(9).unwrap(), ReadinessLevel::AiAdvanced);
        assert_eq!(bands.classify(2).unwrap(), ReadinessLevel::NotReady);
    }

    #[test]
    fn too_narrow_range_is_rejected() {
        assert!(matches!(
            ReadinessBands::rescaled(3, 6),
            Err(ReadinessError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn explicit_cutoffs_are_validated() {
        assert!(ReadinessBands::new(21, 105, [41, 61, 76, 86]).is_ok());
        assert!(ReadinessBands::new(21, 105, [21, 61, 76, 86]).is_err());
        assert!(ReadinessBands::new(21, 105, [41, 41, 76, 86]).is_err());
        assert!(ReadinessBands::new(21, 105, [41, 61, 76, 106]).is_err());
    }

    #[test]
    fn summary_for_partial_session() {
        let catalog = Catalog::builtin().unwrap();
        let bands = ReadinessBands::for_catalog(&catalog).unwrap();
        let mut s =
            AssessmentSession::start(BusinessProfile::new("Acme", "Retail", "5", "Kisumu"))
                .unwrap();
        for (q, score) in catalog.questions()[..6].iter().zip([5, 4, 3, 2, 1, 5]) {
            s.submit_answer(&catalog, &q.id, score).unwrap();
        }
        let summary = ScoreSummary::compute(&s, &catalog, &bands).unwrap();

        assert_eq!(summary.total, 20);
        assert_eq!(summary.answered, 6);
        assert!(!summary.complete);
        assert!(summary.readiness.is_none());
        assert_eq!(summary.sections[0].subtotal, 20);
        assert_eq!(summary.sections[0].max_points, 30);
        assert_eq!(summary.sections[0].percentage, 66.7);
        assert_eq!(summary.sections[0].performance, PerformanceLevel::Average);
        assert_eq!(summary.sections[1].answered, 0);
        assert_eq!(summary.completion_percentage, 28.6);

        assert_eq!(summary.strengths.len(), 3);
        assert_eq!(summary.strengths[0].question_id, "data_collection_processes");
        let kinds: Vec<FindingKind> = summary.improvement_areas.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![FindingKind::Moderate, FindingKind::Critical, FindingKind::Critical]
        );
    }

    #[test]
    fn summary_for_complete_session_carries_readiness() {
        let catalog = two_by_one();
        let bands = ReadinessBands::for_catalog(&catalog).unwrap();
        let mut s =
            AssessmentSession::start(BusinessProfile::new("Acme", "Retail", "5", "Kisumu"))
                .unwrap();
        s.submit_answer(&catalog, "Q1", 4).unwrap();
        s.submit_answer(&catalog, "Q2", 5).unwrap();
        let summary = ScoreSummary::compute(&s, &catalog, &bands).unwrap();
        let readiness = summary.readiness.unwrap();
        assert_eq!(summary.total, 9);
        assert_eq!(readiness.total, 9);
        assert_eq!(readiness.level, ReadinessLevel::AiAdvanced);
        assert!(readiness.band.lower <= 9 && 9 < readiness.band.upper);
    }
}
