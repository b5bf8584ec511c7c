use crate::error::{ReadinessError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

/// Check that a submitted score is an integer in `[MIN_SCORE, MAX_SCORE]`.
pub fn validate_score(score: i64) -> Result<u8> {
    if score < MIN_SCORE as i64 || score > MAX_SCORE as i64 {
        return Err(ReadinessError::Validation(format!(
            "score must be between {MIN_SCORE} and {MAX_SCORE}, got {score}"
        )));
    }
    Ok(score as u8)
}

// ---------------------------------------------------------------------------
// BusinessProfile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub name: String,
    pub industry: String,
    pub size: String,
    pub location: String,
}

impl BusinessProfile {
    pub fn new(
        name: impl Into<String>,
        industry: impl Into<String>,
        size: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            industry: industry.into(),
            size: size.into(),
            location: location.into(),
        }
    }

    /// Trim every field; fail on the first one left empty.
    pub fn normalized(self) -> Result<Self> {
        Ok(Self {
            name: required("name", &self.name)?,
            industry: required("industry", &self.industry)?,
            size: required("size", &self.size)?,
            location: required("location", &self.location)?,
        })
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ReadinessError::Validation(format!(
            "business profile field '{field}' is required"
        )));
    }
    Ok(value.to_string())
}

// ---------------------------------------------------------------------------
// ReadinessLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessLevel {
    NotReady,
    FoundationBuilding,
    ReadyForPilots,
    AiReady,
    AiAdvanced,
}

impl ReadinessLevel {
    pub fn all() -> &'static [ReadinessLevel] {
        &[
            ReadinessLevel::NotReady,
            ReadinessLevel::FoundationBuilding,
            ReadinessLevel::ReadyForPilots,
            ReadinessLevel::AiReady,
            ReadinessLevel::AiAdvanced,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReadinessLevel::NotReady => "not_ready",
            ReadinessLevel::FoundationBuilding => "foundation_building",
            ReadinessLevel::ReadyForPilots => "ready_for_pilots",
            ReadinessLevel::AiReady => "ai_ready",
            ReadinessLevel::AiAdvanced => "ai_advanced",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReadinessLevel::NotReady => "Not Ready",
            ReadinessLevel::FoundationBuilding => "Foundation Building",
            ReadinessLevel::ReadyForPilots => "Ready for Pilots",
            ReadinessLevel::AiReady => "AI Ready",
            ReadinessLevel::AiAdvanced => "AI Advanced",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ReadinessLevel::NotReady => {
                "Significant foundational work needed before AI implementation"
            }
            ReadinessLevel::FoundationBuilding => {
                "Some readiness exists but key gaps need addressing"
            }
            ReadinessLevel::ReadyForPilots => "Good foundation for starting AI implementation",
            ReadinessLevel::AiReady => "Strong readiness for comprehensive AI implementation",
            ReadinessLevel::AiAdvanced => {
                "Excellent readiness for cutting-edge AI implementation"
            }
        }
    }

    pub fn timeline(self) -> &'static str {
        match self {
            ReadinessLevel::NotReady => "6-12 months of foundation building before AI pilots",
            ReadinessLevel::FoundationBuilding => {
                "3-6 months of capability building, then pilot projects"
            }
            ReadinessLevel::ReadyForPilots => "Ready for immediate pilot projects",
            ReadinessLevel::AiReady => "Ready for multiple AI initiatives",
            ReadinessLevel::AiAdvanced => "Ready for advanced AI implementations",
        }
    }
}

impl fmt::Display for ReadinessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReadinessLevel {
    type Err = ReadinessError;

    fn from_str(s: &str) -> Result<Self> {
        ReadinessLevel::all()
            .iter()
            .copied()
            .find(|l| l.as_str() == s || l.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| ReadinessError::Validation(format!("unknown readiness level '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// PerformanceLevel
// ---------------------------------------------------------------------------

/// Per-section label derived from the section percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceLevel {
    Excellent,
    Good,
    AboveAverage,
    Average,
    BelowAverage,
    NeedsImprovement,
}

impl PerformanceLevel {
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= 90.0 {
            PerformanceLevel::Excellent
        } else if pct >= 80.0 {
            PerformanceLevel::Good
        } else if pct >= 70.0 {
            PerformanceLevel::AboveAverage
        } else if pct >= 60.0 {
            PerformanceLevel::Average
        } else if pct >= 50.0 {
            PerformanceLevel::BelowAverage
        } else {
            PerformanceLevel::NeedsImprovement
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PerformanceLevel::Excellent => "Excellent",
            PerformanceLevel::Good => "Good",
            PerformanceLevel::AboveAverage => "Above Average",
            PerformanceLevel::Average => "Average",
            PerformanceLevel::BelowAverage => "Below Average",
            PerformanceLevel::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_in_range_pass() {
        for s in 1..=5 {
            assert_eq!(validate_score(s).unwrap(), s as u8);
        }
    }

    #[test]
    fn scores_out_of_range_fail() {
        for s in [0, 6, 7, -1, i64::MAX] {
            assert!(matches!(
                validate_score(s),
                Err(ReadinessError::Validation(_))
            ));
        }
    }

    #[test]
    fn profile_is_trimmed() {
        let p = BusinessProfile::new("  Acme ", "Retail\n", " 10-50", "Nairobi ")
            .normalized()
            .unwrap();
        assert_eq!(p, BusinessProfile::new("Acme", "Retail", "10-50", "Nairobi"));
    }

    #[test]
    fn blank_profile_field_names_the_field() {
        let err = BusinessProfile::new("Acme", "Retail", "   ", "Nairobi")
            .normalized()
            .unwrap_err();
        assert!(err.to_string().contains("'size'"));
    }

    #[test]
    fn readiness_levels_are_ordered() {
        let levels = ReadinessLevel::all();
        assert!(levels.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(levels.len(), 5);
    }

    #[test]
    fn readiness_level_parses_label_and_key() {
        assert_eq!(
            "ready_for_pilots".parse::<ReadinessLevel>().unwrap(),
            ReadinessLevel::ReadyForPilots
        );
        assert_eq!(
            "AI Ready".parse::<ReadinessLevel>().unwrap(),
            ReadinessLevel::AiReady
        );
        assert!("expert".parse::<ReadinessLevel>().is_err());
    }

    #[test]
    fn readiness_level_serializes_snake_case() {
        let json = serde_json::to_string(&ReadinessLevel::AiAdvanced).unwrap();
        assert_eq!(json, "\"ai_advanced\"");
    }

    #[test]
    fn performance_thresholds() {
        assert_eq!(PerformanceLevel::from_percentage(100.0), PerformanceLevel::Excellent);
        assert_eq!(PerformanceLevel::from_percentage(80.0), PerformanceLevel::Good);
        assert_eq!(PerformanceLevel::from_percentage(75.0), PerformanceLevel::AboveAverage);
        assert_eq!(PerformanceLevel::from_percentage(60.0), PerformanceLevel::Average);
        assert_eq!(PerformanceLevel::from_percentage(50.0), PerformanceLevel::BelowAverage);
        assert_eq!(PerformanceLevel::from_percentage(20.0), PerformanceLevel::NeedsImprovement);
    }
}
