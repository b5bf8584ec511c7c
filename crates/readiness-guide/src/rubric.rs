use crate::provider::GuidanceProvider;
use crate::types::{Guidance, GuidanceRequest};
use crate::Result;
use async_trait::async_trait;

/// Offline provider: turns the question's own rubric into an explanation.
/// Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct RubricProvider;

impl RubricProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, request: &GuidanceRequest) -> Guidance {
        let mut explanation = String::new();
        match &request.description {
            Some(topic) => explanation.push_str(&format!(
                "This question in {} looks at {}: {}",
                request.section_name, topic, request.prompt
            )),
            None => explanation.push_str(&format!(
                "This question in {} asks: {}",
                request.section_name, request.prompt
            )),
        }
        explanation.push_str("\n\nPick the score whose description best matches where you are today:");
        for (score, text) in &request.rubric {
            explanation.push_str(&format!("\n{score}: {text}"));
        }

        Guidance {
            question_id: request.question_id.clone(),
            explanation,
            scoring_guidance: request.rubric.clone(),
            tips: tips_for(request),
            provider: self.name().to_string(),
            llm_powered: false,
        }
    }
}

#[async_trait]
impl GuidanceProvider for RubricProvider {
    fn name(&self) -> &'static str {
        "rubric"
    }

    async fn explain(&self, request: &GuidanceRequest) -> Result<Guidance> {
        Ok(self.render(request))
    }
}

fn tips_for(request: &GuidanceRequest) -> Vec<String> {
    let mut tips = vec![
        "Score what is in place today, not what is planned".to_string(),
        "If you sit between two levels, choose the lower one".to_string(),
    ];
    if let Some(business) = &request.business {
        tips.push(format!(
            "Compare against other {} businesses of {} staff",
            business.industry, business.size
        ));
    }
    tips
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tests::sample_request;

    #[tokio::test]
    async fn renders_every_rubric_level() {
        let req = sample_request();
        let g = RubricProvider::new().explain(&req).await.unwrap();
        assert_eq!(g.question_id, "1.2");
        assert!(!g.llm_powered);
        assert_eq!(g.provider, "rubric");
        assert_eq!(g.scoring_guidance, req.rubric);
        for score in 1..=5 {
            assert!(g.explanation.contains(&format!("{score}: rubric level {score}")));
        }
        assert!(g.explanation.contains("Data Quality"));
    }

    #[test]
    fn business_context_adds_a_tip() {
        let mut req = sample_request();
        let with = RubricProvider.render(&req).tips.len();
        req.business = None;
        let without = RubricProvider.render(&req).tips.len();
        assert_eq!(with, without + 1);
    }
}
