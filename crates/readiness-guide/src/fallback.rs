use crate::provider::GuidanceProvider;
use crate::rubric::RubricProvider;
use crate::types::{Guidance, GuidanceRequest};
use crate::Result;
use async_trait::async_trait;

/// Tries `primary`; on any error logs a warning and answers from the rubric.
pub struct FallbackProvider {
    primary: Box<dyn GuidanceProvider>,
    fallback: RubricProvider,
}

impl FallbackProvider {
    pub fn new(primary: Box<dyn GuidanceProvider>) -> Self {
        Self {
            primary,
            fallback: RubricProvider::new(),
        }
    }
}

#[async_trait]
impl GuidanceProvider for FallbackProvider {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    async fn explain(&self, request: &GuidanceRequest) -> Result<Guidance> {
        match self.primary.explain(request).await {
            Ok(guidance) => Ok(guidance),
            Err(e) => {
                tracing::warn!(
                    provider = self.primary.name(),
                    question_id = %request.question_id,
                    error = %e,
                    "guidance provider failed, using rubric fallback"
                );
                self.fallback.explain(request).await
            }
        }
    }
}
