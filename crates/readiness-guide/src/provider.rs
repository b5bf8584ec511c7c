use crate::types::{Guidance, GuidanceRequest};
use crate::Result;
use async_trait::async_trait;

/// Produces an explanation for one question.
#[async_trait]
pub trait GuidanceProvider: Send + Sync {
    /// Short identifier reported in [`Guidance::provider`] and logs.
    fn name(&self) -> &'static str;

    async fn explain(&self, request: &GuidanceRequest) -> Result<Guidance>;
}
