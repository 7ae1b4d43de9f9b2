//! Recommendation service access.
//!
//! The [`RecommendationService`] trait is the seam between the session and
//! the network; [`ApiClient`] is the HTTP implementation.

pub mod api;

pub use api::{ApiClient, ClientSettings};

use crate::error::ApiResult;
use crate::models::{QuestionnaireInput, Recommendation, Run, UsageEntry};
use async_trait::async_trait;

/// Operations offered by the EcoPackAI service.
#[async_trait]
pub trait RecommendationService: Send + Sync {
    /// Score materials for a questionnaire (`POST /recommend`).
    async fn recommend(&self, input: &QuestionnaireInput) -> ApiResult<Recommendation>;

    /// Past runs, oldest first (`GET /history`).
    async fn history(&self) -> ApiResult<Vec<Run>>;

    /// Drop server-side history (`POST /history/clear`).
    async fn clear_history(&self) -> ApiResult<()>;

    /// Recommendation counts per material (`GET /usage`).
    async fn usage(&self) -> ApiResult<Vec<UsageEntry>>;

    /// Service status line (`GET /`).
    async fn health(&self) -> ApiResult<String>;
}
