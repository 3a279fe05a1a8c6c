use crate::candidate::NameCandidate;
use crate::error::Result;
use crate::feedback::Feedback;
use crate::session::RefinementSession;
use crate::validation::{DomainStatus, TrademarkReport};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything a generator needs to produce one round.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub brief: String,
    /// 1-based round number being generated.
    pub round: usize,
    /// Full history, oldest first.
    pub feedback_history: Vec<Feedback>,
    /// Names already carried into this round; generators should not repeat them.
    pub carry_over: Vec<String>,
    pub requested_count: usize,
}

#[async_trait]
pub trait NameGenerator: Send + Sync {
    fn name(&self) -> &str;
    async fn generate(&self, request: GenerationRequest) -> Result<Vec<NameCandidate>>;
}

/// A presented round, as shown to whoever gives feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundView {
    pub round: usize,
    pub iteration: usize,
    pub max_iterations: usize,
    pub fallback_count: usize,
    pub candidates: Vec<NameCandidate>,
}

impl RoundView {
    pub fn of(session: &RefinementSession) -> Option<Self> {
        Some(Self {
            round: session.rounds().len(),
            iteration: session.iteration(),
            max_iterations: session.max_iterations(),
            fallback_count: session.fallback_count(),
            candidates: session.latest_round()?.to_vec(),
        })
    }

    pub fn remaining_iterations(&self) -> usize {
        self.max_iterations.saturating_sub(self.iteration)
    }
}

#[async_trait]
pub trait FeedbackCollector: Send + Sync {
    async fn collect(&self, view: &RoundView) -> Result<Feedback>;
}

#[async_trait]
pub trait DomainChecker: Send + Sync {
    /// Availability per TLD. `Unknown` is a valid answer and is never
    /// replaced by a guess.
    async fn check_domains(&self, name: &str, tlds: &[String])
    -> Result<BTreeMap<String, DomainStatus>>;
}

#[async_trait]
pub trait TrademarkChecker: Send + Sync {
    async fn check_trademark(&self, name: &str) -> Result<TrademarkReport>;
}

#[async_trait]
pub trait SeoScorer: Send + Sync {
    /// Score in `[0, 100]`.
    async fn score_seo(&self, name: &str, tagline: &str) -> Result<f64>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub brief: String,
    pub iteration: usize,
    pub rounds: usize,
    pub complete: bool,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&RefinementSession> for SessionSummary {
    fn from(session: &RefinementSession) -> Self {
        Self {
            id: session.id().to_string(),
            brief: session.brief().to_string(),
            iteration: session.iteration(),
            rounds: session.rounds().len(),
            complete: session.is_complete(),
            updated_at: session.updated_at(),
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, session: &RefinementSession) -> Result<()>;
    /// Fails with `SessionNotFound` for an unknown id.
    async fn load(&self, id: &str) -> Result<RefinementSession>;
    /// Most recently updated first.
    async fn list(&self) -> Result<Vec<SessionSummary>>;
    async fn delete(&self, id: &str) -> Result<()>;
}
