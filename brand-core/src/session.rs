use crate::candidate::{NameCandidate, name_key};
use crate::error::{BrandError, Result};
use crate::feedback::Feedback;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_MAX_ITERATIONS: usize = 3;
pub const DEFAULT_FALLBACK_COUNT: usize = 10;
pub const DEFAULT_CANDIDATES_PER_ROUND: usize = 20;

fn default_candidates_per_round() -> usize {
    DEFAULT_CANDIDATES_PER_ROUND
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    Approved,
    IterationCapReached,
}

/// State of one naming session.
///
/// Fields are read through accessors. The `record_*`, `approve` and
/// `force_approve` methods are the only mutators and each one preserves
/// `rounds.len() == feedback_history.len() + 1` at every point where a round
/// awaits feedback or the session is complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementSession {
    id: String,
    brief: String,
    iteration: usize,
    max_iterations: usize,
    fallback_count: usize,
    #[serde(default = "default_candidates_per_round")]
    candidates_per_round: usize,
    rounds: Vec<Vec<NameCandidate>>,
    feedback_history: Vec<Feedback>,
    approved_names: Option<Vec<String>>,
    #[serde(default)]
    completion: Option<Completion>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RefinementSession {
    pub fn new(brief: impl Into<String>, max_iterations: usize, fallback_count: usize) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            brief: brief.into(),
            iteration: 0,
            max_iterations: max_iterations.max(1),
            fallback_count: fallback_count.max(1),
            candidates_per_round: DEFAULT_CANDIDATES_PER_ROUND,
            rounds: Vec::new(),
            feedback_history: Vec::new(),
            approved_names: None,
            completion: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_defaults(brief: impl Into<String>) -> Self {
        Self::new(brief, DEFAULT_MAX_ITERATIONS, DEFAULT_FALLBACK_COUNT)
    }

    /// Round size for this session, kept with the other policy values so a
    /// resumed session generates the same number of names.
    #[must_use]
    pub fn with_candidates_per_round(mut self, count: usize) -> Self {
        self.candidates_per_round = count.max(1);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn brief(&self) -> &str {
        &self.brief
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn fallback_count(&self) -> usize {
        self.fallback_count
    }

    pub fn candidates_per_round(&self) -> usize {
        self.candidates_per_round
    }

    pub fn rounds(&self) -> &[Vec<NameCandidate>] {
        &self.rounds
    }

    pub fn feedback_history(&self) -> &[Feedback] {
        &self.feedback_history
    }

    pub fn approved_names(&self) -> Option<&[String]> {
        self.approved_names.as_deref()
    }

    pub fn completion(&self) -> Option<Completion> {
        self.completion
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn latest_round(&self) -> Option<&[NameCandidate]> {
        self.rounds.last().map(Vec::as_slice)
    }

    pub fn is_complete(&self) -> bool {
        self.completion.is_some()
    }

    /// A round has been presented and no feedback has answered it yet.
    pub fn awaiting_feedback(&self) -> bool {
        !self.is_complete() && self.rounds.len() == self.feedback_history.len() + 1
    }

    /// Feedback has been recorded but the next round was never committed.
    pub fn needs_round(&self) -> bool {
        !self.is_complete() && self.rounds.len() == self.feedback_history.len()
    }

    pub fn cap_reached(&self) -> bool {
        self.iteration >= self.max_iterations
    }

    /// Candidates from the latest round that the latest feedback liked, in
    /// the order they were liked.
    pub fn carry_over(&self) -> Vec<NameCandidate> {
        if self.rounds.is_empty() || self.rounds.len() != self.feedback_history.len() {
            return Vec::new();
        }
        let (Some(round), Some(feedback)) = (self.rounds.last(), self.feedback_history.last())
        else {
            return Vec::new();
        };
        let mut carried: Vec<NameCandidate> = Vec::new();
        for liked in feedback.liked_names() {
            if carried.iter().any(|c| c.is_named(liked)) {
                continue;
            }
            if let Some(candidate) = round.iter().find(|c| c.is_named(liked)) {
                carried.push(candidate.clone());
            }
        }
        carried
    }

    /// Commits a generated round. Only valid when no round is pending.
    pub fn record_round(&mut self, candidates: Vec<NameCandidate>) -> Result<()> {
        if self.is_complete() {
            return Err(BrandError::session(format!("session {} is already complete", self.id)));
        }
        if self.awaiting_feedback() {
            return Err(BrandError::session(format!(
                "round {} is still awaiting feedback",
                self.rounds.len()
            )));
        }
        if candidates.is_empty() {
            return Err(BrandError::generation(self.rounds.len() + 1, "round has no candidates"));
        }
        self.rounds.push(candidates);
        self.touch();
        Ok(())
    }

    /// Appends non-approving feedback for the pending round and advances the iteration.
    pub fn record_feedback(&mut self, feedback: Feedback) -> Result<()> {
        if feedback.is_approval() {
            return Err(BrandError::session("approval is recorded with approve(), not as history"));
        }
        self.ensure_pending()?;
        self.feedback_history.push(feedback);
        self.iteration = (self.iteration + 1).min(self.max_iterations);
        self.touch();
        Ok(())
    }

    pub fn approve(&mut self, names: Vec<String>) -> Result<()> {
        self.ensure_pending()?;
        if names.is_empty() {
            return Err(BrandError::selection("approval requires at least one selected name"));
        }
        self.approved_names = Some(names);
        self.completion = Some(Completion::Approved);
        self.touch();
        Ok(())
    }

    /// Approves the first `fallback_count` candidates of the pending round.
    pub fn force_approve(&mut self) -> Result<Vec<String>> {
        self.ensure_pending()?;
        let names: Vec<String> = self
            .latest_round()
            .unwrap_or_default()
            .iter()
            .take(self.fallback_count)
            .map(|c| c.name.clone())
            .collect();
        self.approved_names = Some(names.clone());
        self.completion = Some(Completion::IterationCapReached);
        self.touch();
        Ok(names)
    }

    /// Resolves a name against the pending round, returning its canonical spelling.
    pub fn resolve_name(&self, name: &str) -> Option<&str> {
        self.latest_round()?.iter().find(|c| c.is_named(name)).map(|c| c.name.as_str())
    }

    /// Every candidate ever presented, newest round first, deduplicated by name.
    pub fn all_candidates(&self) -> Vec<&NameCandidate> {
        let mut seen = std::collections::HashSet::new();
        self.rounds
            .iter()
            .rev()
            .flatten()
            .filter(|c| seen.insert(name_key(&c.name)))
            .collect()
    }

    fn ensure_pending(&self) -> Result<()> {
        if self.awaiting_feedback() {
            Ok(())
        } else if self.is_complete() {
            Err(BrandError::session(format!("session {} is already complete", self.id)))
        } else {
            Err(BrandError::session(format!("session {} has no round awaiting feedback", self.id)))
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
