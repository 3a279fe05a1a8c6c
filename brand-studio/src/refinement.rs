//! The refinement loop: generate a round, collect feedback, repeat until the
//! user approves names or the iteration cap forces a fallback selection.
//!
//! A session only changes at round boundaries. Generation failures,
//! cancellation, and invalid selections leave it exactly as it was.
//!
//! ```text
//! present_round ──▶ cap reached? ──yes──▶ force approve (IterationCapReached)
//!       ▲                 │ no
//!       │                 ▼
//!       │           collect feedback
//!       │                 │
//!       └── regenerate/refine ◀── approve? ──yes──▶ Approved
//! ```

use crate::config::RefinementConfig;
use crate::telemetry;
use brand_core::{
    BrandError, Completion, Feedback, FeedbackCollector, GenerationRequest, NameCandidate,
    NameGenerator, RefinementSession, Result, RoundView, SessionStore, name_key,
};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug};

/// What happened when a round was presented.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundOutcome {
    /// The round is committed and waits for feedback.
    AwaitingFeedback(RoundView),
    /// The round hit the iteration cap and the session was finalised.
    Completed(Completion),
}

pub struct RefinementLoop {
    generator: Arc<dyn NameGenerator>,
    store: Option<Arc<dyn SessionStore>>,
    config: RefinementConfig,
    cancel: CancellationToken,
}

impl RefinementLoop {
    pub fn new(generator: Arc<dyn NameGenerator>, config: RefinementConfig) -> Self {
        Self { generator, store: None, config, cancel: CancellationToken::new() }
    }

    /// Persists the session after every committed round and feedback.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &RefinementConfig {
        &self.config
    }

    pub fn start_session(&self, brief: impl Into<String>) -> RefinementSession {
        RefinementSession::new(brief, self.config.max_iterations, self.config.fallback_count)
            .with_candidates_per_round(self.config.candidates_per_round)
    }

    /// Generates and commits the next round. When the iteration cap is
    /// reached the round is finalised immediately by approving its first
    /// `fallback_count` candidates.
    pub async fn present_round(&self, session: &mut RefinementSession) -> Result<RoundOutcome> {
        if session.is_complete() {
            return Err(BrandError::session(format!(
                "session {} is already complete",
                session.id()
            )));
        }
        if session.awaiting_feedback() {
            return Err(BrandError::session(format!(
                "round {} of session {} is still awaiting feedback",
                session.rounds().len(),
                session.id()
            )));
        }

        let round = session.rounds().len() + 1;
        let span = telemetry::round_span(session.id(), round, session.iteration());
        let carried = session.carry_over();
        let request = GenerationRequest {
            brief: session.brief().to_string(),
            round,
            feedback_history: session.feedback_history().to_vec(),
            carry_over: carried.iter().map(|c| c.name.clone()).collect(),
            requested_count: session.candidates_per_round().saturating_sub(carried.len()).max(1),
        };

        let generated = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(BrandError::Cancelled),
            result = self.generator.generate(request).instrument(span.clone()) => {
                result.map_err(|e| generation_failure(round, e))?
            }
        };

        let carried_count = carried.len();
        let candidates = merge_round(carried, generated);
        if candidates.is_empty() {
            return Err(BrandError::generation(round, "no candidates were generated"));
        }
        let size = candidates.len();
        session.record_round(candidates)?;
        span.in_scope(|| telemetry::log_round_committed(session.id(), round, size, carried_count));

        if session.cap_reached() {
            let approved = session.force_approve()?;
            telemetry::log_completion(
                session.id(),
                Completion::IterationCapReached,
                approved.len(),
            );
            self.persist(session).await?;
            return Ok(RoundOutcome::Completed(Completion::IterationCapReached));
        }

        self.persist(session).await?;
        let view = RoundView::of(session)
            .ok_or_else(|| BrandError::session("committed round is missing"))?;
        Ok(RoundOutcome::AwaitingFeedback(view))
    }

    /// Picks a stored session back up: the completion if it is finished, the
    /// pending round if one awaits feedback, otherwise the next round is
    /// generated. The last case covers a process that committed feedback
    /// and then failed or was cancelled before the next round.
    pub async fn resume(&self, session: &mut RefinementSession) -> Result<RoundOutcome> {
        if let Some(completion) = session.completion() {
            return Ok(RoundOutcome::Completed(completion));
        }
        if session.awaiting_feedback() {
            let view = RoundView::of(session)
                .ok_or_else(|| BrandError::session("pending round is missing"))?;
            return Ok(RoundOutcome::AwaitingFeedback(view));
        }
        debug!(
            session_id = %session.id(),
            round = session.rounds().len() + 1,
            "resuming with a new round"
        );
        self.present_round(session).await
    }

    /// Validates feedback against the pending round and commits it. Returns
    /// the completion when the feedback approved names.
    pub async fn apply_feedback(
        &self,
        session: &mut RefinementSession,
        feedback: Feedback,
    ) -> Result<Option<Completion>> {
        if !session.awaiting_feedback() {
            return Err(BrandError::session(format!(
                "session {} has no round awaiting feedback",
                session.id()
            )));
        }
        let round = session.rounds().len();
        for name in feedback.referenced_names() {
            if session.resolve_name(name).is_none() {
                return Err(BrandError::selection(format!(
                    "'{}' is not a candidate in round {}",
                    name, round
                )));
            }
        }

        if feedback.is_approval() {
            let approved: Vec<String> = feedback
                .selected_names()
                .iter()
                .filter_map(|name| session.resolve_name(name).map(str::to_string))
                .collect();
            let count = approved.len();
            session.approve(approved)?;
            telemetry::log_feedback(session.id(), feedback.kind(), session.iteration());
            telemetry::log_completion(session.id(), Completion::Approved, count);
            self.persist(session).await?;
            return Ok(Some(Completion::Approved));
        }

        let kind = feedback.kind();
        session.record_feedback(feedback)?;
        telemetry::log_feedback(session.id(), kind, session.iteration());
        self.persist(session).await?;
        Ok(None)
    }

    /// Drives the session to completion. Resumes a session that is already
    /// waiting for feedback.
    pub async fn run(
        &self,
        session: &mut RefinementSession,
        collector: &dyn FeedbackCollector,
    ) -> Result<Completion> {
        loop {
            if let Some(completion) = session.completion() {
                return Ok(completion);
            }
            if !session.awaiting_feedback() {
                if let RoundOutcome::Completed(completion) = self.present_round(session).await? {
                    return Ok(completion);
                }
            }

            let view = RoundView::of(session)
                .ok_or_else(|| BrandError::session("no round to collect feedback for"))?;
            let feedback = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(BrandError::Cancelled),
                feedback = collector.collect(&view) => feedback?,
            };
            if let Some(completion) = self.apply_feedback(session, feedback).await? {
                return Ok(completion);
            }
        }
    }

    async fn persist(&self, session: &RefinementSession) -> Result<()> {
        if let Some(store) = &self.store {
            store.save(session).await?;
            debug!(session_id = %session.id(), rounds = session.rounds().len(), "session saved");
        }
        Ok(())
    }
}

/// Carried candidates lead the round; generated names already present are dropped.
fn merge_round(carried: Vec<NameCandidate>, generated: Vec<NameCandidate>) -> Vec<NameCandidate> {
    let mut seen: HashSet<String> = HashSet::new();
    carried
        .into_iter()
        .chain(generated)
        .filter(|c| !c.name.trim().is_empty() && seen.insert(name_key(&c.name)))
        .collect()
}

fn generation_failure(round: usize, error: BrandError) -> BrandError {
    match error {
        BrandError::Cancelled | BrandError::Generation { .. } => error,
        other => BrandError::generation(round, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brand_core::NamingStrategy;

    fn candidate(name: &str, tagline: &str) -> NameCandidate {
        NameCandidate::new(name, NamingStrategy::Invented).with_tagline(tagline)
    }

    #[test]
    fn test_merge_keeps_carried_verbatim() {
        let merged = merge_round(
            vec![candidate("Zenith", "original")],
            vec![candidate("zenith", "regenerated"), candidate("Nova", ""), candidate(" ", "")],
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], candidate("Zenith", "original"));
        assert_eq!(merged[1].name, "Nova");
    }

    #[test]
    fn test_generation_failure_wrapping() {
        let wrapped = generation_failure(2, BrandError::model("quota"));
        assert!(matches!(wrapped, BrandError::Generation { round: 2, .. }));
        assert!(matches!(generation_failure(2, BrandError::Cancelled), BrandError::Cancelled));
    }
}
