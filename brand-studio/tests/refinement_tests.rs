//! Refinement loop behaviour against in-process fakes.

use async_trait::async_trait;
use brand_core::{
    BrandError, Completion, Feedback, FeedbackCollector, GenerationRequest, NameCandidate,
    NameGenerator, NamingStrategy, RefinementSession, Result, RoundView, SessionStore,
};
use brand_studio::feedback::{FeedbackInput, capture};
use brand_studio::{InMemorySessionStore, RefinementConfig, RefinementLoop, RoundOutcome};
use proptest::prelude::*;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Fakes
// ============================================================================

/// Produces `R{round}-{i}` names and records every request.
#[derive(Default)]
struct NumberedGenerator {
    fail_on_round: Option<usize>,
    empty: bool,
    hang: bool,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl NumberedGenerator {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl NameGenerator for NumberedGenerator {
    fn name(&self) -> &str {
        "numbered"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Vec<NameCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.fail_on_round == Some(request.round) {
            return Err(BrandError::model("upstream unavailable"));
        }
        if self.empty {
            return Ok(Vec::new());
        }
        Ok((1..=request.requested_count)
            .map(|i| {
                NameCandidate::new(format!("R{}-{}", request.round, i), NamingStrategy::Invented)
                    .with_tagline(format!("tagline {}", i))
                    .with_rationale(format!("from round {}", request.round))
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Approve(&'static str),
    Regenerate,
    Like(&'static str),
}

struct ScriptedCollector {
    replies: Mutex<VecDeque<Reply>>,
    seen: Mutex<Vec<RoundView>>,
}

impl ScriptedCollector {
    fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self { replies: Mutex::new(replies.into_iter().collect()), seen: Mutex::default() }
    }

    fn seen(&self) -> Vec<RoundView> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedbackCollector for ScriptedCollector {
    async fn collect(&self, view: &RoundView) -> Result<Feedback> {
        self.seen.lock().unwrap().push(view.clone());
        let reply = self.replies.lock().unwrap().pop_front();
        let input = match reply {
            Some(Reply::Approve(selection)) => {
                FeedbackInput::Approve { selection: selection.to_string() }
            }
            Some(Reply::Regenerate) => FeedbackInput::Regenerate { text: None },
            Some(Reply::Like(selection)) => FeedbackInput::Refine(brand_studio::RefineInput {
                like: Some(selection.to_string()),
                ..Default::default()
            }),
            None => return Err(BrandError::Cancelled),
        };
        capture(input, view)
    }
}

fn config(max_iterations: usize, candidates_per_round: usize) -> RefinementConfig {
    RefinementConfig { max_iterations, candidates_per_round, fallback_count: 10 }
}

fn refinement(generator: Arc<NumberedGenerator>, config: RefinementConfig) -> RefinementLoop {
    RefinementLoop::new(generator, config)
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn approval_on_round_one() {
    let generator = Arc::new(NumberedGenerator::default());
    let refinement = refinement(generator.clone(), config(3, 5));
    let mut session = refinement.start_session("Product: meal planner");
    let collector = ScriptedCollector::new([Reply::Approve("1,3")]);

    let completion = refinement.run(&mut session, &collector).await.unwrap();

    assert_eq!(completion, Completion::Approved);
    assert_eq!(session.approved_names().unwrap(), ["R1-1", "R1-3"]);
    assert!(session.feedback_history().is_empty());
    assert_eq!(session.rounds().len(), 1);
    assert_eq!(generator.calls(), 1);
}

/// Always proposes the same five fitness names.
struct FitnessGenerator;

#[async_trait]
impl NameGenerator for FitnessGenerator {
    fn name(&self) -> &str {
        "fitness"
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<Vec<NameCandidate>> {
        Ok(["FitFlow", "Pulseo", "MoveMint", "Stridely", "CoreKin"]
            .into_iter()
            .map(|n| NameCandidate::new(n, NamingStrategy::Portmanteau))
            .collect())
    }
}

struct ApproveByName(&'static str);

#[async_trait]
impl FeedbackCollector for ApproveByName {
    async fn collect(&self, _view: &RoundView) -> Result<Feedback> {
        Feedback::approve([self.0])
    }
}

#[tokio::test]
async fn fitness_app_approved_by_name() {
    let refinement = RefinementLoop::new(Arc::new(FitnessGenerator), config(3, 5));
    let mut session = refinement.start_session("fitness app");

    let completion = refinement.run(&mut session, &ApproveByName("FitFlow")).await.unwrap();

    assert_eq!(completion, Completion::Approved);
    assert_eq!(session.approved_names().unwrap(), ["FitFlow"]);
    assert!(session.feedback_history().is_empty());
    assert_eq!(session.rounds().len(), 1);
}

#[tokio::test]
async fn cap_reached_after_max_iterations() {
    let generator = Arc::new(NumberedGenerator::default());
    let refinement = refinement(generator.clone(), config(2, 5));
    let mut session = refinement.start_session("Product: meal planner");
    let collector = ScriptedCollector::new([Reply::Regenerate, Reply::Regenerate]);

    let completion = refinement.run(&mut session, &collector).await.unwrap();

    assert_eq!(completion, Completion::IterationCapReached);
    assert_eq!(generator.calls(), 3);
    assert_eq!(session.rounds().len(), 3);
    assert_eq!(session.feedback_history().len(), 2);
    assert_eq!(collector.seen().len(), 2);
    // fallback_count is 10 but the final round only has 5 names
    assert_eq!(
        session.approved_names().unwrap(),
        ["R3-1", "R3-2", "R3-3", "R3-4", "R3-5"]
    );
}

#[tokio::test]
async fn every_generate_call_sees_the_full_history() {
    let generator = Arc::new(NumberedGenerator::default());
    let refinement = refinement(generator.clone(), config(3, 4));
    let mut session = refinement.start_session("Product: meal planner");
    let collector =
        ScriptedCollector::new([Reply::Regenerate, Reply::Like("2"), Reply::Approve("1")]);

    refinement.run(&mut session, &collector).await.unwrap();

    let requests = generator.requests();
    assert_eq!(requests.len(), 3);
    for (i, request) in requests.iter().enumerate() {
        assert_eq!(request.round, i + 1);
        assert_eq!(request.feedback_history.len(), i);
        assert_eq!(request.brief, "Product: meal planner");
    }
    assert_eq!(requests[2].feedback_history, session.feedback_history());
}

#[tokio::test]
async fn liked_names_carry_over_verbatim() {
    let generator = Arc::new(NumberedGenerator::default());
    let refinement = refinement(generator.clone(), config(3, 5));
    let mut session = refinement.start_session("Product: meal planner");

    refinement.present_round(&mut session).await.unwrap();
    let liked: Vec<NameCandidate> =
        vec![session.rounds()[0][3].clone(), session.rounds()[0][1].clone()];
    let view = RoundView::of(&session).unwrap();
    let feedback = capture(
        FeedbackInput::Refine(brand_studio::RefineInput {
            like: Some("4,2".to_string()),
            ..Default::default()
        }),
        &view,
    )
    .unwrap();
    assert_eq!(refinement.apply_feedback(&mut session, feedback).await.unwrap(), None);

    refinement.present_round(&mut session).await.unwrap();
    let round_two = &session.rounds()[1];
    assert_eq!(&round_two[..2], liked.as_slice());
    assert_eq!(round_two.len(), 5);

    let request = &generator.requests()[1];
    assert_eq!(request.carry_over, vec!["R1-4".to_string(), "R1-2".to_string()]);
    assert_eq!(request.requested_count, 3);
}

#[tokio::test]
async fn rejected_selection_leaves_session_unchanged() {
    let generator = Arc::new(NumberedGenerator::default());
    let refinement = refinement(generator, config(3, 5));
    let mut session = refinement.start_session("Product: meal planner");
    refinement.present_round(&mut session).await.unwrap();
    let snapshot = session.clone();

    let view = RoundView::of(&session).unwrap();
    let err = capture(FeedbackInput::Approve { selection: "7".to_string() }, &view).unwrap_err();
    assert!(matches!(err, BrandError::Selection(_)));

    let stranger = Feedback::approve(["NotInRound"]).unwrap();
    let err = refinement.apply_feedback(&mut session, stranger).await.unwrap_err();
    assert!(matches!(err, BrandError::Selection(_)));

    let disliked = Feedback::refine().disliked_name("R9-9").build().unwrap();
    assert!(refinement.apply_feedback(&mut session, disliked).await.is_err());

    assert_eq!(session, snapshot);
}

#[tokio::test]
async fn approval_uses_canonical_spelling() {
    let generator = Arc::new(NumberedGenerator::default());
    let refinement = refinement(generator, config(3, 3));
    let mut session = refinement.start_session("Product: meal planner");
    refinement.present_round(&mut session).await.unwrap();

    let completion = refinement
        .apply_feedback(&mut session, Feedback::approve(["r1-2"]).unwrap())
        .await
        .unwrap();
    assert_eq!(completion, Some(Completion::Approved));
    assert_eq!(session.approved_names().unwrap(), ["R1-2"]);
}

#[tokio::test]
async fn generation_failure_leaves_session_unchanged() {
    let generator = Arc::new(NumberedGenerator { fail_on_round: Some(2), ..Default::default() });
    let refinement = refinement(generator, config(3, 3));
    let mut session = refinement.start_session("Product: meal planner");
    refinement.present_round(&mut session).await.unwrap();
    refinement.apply_feedback(&mut session, Feedback::regenerate(None)).await.unwrap();
    let snapshot = session.clone();

    let err = refinement.present_round(&mut session).await.unwrap_err();
    assert!(matches!(err, BrandError::Generation { round: 2, .. }), "{err}");
    assert_eq!(session, snapshot);
}

#[tokio::test]
async fn empty_round_is_a_generation_failure() {
    let generator = Arc::new(NumberedGenerator { empty: true, ..Default::default() });
    let refinement = refinement(generator, config(3, 3));
    let mut session = refinement.start_session("Product: meal planner");
    let snapshot = session.clone();

    let err = refinement.present_round(&mut session).await.unwrap_err();
    assert!(matches!(err, BrandError::Generation { round: 1, .. }));
    assert_eq!(session, snapshot);
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_generation_leaves_session_unchanged() {
    let generator = Arc::new(NumberedGenerator { hang: true, ..Default::default() });
    let token = CancellationToken::new();
    let refinement = refinement(generator.clone(), config(3, 3)).with_cancellation(token.clone());
    let mut session = refinement.start_session("Product: meal planner");
    let snapshot = session.clone();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();
    });
    let err = refinement.present_round(&mut session).await.unwrap_err();
    canceller.await.unwrap();

    assert!(matches!(err, BrandError::Cancelled));
    assert_eq!(generator.calls(), 1);
    assert_eq!(session, snapshot);
}

#[tokio::test]
async fn cancelled_collection_appends_no_feedback() {
    let generator = Arc::new(NumberedGenerator::default());
    let refinement = refinement(generator, config(3, 3));
    let mut session = refinement.start_session("Product: meal planner");
    // The collector has no replies left, which it reports as cancellation.
    let collector = ScriptedCollector::new([]);

    let err = refinement.run(&mut session, &collector).await.unwrap_err();
    assert!(matches!(err, BrandError::Cancelled));
    assert_eq!(session.rounds().len(), 1);
    assert!(session.feedback_history().is_empty());
    assert!(session.awaiting_feedback());
}

#[tokio::test]
async fn run_resumes_a_pending_session() {
    let generator = Arc::new(NumberedGenerator::default());
    let refinement = refinement(generator.clone(), config(3, 3));
    let mut session = refinement.start_session("Product: meal planner");
    refinement.present_round(&mut session).await.unwrap();

    let collector = ScriptedCollector::new([Reply::Approve("2")]);
    let completion = refinement.run(&mut session, &collector).await.unwrap();
    assert_eq!(completion, Completion::Approved);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn step_api_rejects_out_of_order_calls() {
    let generator = Arc::new(NumberedGenerator::default());
    let refinement = refinement(generator, config(1, 3));
    let mut session = refinement.start_session("Product: meal planner");

    assert!(refinement.apply_feedback(&mut session, Feedback::regenerate(None)).await.is_err());
    let outcome = refinement.present_round(&mut session).await.unwrap();
    assert!(matches!(outcome, RoundOutcome::AwaitingFeedback(ref view) if view.round == 1));
    assert!(matches!(
        refinement.present_round(&mut session).await,
        Err(BrandError::Session(_))
    ));

    refinement.apply_feedback(&mut session, Feedback::regenerate(None)).await.unwrap();
    let outcome = refinement.present_round(&mut session).await.unwrap();
    assert_eq!(outcome, RoundOutcome::Completed(Completion::IterationCapReached));
    assert!(refinement.present_round(&mut session).await.is_err());
}

#[tokio::test]
async fn sessions_are_persisted_at_round_boundaries() {
    let generator = Arc::new(NumberedGenerator::default());
    let store = Arc::new(InMemorySessionStore::new());
    let refinement = refinement(generator, config(3, 3)).with_store(store.clone());
    let mut session = refinement.start_session("Product: meal planner");

    refinement.present_round(&mut session).await.unwrap();
    assert_eq!(store.load(session.id()).await.unwrap(), session);

    refinement.apply_feedback(&mut session, Feedback::regenerate(None)).await.unwrap();
    let saved = store.load(session.id()).await.unwrap();
    assert_eq!(saved.feedback_history().len(), 1);
    assert_eq!(saved, session);
}

#[tokio::test]
async fn failed_round_after_feedback_can_be_resumed() {
    let store = Arc::new(InMemorySessionStore::new());
    let failing = Arc::new(NumberedGenerator { fail_on_round: Some(2), ..Default::default() });
    let first = refinement(failing, config(3, 3)).with_store(store.clone());
    let mut session = first.start_session("Product: meal planner");
    first.present_round(&mut session).await.unwrap();
    first.apply_feedback(&mut session, Feedback::regenerate(None)).await.unwrap();
    assert!(first.present_round(&mut session).await.is_err());

    // A later invocation only has what was saved.
    let mut saved = store.load(session.id()).await.unwrap();
    assert!(saved.needs_round());
    assert!(!saved.awaiting_feedback());

    let working = Arc::new(NumberedGenerator::default());
    let second = refinement(working.clone(), config(3, 3)).with_store(store.clone());
    let outcome = second.resume(&mut saved).await.unwrap();

    assert!(matches!(outcome, RoundOutcome::AwaitingFeedback(ref view) if view.round == 2));
    assert_eq!(working.requests()[0].feedback_history.len(), 1);
    let completion =
        second.apply_feedback(&mut saved, Feedback::approve(["R2-1"]).unwrap()).await.unwrap();
    assert_eq!(completion, Some(Completion::Approved));
    assert!(store.load(saved.id()).await.unwrap().is_complete());
}

#[tokio::test]
async fn resume_does_not_regenerate_pending_or_finished_sessions() {
    let generator = Arc::new(NumberedGenerator::default());
    let refinement = refinement(generator.clone(), config(3, 3));
    let mut session = refinement.start_session("Product: meal planner");
    refinement.present_round(&mut session).await.unwrap();

    let outcome = refinement.resume(&mut session).await.unwrap();
    assert!(matches!(outcome, RoundOutcome::AwaitingFeedback(ref view) if view.round == 1));
    assert_eq!(generator.calls(), 1);

    refinement.apply_feedback(&mut session, Feedback::approve(["R1-1"]).unwrap()).await.unwrap();
    let outcome = refinement.resume(&mut session).await.unwrap();
    assert_eq!(outcome, RoundOutcome::Completed(Completion::Approved));
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn round_size_follows_the_session_not_the_loop() {
    let first = refinement(Arc::new(NumberedGenerator::default()), config(3, 5));
    let mut session = first.start_session("Product: meal planner");
    first.present_round(&mut session).await.unwrap();
    first.apply_feedback(&mut session, Feedback::regenerate(None)).await.unwrap();

    // A later invocation configured with a different default.
    let generator = Arc::new(NumberedGenerator::default());
    let second = refinement(generator.clone(), config(3, 20));
    second.present_round(&mut session).await.unwrap();

    assert_eq!(generator.requests()[0].requested_count, 5);
    assert_eq!(session.rounds()[1].len(), 5);
}

// ============================================================================
// Properties
// ============================================================================

fn reply_strategy() -> impl Strategy<Value = Reply> {
    prop_oneof![
        3 => Just(Reply::Regenerate),
        2 => Just(Reply::Like("1")),
        1 => Just(Reply::Approve("1")),
    ]
}

proptest! {
    #[test]
    fn loop_terminates_within_bound(
        max_iterations in 1usize..6,
        replies in proptest::collection::vec(reply_strategy(), 0..8),
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (session, calls, completion) = runtime.block_on(async {
            let generator = Arc::new(NumberedGenerator::default());
            let refinement = refinement(generator.clone(), config(max_iterations, 4));
            let mut session: RefinementSession = refinement.start_session("Product: anything");
            // Fall back to regenerating once the script runs out.
            let mut script = replies.clone();
            script.extend(std::iter::repeat_n(Reply::Regenerate, max_iterations + 1));
            let collector = ScriptedCollector::new(script);
            let completion = refinement.run(&mut session, &collector).await.unwrap();
            (session, generator.calls(), completion)
        });

        prop_assert!(calls <= max_iterations + 1);
        prop_assert_eq!(calls, session.rounds().len());
        prop_assert_eq!(session.feedback_history().len(), session.rounds().len() - 1);
        prop_assert!(session.feedback_history().iter().all(|f| !f.is_approval()));
        prop_assert!(session.iteration() <= max_iterations);
        prop_assert!(!session.approved_names().unwrap().is_empty());
        if completion == Completion::IterationCapReached {
            prop_assert_eq!(calls, max_iterations + 1);
        }
    }
}
