//! # brand-core
//!
//! Core types and capability traits for Brand Studio.
//!
//! ## Overview
//!
//! - [`NameCandidate`] - a proposed name with rationale, tagline and strategy
//! - [`Feedback`] - immutable, validated user feedback on one round
//! - [`RefinementSession`] - rounds, feedback history and completion state
//! - [`ValidationResult`] / [`ValidationReport`] - per-name checks and the pass policy
//! - [`BrandError`] / [`Result`] - unified error handling
//!
//! ## Capabilities
//!
//! The refinement loop and validator only see these traits, so every
//! external dependency can be swapped for an in-process fake:
//!
//! ```rust,ignore
//! #[async_trait]
//! pub trait NameGenerator: Send + Sync {
//!     fn name(&self) -> &str;
//!     async fn generate(&self, request: GenerationRequest) -> Result<Vec<NameCandidate>>;
//! }
//! ```

pub mod candidate;
pub mod capability;
pub mod error;
pub mod feedback;
pub mod model;
pub mod session;
pub mod validation;

pub use candidate::{NameCandidate, NamingStrategy, name_key};
pub use capability::{
    DomainChecker, FeedbackCollector, GenerationRequest, NameGenerator, RoundView, SeoScorer,
    SessionStore, SessionSummary, TrademarkChecker,
};
pub use error::{BrandError, Result};
pub use feedback::{Feedback, FeedbackBuilder, FeedbackKind, build_feedback_summary};
pub use model::{Llm, LlmRequest, LlmResponse, UsageMetadata};
pub use session::{
    Completion, DEFAULT_CANDIDATES_PER_ROUND, DEFAULT_FALLBACK_COUNT, DEFAULT_MAX_ITERATIONS,
    RefinementSession,
};
pub use validation::{
    CheckKind, CheckOutcome, DEFAULT_PASS_RATIO, DomainStatus, TrademarkConflict,
    TrademarkReport, TrademarkRisk, ValidationReport, ValidationResult, Verdict, set_passes,
};
