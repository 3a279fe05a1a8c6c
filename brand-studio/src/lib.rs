//! # brand-studio
//!
//! Iterative brand naming. A product brief goes through rounds of generated
//! name candidates and user feedback until names are approved (or the
//! iteration cap picks the top of the final round), then the chosen names
//! are validated and turned into a brand package.
//!
//! ## Components
//!
//! - [`BrandResearcher`] - industry, competitor and audience insights added to the brief
//! - [`RefinementLoop`] - generate, collect feedback, repeat; bounded by `max_iterations`
//! - [`feedback`] - index selections and list inputs to [`brand_core::Feedback`]
//! - [`Validator`] - concurrent domain, trademark and SEO checks with a set-level verdict
//! - [`BrandPackageAssembler`] - taglines, story, hero copy and value proposition
//! - [`GeminiClient`] / [`LlmNameGenerator`] - the model-backed capabilities
//! - [`JsonFileSessionStore`] - sessions persisted between CLI invocations
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use brand_studio::{BrandBrief, GeminiClient, LlmNameGenerator, RefinementLoop, StudioConfig};
//! use brand_studio::feedback::{PromptedFeedbackCollector, StdioPrompter};
//! use std::sync::Arc;
//!
//! let config = StudioConfig::from_env()?;
//! let model = Arc::new(GeminiClient::from_config(&config.model)?);
//! let refinement = RefinementLoop::new(Arc::new(LlmNameGenerator::new(model)), config.refinement);
//!
//! let brief = BrandBrief::new("AI meal planning app")?.with_audience("busy parents");
//! let mut session = refinement.start_session(brief.render());
//! let collector = PromptedFeedbackCollector::new(StdioPrompter::new());
//! let completion = refinement.run(&mut session, &collector).await?;
//! ```
//!
//! ## Flow
//!
//! ```text
//! brief → research → round 1 → feedback ─┬─ approve ───────────────▶ approved names
//!                       ▲                └─ regenerate / refine ──┐
//!                       └────────── full feedback history ◀───────┘
//!                               (cap reached → top names of final round)
//!
//! approved names → Validator → BrandPackageAssembler
//! ```

pub mod assembler;
pub mod brief;
pub mod config;
pub mod feedback;
pub mod generator;
pub mod llm;
pub mod output;
pub mod refinement;
pub mod research;
pub mod store;
pub mod telemetry;
pub mod validator;

pub use assembler::{BrandPackage, BrandPackageAssembler};
pub use brief::{BrandBrief, Personality};
pub use config::{
    ConfigError, ModelConfig, RefinementConfig, StudioConfig, StudioConfigBuilder,
    TelemetryConfig, ValidationConfig,
};
pub use feedback::{FeedbackInput, PromptedFeedbackCollector, RefineInput, capture};
pub use generator::LlmNameGenerator;
pub use llm::{GeminiClient, RetryConfig, ScriptedLlm};
pub use refinement::{RefinementLoop, RoundOutcome};
pub use research::{BrandResearcher, ResearchInsights};
pub use store::{InMemorySessionStore, JsonFileSessionStore};
pub use validator::Validator;
