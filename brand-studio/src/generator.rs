//! LLM-backed name generation.
//!
//! The model is asked for a JSON object of the form
//! `{"generated_names": [{"name", "strategy", "rationale", "tagline"}]}`.
//! Replies are parsed at the boundary into [`NameCandidate`]s; a reply that
//! does not match the schema is regenerated once before the round fails.

use crate::llm::parse_json_reply;
use async_trait::async_trait;
use brand_core::{
    BrandError, GenerationRequest, Llm, LlmRequest, NameCandidate, NameGenerator,
    NamingStrategy, Result, build_feedback_summary, name_key,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

const GENERATION_STAGE: &str = "generation";

const MAX_ATTEMPTS: usize = 2;

const NAMING_INSTRUCTION: &str = r#"You are an expert brand strategist creating names for new products.

## Naming strategies

Spread the names across all four strategies:
- **portmanteau**: blend two meaningful words (Instagram, Pinterest)
- **descriptive**: say what the product does or evokes (PayPal, YouTube)
- **invented**: coined words with a pleasing sound (Kodak, Spotify)
- **acronym**: short letter-based marks (IBM, H&M)

## Guidelines

- Names must be easy to say, spell, and remember
- Prefer 2-3 syllables and fewer than 12 characters
- Avoid names of well-known existing brands
- Give each name a one-sentence rationale and a 5-8 word tagline
- When feedback is provided, follow it closely: keep what was liked, drop what was disliked

## Output

Reply with JSON only:
{"generated_names": [{"name": "...", "strategy": "portmanteau|descriptive|invented|acronym", "rationale": "...", "tagline": "..."}]}
"#;

#[derive(Debug, Deserialize)]
struct GeneratedNames {
    generated_names: Vec<GeneratedName>,
}

#[derive(Debug, Deserialize)]
struct GeneratedName {
    name: String,
    #[serde(default)]
    strategy: Option<String>,
    #[serde(default)]
    rationale: String,
    #[serde(default)]
    tagline: String,
}

/// Generates candidates by prompting an [`Llm`].
pub struct LlmNameGenerator {
    llm: Arc<dyn Llm>,
    temperature: f32,
}

impl LlmNameGenerator {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm, temperature: 0.9 }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn attempt(&self, request: &GenerationRequest) -> Result<Vec<NameCandidate>> {
        let response = self
            .llm
            .generate_text(
                LlmRequest::new(build_prompt(request))
                    .with_system_instruction(NAMING_INSTRUCTION)
                    .with_temperature(self.temperature)
                    .json(),
            )
            .await?;
        parse_candidates(&response.text, request)
    }
}

#[async_trait]
impl NameGenerator for LlmNameGenerator {
    fn name(&self) -> &str {
        self.llm.name()
    }

    async fn generate(&self, request: GenerationRequest) -> Result<Vec<NameCandidate>> {
        let mut attempt = 1;
        loop {
            match self.attempt(&request).await {
                Err(error) if error.is_malformed_output() && attempt < MAX_ATTEMPTS => {
                    warn!(
                        round = request.round,
                        attempt,
                        error = %error,
                        "regenerating malformed names reply"
                    );
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// Builds the user prompt for one round.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let mut sections = vec![
        format!("## Brief\n{}", request.brief),
        format!(
            "## Task\nGenerate {} brand name candidates (round {}).",
            request.requested_count, request.round
        ),
    ];
    if !request.carry_over.is_empty() {
        sections.push(format!(
            "## Already kept\nThese names are carried forward; do not repeat them: {}",
            request.carry_over.join(", ")
        ));
    }
    let summary = build_feedback_summary(&request.feedback_history);
    if !summary.is_empty() {
        sections.push(format!("## Feedback\n{}", summary));
    }
    sections.join("\n\n")
}

fn parse_candidates(text: &str, request: &GenerationRequest) -> Result<Vec<NameCandidate>> {
    let parsed: GeneratedNames = parse_json_reply(GENERATION_STAGE, text)?;

    let mut seen: HashSet<String> = request.carry_over.iter().map(|n| name_key(n)).collect();
    let mut candidates = Vec::new();
    for raw in parsed.generated_names {
        let name = raw.name.trim();
        if name.is_empty() || !seen.insert(name_key(name)) {
            continue;
        }
        let strategy = match raw.strategy.as_deref().map(str::parse::<NamingStrategy>) {
            Some(Ok(strategy)) => strategy,
            Some(Err(_)) | None => {
                debug!(
                    name,
                    strategy = ?raw.strategy,
                    "unrecognised strategy label; treating as invented"
                );
                NamingStrategy::Invented
            }
        };
        candidates.push(
            NameCandidate::new(name, strategy)
                .with_rationale(raw.rationale.trim())
                .with_tagline(raw.tagline.trim()),
        );
        if candidates.len() == request.requested_count {
            break;
        }
    }

    if candidates.is_empty() {
        return Err(BrandError::malformed(GENERATION_STAGE, "reply contained no usable names"));
    }
    Ok(candidates)
}
