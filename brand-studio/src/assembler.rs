//! Brand package assembly for an approved name.
//!
//! Length bounds are advisory. Copy outside them is kept, logged at warn
//! level, and listed in [`BrandPackage::advisories`]. A reply that cannot be
//! parsed is regenerated exactly once.

use crate::llm::parse_json_reply;
use crate::telemetry;
use brand_core::{BrandError, Llm, LlmRequest, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::{Instrument, warn};

const ASSEMBLY_STAGE: &str = "assembly";

pub const TAGLINE_COUNT: RangeInclusive<usize> = 3..=5;
pub const TAGLINE_WORDS: RangeInclusive<usize> = 5..=8;
pub const STORY_WORDS: RangeInclusive<usize> = 150..=300;
pub const HERO_COPY_WORDS: RangeInclusive<usize> = 50..=100;
pub const VALUE_PROP_WORDS: RangeInclusive<usize> = 20..=30;

const ASSEMBLY_INSTRUCTION: &str = r#"You are a senior brand copywriter. Build the launch copy for an approved brand name.

## Deliverables

- **taglines**: 3 to 5 taglines, each 5 to 8 words
- **story**: the brand story, 150 to 300 words, covering the problem, the founding insight, and the promise
- **hero_copy**: landing page hero text, 50 to 100 words
- **value_proposition**: one value proposition, 20 to 30 words

Match the brand personality described in the brief. Do not invent facts about the company.

## Output

Reply with JSON only:
{"taglines": ["..."], "story": "...", "hero_copy": "...", "value_proposition": "..."}
"#;

#[derive(Debug, Deserialize)]
struct RawPackage {
    taglines: Vec<String>,
    story: String,
    hero_copy: String,
    #[serde(alias = "value_prop")]
    value_proposition: String,
}

/// Launch copy for one approved name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandPackage {
    pub name: String,
    pub taglines: Vec<String>,
    pub story: String,
    pub hero_copy: String,
    pub value_prop: String,
    /// Length bounds the copy missed.
    #[serde(default)]
    pub advisories: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl BrandPackage {
    fn from_raw(name: &str, raw: RawPackage) -> Result<Self> {
        let taglines: Vec<String> = raw
            .taglines
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        let story = raw.story.trim().to_string();
        let hero_copy = raw.hero_copy.trim().to_string();
        let value_prop = raw.value_proposition.trim().to_string();

        let missing = [
            ("taglines", taglines.is_empty()),
            ("story", story.is_empty()),
            ("hero_copy", hero_copy.is_empty()),
            ("value_proposition", value_prop.is_empty()),
        ];
        if let Some((field, _)) = missing.iter().find(|(_, empty)| *empty) {
            return Err(BrandError::malformed(ASSEMBLY_STAGE, format!("'{}' is empty", field)));
        }

        let mut package = Self {
            name: name.to_string(),
            taglines,
            story,
            hero_copy,
            value_prop,
            advisories: Vec::new(),
            created_at: Utc::now(),
        };
        package.advisories = package.check_bounds();
        Ok(package)
    }

    /// Describes every length bound the package misses.
    pub fn check_bounds(&self) -> Vec<String> {
        let mut advisories = Vec::new();
        if !TAGLINE_COUNT.contains(&self.taglines.len()) {
            advisories.push(bound_advisory(
                "tagline count",
                self.taglines.len(),
                &TAGLINE_COUNT,
                "",
            ));
        }
        for (i, tagline) in self.taglines.iter().enumerate() {
            let words = word_count(tagline);
            if !TAGLINE_WORDS.contains(&words) {
                advisories.push(bound_advisory(
                    &format!("tagline {}", i + 1),
                    words,
                    &TAGLINE_WORDS,
                    " words",
                ));
            }
        }
        for (field, text, range) in [
            ("story", &self.story, &STORY_WORDS),
            ("hero copy", &self.hero_copy, &HERO_COPY_WORDS),
            ("value proposition", &self.value_prop, &VALUE_PROP_WORDS),
        ] {
            let words = word_count(text);
            if !range.contains(&words) {
                advisories.push(bound_advisory(field, words, range, " words"));
            }
        }
        advisories
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn bound_advisory(field: &str, actual: usize, range: &RangeInclusive<usize>, unit: &str) -> String {
    format!(
        "{} is {}{}, expected {}-{}{}",
        field,
        actual,
        unit,
        range.start(),
        range.end(),
        unit
    )
}

pub struct BrandPackageAssembler {
    llm: Arc<dyn Llm>,
    temperature: f32,
}

impl BrandPackageAssembler {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm, temperature: 0.7 }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Produces the package for `name`. Model errors are returned as-is;
    /// only unparseable replies are retried.
    pub async fn assemble(&self, name: &str, brief: &str) -> Result<BrandPackage> {
        let name = name.trim();
        if name.is_empty() {
            return Err(BrandError::selection("an approved name is required for assembly"));
        }
        async {
            match self.attempt(name, brief).await {
                Err(first) if first.is_malformed_output() => {
                    warn!(name, error = %first, "regenerating malformed brand package");
                    self.attempt(name, brief).await.map_err(|second| {
                        if second.is_malformed_output() {
                            BrandError::malformed(
                                ASSEMBLY_STAGE,
                                format!("two malformed replies for '{}': {}", name, second),
                            )
                        } else {
                            second
                        }
                    })
                }
                other => other,
            }
        }
        .instrument(telemetry::assembly_span(name))
        .await
    }

    async fn attempt(&self, name: &str, brief: &str) -> Result<BrandPackage> {
        let prompt = format!("## Brief\n{}\n\n## Approved name\n{}", brief, name);
        let response = self
            .llm
            .generate_text(
                LlmRequest::new(prompt)
                    .with_system_instruction(ASSEMBLY_INSTRUCTION)
                    .with_temperature(self.temperature)
                    .json(),
            )
            .await?;
        let raw: RawPackage = parse_json_reply(ASSEMBLY_STAGE, &response.text)?;
        let package = BrandPackage::from_raw(name, raw)?;
        for advisory in &package.advisories {
            warn!(name, advisory = %advisory, "brand package outside length bounds");
        }
        Ok(package)
    }
}
