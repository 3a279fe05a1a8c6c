//! Market research ahead of round 1.
//!
//! One model call turns the brief into industry, competitor, and audience
//! insights. The rendered insights are appended to the brief so every round
//! of generation sees them. Research is enrichment: when it fails the
//! session starts from the plain brief.

use crate::llm::parse_json_reply;
use crate::telemetry;
use brand_core::{BrandError, Llm, LlmRequest, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{Instrument, info, warn};

const RESEARCH_STAGE: &str = "research";

const RESEARCH_INSTRUCTION: &str = r#"You are a brand strategist preparing a naming brief.

Study the product brief and report what a naming team needs to know:

1. The industry: its defining traits, market dynamics, common terminology, and current trends
2. Competitor naming: which strategies competitors use, a few names that work and why, and overused patterns
3. The audience: who they are, what they respond to, and how they like to be addressed
4. Recommendations: naming strategies to try, keywords worth exploring, and cliches to avoid

Be concrete and brief. Do not invent market statistics.

## Output

Reply with JSON only:
{
  "industry_analysis": {"key_characteristics": [], "market_dynamics": "", "terminology": [], "trends": []},
  "competitor_patterns": {"common_strategies": [], "successful_examples": [{"brand": "", "why_it_works": ""}], "patterns_to_avoid": []},
  "audience_insights": {"demographics": "", "preferences": [], "communication_style": ""},
  "recommendations": {"suggested_strategies": [], "keywords_to_explore": [], "avoid": []}
}
"#;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndustryAnalysis {
    pub key_characteristics: Vec<String>,
    pub market_dynamics: String,
    pub terminology: Vec<String>,
    pub trends: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitorExample {
    pub brand: String,
    pub why_it_works: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitorPatterns {
    pub common_strategies: Vec<String>,
    pub successful_examples: Vec<CompetitorExample>,
    pub patterns_to_avoid: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudienceInsights {
    pub demographics: String,
    pub preferences: Vec<String>,
    pub communication_style: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recommendations {
    pub suggested_strategies: Vec<String>,
    pub keywords_to_explore: Vec<String>,
    pub avoid: Vec<String>,
}

/// Parsed research reply. Missing sections default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchInsights {
    #[serde(rename = "industry_analysis")]
    pub industry: IndustryAnalysis,
    #[serde(rename = "competitor_patterns")]
    pub competitors: CompetitorPatterns,
    #[serde(rename = "audience_insights")]
    pub audience: AudienceInsights,
    pub recommendations: Recommendations,
}

fn push_line(out: &mut Vec<String>, label: &str, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        out.push(format!("{}: {}", label, value));
    }
}

fn push_list(out: &mut Vec<String>, label: &str, items: &[String]) {
    let items: Vec<&str> = items.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
    if !items.is_empty() {
        out.push(format!("{}: {}", label, items.join(", ")));
    }
}

impl ResearchInsights {
    /// The brief section, one line per non-empty insight.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        push_list(&mut lines, "Industry traits", &self.industry.key_characteristics);
        push_line(&mut lines, "Market", &self.industry.market_dynamics);
        push_list(&mut lines, "Terminology", &self.industry.terminology);
        push_list(&mut lines, "Trends", &self.industry.trends);
        push_list(&mut lines, "Competitor strategies", &self.competitors.common_strategies);
        let examples: Vec<String> = self
            .competitors
            .successful_examples
            .iter()
            .filter(|e| !e.brand.trim().is_empty())
            .map(|e| match e.why_it_works.trim() {
                "" => e.brand.trim().to_string(),
                why => format!("{} ({})", e.brand.trim(), why),
            })
            .collect();
        push_list(&mut lines, "Competitor names that work", &examples);
        push_list(&mut lines, "Overused patterns", &self.competitors.patterns_to_avoid);
        push_line(&mut lines, "Audience", &self.audience.demographics);
        push_list(&mut lines, "Audience preferences", &self.audience.preferences);
        push_line(&mut lines, "Audience voice", &self.audience.communication_style);
        push_list(&mut lines, "Strategies to try", &self.recommendations.suggested_strategies);
        push_list(&mut lines, "Keywords to explore", &self.recommendations.keywords_to_explore);
        push_list(&mut lines, "Avoid", &self.recommendations.avoid);

        if lines.is_empty() {
            String::new()
        } else {
            format!("## Research\n{}", lines.join("\n"))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.render().is_empty()
    }
}

pub struct BrandResearcher {
    llm: Arc<dyn Llm>,
    temperature: f32,
}

impl BrandResearcher {
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm, temperature: 0.4 }
    }

    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Researches `brief`. An unparseable or empty reply is retried once.
    pub async fn research(&self, brief: &str) -> Result<ResearchInsights> {
        async {
            match self.attempt(brief).await {
                Err(first) if first.is_malformed_output() => {
                    warn!(error = %first, "retrying malformed research reply");
                    self.attempt(brief).await
                }
                other => other,
            }
        }
        .instrument(telemetry::research_span())
        .await
    }

    /// The brief with the research section appended, or the brief unchanged
    /// when research fails.
    pub async fn enrich_brief(&self, brief: &str) -> String {
        match self.research(brief).await {
            Ok(insights) => {
                info!(lines = insights.render().lines().count(), "research added to brief");
                format!("{}\n\n{}", brief.trim_end(), insights.render())
            }
            Err(e) => {
                warn!(error = %e, "research unavailable; continuing with the plain brief");
                brief.to_string()
            }
        }
    }

    async fn attempt(&self, brief: &str) -> Result<ResearchInsights> {
        let response = self
            .llm
            .generate_text(
                LlmRequest::new(format!("## Brief\n{}", brief))
                    .with_system_instruction(RESEARCH_INSTRUCTION)
                    .with_temperature(self.temperature)
                    .json(),
            )
            .await?;
        let insights: ResearchInsights = parse_json_reply(RESEARCH_STAGE, &response.text)?;
        if insights.is_empty() {
            return Err(BrandError::malformed(RESEARCH_STAGE, "reply has no insights"));
        }
        Ok(insights)
    }
}
