//! The product brief every session is anchored to.

use brand_core::{BrandError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Playful,
    #[default]
    Professional,
    Innovative,
    Luxury,
}

impl Personality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Personality::Playful => "playful",
            Personality::Professional => "professional",
            Personality::Innovative => "innovative",
            Personality::Luxury => "luxury",
        }
    }

    /// Voice guidance handed to the model alongside the personality label.
    pub fn voice(&self) -> &'static str {
        match self {
            Personality::Playful => "fun, approachable, energetic",
            Personality::Professional => "trustworthy, credible, established",
            Personality::Innovative => "forward-thinking, disruptive, cutting-edge",
            Personality::Luxury => "premium, exclusive, sophisticated",
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Personality {
    type Err = BrandError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "playful" | "fun" => Ok(Personality::Playful),
            "professional" | "corporate" => Ok(Personality::Professional),
            "innovative" | "tech" => Ok(Personality::Innovative),
            "luxury" | "premium" => Ok(Personality::Luxury),
            other => Err(BrandError::Config(format!(
                "unknown brand personality '{}'; \
                 expected playful, professional, innovative, or luxury",
                other
            ))),
        }
    }
}

/// What is being named and for whom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandBrief {
    pub product: String,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub personality: Personality,
    #[serde(default)]
    pub industry: Option<String>,
}

impl BrandBrief {
    pub fn new(product: impl Into<String>) -> Result<Self> {
        let product = product.into().trim().to_string();
        if product.is_empty() {
            return Err(BrandError::Config("product description is required".to_string()));
        }
        Ok(Self { product, audience: None, personality: Personality::default(), industry: None })
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = non_blank(audience.into());
        self
    }

    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = non_blank(industry.into());
        self
    }

    /// Renders the brief as the text stored on the session and sent to the model.
    pub fn render(&self) -> String {
        let mut lines = vec![format!("Product: {}", self.product)];
        if let Some(audience) = &self.audience {
            lines.push(format!("Target audience: {}", audience));
        }
        lines.push(format!(
            "Brand personality: {} ({})",
            self.personality,
            self.personality.voice()
        ));
        if let Some(industry) = &self.industry {
            lines.push(format!("Industry: {}", industry));
        }
        lines.join("\n")
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_full_brief() {
        let brief = BrandBrief::new("AI meal planning app")
            .unwrap()
            .with_audience("busy parents")
            .with_personality(Personality::Playful)
            .with_industry("food tech");

        assert_eq!(
            brief.render(),
            "Product: AI meal planning app\n\
             Target audience: busy parents\n\
             Brand personality: playful (fun, approachable, energetic)\n\
             Industry: food tech"
        );
    }

    #[test]
    fn test_blank_fields_are_omitted() {
        let brief = BrandBrief::new("  budgeting tool ").unwrap().with_audience("  ");
        assert_eq!(brief.product, "budgeting tool");
        assert!(brief.audience.is_none());
        assert!(!brief.render().contains("Target audience"));
        assert!(BrandBrief::new("   ").is_err());
    }

    #[test]
    fn test_personality_parsing() {
        assert_eq!("Luxury".parse::<Personality>().unwrap(), Personality::Luxury);
        assert_eq!("tech".parse::<Personality>().unwrap(), Personality::Innovative);
        assert!("grumpy".parse::<Personality>().is_err());
    }
}
