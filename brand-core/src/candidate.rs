use crate::error::{BrandError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a candidate name was constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    Portmanteau,
    Descriptive,
    Invented,
    Acronym,
}

impl NamingStrategy {
    pub const ALL: [NamingStrategy; 4] =
        [Self::Portmanteau, Self::Descriptive, Self::Invented, Self::Acronym];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Portmanteau => "portmanteau",
            Self::Descriptive => "descriptive",
            Self::Invented => "invented",
            Self::Acronym => "acronym",
        }
    }
}

impl fmt::Display for NamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamingStrategy {
    type Err = BrandError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portmanteau" | "compound" | "blend" => Ok(Self::Portmanteau),
            "descriptive" | "evocative" | "metaphorical" => Ok(Self::Descriptive),
            "invented" | "neologism" | "coined" | "abstract" => Ok(Self::Invented),
            "acronym" | "abbreviation" | "initialism" => Ok(Self::Acronym),
            other => Err(BrandError::malformed(
                "naming strategy",
                format!("unknown strategy '{}'", other),
            )),
        }
    }
}

/// A proposed brand name with its rationale and tagline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCandidate {
    pub name: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub tagline: String,
    pub strategy: NamingStrategy,
}

impl NameCandidate {
    pub fn new(name: impl Into<String>, strategy: NamingStrategy) -> Self {
        Self { name: name.into(), rationale: String::new(), tagline: String::new(), strategy }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = rationale.into();
        self
    }

    pub fn with_tagline(mut self, tagline: impl Into<String>) -> Self {
        self.tagline = tagline.into();
        self
    }

    /// Case-insensitive name comparison used for dedup and selection lookups.
    pub fn is_named(&self, name: &str) -> bool {
        name_key(&self.name) == name_key(name)
    }
}

/// Normalized key under which two names are considered the same.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}
