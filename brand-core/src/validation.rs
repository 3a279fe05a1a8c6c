//! Validation results and the pass policy.
//!
//! A candidate passes when its trademark risk is low or medium and at least
//! one TLD is available. A check that could not run is recorded as
//! [`CheckOutcome::Unavailable`], which makes the verdict indeterminate when
//! the pass rule depends on it. Indeterminate candidates are left out of the
//! aggregate ratio.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default fraction of assessed candidates that must pass.
pub const DEFAULT_PASS_RATIO: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Domain,
    Trademark,
    Seo,
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Domain => "domain",
            Self::Trademark => "trademark",
            Self::Seo => "seo",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainStatus {
    Available,
    Taken,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrademarkRisk {
    Low,
    Medium,
    High,
    Critical,
}

impl TrademarkRisk {
    pub fn is_acceptable(&self) -> bool {
        matches!(self, Self::Low | Self::Medium)
    }
}

impl fmt::Display for TrademarkRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrademarkConflict {
    pub mark: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub exact: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrademarkReport {
    pub risk: TrademarkRisk,
    #[serde(default)]
    pub conflicts: Vec<TrademarkConflict>,
}

impl TrademarkReport {
    pub fn clear() -> Self {
        Self { risk: TrademarkRisk::Low, conflicts: Vec::new() }
    }
}

/// Result of one external check: either a value or the reason it could not run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum CheckOutcome<T> {
    Completed(T),
    Unavailable(String),
}

impl<T> CheckOutcome<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Unavailable(_) => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Fail,
    Indeterminate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub domain_status: CheckOutcome<BTreeMap<String, DomainStatus>>,
    pub trademark: CheckOutcome<TrademarkReport>,
    pub seo_score: CheckOutcome<f64>,
}

impl ValidationResult {
    pub fn trademark_risk(&self) -> Option<TrademarkRisk> {
        self.trademark.completed().map(|report| report.risk)
    }

    pub fn seo(&self) -> Option<f64> {
        self.seo_score.completed().copied()
    }

    pub fn available_tlds(&self) -> Vec<&str> {
        match &self.domain_status {
            CheckOutcome::Completed(map) => map
                .iter()
                .filter(|(_, status)| **status == DomainStatus::Available)
                .map(|(tld, _)| tld.as_str())
                .collect(),
            CheckOutcome::Unavailable(_) => Vec::new(),
        }
    }

    pub fn has_available_domain(&self) -> bool {
        !self.available_tlds().is_empty()
    }

    /// `Some(true)` when a TLD is available, `Some(false)` when every TLD is
    /// known taken, `None` when that cannot be decided.
    fn domain_criterion(&self) -> Option<bool> {
        let map = self.domain_status.completed()?;
        if map.values().any(|s| *s == DomainStatus::Available) {
            Some(true)
        } else if !map.is_empty() && map.values().all(|s| *s == DomainStatus::Taken) {
            Some(false)
        } else {
            None
        }
    }

    pub fn verdict(&self) -> Verdict {
        let trademark = self.trademark_risk().map(|risk| risk.is_acceptable());
        match (trademark, self.domain_criterion()) {
            (Some(false), _) | (_, Some(false)) => Verdict::Fail,
            (Some(true), Some(true)) => Verdict::Pass,
            _ => Verdict::Indeterminate,
        }
    }

    /// Derived pass flag; `None` when indeterminate.
    pub fn passed(&self) -> Option<bool> {
        match self.verdict() {
            Verdict::Pass => Some(true),
            Verdict::Fail => Some(false),
            Verdict::Indeterminate => None,
        }
    }

    pub fn unavailable_checks(&self) -> Vec<CheckKind> {
        let mut kinds = Vec::new();
        if self.domain_status.is_unavailable() {
            kinds.push(CheckKind::Domain);
        }
        if self.trademark.is_unavailable() {
            kinds.push(CheckKind::Trademark);
        }
        if self.seo_score.is_unavailable() {
            kinds.push(CheckKind::Seo);
        }
        kinds
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub results: BTreeMap<String, ValidationResult>,
    pub set_passed: bool,
    pub assessed: usize,
    pub passed: usize,
}

impl ValidationReport {
    pub fn from_results(results: BTreeMap<String, ValidationResult>, pass_ratio: f64) -> Self {
        let mut assessed = 0;
        let mut passed = 0;
        for result in results.values() {
            match result.verdict() {
                Verdict::Pass => {
                    assessed += 1;
                    passed += 1;
                }
                Verdict::Fail => assessed += 1,
                Verdict::Indeterminate => {}
            }
        }
        let any_domain = results.values().any(ValidationResult::has_available_domain);
        Self {
            set_passed: set_passes(passed, assessed, any_domain, pass_ratio),
            results,
            assessed,
            passed,
        }
    }

    pub fn pass_ratio(&self) -> Option<f64> {
        (self.assessed > 0).then(|| self.passed as f64 / self.assessed as f64)
    }

    pub fn names_with(&self, verdict: Verdict) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, result)| result.verdict() == verdict)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Aggregate rule. Zero assessed candidates never pass.
pub fn set_passes(passed: usize, assessed: usize, any_domain_available: bool, ratio: f64) -> bool {
    assessed > 0 && passed as f64 >= ratio * assessed as f64 && any_domain_available
}
