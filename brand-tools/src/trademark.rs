//! Heuristic trademark screening.
//!
//! Compares a name against a list of known marks and against crowded naming
//! patterns. This is a screening aid, not a legal search.

use async_trait::async_trait;
use brand_core::{Result, TrademarkChecker, TrademarkConflict, TrademarkReport, TrademarkRisk};
use tracing::debug;

/// Word fragments common enough in tech marks that a name using them is likely to collide.
pub const CROWDED_PATTERNS: [&str; 14] = [
    "tech", "soft", "cloud", "data", "cyber", "digi", "smart", "net", "web", "app", "link", "sync",
    "flow", "wave",
];

const ACTIVE_STATUSES: [&str; 2] = ["LIVE", "REGISTERED"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownMark {
    pub mark: String,
    pub status: String,
    pub owner: Option<String>,
}

impl KnownMark {
    pub fn live(mark: impl Into<String>, owner: impl Into<String>) -> Self {
        Self { mark: mark.into(), status: "LIVE".into(), owner: Some(owner.into()) }
    }

    pub fn dead(mark: impl Into<String>) -> Self {
        Self { mark: mark.into(), status: "DEAD".into(), owner: None }
    }

    pub fn is_active(&self) -> bool {
        ACTIVE_STATUSES.contains(&self.status.to_uppercase().as_str())
    }
}

/// Risk table: an active exact match is critical; any exact match or five
/// similar marks is high; two to four similar marks is medium; otherwise low.
pub fn assess_trademark_risk(conflicts: &[TrademarkConflict]) -> TrademarkRisk {
    let exact: Vec<_> = conflicts.iter().filter(|c| c.exact).collect();
    let similar = conflicts.len() - exact.len();

    if exact.iter().any(|c| ACTIVE_STATUSES.contains(&c.status.as_str())) {
        TrademarkRisk::Critical
    } else if !exact.is_empty() || similar >= 5 {
        TrademarkRisk::High
    } else if similar >= 2 {
        TrademarkRisk::Medium
    } else {
        TrademarkRisk::Low
    }
}

/// Two keys of four or more characters starting with the same four.
fn shares_stem(a: &str, b: &str) -> bool {
    a.chars().count() >= 4 && b.chars().count() >= 4 && a.chars().take(4).eq(b.chars().take(4))
}

fn mark_key(mark: &str) -> String {
    mark.chars().filter(|c| c.is_alphanumeric()).flat_map(char::to_uppercase).collect()
}

#[derive(Debug, Clone, Default)]
pub struct HeuristicTrademarkChecker {
    known_marks: Vec<KnownMark>,
}

impl HeuristicTrademarkChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_known_marks(mut self, marks: impl IntoIterator<Item = KnownMark>) -> Self {
        self.known_marks.extend(marks);
        self
    }

    /// All conflicts for `name`, exact matches first.
    pub fn conflicts(&self, name: &str) -> Vec<TrademarkConflict> {
        let key = mark_key(name);
        if key.is_empty() {
            return Vec::new();
        }
        let mut conflicts = Vec::new();

        for known in &self.known_marks {
            let known_key = mark_key(&known.mark);
            if known_key.is_empty() {
                continue;
            }
            let exact = known_key == key;
            let similar = !exact
                && (known_key.contains(&key)
                    || key.contains(&known_key)
                    || shares_stem(&key, &known_key));
            if exact || similar {
                conflicts.push(TrademarkConflict {
                    mark: known.mark.to_uppercase(),
                    status: known.status.to_uppercase(),
                    owner: known.owner.clone(),
                    exact,
                });
            }
        }

        let lower = key.to_lowercase();
        let char_count = name.trim().chars().count();
        if char_count > 4 && CROWDED_PATTERNS.iter().any(|p| lower.contains(p)) {
            conflicts.push(TrademarkConflict {
                mark: format!("{} SYSTEMS", key),
                status: "LIVE".into(),
                owner: None,
                exact: false,
            });
        }
        if char_count <= 5 {
            conflicts.push(TrademarkConflict {
                mark: format!("{}X", key),
                status: "REGISTERED".into(),
                owner: None,
                exact: false,
            });
        }

        conflicts.sort_by_key(|c| !c.exact);
        conflicts
    }
}

#[async_trait]
impl TrademarkChecker for HeuristicTrademarkChecker {
    async fn check_trademark(&self, name: &str) -> Result<TrademarkReport> {
        let conflicts = self.conflicts(name);
        let risk = assess_trademark_risk(&conflicts);
        debug!(name = %name, %risk, conflicts = conflicts.len(), "trademark screen");
        Ok(TrademarkReport { risk, conflicts })
    }
}
