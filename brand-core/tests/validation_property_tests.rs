//! Property-based tests for the validation pass policy.

use brand_core::{
    CheckOutcome, DEFAULT_PASS_RATIO, DomainStatus, TrademarkReport, TrademarkRisk,
    ValidationReport, ValidationResult, Verdict,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

// ============================================================================
// Generators
// ============================================================================

fn arb_risk() -> impl Strategy<Value = TrademarkRisk> {
    prop_oneof![
        Just(TrademarkRisk::Low),
        Just(TrademarkRisk::Medium),
        Just(TrademarkRisk::High),
        Just(TrademarkRisk::Critical),
    ]
}

/// (trademark risk, domain available) for a fully assessable candidate.
fn arb_assessable() -> impl Strategy<Value = (TrademarkRisk, bool)> {
    (arb_risk(), any::<bool>())
}

fn assessable(risk: TrademarkRisk, domain_available: bool) -> ValidationResult {
    let status = if domain_available { DomainStatus::Available } else { DomainStatus::Taken };
    let mut domains = BTreeMap::new();
    domains.insert(".com".to_string(), DomainStatus::Taken);
    domains.insert(".io".to_string(), status);
    ValidationResult {
        domain_status: CheckOutcome::Completed(domains),
        trademark: CheckOutcome::Completed(TrademarkReport { risk, conflicts: vec![] }),
        seo_score: CheckOutcome::Completed(50.0),
    }
}

fn unavailable() -> ValidationResult {
    ValidationResult {
        domain_status: CheckOutcome::Unavailable("timeout".into()),
        trademark: CheckOutcome::Unavailable("timeout".into()),
        seo_score: CheckOutcome::Unavailable("timeout".into()),
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// For any fully assessable set, `set_passed` holds exactly when at least
    /// half pass and some candidate has an available domain.
    #[test]
    fn prop_set_pass_is_proportional(items in prop::collection::vec(arb_assessable(), 1..12)) {
        let results: BTreeMap<String, ValidationResult> = items
            .iter()
            .enumerate()
            .map(|(i, (risk, avail))| (format!("Name{i}"), assessable(*risk, *avail)))
            .collect();
        let report = ValidationReport::from_results(results, DEFAULT_PASS_RATIO);

        let n = items.len();
        let p = items.iter().filter(|(risk, avail)| risk.is_acceptable() && *avail).count();
        let any_domain = items.iter().any(|(_, avail)| *avail);

        prop_assert_eq!(report.assessed, n);
        prop_assert_eq!(report.passed, p);
        prop_assert_eq!(report.set_passed, 2 * p >= n && any_domain);
    }

    /// A single candidate whose checks all failed is excluded from the ratio.
    #[test]
    fn prop_unavailable_candidate_is_isolated(
        items in prop::collection::vec(arb_assessable(), 1..10),
        position in 0usize..10,
    ) {
        let mut results: BTreeMap<String, ValidationResult> = items
            .iter()
            .enumerate()
            .map(|(i, (risk, avail))| (format!("Name{i:02}"), assessable(*risk, *avail)))
            .collect();
        let baseline = ValidationReport::from_results(results.clone(), DEFAULT_PASS_RATIO);

        results.insert(format!("Broken{position}"), unavailable());
        let report = ValidationReport::from_results(results, DEFAULT_PASS_RATIO);

        prop_assert_eq!(report.assessed, items.len());
        prop_assert_eq!(report.passed, baseline.passed);
        prop_assert_eq!(report.set_passed, baseline.set_passed);
        prop_assert_eq!(report.names_with(Verdict::Indeterminate).len(), 1);
    }
}

#[test]
fn test_all_unavailable_never_passes() {
    let mut results = BTreeMap::new();
    results.insert("Acme".to_string(), unavailable());
    results.insert("Zenith".to_string(), unavailable());
    let report = ValidationReport::from_results(results, DEFAULT_PASS_RATIO);
    assert_eq!(report.assessed, 0);
    assert!(!report.set_passed);
    assert_eq!(report.pass_ratio(), None);
}
