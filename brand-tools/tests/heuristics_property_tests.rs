//! Property tests for the offline heuristics and domain helpers.

use brand_core::TrademarkRisk;
use brand_tools::{
    HeuristicSeoScorer, HeuristicTrademarkChecker, KnownMark, assess_trademark_risk,
    domain_label, normalize_tld,
};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn seo_score_stays_in_range(name in "\\PC{0,24}", tagline in "\\PC{0,60}") {
        let total = HeuristicSeoScorer::new().breakdown(&name, &tagline).total();
        prop_assert!((0.0..=100.0).contains(&total), "{name:?}: {total}");
    }

    #[test]
    fn domain_labels_are_hostname_safe(name in "\\PC{0,30}") {
        let label = domain_label(&name);
        prop_assert!(
            label.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()),
            "{label:?}"
        );
    }

    #[test]
    fn tld_normalization_is_idempotent(tld in "\\.?[a-zA-Z]{2,6}") {
        let once = normalize_tld(&tld);
        prop_assert!(once.starts_with('.'));
        prop_assert_eq!(normalize_tld(&once), once);
    }

    #[test]
    fn exact_matches_lead_and_raise_risk(mark in "[A-Z][a-z]{5,9}") {
        let checker = HeuristicTrademarkChecker::new()
            .with_known_marks([KnownMark::live(mark.clone(), "Owner Inc")]);
        let conflicts = checker.conflicts(&mark);
        prop_assert!(conflicts.first().is_some_and(|c| c.exact));
        prop_assert!(assess_trademark_risk(&conflicts) >= TrademarkRisk::High);
    }
}
