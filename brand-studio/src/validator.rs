//! Candidate validation: domain, trademark, and SEO checks per name.
//!
//! The three checks for a name run concurrently, each under its own
//! timeout. Names fan out with bounded concurrency. A failed or timed-out
//! check is recorded as unavailable for that name only and never fails the
//! batch.

use crate::config::ValidationConfig;
use crate::telemetry;
use brand_core::{
    BrandError, CheckKind, CheckOutcome, DomainChecker, Result, SeoScorer, TrademarkChecker,
    ValidationReport, ValidationResult, name_key,
};
use futures::StreamExt;
use futures::stream;
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

pub struct Validator {
    domains: Arc<dyn DomainChecker>,
    trademarks: Arc<dyn TrademarkChecker>,
    seo: Arc<dyn SeoScorer>,
    tlds: Vec<String>,
    check_timeout: Duration,
    concurrency: usize,
    pass_ratio: f64,
}

impl Validator {
    pub fn new(
        domains: Arc<dyn DomainChecker>,
        trademarks: Arc<dyn TrademarkChecker>,
        seo: Arc<dyn SeoScorer>,
        config: &ValidationConfig,
    ) -> Self {
        Self {
            domains,
            trademarks,
            seo,
            tlds: config.tlds.clone(),
            check_timeout: config.check_timeout(),
            concurrency: config.concurrency.max(1),
            pass_ratio: config.pass_ratio,
        }
    }

    #[must_use]
    pub fn with_tlds(mut self, tlds: Vec<String>) -> Self {
        self.tlds = tlds;
        self
    }

    pub fn tlds(&self) -> &[String] {
        &self.tlds
    }

    /// Validates `(name, tagline)` pairs. Names are compared
    /// case-insensitively and each distinct name is checked once.
    pub async fn validate(&self, names: &[(String, String)]) -> Result<ValidationReport> {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for (name, tagline) in names {
            let name = name.trim();
            if name.is_empty() {
                return Err(BrandError::selection("cannot validate an empty name"));
            }
            if seen.insert(name_key(name)) {
                unique.push((name.to_string(), tagline.clone()));
            }
        }
        if unique.is_empty() {
            return Err(BrandError::selection("validation requires at least one name"));
        }

        let span = telemetry::validation_span(unique.len());
        let results: BTreeMap<String, ValidationResult> = stream::iter(unique)
            .map(|(name, tagline)| async move {
                let result = self.validate_one(&name, &tagline).await;
                (name, result)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .instrument(span)
            .await;

        Ok(ValidationReport::from_results(results, self.pass_ratio))
    }

    /// Runs all three checks for a single name.
    pub async fn validate_one(&self, name: &str, tagline: &str) -> ValidationResult {
        let (domain_status, trademark, seo_score) = tokio::join!(
            self.guarded(name, CheckKind::Domain, self.domains.check_domains(name, &self.tlds)),
            self.guarded(name, CheckKind::Trademark, self.trademarks.check_trademark(name)),
            self.guarded(name, CheckKind::Seo, async {
                let score = self.seo.score_seo(name, tagline).await?;
                if score.is_finite() {
                    Ok(score.clamp(0.0, 100.0))
                } else {
                    Err(BrandError::model(format!("SEO scorer returned {}", score)))
                }
            }),
        );
        ValidationResult { domain_status, trademark, seo_score }
    }

    async fn guarded<T, F>(&self, name: &str, check: CheckKind, check_future: F) -> CheckOutcome<T>
    where
        F: Future<Output = Result<T>>,
    {
        let outcome = tokio::time::timeout(self.check_timeout, check_future)
            .instrument(telemetry::check_span(name, check))
            .await;
        let reason = match outcome {
            Ok(Ok(value)) => return CheckOutcome::Completed(value),
            Ok(Err(error)) => error.to_string(),
            Err(_) => format!("timed out after {} ms", self.check_timeout.as_millis()),
        };
        let unavailable = BrandError::check_unavailable(name, check, reason);
        let message = unavailable.to_string();
        telemetry::log_check_unavailable(name, check, &message);
        CheckOutcome::Unavailable(message)
    }
}
