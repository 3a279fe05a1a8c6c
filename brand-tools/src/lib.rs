//! # brand-tools
//!
//! Capability implementations used by the Brand Studio validator.
//!
//! - [`WhoisDomainChecker`] - port-43 WHOIS lookups, three-valued per TLD
//! - [`CachedDomainChecker`] / [`DomainCache`] - shared TTL cache in front of any checker
//! - [`HeuristicTrademarkChecker`] - screening against known marks and crowded patterns
//! - [`HeuristicSeoScorer`] - offline 0-100 score from length, spelling and tagline echo
//!
//! ```rust,no_run
//! use brand_tools::{CachedDomainChecker, DomainCache, WhoisDomainChecker, default_tlds};
//! use brand_core::DomainChecker;
//!
//! # async fn run() -> brand_core::Result<()> {
//! let checker = CachedDomainChecker::new(WhoisDomainChecker::new(), DomainCache::default());
//! let statuses = checker.check_domains("Zenith", &default_tlds()).await?;
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod seo;
pub mod trademark;

pub use domain::{
    CachedDomainChecker, DEFAULT_CACHE_TTL, DEFAULT_TLDS, DOMAIN_PREFIXES, DomainAlternatives,
    DomainCache, MAX_LABEL_LEN, WhoisDomainChecker, classify_whois_response, default_tlds,
    domain_label, find_alternatives, is_valid_label, normalize_tld,
};
pub use seo::{HeuristicSeoScorer, SeoBreakdown};
pub use trademark::{CROWDED_PATTERNS, HeuristicTrademarkChecker, KnownMark, assess_trademark_risk};
