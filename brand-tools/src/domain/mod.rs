//! Domain availability over WHOIS.

mod cache;
mod whois;

pub use cache::{CachedDomainChecker, DEFAULT_CACHE_TTL, DomainCache};
pub use whois::{WhoisDomainChecker, classify_whois_response, default_whois_server};

use tracing::debug;

use brand_core::{DomainChecker, DomainStatus, Result};
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;

/// TLDs checked when none are configured.
pub const DEFAULT_TLDS: [&str; 10] =
    [".com", ".ai", ".io", ".so", ".app", ".co", ".is", ".me", ".net", ".to"];

/// Prefixes tried when the bare name is taken everywhere.
pub const DOMAIN_PREFIXES: [&str; 6] = ["get", "try", "your", "my", "hello", "use"];

pub fn default_tlds() -> Vec<String> {
    DEFAULT_TLDS.iter().map(|t| t.to_string()).collect()
}

/// Longest DNS label.
pub const MAX_LABEL_LEN: usize = 63;

/// Hostname label for a brand name: Latin accents folded to ASCII, then
/// everything but `[a-z0-9]` dropped. "Blue Wave" -> "bluewave",
/// "Café Noir" -> "cafenoir", "Fit&Co" -> "fitco".
pub fn domain_label(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .filter_map(fold_to_ascii)
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// True when `label` can be queried as-is.
pub fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && label.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

fn fold_to_ascii(c: char) -> Option<char> {
    if c.is_ascii() {
        return Some(c);
    }
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'ñ' | 'ń' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => 'u',
        'ý' | 'ÿ' => 'y',
        'ś' | 'š' => 's',
        'ź' | 'ż' | 'ž' => 'z',
        'ł' => 'l',
        _ => return None,
    };
    Some(folded)
}

/// Normalizes ".com", "com" and " .COM " to ".com".
pub fn normalize_tld(tld: &str) -> String {
    let trimmed = tld.trim().trim_start_matches('.').to_lowercase();
    format!(".{}", trimmed)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DomainAlternatives {
    /// Full domain (`getacme.com`) to status.
    pub variations: BTreeMap<String, DomainStatus>,
}

impl DomainAlternatives {
    pub fn available(&self) -> impl Iterator<Item = &str> {
        self.variations
            .iter()
            .filter(|(_, status)| **status == DomainStatus::Available)
            .map(|(domain, _)| domain.as_str())
    }
}

/// Checks every prefix variant of `name` across `tlds`.
pub async fn find_alternatives(
    checker: &dyn DomainChecker,
    name: &str,
    tlds: &[String],
) -> Result<DomainAlternatives> {
    let label = domain_label(name);
    if label.is_empty() {
        debug!(name = %name, "no hostname characters; skipping alternatives");
        return Ok(DomainAlternatives::default());
    }
    let lookups = DOMAIN_PREFIXES.iter().map(|prefix| {
        let variant = format!("{}{}", prefix, label);
        async move {
            let statuses = checker.check_domains(&variant, tlds).await;
            (variant, statuses)
        }
    });

    let mut alternatives = DomainAlternatives::default();
    for (variant, statuses) in join_all(lookups).await {
        for (tld, status) in statuses? {
            alternatives.variations.insert(format!("{}{}", variant, tld), status);
        }
    }
    Ok(alternatives)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_label() {
        assert_eq!(domain_label("Blue Wave"), "bluewave");
        assert_eq!(domain_label("Zen-Ith"), "zenith");
    }

    #[test]
    fn test_domain_label_drops_non_hostname_characters() {
        assert_eq!(domain_label("Fit&Co"), "fitco");
        assert_eq!(domain_label("Brand.ly"), "brandly");
        assert_eq!(domain_label("Café Noir"), "cafenoir");
        assert_eq!(domain_label("Über 24/7"), "uber247");
        assert_eq!(domain_label("東京"), "");
    }

    #[test]
    fn test_label_validity() {
        assert!(is_valid_label("fitco"));
        assert!(!is_valid_label(""));
        assert!(!is_valid_label(&"a".repeat(MAX_LABEL_LEN + 1)));
        assert!(!is_valid_label("fit&co"));
    }

    #[test]
    fn test_normalize_tld() {
        assert_eq!(normalize_tld("com"), ".com");
        assert_eq!(normalize_tld(" .AI "), ".ai");
    }
}
