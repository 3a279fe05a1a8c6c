use async_trait::async_trait;
use brand_core::{Result, SeoScorer};
use serde::Serialize;
use tracing::debug;

/// Component scores; their sum is the SEO score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeoBreakdown {
    /// 0..=30
    pub keyword: f64,
    /// 0..=25
    pub brandability: f64,
    /// 0..=20
    pub search: f64,
    /// 0..=15
    pub memorability: f64,
    /// 0..=10
    pub domain_fit: f64,
}

impl SeoBreakdown {
    pub fn total(&self) -> f64 {
        (self.keyword + self.brandability + self.search + self.memorability + self.domain_fit)
            .clamp(0.0, 100.0)
    }
}

/// Offline scorer built from spelling and length heuristics.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSeoScorer;

impl HeuristicSeoScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn breakdown(&self, name: &str, tagline: &str) -> SeoBreakdown {
        let letters: Vec<char> =
            name.chars().filter(|c| c.is_alphabetic()).flat_map(char::to_lowercase).collect();
        let len = letters.len();

        SeoBreakdown {
            keyword: keyword_score(&letters, tagline),
            brandability: match len {
                5..=8 => 25.0,
                4 | 9 | 10 => 18.0,
                3 | 11 | 12 => 10.0,
                0 => 0.0,
                _ => 5.0,
            },
            search: search_score(&letters),
            memorability: memorability_score(&letters),
            domain_fit: if name.chars().all(|c| c.is_ascii_alphanumeric()) && !name.is_empty() {
                10.0
            } else if name.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-') {
                6.0
            } else {
                2.0
            },
        }
    }
}

/// Rewards names that echo a word from the tagline.
fn keyword_score(letters: &[char], tagline: &str) -> f64 {
    let name: String = letters.iter().collect();
    if name.is_empty() {
        return 0.0;
    }
    let mut best = 5.0;
    for word in tagline.split(|c: char| !c.is_alphabetic()).filter(|w| w.chars().count() >= 3) {
        let word = word.to_lowercase();
        if word.chars().count() >= 4 && name.contains(&word) {
            return 30.0;
        }
        let stem: String = word.chars().take(4).collect();
        if stem.chars().count() == 4 && name.contains(&stem) {
            best = f64::max(best, 22.0);
        } else {
            let short: String = word.chars().take(3).collect();
            if name.contains(&short) {
                best = f64::max(best, 14.0);
            }
        }
    }
    best
}

/// Distinct letters relative to length; repetitive names are harder to find.
fn search_score(letters: &[char]) -> f64 {
    if letters.is_empty() {
        return 0.0;
    }
    let mut distinct = letters.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    let ratio = distinct.len() as f64 / letters.len() as f64;
    if ratio >= 0.7 {
        20.0
    } else if ratio >= 0.5 {
        14.0
    } else {
        8.0
    }
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y')
}

/// Pronounceability: balanced vowels and no long consonant clusters.
fn memorability_score(letters: &[char]) -> f64 {
    if letters.is_empty() {
        return 0.0;
    }
    let vowels = letters.iter().filter(|c| is_vowel(**c)).count();
    let ratio = vowels as f64 / letters.len() as f64;
    let mut score: f64 = if (0.3..=0.6).contains(&ratio) { 15.0 } else { 9.0 };

    let mut run = 0;
    let mut longest = 0;
    for c in letters {
        if is_vowel(*c) {
            run = 0;
        } else {
            run += 1;
            longest = longest.max(run);
        }
    }
    if longest >= 4 {
        score -= 6.0;
    } else if longest == 3 {
        score -= 3.0;
    }
    score.max(0.0)
}

#[async_trait]
impl SeoScorer for HeuristicSeoScorer {
    async fn score_seo(&self, name: &str, tagline: &str) -> Result<f64> {
        let breakdown = self.breakdown(name, tagline);
        let score = breakdown.total();
        debug!(name = %name, score, "seo score");
        Ok(score)
    }
}
