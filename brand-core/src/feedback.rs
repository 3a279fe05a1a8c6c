//! Structured user feedback on a round of candidates.
//!
//! A [`Feedback`] is immutable once built. Every list field is an
//! insertion-ordered set: duplicates (compared case-insensitively) are dropped
//! and the first occurrence wins. Approval feedback always carries at least
//! one selected name; other kinds never carry selections.

use crate::candidate::name_key;
use crate::error::{BrandError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackKind {
    Approve,
    Regenerate,
    Refine,
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Regenerate => "regenerate",
            Self::Refine => "refine",
        }
    }
}

impl fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FeedbackRecord")]
pub struct Feedback {
    #[serde(rename = "type")]
    kind: FeedbackKind,
    liked_names: Vec<String>,
    disliked_names: Vec<String>,
    liked_elements: Vec<String>,
    disliked_elements: Vec<String>,
    liked_patterns: Vec<String>,
    disliked_patterns: Vec<String>,
    new_directions: Vec<String>,
    tone_adjustment: Option<String>,
    free_text: Option<String>,
    selected_names: Vec<String>,
    created_at: DateTime<Utc>,
}

/// Unvalidated wire form; deserialization goes through the builder.
#[derive(Deserialize)]
struct FeedbackRecord {
    #[serde(rename = "type")]
    kind: FeedbackKind,
    #[serde(default)]
    liked_names: Vec<String>,
    #[serde(default)]
    disliked_names: Vec<String>,
    #[serde(default)]
    liked_elements: Vec<String>,
    #[serde(default)]
    disliked_elements: Vec<String>,
    #[serde(default)]
    liked_patterns: Vec<String>,
    #[serde(default)]
    disliked_patterns: Vec<String>,
    #[serde(default)]
    new_directions: Vec<String>,
    #[serde(default)]
    tone_adjustment: Option<String>,
    #[serde(default)]
    free_text: Option<String>,
    #[serde(default)]
    selected_names: Vec<String>,
    #[serde(default = "Utc::now")]
    created_at: DateTime<Utc>,
}

impl TryFrom<FeedbackRecord> for Feedback {
    type Error = BrandError;

    fn try_from(record: FeedbackRecord) -> Result<Self> {
        let mut builder = FeedbackBuilder::new(record.kind)
            .liked_names(record.liked_names)
            .disliked_names(record.disliked_names)
            .liked_elements(record.liked_elements)
            .disliked_elements(record.disliked_elements)
            .liked_patterns(record.liked_patterns)
            .disliked_patterns(record.disliked_patterns)
            .new_directions(record.new_directions)
            .selected_names(record.selected_names);
        if let Some(tone) = record.tone_adjustment {
            builder = builder.tone_adjustment(tone);
        }
        if let Some(text) = record.free_text {
            builder = builder.free_text(text);
        }
        let mut feedback = builder.build()?;
        feedback.created_at = record.created_at;
        Ok(feedback)
    }
}

impl Feedback {
    pub fn builder(kind: FeedbackKind) -> FeedbackBuilder {
        FeedbackBuilder::new(kind)
    }

    /// Approval of the given names. Fails when no name survives trimming.
    pub fn approve<I, S>(selected: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FeedbackBuilder::new(FeedbackKind::Approve).selected_names(selected).build()
    }

    /// A request for a fresh batch, optionally with a free-text note.
    pub fn regenerate(free_text: Option<String>) -> Self {
        let mut feedback = Self::empty(FeedbackKind::Regenerate);
        feedback.free_text = free_text.and_then(clean);
        feedback
    }

    pub fn refine() -> FeedbackBuilder {
        FeedbackBuilder::new(FeedbackKind::Refine)
    }

    fn empty(kind: FeedbackKind) -> Self {
        Self {
            kind,
            liked_names: Vec::new(),
            disliked_names: Vec::new(),
            liked_elements: Vec::new(),
            disliked_elements: Vec::new(),
            liked_patterns: Vec::new(),
            disliked_patterns: Vec::new(),
            new_directions: Vec::new(),
            tone_adjustment: None,
            free_text: None,
            selected_names: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> FeedbackKind {
        self.kind
    }

    pub fn is_approval(&self) -> bool {
        self.kind == FeedbackKind::Approve
    }

    pub fn liked_names(&self) -> &[String] {
        &self.liked_names
    }

    pub fn disliked_names(&self) -> &[String] {
        &self.disliked_names
    }

    pub fn liked_elements(&self) -> &[String] {
        &self.liked_elements
    }

    pub fn disliked_elements(&self) -> &[String] {
        &self.disliked_elements
    }

    pub fn liked_patterns(&self) -> &[String] {
        &self.liked_patterns
    }

    pub fn disliked_patterns(&self) -> &[String] {
        &self.disliked_patterns
    }

    pub fn new_directions(&self) -> &[String] {
        &self.new_directions
    }

    pub fn tone_adjustment(&self) -> Option<&str> {
        self.tone_adjustment.as_deref()
    }

    pub fn free_text(&self) -> Option<&str> {
        self.free_text.as_deref()
    }

    pub fn selected_names(&self) -> &[String] {
        &self.selected_names
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Names this feedback refers to, which must all exist in the round it answers.
    pub fn referenced_names(&self) -> impl Iterator<Item = &String> {
        self.selected_names.iter().chain(&self.liked_names).chain(&self.disliked_names)
    }

    /// Renders this feedback as generator guidance.
    ///
    /// Pure and deterministic: the timestamp is not part of the output and
    /// every list is emitted in insertion order.
    pub fn to_prompt_context(&self) -> String {
        let mut sections: Vec<String> = Vec::new();

        match self.kind {
            FeedbackKind::Regenerate => sections
                .push("Start fresh: propose names unlike anything in the previous batch.".into()),
            FeedbackKind::Approve => {
                sections.push(format!("Approved names: {}", self.selected_names.join(", ")))
            }
            FeedbackKind::Refine => {}
        }

        if !self.liked_names.is_empty() {
            sections.push(format!(
                "Liked names: {}\nKeep the qualities that make these work.",
                self.liked_names.join(", ")
            ));
        }
        if !self.liked_elements.is_empty() {
            sections.push(format!(
                "Liked elements: {}\nWork these sounds, roots, or themes into new names.",
                self.liked_elements.join(", ")
            ));
        }
        if !self.liked_patterns.is_empty() {
            sections.push(format!("Preferred patterns: {}", self.liked_patterns.join(", ")));
        }
        if !self.disliked_names.is_empty() {
            sections.push(format!(
                "Disliked names: {}\nSteer away from their style and structure.",
                self.disliked_names.join(", ")
            ));
        }
        if !self.disliked_elements.is_empty() {
            sections.push(format!(
                "Avoid elements: {}\nDo not use these words or close variants.",
                self.disliked_elements.join(", ")
            ));
        }
        if !self.disliked_patterns.is_empty() {
            sections.push(format!("Avoid patterns: {}", self.disliked_patterns.join(", ")));
        }
        if !self.new_directions.is_empty() {
            sections.push(format!("New directions to explore: {}", self.new_directions.join(", ")));
        }
        if let Some(tone) = &self.tone_adjustment {
            sections.push(format!("Tone adjustment: {}", tone));
        }
        if let Some(text) = &self.free_text {
            sections.push(format!("Additional feedback: {}", text));
        }

        sections.join("\n\n")
    }
}

/// Renders the whole history, oldest first, numbered by iteration.
pub fn build_feedback_summary(history: &[Feedback]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let mut out = String::from("Feedback history (oldest first):");
    for (i, feedback) in history.iter().enumerate() {
        out.push_str(&format!("\n\nIteration {} ({}):\n", i + 1, feedback.kind()));
        let context = feedback.to_prompt_context();
        if context.is_empty() {
            out.push_str("No specific guidance.");
        } else {
            out.push_str(&context);
        }
    }
    out
}

/// Builder for [`Feedback`]; validation happens in [`FeedbackBuilder::build`].
#[derive(Debug, Clone)]
pub struct FeedbackBuilder {
    inner: Feedback,
}

impl FeedbackBuilder {
    pub fn new(kind: FeedbackKind) -> Self {
        Self { inner: Feedback::empty(kind) }
    }

    pub fn liked_name(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.inner.liked_names, name.into());
        self
    }

    pub fn liked_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.inner.liked_names, names);
        self
    }

    pub fn disliked_name(mut self, name: impl Into<String>) -> Self {
        push_unique(&mut self.inner.disliked_names, name.into());
        self
    }

    pub fn disliked_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.inner.disliked_names, names);
        self
    }

    pub fn liked_elements<I, S>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.inner.liked_elements, elements);
        self
    }

    pub fn disliked_elements<I, S>(mut self, elements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.inner.disliked_elements, elements);
        self
    }

    pub fn liked_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.inner.liked_patterns, patterns);
        self
    }

    pub fn disliked_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.inner.disliked_patterns, patterns);
        self
    }

    pub fn new_directions<I, S>(mut self, directions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.inner.new_directions, directions);
        self
    }

    pub fn tone_adjustment(mut self, tone: impl Into<String>) -> Self {
        self.inner.tone_adjustment = clean(tone.into());
        self
    }

    pub fn free_text(mut self, text: impl Into<String>) -> Self {
        self.inner.free_text = clean(text.into());
        self
    }

    pub fn selected_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        extend_unique(&mut self.inner.selected_names, names);
        self
    }

    pub fn build(self) -> Result<Feedback> {
        let feedback = self.inner;
        match feedback.kind {
            FeedbackKind::Approve if feedback.selected_names.is_empty() => {
                Err(BrandError::selection("approval requires at least one selected name"))
            }
            FeedbackKind::Regenerate | FeedbackKind::Refine
                if !feedback.selected_names.is_empty() =>
            {
                Err(BrandError::selection(format!(
                    "selected names are only valid for approval, not {}",
                    feedback.kind
                )))
            }
            _ => Ok(feedback),
        }
    }
}

fn clean(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

fn push_unique(list: &mut Vec<String>, value: String) {
    let Some(value) = clean(value) else {
        return;
    };
    let key = name_key(&value);
    if !list.iter().any(|existing| name_key(existing) == key) {
        list.push(value);
    }
}

fn extend_unique<I, S>(list: &mut Vec<String>, values: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    for value in values {
        push_unique(list, value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approve_requires_selection() {
        let err = Feedback::approve(Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, BrandError::Selection(_)));

        let err = Feedback::approve(["  ", ""]).unwrap_err();
        assert!(matches!(err, BrandError::Selection(_)));

        let ok = Feedback::approve(["Zenith"]).unwrap();
        assert_eq!(ok.selected_names(), ["Zenith"]);
    }

    #[test]
    fn test_selection_rejected_for_refine() {
        let err = Feedback::refine().selected_names(["Acme"]).build().unwrap_err();
        assert!(matches!(err, BrandError::Selection(_)));
    }

    #[test]
    fn test_insertion_ordered_dedup() {
        let fb = Feedback::refine()
            .liked_names(["Nova", "Acme", "nova", " Acme ", "Zenith"])
            .liked_elements(["sky", "", "sky"])
            .build()
            .unwrap();
        assert_eq!(fb.liked_names(), ["Nova", "Acme", "Zenith"]);
        assert_eq!(fb.liked_elements(), ["sky"]);
    }

    #[test]
    fn test_prompt_context_order() {
        let fb = Feedback::refine()
            .liked_name("Nova")
            .liked_name("Aster")
            .disliked_elements(["corp"])
            .tone_adjustment("warmer")
            .build()
            .unwrap();
        let ctx = fb.to_prompt_context();
        let liked = ctx.find("Liked names: Nova, Aster").unwrap();
        let avoid = ctx.find("Avoid elements: corp").unwrap();
        let tone = ctx.find("Tone adjustment: warmer").unwrap();
        assert!(liked < avoid && avoid < tone);
    }

    #[test]
    fn test_regenerate_context_mentions_fresh_batch() {
        let fb = Feedback::regenerate(Some("more playful".into()));
        let ctx = fb.to_prompt_context();
        assert!(ctx.starts_with("Start fresh"));
        assert!(ctx.ends_with("Additional feedback: more playful"));
    }

    #[test]
    fn test_summary_numbers_iterations() {
        let history = vec![
            Feedback::regenerate(None),
            Feedback::refine().liked_name("Nova").build().unwrap(),
        ];
        let summary = build_feedback_summary(&history);
        assert!(summary.contains("Iteration 1 (regenerate):"));
        assert!(summary.contains("Iteration 2 (refine):\nLiked names: Nova"));
        assert!(build_feedback_summary(&[]).is_empty());
    }

    #[test]
    fn test_deserialize_validates() {
        let bad = r#"{"type":"APPROVE","selected_names":[]}"#;
        assert!(serde_json::from_str::<Feedback>(bad).is_err());

        let good = r#"{"type":"REFINE","liked_names":["A","a","B"]}"#;
        let fb: Feedback = serde_json::from_str(good).unwrap();
        assert_eq!(fb.liked_names(), ["A", "B"]);
    }

    #[test]
    fn test_serde_round_trip_preserves_timestamp() {
        let fb = Feedback::refine().new_directions(["ocean"]).build().unwrap();
        let json = serde_json::to_string(&fb).unwrap();
        assert!(json.contains("\"type\":\"REFINE\""));
        let back: Feedback = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fb);
    }
}
