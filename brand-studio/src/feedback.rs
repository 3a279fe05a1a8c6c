//! Feedback capture: turning user input about a presented round into [`Feedback`].
//!
//! Index selections are 1-based and map back to the literal names of the
//! round being answered. Anything out of range, zero, or non-numeric is
//! rejected with a selection error; nothing is clamped or skipped.

use crate::output;
use async_trait::async_trait;
use brand_core::{BrandError, Feedback, FeedbackCollector, Result, RoundView};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Splits a comma-separated list, trimming items and dropping empties.
pub fn split_list(input: &str) -> Vec<String> {
    input.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// Parses 1-based indices ("1,3" or "1 3") into 0-based positions within a
/// round of `round_len` candidates. Duplicates collapse to their first use.
pub fn parse_indices(input: &str, round_len: usize) -> Result<Vec<usize>> {
    let mut indices = Vec::new();
    for token in input.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()) {
        let index: usize = token
            .parse()
            .map_err(|_| BrandError::selection(format!("'{}' is not a number", token)))?;
        if index == 0 || index > round_len {
            return Err(BrandError::selection(format!(
                "index {} is out of range; choose 1 to {}",
                index, round_len
            )));
        }
        if !indices.contains(&(index - 1)) {
            indices.push(index - 1);
        }
    }
    if indices.is_empty() {
        return Err(BrandError::selection("no names selected"));
    }
    Ok(indices)
}

/// Resolves a selection against the presented round. `all` picks the top
/// `fallback_count` candidates.
pub fn select_names(input: &str, view: &RoundView) -> Result<Vec<String>> {
    if input.trim().eq_ignore_ascii_case("all") {
        return Ok(view
            .candidates
            .iter()
            .take(view.fallback_count)
            .map(|c| c.name.clone())
            .collect());
    }
    Ok(parse_indices(input, view.candidates.len())?
        .into_iter()
        .map(|i| view.candidates[i].name.clone())
        .collect())
}

/// Structured refinement signals, as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct RefineInput {
    /// Indices of liked names, e.g. "1,4".
    pub like: Option<String>,
    /// Indices of disliked names.
    pub dislike: Option<String>,
    pub elements: Vec<String>,
    pub avoid: Vec<String>,
    pub liked_patterns: Vec<String>,
    pub disliked_patterns: Vec<String>,
    pub directions: Vec<String>,
    pub tone: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone)]
pub enum FeedbackInput {
    Approve { selection: String },
    Regenerate { text: Option<String> },
    Refine(RefineInput),
}

/// Converts raw input into validated feedback for the presented round.
pub fn capture(input: FeedbackInput, view: &RoundView) -> Result<Feedback> {
    match input {
        FeedbackInput::Approve { selection } => Feedback::approve(select_names(&selection, view)?),
        FeedbackInput::Regenerate { text } => Ok(Feedback::regenerate(text)),
        FeedbackInput::Refine(refine) => {
            let mut builder = Feedback::refine()
                .liked_elements(refine.elements)
                .disliked_elements(refine.avoid)
                .liked_patterns(refine.liked_patterns)
                .disliked_patterns(refine.disliked_patterns)
                .new_directions(refine.directions);
            if let Some(like) = non_empty(refine.like.as_deref()) {
                builder = builder.liked_names(select_names(like, view)?);
            }
            if let Some(dislike) = non_empty(refine.dislike.as_deref()) {
                builder = builder.disliked_names(select_names(dislike, view)?);
            }
            if let Some(tone) = refine.tone {
                builder = builder.tone_adjustment(tone);
            }
            if let Some(text) = refine.text {
                builder = builder.free_text(text);
            }
            builder.build()
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ============================================================================
// Interactive collection
// ============================================================================

/// A line-oriented conversation with the user.
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Shows `question` and returns the next answer line, trimmed.
    async fn ask(&self, question: &str) -> Result<String>;
    fn say(&self, message: &str);
}

/// Prompts on stdout and reads answers from stdin.
pub struct StdioPrompter {
    lines: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
}

impl StdioPrompter {
    pub fn new() -> Self {
        Self { lines: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()) }
    }
}

impl Default for StdioPrompter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompter for StdioPrompter {
    async fn ask(&self, question: &str) -> Result<String> {
        print!("{}", question);
        std::io::stdout().flush()?;
        match self.lines.lock().await.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(BrandError::Cancelled),
        }
    }

    fn say(&self, message: &str) {
        println!("{}", message);
    }
}

/// Replays canned answers; used to drive the interactive flow in tests.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    transcript: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
            transcript: Mutex::default(),
        }
    }

    /// Everything asked or said so far.
    pub fn transcript(&self) -> Vec<String> {
        self.transcript.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    fn record(&self, line: &str) {
        self.transcript.lock().unwrap_or_else(|p| p.into_inner()).push(line.to_string());
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn ask(&self, question: &str) -> Result<String> {
        self.record(question);
        let next = self.answers.lock().unwrap_or_else(|p| p.into_inner()).pop_front();
        next.map(|a| a.trim().to_string()).ok_or(BrandError::Cancelled)
    }

    fn say(&self, message: &str) {
        self.record(message);
    }
}

/// Collects feedback by asking the user through a [`Prompter`]. Invalid
/// selections are reported and asked again, up to `max_attempts`.
pub struct PromptedFeedbackCollector<P> {
    prompter: P,
    max_attempts: usize,
}

impl<P: Prompter> PromptedFeedbackCollector<P> {
    pub fn new(prompter: P) -> Self {
        Self { prompter, max_attempts: 3 }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    async fn ask_optional(&self, question: &str) -> Result<Option<String>> {
        let answer = self.prompter.ask(question).await?;
        Ok((!answer.is_empty()).then_some(answer))
    }

    async fn ask_list(&self, question: &str) -> Result<Vec<String>> {
        Ok(split_list(&self.prompter.ask(question).await?))
    }

    async fn read_input(&self) -> Result<FeedbackInput> {
        let choice = self.prompter.ask("Your choice: [a]pprove, [r]egenerate, re[f]ine > ").await?;
        match choice.to_lowercase().as_str() {
            "a" | "approve" => {
                let selection =
                    self.prompter.ask("Names to approve (e.g. 1,3 or 'all') > ").await?;
                Ok(FeedbackInput::Approve { selection })
            }
            "r" | "regenerate" => Ok(FeedbackInput::Regenerate {
                text: self.ask_optional("What should be different? (optional) > ").await?,
            }),
            "f" | "refine" => Ok(FeedbackInput::Refine(RefineInput {
                like: self.ask_optional("Names you like (numbers, optional) > ").await?,
                dislike: self.ask_optional("Names you dislike (numbers, optional) > ").await?,
                elements: self.ask_list("Elements to keep (comma-separated) > ").await?,
                avoid: self.ask_list("Elements to avoid (comma-separated) > ").await?,
                liked_patterns: self.ask_list("Patterns you like (comma-separated) > ").await?,
                disliked_patterns: self
                    .ask_list("Patterns you dislike (comma-separated) > ")
                    .await?,
                directions: self.ask_list("New directions to explore (comma-separated) > ").await?,
                tone: self.ask_optional("Tone adjustment (optional) > ").await?,
                text: self.ask_optional("Anything else? (optional) > ").await?,
            })),
            other => Err(BrandError::selection(format!("unknown choice '{}'", other))),
        }
    }
}

#[async_trait]
impl<P: Prompter> FeedbackCollector for PromptedFeedbackCollector<P> {
    async fn collect(&self, view: &RoundView) -> Result<Feedback> {
        self.prompter.say(&output::render_round(view));
        let mut attempt = 1;
        loop {
            let result = match self.read_input().await {
                Ok(input) => capture(input, view),
                Err(error) => Err(error),
            };
            match result {
                Err(BrandError::Selection(message)) if attempt < self.max_attempts => {
                    self.prompter.say(&format!("Invalid selection: {}. Try again.", message));
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
