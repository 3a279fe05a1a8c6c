//! Configuration for Brand Studio.
//!
//! Policy values (iteration cap, fallback size, pass ratio, timeouts) live
//! here and are threaded through construction of the loop and validator.
//!
//! ## Validation
//!
//! Every section has a fail-fast `validate()`. [`StudioConfig::from_env`]
//! loads `BRAND_*` variables over the defaults and validates the result;
//! [`StudioConfig::builder`] does the same for programmatic setup.

use brand_core::{
    BrandError, DEFAULT_CANDIDATES_PER_ROUND, DEFAULT_FALLBACK_COUNT, DEFAULT_MAX_ITERATIONS,
    DEFAULT_PASS_RATIO,
};
use brand_tools::{default_tlds, normalize_tld};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const SUPPORTED_PROVIDERS: &[&str] = &["gemini"];

/// Upper bound on refinement iterations.
pub const MAX_ITERATIONS_LIMIT: usize = 20;

pub const MAX_CANDIDATES_LIMIT: usize = 100;

pub const MAX_TOKENS_LIMIT: usize = 1_000_000;

/// A configuration value that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". {}", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into(), suggestion: None }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    fn nested(self, section: &str) -> Self {
        Self { field: format!("{}.{}", section, self.field), ..self }
    }
}

impl From<ConfigError> for BrandError {
    fn from(err: ConfigError) -> Self {
        BrandError::Config(err.to_string())
    }
}

fn parse_var<T>(field: &str, var: &str, raw: &str, hint: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| {
        ConfigError::new(field, format!("Invalid {} '{}': {}", var, raw, e)).with_suggestion(hint)
    })
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

// ============================================================================
// Model
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Never written back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model_name() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_max_tokens() -> usize {
    8192
}

fn default_temperature() -> f32 {
    0.9
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model_name: default_model_name(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            api_key: None,
        }
    }
}

impl ModelConfig {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self { model_name: model_name.into(), ..Default::default() }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let provider = self.provider.to_lowercase();
        if !SUPPORTED_PROVIDERS.contains(&provider.as_str()) {
            return Err(ConfigError::new(
                "provider",
                format!("Unsupported model provider '{}'", self.provider),
            )
            .with_suggestion(format!("Supported providers: {:?}", SUPPORTED_PROVIDERS)));
        }

        if self.model_name.trim().is_empty() {
            return Err(ConfigError::new("model_name", "Model name cannot be empty")
                .with_suggestion("Use a Gemini model such as 'gemini-2.5-flash'"));
        }
        if self.model_name.contains(char::is_control) || self.model_name.len() > 256 {
            return Err(ConfigError::new("model_name", "Model name is malformed")
                .with_suggestion("Use printable characters, under 256 in total"));
        }

        if self.max_tokens == 0 || self.max_tokens > MAX_TOKENS_LIMIT {
            return Err(ConfigError::new(
                "max_tokens",
                format!("Max tokens {} is out of range", self.max_tokens),
            )
            .with_suggestion(format!("Use a value between 1 and {}", MAX_TOKENS_LIMIT)));
        }

        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::new(
                "temperature",
                format!("Temperature {} is out of range", self.temperature),
            )
            .with_suggestion("Temperature must be between 0.0 and 2.0"));
        }

        Ok(())
    }

    /// The API key, or a config error naming the variables to set.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            ConfigError::new("api_key", "No Gemini API key configured")
                .with_suggestion("Set GEMINI_API_KEY or GOOGLE_API_KEY")
        })
    }
}

// ============================================================================
// Refinement
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefinementConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_candidates_per_round")]
    pub candidates_per_round: usize,
    #[serde(default = "default_fallback_count")]
    pub fallback_count: usize,
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

fn default_candidates_per_round() -> usize {
    DEFAULT_CANDIDATES_PER_ROUND
}

fn default_fallback_count() -> usize {
    DEFAULT_FALLBACK_COUNT
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            candidates_per_round: default_candidates_per_round(),
            fallback_count: default_fallback_count(),
        }
    }
}

impl RefinementConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 || self.max_iterations > MAX_ITERATIONS_LIMIT {
            return Err(ConfigError::new(
                "max_iterations",
                format!("Max iterations {} is out of range", self.max_iterations),
            )
            .with_suggestion(format!("Use a value between 1 and {}", MAX_ITERATIONS_LIMIT)));
        }
        if self.candidates_per_round == 0 || self.candidates_per_round > MAX_CANDIDATES_LIMIT {
            return Err(ConfigError::new(
                "candidates_per_round",
                format!("Candidates per round {} is out of range", self.candidates_per_round),
            )
            .with_suggestion(format!("Use a value between 1 and {}", MAX_CANDIDATES_LIMIT)));
        }
        if self.fallback_count == 0 {
            return Err(ConfigError::new("fallback_count", "Fallback count must be at least 1")
                .with_suggestion("The default approves the top 10 names when the cap is reached"));
        }
        Ok(())
    }
}

// ============================================================================
// Validation
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationConfig {
    #[serde(default = "default_tlds")]
    pub tlds: Vec<String>,
    /// Per check, per name.
    #[serde(default = "default_check_timeout_ms")]
    pub check_timeout_ms: u64,
    /// Names validated at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_pass_ratio")]
    pub pass_ratio: f64,
    /// Connect-and-read budget for one WHOIS query.
    #[serde(default = "default_whois_timeout_ms")]
    pub whois_timeout_ms: u64,
}

fn default_check_timeout_ms() -> u64 {
    5000
}

fn default_concurrency() -> usize {
    4
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_pass_ratio() -> f64 {
    DEFAULT_PASS_RATIO
}

fn default_whois_timeout_ms() -> u64 {
    4000
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            tlds: default_tlds(),
            check_timeout_ms: default_check_timeout_ms(),
            concurrency: default_concurrency(),
            cache_ttl_secs: default_cache_ttl_secs(),
            pass_ratio: default_pass_ratio(),
            whois_timeout_ms: default_whois_timeout_ms(),
        }
    }
}

impl ValidationConfig {
    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn whois_timeout(&self) -> Duration {
        Duration::from_millis(self.whois_timeout_ms)
    }

    /// Replaces the TLD list, normalizing ".com", "com" and "COM" alike.
    pub fn with_tlds<I, S>(mut self, tlds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tlds = parse_tld_list(tlds);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tlds.is_empty() {
            return Err(ConfigError::new("tlds", "At least one TLD is required")
                .with_suggestion("For example BRAND_TLDS=.com,.ai,.io"));
        }
        if let Some(bad) = self.tlds.iter().find(|t| {
            t.len() < 2 || !t.starts_with('.') || !t[1..].chars().all(|c| c.is_ascii_alphanumeric())
        }) {
            return Err(ConfigError::new("tlds", format!("Invalid TLD '{}'", bad))
                .with_suggestion("TLDs look like '.com' or '.ai'"));
        }
        if self.check_timeout_ms == 0 {
            return Err(ConfigError::new("check_timeout_ms", "Check timeout must be positive")
                .with_suggestion("The default is 5000 ms"));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::new("concurrency", "Concurrency must be at least 1"));
        }
        if !self.pass_ratio.is_finite() || !(0.0..=1.0).contains(&self.pass_ratio) {
            return Err(ConfigError::new(
                "pass_ratio",
                format!("Pass ratio {} is out of range", self.pass_ratio),
            )
            .with_suggestion("Use a fraction between 0.0 and 1.0 (default 0.5)"));
        }
        if self.whois_timeout_ms == 0 {
            return Err(ConfigError::new("whois_timeout_ms", "WHOIS timeout must be positive"));
        }
        Ok(())
    }
}

/// Splits and normalizes a TLD list, dropping empties and duplicates.
pub fn parse_tld_list<I, S>(tlds: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for raw in tlds {
        for part in raw.as_ref().split(',') {
            if part.trim().trim_start_matches('.').is_empty() {
                continue;
            }
            let tld = normalize_tld(part);
            if !out.contains(&tld) {
                out.push(tld);
            }
        }
    }
    out
}

// ============================================================================
// Telemetry
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelemetryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_true")]
    pub enable_metrics: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_true() -> bool {
    true
}

fn default_service_name() -> String {
    "brand-studio".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: default_service_name(),
            enable_metrics: true,
            log_level: default_log_level(),
        }
    }
}

impl TelemetryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::new(
                "log_level",
                format!("Invalid log level '{}'", self.log_level),
            )
            .with_suggestion(format!("Valid log levels: {:?}", valid_levels)));
        }
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::new("service_name", "Service name cannot be empty")
                .with_suggestion("Set BRAND_SERVICE_NAME or use the default 'brand-studio'"));
        }
        Ok(())
    }
}

// ============================================================================
// Studio
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudioConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub refinement: RefinementConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default = "default_session_dir")]
    pub session_dir: String,
}

fn default_session_dir() -> String {
    ".brand-sessions".to_string()
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            refinement: RefinementConfig::default(),
            validation: ValidationConfig::default(),
            telemetry: TelemetryConfig::default(),
            session_dir: default_session_dir(),
        }
    }
}

impl StudioConfig {
    pub fn builder() -> StudioConfigBuilder {
        StudioConfigBuilder::default()
    }

    /// Loads configuration from the process environment.
    ///
    /// ## Environment Variables
    ///
    /// - `GEMINI_API_KEY` / `GOOGLE_API_KEY` - model credentials
    /// - `BRAND_MODEL`, `BRAND_TEMPERATURE`, `BRAND_MAX_TOKENS`
    /// - `BRAND_MAX_ITERATIONS` (default 3), `BRAND_CANDIDATES_PER_ROUND` (20),
    ///   `BRAND_FALLBACK_COUNT` (10)
    /// - `BRAND_TLDS` (comma separated), `BRAND_CHECK_TIMEOUT_MS` (5000),
    ///   `BRAND_VALIDATION_CONCURRENCY` (4), `BRAND_CACHE_TTL_SECS` (300),
    ///   `BRAND_PASS_RATIO` (0.5), `BRAND_WHOIS_TIMEOUT_MS` (4000)
    /// - `BRAND_TELEMETRY_ENABLED`, `BRAND_ENABLE_METRICS`, `BRAND_SERVICE_NAME`,
    ///   `BRAND_LOG_LEVEL`
    /// - `BRAND_SESSION_DIR` (default `.brand-sessions`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`StudioConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.model.api_key = lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY"));
        if let Some(model) = lookup("BRAND_MODEL") {
            config.model.model_name = model;
        }
        if let Some(raw) = lookup("BRAND_TEMPERATURE") {
            config.model.temperature =
                parse_var("model.temperature", "BRAND_TEMPERATURE", &raw, "Use a number like 0.9")?;
        }
        if let Some(raw) = lookup("BRAND_MAX_TOKENS") {
            config.model.max_tokens =
                parse_var("model.max_tokens", "BRAND_MAX_TOKENS", &raw, "Use a positive integer")?;
        }

        if let Some(raw) = lookup("BRAND_MAX_ITERATIONS") {
            config.refinement.max_iterations = parse_var(
                "refinement.max_iterations",
                "BRAND_MAX_ITERATIONS",
                &raw,
                "Use a positive integer like 3",
            )?;
        }
        if let Some(raw) = lookup("BRAND_CANDIDATES_PER_ROUND") {
            config.refinement.candidates_per_round = parse_var(
                "refinement.candidates_per_round",
                "BRAND_CANDIDATES_PER_ROUND",
                &raw,
                "Use a positive integer like 20",
            )?;
        }
        if let Some(raw) = lookup("BRAND_FALLBACK_COUNT") {
            config.refinement.fallback_count = parse_var(
                "refinement.fallback_count",
                "BRAND_FALLBACK_COUNT",
                &raw,
                "Use a positive integer like 10",
            )?;
        }

        if let Some(raw) = lookup("BRAND_TLDS") {
            config.validation.tlds = parse_tld_list([raw]);
        }
        if let Some(raw) = lookup("BRAND_CHECK_TIMEOUT_MS") {
            config.validation.check_timeout_ms = parse_var(
                "validation.check_timeout_ms",
                "BRAND_CHECK_TIMEOUT_MS",
                &raw,
                "Use milliseconds, for example 5000",
            )?;
        }
        if let Some(raw) = lookup("BRAND_VALIDATION_CONCURRENCY") {
            config.validation.concurrency = parse_var(
                "validation.concurrency",
                "BRAND_VALIDATION_CONCURRENCY",
                &raw,
                "Use a positive integer like 4",
            )?;
        }
        if let Some(raw) = lookup("BRAND_CACHE_TTL_SECS") {
            config.validation.cache_ttl_secs = parse_var(
                "validation.cache_ttl_secs",
                "BRAND_CACHE_TTL_SECS",
                &raw,
                "Use seconds, for example 300",
            )?;
        }
        if let Some(raw) = lookup("BRAND_PASS_RATIO") {
            config.validation.pass_ratio = parse_var(
                "validation.pass_ratio",
                "BRAND_PASS_RATIO",
                &raw,
                "Use a fraction like 0.5",
            )?;
        }
        if let Some(raw) = lookup("BRAND_WHOIS_TIMEOUT_MS") {
            config.validation.whois_timeout_ms = parse_var(
                "validation.whois_timeout_ms",
                "BRAND_WHOIS_TIMEOUT_MS",
                &raw,
                "Use milliseconds, for example 4000",
            )?;
        }

        if let Some(raw) = lookup("BRAND_TELEMETRY_ENABLED") {
            config.telemetry.enabled = parse_bool(&raw);
        }
        if let Some(raw) = lookup("BRAND_ENABLE_METRICS") {
            config.telemetry.enable_metrics = parse_bool(&raw);
        }
        if let Some(name) = lookup("BRAND_SERVICE_NAME") {
            config.telemetry.service_name = name;
        }
        if let Some(level) = lookup("BRAND_LOG_LEVEL") {
            config.telemetry.log_level = level;
        }

        if let Some(dir) = lookup("BRAND_SESSION_DIR") {
            config.session_dir = dir;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.model.validate().map_err(|e| e.nested("model"))?;
        self.refinement.validate().map_err(|e| e.nested("refinement"))?;
        self.validation.validate().map_err(|e| e.nested("validation"))?;
        self.telemetry.validate().map_err(|e| e.nested("telemetry"))?;

        if self.session_dir.trim().is_empty() || self.session_dir.contains('\0') {
            return Err(ConfigError::new("session_dir", "Session directory is not a valid path")
                .with_suggestion("Set BRAND_SESSION_DIR to a directory path"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StudioConfigBuilder {
    config: StudioConfig,
}

impl StudioConfigBuilder {
    pub fn model(mut self, model: ModelConfig) -> Self {
        self.config.model = model;
        self
    }

    pub fn refinement(mut self, refinement: RefinementConfig) -> Self {
        self.config.refinement = refinement;
        self
    }

    pub fn validation(mut self, validation: ValidationConfig) -> Self {
        self.config.validation = validation;
        self
    }

    pub fn telemetry(mut self, telemetry: TelemetryConfig) -> Self {
        self.config.telemetry = telemetry;
        self
    }

    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.config.refinement.max_iterations = iterations;
        self
    }

    pub fn candidates_per_round(mut self, count: usize) -> Self {
        self.config.refinement.candidates_per_round = count;
        self
    }

    pub fn session_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.session_dir = dir.into();
        self
    }

    pub fn build(self) -> Result<StudioConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }

    pub fn build_unchecked(self) -> StudioConfig {
        self.config
    }
}
