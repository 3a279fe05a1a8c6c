//! Brand Studio CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Start a session and show round 1
//! brand-studio generate --product "AI meal planning app" --audience "busy parents"
//!
//! # Answer the round
//! brand-studio feedback --session <id> refine --like 2,5 --avoid "tech jargon"
//! brand-studio feedback --session <id> approve 1,3
//!
//! # Pick up a session whose next round failed or was interrupted
//! brand-studio generate --session <id>
//!
//! # Check and package the approved names
//! brand-studio validate --session <id>
//! brand-studio story --session <id>
//!
//! # Or do everything in one conversation
//! brand-studio interactive --product "AI meal planning app"
//! ```

use brand_core::{
    BrandError, DomainChecker, Llm, RefinementSession, Result, RoundView, SessionStore,
    ValidationReport, name_key,
};
use brand_studio::config::parse_tld_list;
use brand_studio::feedback::{self, PromptedFeedbackCollector, Prompter, StdioPrompter};
use brand_studio::{
    BrandBrief, BrandPackageAssembler, BrandResearcher, FeedbackInput, GeminiClient,
    JsonFileSessionStore, LlmNameGenerator, Personality, RefineInput, RefinementLoop,
    RoundOutcome, StudioConfig, TelemetryConfig, ValidationConfig, Validator, output, telemetry,
};
use brand_tools::{
    CachedDomainChecker, DomainCache, HeuristicSeoScorer, HeuristicTrademarkChecker,
    WhoisDomainChecker, find_alternatives,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Brand Studio - iterative brand naming
#[derive(Parser, Debug)]
#[command(name = "brand-studio")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show log output at the configured level (BRAND_LOG_LEVEL)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Session directory (overrides BRAND_SESSION_DIR)
    #[arg(long, global = true)]
    session_dir: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPersonality {
    Playful,
    Professional,
    Innovative,
    Luxury,
}

impl From<CliPersonality> for Personality {
    fn from(cli: CliPersonality) -> Self {
        match cli {
            CliPersonality::Playful => Personality::Playful,
            CliPersonality::Professional => Personality::Professional,
            CliPersonality::Innovative => Personality::Innovative,
            CliPersonality::Luxury => Personality::Luxury,
        }
    }
}

/// Everything about a new session except the product itself.
#[derive(Args, Debug)]
struct BriefArgs {
    /// Who it is for
    #[arg(long)]
    audience: Option<String>,
    #[arg(long, value_enum, default_value = "professional")]
    personality: CliPersonality,
    #[arg(long)]
    industry: Option<String>,
    /// Names per round (overrides BRAND_CANDIDATES_PER_ROUND)
    #[arg(long)]
    count: Option<usize>,
    /// Feedback rounds before the top names are kept automatically
    #[arg(long)]
    max_iterations: Option<usize>,
    /// Skip the market research step before round 1
    #[arg(long)]
    no_research: bool,
}

impl BriefArgs {
    fn brief(&self, product: &str) -> Result<BrandBrief> {
        let mut brief = BrandBrief::new(product)?.with_personality(self.personality.into());
        if let Some(audience) = &self.audience {
            brief = brief.with_audience(audience.clone());
        }
        if let Some(industry) = &self.industry {
            brief = brief.with_industry(industry.clone());
        }
        Ok(brief)
    }

    fn apply(&self, config: &mut StudioConfig) {
        if let Some(count) = self.count {
            config.refinement.candidates_per_round = count;
        }
        if let Some(max) = self.max_iterations {
            config.refinement.max_iterations = max;
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a session and present round 1, or continue a saved session
    Generate {
        /// What is being named
        #[arg(long, required_unless_present = "session")]
        product: Option<String>,
        /// Continue this session instead of starting one; brief options are ignored
        #[arg(long, conflicts_with = "product")]
        session: Option<String>,
        #[command(flatten)]
        brief: BriefArgs,
    },
    /// Answer the pending round of a session
    Feedback {
        #[arg(long)]
        session: String,
        #[command(subcommand)]
        action: FeedbackAction,
    },
    /// Check domains, trademarks and SEO for approved (or given) names
    Validate {
        #[arg(long)]
        session: Option<String>,
        /// Comma-separated names to check instead of the approved ones
        #[arg(long)]
        names: Option<String>,
        /// Comma-separated TLDs (overrides BRAND_TLDS)
        #[arg(long)]
        tlds: Option<String>,
        /// Also write the report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Write taglines, story, hero copy and value proposition for an approved name
    Story {
        #[arg(long)]
        session: String,
        /// Approved name to package (defaults to the first one)
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Run the whole flow as a conversation in the terminal
    Interactive {
        /// What is being named
        #[arg(long)]
        product: String,
        #[command(flatten)]
        brief: BriefArgs,
    },
    /// List saved sessions
    Sessions {
        /// Delete a session instead of listing
        #[arg(long)]
        delete: Option<String>,
    },
    /// Show and check the configuration
    Config,
}

#[derive(Subcommand, Debug)]
enum FeedbackAction {
    /// Approve names by number ("1,3") or "all"
    Approve { selection: String },
    /// Ask for a fresh batch
    Regenerate {
        #[arg(long)]
        text: Option<String>,
    },
    /// Steer the next batch
    Refine {
        /// Numbers of liked names; they carry into the next round
        #[arg(long)]
        like: Option<String>,
        #[arg(long)]
        dislike: Option<String>,
        /// Elements to keep, comma-separated
        #[arg(long)]
        elements: Option<String>,
        /// Elements to avoid, comma-separated
        #[arg(long)]
        avoid: Option<String>,
        /// Naming patterns to lean into, comma-separated
        #[arg(long)]
        patterns: Option<String>,
        /// Naming patterns to stop using, comma-separated
        #[arg(long)]
        avoid_patterns: Option<String>,
        /// New directions to explore, comma-separated
        #[arg(long)]
        direction: Option<String>,
        #[arg(long)]
        tone: Option<String>,
        #[arg(long)]
        text: Option<String>,
    },
}

impl FeedbackAction {
    fn into_input(self) -> FeedbackInput {
        let list =
            |value: Option<String>| value.as_deref().map(feedback::split_list).unwrap_or_default();
        match self {
            FeedbackAction::Approve { selection } => FeedbackInput::Approve { selection },
            FeedbackAction::Regenerate { text } => FeedbackInput::Regenerate { text },
            FeedbackAction::Refine {
                like,
                dislike,
                elements,
                avoid,
                patterns,
                avoid_patterns,
                direction,
                tone,
                text,
            } => FeedbackInput::Refine(RefineInput {
                like,
                dislike,
                elements: list(elements),
                avoid: list(avoid),
                liked_patterns: list(patterns),
                disliked_patterns: list(avoid_patterns),
                directions: list(direction),
                tone,
                text,
            }),
        }
    }
}

fn init_telemetry(config: &TelemetryConfig, verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    // Keep the console clean unless asked for logs.
    let level = match (config.enabled, verbose) {
        (false, _) => "error",
        (true, false) => "warn",
        (true, true) => config.log_level.as_str(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init();
    telemetry::init_metrics(config);
}

fn build_model(config: &StudioConfig) -> Result<Arc<dyn Llm>> {
    Ok(Arc::new(GeminiClient::from_config(&config.model)?))
}

fn build_refinement(
    config: &StudioConfig,
    store: Arc<dyn SessionStore>,
) -> Result<RefinementLoop> {
    let generator =
        LlmNameGenerator::new(build_model(config)?).with_temperature(config.model.temperature);
    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });
    Ok(RefinementLoop::new(Arc::new(generator), config.refinement.clone())
        .with_store(store)
        .with_cancellation(token))
}

fn build_domain_checker(config: &ValidationConfig) -> Arc<dyn DomainChecker> {
    let whois = WhoisDomainChecker::new().with_timeout(config.whois_timeout());
    Arc::new(CachedDomainChecker::new(whois, DomainCache::new(config.cache_ttl())))
}

fn build_validator(config: &ValidationConfig, domains: Arc<dyn DomainChecker>) -> Validator {
    Validator::new(
        domains,
        Arc::new(HeuristicTrademarkChecker::new()),
        Arc::new(HeuristicSeoScorer::new()),
        config,
    )
}

/// The rendered brief, with market research appended unless skipped.
async fn session_brief(
    config: &StudioConfig,
    brief: &BrandBrief,
    skip_research: bool,
) -> Result<String> {
    let rendered = brief.render();
    if skip_research {
        return Ok(rendered);
    }
    output::phase("Researching the market");
    Ok(BrandResearcher::new(build_model(config)?).enrich_brief(&rendered).await)
}

/// Suggests prefixed domains ("getacme.com") for names taken on every TLD.
async fn suggest_alternatives(
    domains: &dyn DomainChecker,
    report: &ValidationReport,
    tlds: &[String],
) {
    let blocked = report.results.iter().filter(|(_, result)| {
        result.domain_status.completed().is_some() && !result.has_available_domain()
    });
    for (name, _) in blocked {
        match find_alternatives(domains, name, tlds).await {
            Ok(alternatives) => {
                let free: Vec<&str> = alternatives.available().take(5).collect();
                if free.is_empty() {
                    output::warning(&format!("{}: no prefixed domains available either", name));
                } else {
                    output::status(&format!("{}: try {}", name, free.join(", ")));
                }
            }
            Err(e) => warn!(name = %name, error = %e, "domain alternatives lookup failed"),
        }
    }
}

fn print_next_steps(session: &RefinementSession) {
    let id = session.id();
    if session.is_complete() {
        output::status(&format!("Next: brand-studio validate --session {}", id));
        output::status(&format!("      brand-studio story --session {}", id));
    } else {
        output::status(&format!("Session: {}", id.cyan()));
        output::status(&format!("Approve:    brand-studio feedback --session {} approve 1,3", id));
        output::status(&format!(
            "Refine:     brand-studio feedback --session {} refine --like 2",
            id
        ));
        output::status(&format!("Regenerate: brand-studio feedback --session {} regenerate", id));
    }
    println!();
}

fn show_outcome(outcome: &RoundOutcome, session: &RefinementSession) {
    match outcome {
        RoundOutcome::AwaitingFeedback(view) => output::print_round(view),
        RoundOutcome::Completed(_) => output::print_completion(session),
    }
    print_next_steps(session);
}

/// Generates the next round; on failure points at the command that retries it.
async fn next_round(
    refinement: &RefinementLoop,
    session: &mut RefinementSession,
) -> Result<RoundOutcome> {
    match refinement.resume(session).await {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            if session.needs_round() {
                output::warning(&format!(
                    "Feedback is saved. Retry the round with: brand-studio generate --session {}",
                    session.id()
                ));
            }
            Err(e)
        }
    }
}

/// Name/tagline pairs for validation, taglines looked up from the session.
fn validation_targets(
    names: &[String],
    session: Option<&RefinementSession>,
) -> Vec<(String, String)> {
    let candidates = session.map(RefinementSession::all_candidates).unwrap_or_default();
    names
        .iter()
        .map(|name| {
            let tagline = candidates
                .iter()
                .find(|c| name_key(&c.name) == name_key(name))
                .map(|c| c.tagline.clone())
                .unwrap_or_default();
            (name.clone(), tagline)
        })
        .collect()
}

async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    tokio::fs::write(path, serde_json::to_string_pretty(value)?).await?;
    output::success(&format!("Wrote {}", path.display()));
    Ok(())
}

async fn run_generate(
    config: StudioConfig,
    store: Arc<dyn SessionStore>,
    product: &str,
    args: &BriefArgs,
) -> Result<()> {
    let brief = args.brief(product)?;
    let refinement = build_refinement(&config, store)?;
    let brief = session_brief(&config, &brief, args.no_research).await?;
    let mut session = refinement.start_session(brief);
    info!(session_id = %session.id(), "starting session");
    output::phase("Generating names");
    let outcome = refinement.present_round(&mut session).await?;
    show_outcome(&outcome, &session);
    Ok(())
}

async fn run_resume(
    config: StudioConfig,
    store: Arc<dyn SessionStore>,
    session_id: &str,
) -> Result<()> {
    let mut session = store.load(session_id).await?;
    let refinement = build_refinement(&config, store)?;
    if session.needs_round() {
        output::phase(&format!("Generating round {}", session.rounds().len() + 1));
    }
    let outcome = next_round(&refinement, &mut session).await?;
    show_outcome(&outcome, &session);
    Ok(())
}

async fn run_feedback(
    config: StudioConfig,
    store: Arc<dyn SessionStore>,
    session_id: &str,
    action: FeedbackAction,
) -> Result<()> {
    let mut session = store.load(session_id).await?;
    if session.needs_round() {
        return Err(BrandError::session(format!(
            "round {} of session {} was never generated; run `brand-studio generate --session {}`",
            session.rounds().len() + 1,
            session_id,
            session_id
        )));
    }
    let view = RoundView::of(&session).filter(|_| session.awaiting_feedback()).ok_or_else(|| {
        BrandError::session(format!("session {} has no round awaiting feedback", session_id))
    })?;
    let feedback = feedback::capture(action.into_input(), &view)?;

    let refinement = build_refinement(&config, store)?;
    if refinement.apply_feedback(&mut session, feedback).await?.is_some() {
        output::print_completion(&session);
        print_next_steps(&session);
        return Ok(());
    }

    output::phase(&format!("Generating round {}", session.rounds().len() + 1));
    let outcome = next_round(&refinement, &mut session).await?;
    show_outcome(&outcome, &session);
    Ok(())
}

async fn run_validate(
    config: StudioConfig,
    store: Arc<dyn SessionStore>,
    session_id: Option<String>,
    names: Option<String>,
    json: Option<PathBuf>,
) -> Result<()> {
    let session = match &session_id {
        Some(id) => Some(store.load(id).await?),
        None => None,
    };
    let names = match (names, &session) {
        (Some(list), _) => feedback::split_list(&list),
        (None, Some(session)) => {
            session.approved_names().map(<[String]>::to_vec).ok_or_else(|| {
                BrandError::selection(format!(
                    "session {} has no approved names yet; pass --names to check others",
                    session.id()
                ))
            })?
        }
        (None, None) => {
            return Err(BrandError::selection("pass --session or --names"));
        }
    };

    output::phase(&format!("Validating {} names", names.len()));
    let domains = build_domain_checker(&config.validation);
    let report = build_validator(&config.validation, domains.clone())
        .validate(&validation_targets(&names, session.as_ref()))
        .await?;
    output::print_validation(&report);
    suggest_alternatives(domains.as_ref(), &report, &config.validation.tlds).await;
    if let Some(path) = json {
        write_json(&path, &report).await?;
    }
    Ok(())
}

async fn run_story(
    config: StudioConfig,
    store: Arc<dyn SessionStore>,
    session_id: &str,
    name: Option<String>,
    json: Option<PathBuf>,
) -> Result<()> {
    let session = store.load(session_id).await?;
    let approved = session.approved_names().unwrap_or_default();
    let name = match name {
        Some(name) => approved
            .iter()
            .find(|n| name_key(n) == name_key(&name))
            .cloned()
            .ok_or_else(|| BrandError::selection(format!("'{}' is not an approved name", name)))?,
        None => approved.first().cloned().ok_or_else(|| {
            BrandError::selection(format!("session {} has no approved names yet", session_id))
        })?,
    };

    output::phase(&format!("Assembling brand package for {}", name));
    let assembler = BrandPackageAssembler::new(build_model(&config)?);
    let package = assembler.assemble(&name, session.brief()).await?;
    output::print_package(&package);
    if let Some(path) = json {
        write_json(&path, &package).await?;
    }
    Ok(())
}

async fn run_interactive(
    config: StudioConfig,
    store: Arc<dyn SessionStore>,
    product: &str,
    args: &BriefArgs,
) -> Result<()> {
    let brief = args.brief(product)?;
    let refinement = build_refinement(&config, store)?;
    let brief = session_brief(&config, &brief, args.no_research).await?;
    let mut session = refinement.start_session(brief);
    let collector = PromptedFeedbackCollector::new(StdioPrompter::new());

    output::phase("Naming");
    refinement.run(&mut session, &collector).await?;
    output::print_completion(&session);

    let approved = session.approved_names().unwrap_or_default().to_vec();
    output::phase("Validation");
    let domains = build_domain_checker(&config.validation);
    let report = build_validator(&config.validation, domains.clone())
        .validate(&validation_targets(&approved, Some(&session)))
        .await?;
    output::print_validation(&report);
    suggest_alternatives(domains.as_ref(), &report, &config.validation.tlds).await;

    for (i, name) in approved.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, name);
    }
    let answer =
        collector.prompter().ask("Build a brand package for which name? [1] > ").await?;
    let index = if answer.is_empty() {
        0
    } else {
        feedback::parse_indices(&answer, approved.len())?[0]
    };

    output::phase("Brand package");
    let package = BrandPackageAssembler::new(build_model(&config)?)
        .assemble(&approved[index], session.brief())
        .await?;
    output::print_package(&package);
    output::status(&format!("Session saved as {}", session.id()));
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = StudioConfig::from_env()?;
    if let Some(dir) = cli.session_dir {
        config.session_dir = dir;
    }
    init_telemetry(&config.telemetry, cli.verbose);

    let store: Arc<dyn SessionStore> = Arc::new(JsonFileSessionStore::new(&config.session_dir));

    match cli.command {
        Commands::Generate { product, session, brief } => {
            brief.apply(&mut config);
            config.validate()?;
            match (session, product) {
                (Some(id), _) => run_resume(config, store, &id).await,
                (None, Some(product)) => run_generate(config, store, &product, &brief).await,
                (None, None) => Err(BrandError::selection("pass --product or --session")),
            }
        }
        Commands::Feedback { session, action } => {
            config.validate()?;
            run_feedback(config, store, &session, action).await
        }
        Commands::Validate { session, names, tlds, json } => {
            if let Some(tlds) = tlds {
                config.validation.tlds = parse_tld_list([tlds]);
            }
            config.validate()?;
            run_validate(config, store, session, names, json).await
        }
        Commands::Story { session, name, json } => {
            config.validate()?;
            run_story(config, store, &session, name, json).await
        }
        Commands::Interactive { product, brief } => {
            brief.apply(&mut config);
            config.validate()?;
            output::banner();
            run_interactive(config, store, &product, &brief).await
        }
        Commands::Sessions { delete } => {
            if let Some(id) = delete {
                store.delete(&id).await?;
                output::success(&format!("Deleted session {}", id));
            } else {
                output::print_sessions(&store.list().await?);
            }
            Ok(())
        }
        Commands::Config => {
            output::print_config(&config);
            config.validate()?;
            config.model.require_api_key()?;
            println!("{}", "Configuration is valid!".green());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Ok(path) = dotenvy::dotenv() {
        eprintln!("Loaded config from: {}", path.display());
    }

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(BrandError::Config(message)) => {
            eprintln!("{}: {}", "Configuration Error".red().bold(), message);
            eprintln!();
            eprintln!(
                "Set {} in the environment or a {} file.",
                "GEMINI_API_KEY".cyan(),
                ".env".cyan()
            );
            eprintln!("Run {} to see the active settings.", "brand-studio config".cyan());
            ExitCode::FAILURE
        }
        Err(BrandError::Cancelled) => {
            eprintln!("{}", "Cancelled; the session keeps its last completed round.".yellow());
            ExitCode::from(130)
        }
        Err(error) => {
            eprintln!("{}: {}", "Error".red().bold(), error);
            ExitCode::FAILURE
        }
    }
}
