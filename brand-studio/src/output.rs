//! Console rendering for the CLI.

use crate::assembler::BrandPackage;
use crate::config::StudioConfig;
use brand_core::{
    CheckOutcome, Completion, DomainStatus, RefinementSession, RoundView, SessionSummary,
    TrademarkRisk, ValidationReport, ValidationResult, Verdict,
};
use colored::{ColoredString, Colorize};

pub fn banner() {
    println!("{}", "Brand Studio".bright_white().bold());
    println!("{}", "Iterative brand naming".bright_black());
    println!();
}

pub fn phase(name: &str) {
    println!("\n{} {}", "▶".bright_cyan(), name.bright_white().bold());
}

pub fn status(message: &str) {
    println!("  {} {}", "•".bright_black(), message);
}

pub fn success(message: &str) {
    println!("  {} {}", "✓".bright_green(), message.green());
}

pub fn warning(message: &str) {
    println!("  {} {}", "!".bright_yellow(), message.yellow());
}

/// The numbered candidate list shown before asking for feedback.
pub fn render_round(view: &RoundView) -> String {
    let mut out = format!(
        "{} {} {}\n",
        "Round".bright_white().bold(),
        view.round.to_string().cyan(),
        format!(
            "(iteration {}/{}, {} left)",
            view.iteration + 1,
            view.max_iterations,
            view.remaining_iterations()
        )
        .bright_black()
    );
    for (i, candidate) in view.candidates.iter().enumerate() {
        out.push_str(&format!(
            "\n  {:>2}. {} {}",
            i + 1,
            candidate.name.bright_white().bold(),
            format!("[{}]", candidate.strategy).bright_black()
        ));
        if !candidate.tagline.is_empty() {
            out.push_str(&format!("\n      {}", candidate.tagline.italic()));
        }
        if !candidate.rationale.is_empty() {
            out.push_str(&format!("\n      {}", candidate.rationale.bright_black()));
        }
    }
    out
}

pub fn print_round(view: &RoundView) {
    println!("{}", render_round(view));
    println!();
}

pub fn print_completion(session: &RefinementSession) {
    let names = session.approved_names().unwrap_or_default();
    match session.completion() {
        Some(Completion::Approved) => {
            println!("{}", "Names approved!".green().bold());
        }
        Some(Completion::IterationCapReached) => {
            println!(
                "{} {}",
                "Iteration limit reached.".yellow().bold(),
                format!("Keeping the top {} names of the final round.", names.len())
                    .bright_black()
            );
        }
        None => return,
    }
    for name in names {
        println!("  {} {}", "─".bright_black(), name.bright_white());
    }
    println!();
}

fn verdict_label(verdict: Verdict) -> ColoredString {
    match verdict {
        Verdict::Pass => "PASS".green().bold(),
        Verdict::Fail => "FAIL".red().bold(),
        Verdict::Indeterminate => "UNKNOWN".yellow().bold(),
    }
}

fn risk_label(risk: TrademarkRisk) -> ColoredString {
    let text = risk.to_string();
    match risk {
        TrademarkRisk::Low => text.green(),
        TrademarkRisk::Medium => text.yellow(),
        TrademarkRisk::High | TrademarkRisk::Critical => text.red(),
    }
}

fn print_result(name: &str, result: &ValidationResult) {
    println!("  {} {}", verdict_label(result.verdict()), name.bright_white().bold());

    match &result.domain_status {
        CheckOutcome::Completed(domains) => {
            let cells: Vec<String> = domains
                .iter()
                .map(|(tld, status)| match status {
                    DomainStatus::Available => format!("{} ✓", tld).green().to_string(),
                    DomainStatus::Taken => format!("{} ✗", tld).red().to_string(),
                    DomainStatus::Unknown => format!("{} ?", tld).yellow().to_string(),
                })
                .collect();
            println!("      domains:   {}", cells.join("  "));
        }
        CheckOutcome::Unavailable(reason) => {
            println!("      domains:   {}", format!("unavailable ({})", reason).yellow());
        }
    }

    match &result.trademark {
        CheckOutcome::Completed(report) => {
            println!(
                "      trademark: {} ({} conflicts)",
                risk_label(report.risk),
                report.conflicts.len()
            );
        }
        CheckOutcome::Unavailable(reason) => {
            println!("      trademark: {}", format!("unavailable ({})", reason).yellow());
        }
    }

    match &result.seo_score {
        CheckOutcome::Completed(score) => println!("      seo:       {:.0}/100", score),
        CheckOutcome::Unavailable(reason) => {
            println!("      seo:       {}", format!("unavailable ({})", reason).yellow());
        }
    }
}

pub fn print_validation(report: &ValidationReport) {
    println!("{}", "Validation".yellow().bold());
    for (name, result) in &report.results {
        print_result(name, result);
    }
    println!();
    let summary = format!("{} of {} assessable names passed", report.passed, report.assessed);
    if report.set_passed {
        println!("{} {}", "Set passed:".green().bold(), summary);
    } else {
        println!("{} {}", "Set failed:".red().bold(), summary);
    }
    println!();
}

pub fn print_package(package: &BrandPackage) {
    println!("{} {}", "Brand package:".yellow().bold(), package.name.bright_white().bold());
    println!();
    println!("{}", "Taglines".cyan().bold());
    for tagline in &package.taglines {
        println!("  {} {}", "─".bright_black(), tagline);
    }
    println!();
    println!("{}", "Story".cyan().bold());
    println!("{}", package.story);
    println!();
    println!("{}", "Hero copy".cyan().bold());
    println!("{}", package.hero_copy);
    println!();
    println!("{}", "Value proposition".cyan().bold());
    println!("{}", package.value_prop);
    if !package.advisories.is_empty() {
        println!();
        for advisory in &package.advisories {
            warning(advisory);
        }
    }
    println!();
}

pub fn print_sessions(sessions: &[SessionSummary]) {
    if sessions.is_empty() {
        println!("{}", "No saved sessions.".bright_black());
        return;
    }
    println!("{}", "Sessions:".yellow().bold());
    for summary in sessions {
        let state = if summary.complete { "complete".green() } else { "in progress".cyan() };
        let product = summary.brief.lines().next().unwrap_or_default();
        println!(
            "  {}  {}  round {}  {}",
            summary.id.bright_white(),
            state,
            summary.rounds,
            product.bright_black()
        );
    }
    println!();
}

pub fn print_config(config: &StudioConfig) {
    println!("{}", "Configuration:".yellow().bold());
    println!(
        "  Model:           {} ({})",
        config.model.provider.cyan(),
        config.model.model_name
    );
    println!(
        "  API key:         {}",
        if config.model.api_key.is_some() { "set".green() } else { "missing".red() }
    );
    println!("  Max iterations:  {}", config.refinement.max_iterations);
    println!("  Names per round: {}", config.refinement.candidates_per_round);
    println!("  Fallback count:  {}", config.refinement.fallback_count);
    println!("  TLDs:            {}", config.validation.tlds.join(", "));
    println!("  Check timeout:   {} ms", config.validation.check_timeout_ms);
    println!("  Session dir:     {}", config.session_dir);
    println!();
}
