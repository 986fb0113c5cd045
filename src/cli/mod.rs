//! Command-line interface for lexuse.
//!
//! Provides commands for interactive curation, dry-run searches, and
//! inspecting the decision log and configuration.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::collaborators::{ExportUploader, JsonFormProvider};
use crate::config::{load_config, ResolvedConfig};
use crate::core::{
    CurationSession, Decision, DecisionResult, DecisionStore, SessionDeps, SourceAggregator,
};
use crate::domain::{Form, LanguageCode};
use crate::sources::build_sources;

pub mod prompt;

use prompt::Choice;

/// lexuse - usage-example mining and curation
#[derive(Parser, Debug)]
#[command(name = "lexuse")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Curate usage examples interactively
    Curate {
        /// Language code of the forms (e.g. sv, en)
        #[arg(short, long, env = "LEXUSE_LANGUAGE", default_value = "sv")]
        language: String,

        /// Forms to work on (JSON array or JSONL)
        #[arg(short, long)]
        forms: PathBuf,

        /// Where accepted examples are written (default: $LEXUSE_HOME/exports)
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Show the candidates the sources find for a word, without a session
    Search {
        /// Representation to search for
        representation: String,

        /// Language code
        #[arg(short, long, env = "LEXUSE_LANGUAGE", default_value = "sv")]
        language: String,

        /// Maximum number of candidates to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Summarize the decision log
    Decisions {
        /// List every decision
        #[arg(long)]
        list: bool,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = load_config()?;

        match self.command {
            Commands::Curate {
                language,
                forms,
                export,
            } => curate(&config, LanguageCode::new(language), forms, export).await,
            Commands::Search {
                representation,
                language,
                limit,
            } => search(&config, &representation, LanguageCode::new(language), limit).await,
            Commands::Decisions { list } => show_decisions(&config, list).await,
            Commands::Config => show_config(&config),
        }
    }
}

fn build_aggregator(config: &ResolvedConfig) -> Result<SourceAggregator> {
    let sources = build_sources(&config.sources, &config.data, &config.extraction);
    if sources.is_empty() {
        anyhow::bail!(
            "No usable sources. Check the corpus tables in {}",
            config.data.display()
        );
    }

    let mut aggregator = SourceAggregator::new(config.aggregation.clone());
    for source in sources {
        aggregator.register(source);
    }
    Ok(aggregator)
}

/// Run an interactive curation session
async fn curate(
    config: &ResolvedConfig,
    language: LanguageCode,
    forms_path: PathBuf,
    export: Option<PathBuf>,
) -> Result<()> {
    let aggregator = build_aggregator(config)?;
    let store = DecisionStore::open(config.decisions_path())
        .await
        .context("Failed to open decision log")?;
    let export_path = export.unwrap_or_else(|| config.exports.clone());

    let deps = SessionDeps {
        forms: Arc::new(JsonFormProvider::new(forms_path)),
        aggregator: Arc::new(aggregator),
        uploader: Arc::new(ExportUploader::new(&export_path)),
        store,
    };

    let mut session = CurationSession::start(language, deps).await?;
    println!(
        "Session {}: {} form(s) to work on ({} already decided)",
        session.id(),
        session.remaining_forms(),
        session.summary().already_decided
    );

    let mut position = 0;
    'forms: while let Some(form) = session.next_form().await? {
        position += 1;
        prompt::print_form(&form, position, session.remaining_candidates());

        while let Some(candidate) = session.next_candidate()? {
            prompt::print_candidate(&candidate, session.remaining_candidates());

            loop {
                match prompt::ask_stdin()? {
                    Choice::Accept => match session.decide(Decision::Accept).await {
                        Ok(DecisionResult::NoFittingSense) => {
                            println!("  No fitting sense, skipping this example");
                            break;
                        }
                        Ok(_) => {
                            println!("  Saved to {}", export_path.display());
                            continue 'forms;
                        }
                        Err(e) if e.is_retryable() => {
                            eprintln!("  {}. Try again or skip.", e);
                        }
                        Err(e) => return Err(e.into()),
                    },
                    Choice::Skip => {
                        session.decide(Decision::Skip).await?;
                        break;
                    }
                    Choice::Decline => {
                        session.decide(Decision::DeclineForm).await?;
                        println!("  Declined {}", form);
                        continue 'forms;
                    }
                    Choice::Quit => break 'forms,
                }
            }
        }
    }

    let summary = session.finish();
    println!();
    println!("Forms fetched:        {}", summary.forms_fetched);
    println!("Already decided:      {}", summary.already_decided);
    println!("Without candidates:   {}", summary.without_candidates);
    println!("Finished:             {}", summary.finished);
    println!("Declined:             {}", summary.declined);
    println!("Candidates presented: {}", summary.candidates_total);
    println!(
        "Time fetching:        {:.1}s",
        summary.fetch_duration.as_secs_f64()
    );

    Ok(())
}

/// Dry run: print candidates for a representation
async fn search(
    config: &ResolvedConfig,
    representation: &str,
    language: LanguageCode,
    limit: usize,
) -> Result<()> {
    let aggregator = build_aggregator(config)?;
    let form = Form::new("search", representation, language)?;

    let aggregation = aggregator.collect(&form).await?;
    for report in &aggregation.reports {
        eprintln!("{}", report);
    }

    let mut candidates = aggregation.candidates;
    candidates.sort_by_key(|c| c.word_count);

    if candidates.is_empty() {
        println!("No candidates found for '{}'", representation);
        return Ok(());
    }

    println!("{:<6} {:<20} TEXT", "WORDS", "SOURCE");
    println!("{}", "-".repeat(75));
    for candidate in candidates.iter().take(limit) {
        println!(
            "{:<6} {:<20} {}",
            candidate.word_count, candidate.provenance.source, candidate.text
        );
    }
    if candidates.len() > limit {
        println!("... and {} more", candidates.len() - limit);
    }

    Ok(())
}

/// Summarize the decision log
async fn show_decisions(config: &ResolvedConfig, list: bool) -> Result<()> {
    let path = config.decisions_path();
    let store = DecisionStore::load(&path)
        .await
        .with_context(|| format!("Failed to read decision log: {}", path.display()))?;

    let summary = store.summary();
    println!("Decision log: {}", path.display());
    println!("Finished: {}", summary.finished);
    println!("Declined: {}", summary.declined);
    println!("Total:    {}", summary.total());

    if list && !store.is_empty() {
        println!();
        println!("{:<20} {:<10} DECIDED AT", "FORM", "OUTCOME");
        println!("{}", "-".repeat(60));
        for record in store.records() {
            println!(
                "{:<20} {:<10} {}",
                record.form_id,
                record.outcome.as_str(),
                record.decided_at.format("%Y-%m-%d %H:%M")
            );
        }
    }

    Ok(())
}

/// Show resolved configuration
fn show_config(config: &ResolvedConfig) -> Result<()> {
    match &config.config_file {
        Some(path) => println!("# Config file: {}", path.display()),
        None => println!("# No config file found, using defaults"),
    }
    let yaml = serde_yaml::to_string(config).context("Failed to render configuration")?;
    print!("{}", yaml);
    Ok(())
}
