//! quill - CLI entry point.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use dialoguer::Confirm;
use tracing_subscriber::EnvFilter;

use quill::changelog::{ChangelogStore, FileChangelogStore};
use quill::config::{DEFAULT_MAX_REPAIR_ATTEMPTS, DEFAULT_TIMEOUT_SECS, GenerationConfig, PipelineConfig, Provider};
use quill::git::{DiffSource, GitRepository, PatchFile, create_commit};
use quill::llm::build_generator;
use quill::pipeline::{Coordinator, PipelineState};

/// Draft a conventional commit message and changelog entry from staged changes.
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(about = "Draft a conventional commit message and changelog entry from staged changes")]
#[command(version)]
struct Cli {
    /// Repository to read staged changes from
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Read the diff from this file (`-` for stdin) instead of the index
    #[arg(long, value_name = "PATH", conflicts_with = "commit")]
    diff: Option<PathBuf>,

    /// Generation backend (ollama or claude)
    #[arg(long, env = "QUILL_PROVIDER", default_value = "ollama")]
    provider: Provider,

    /// Model id (defaults to llama3.2 for ollama, sonnet for claude)
    #[arg(long, env = "QUILL_MODEL")]
    model: Option<String>,

    /// Base URL of the Ollama server
    #[arg(long, env = "QUILL_ENDPOINT", default_value = quill::config::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Maximum number of repair attempts before accepting the last message
    #[arg(long, default_value_t = DEFAULT_MAX_REPAIR_ATTEMPTS)]
    max_repairs: u32,

    /// File-purpose requests to run at once
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Only run the structural message checks
    #[arg(long)]
    no_semantic_check: bool,

    /// Path to changelog file
    #[arg(short = 'o', long, default_value = "CHANGELOG.md")]
    output: PathBuf,

    /// Dry run - print message and changelog without writing
    #[arg(long)]
    dry_run: bool,

    /// Create a commit with the generated message
    #[arg(long)]
    commit: bool,

    /// Skip the confirmation prompt before committing
    #[arg(short = 'y', long)]
    yes: bool,

    /// Write the run transcript as JSON to this path
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn pipeline_config(&self) -> PipelineConfig {
        let generation = GenerationConfig {
            provider: self.provider,
            model: self
                .model
                .clone()
                .unwrap_or_else(|| self.provider.default_model().to_string()),
            endpoint: self.endpoint.clone(),
            temperature: 0.0,
            timeout: Duration::from_secs(self.timeout),
        };

        PipelineConfig {
            repo_path: self.repo.clone(),
            max_repair_attempts: self.max_repairs,
            analysis_concurrency: self.concurrency,
            semantic_validation: !self.no_semantic_check,
            generation,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.pipeline_config();

    let generator = build_generator(&config.generation)
        .with_context(|| format!("Failed to set up the {} provider", config.generation.provider))?;
    let source: Box<dyn DiffSource> = match &cli.diff {
        Some(path) => Box::new(PatchFile::new(path)),
        None => Box::new(GitRepository::new(&config.repo_path)),
    };

    println!(
        "Drafting commit message with {} ({})...",
        config.generation.provider, config.generation.model
    );

    let coordinator = Coordinator::new(source, generator, config.clone());
    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, stopping after the current step...");
            cancel.cancel();
        }
    });

    let outcome = match coordinator.run().await {
        Ok(outcome) => outcome,
        Err(err) => {
            if let Some(path) = &cli.transcript
                && let Err(dump_err) = dump_transcript(path, &err.state)
            {
                eprintln!("Warning: {:#}", dump_err);
            }
            return Err(err).context("Failed to generate commit message");
        }
    };

    println!();
    println!("{}", outcome.final_message);
    println!();

    if outcome.exhausted() {
        eprintln!(
            "Warning: message still fails validation after {} repair attempts:",
            outcome.attempts
        );
        for reason in outcome.warnings() {
            eprintln!("  - {}", reason);
        }
    } else if outcome.attempts > 0 {
        println!("Message accepted after {} repair attempt(s)", outcome.attempts);
    }

    if let Some(path) = &cli.transcript {
        dump_transcript(path, &outcome.state)?;
    }

    if cli.dry_run {
        println!("{}", outcome.changelog);
        println!("Dry run complete. No changes made.");
        return Ok(());
    }

    let store = FileChangelogStore::new(&cli.output);
    match store.append(&outcome.changelog) {
        Ok(()) => println!("Updated {}", cli.output.display()),
        Err(e) => eprintln!("Warning: Could not update {}: {}", cli.output.display(), e),
    }

    if cli.commit {
        let confirmed = cli.yes
            || Confirm::new()
                .with_prompt("Create commit with this message?")
                .default(true)
                .interact()
                .context("Failed to read confirmation")?;

        if confirmed {
            let oid = create_commit(&config.repo_path, &outcome.final_message)
                .context("Failed to create commit")?;
            println!("Created commit {}", &oid.to_string()[..7]);
        } else {
            println!("Commit skipped.");
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("quill=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("quill=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn dump_transcript(path: &Path, state: &PipelineState) -> Result<()> {
    let json = serde_json::to_string_pretty(state).context("Failed to serialize transcript")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write transcript to {}", path.display()))?;
    println!("Wrote transcript to {}", path.display());
    Ok(())
}
