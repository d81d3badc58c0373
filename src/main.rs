//! Rulesort CLI
//!
//! Command-line shell around the organizer: resolves the config path, keeps
//! the remembered path and prints the result log.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rulesort::state::FileLastPathStore;
use rulesort::{Config, FilePicker, LastPathStore, OrganizeOptions, Selection};

#[derive(Parser, Debug)]
#[command(name = "rulesort")]
#[command(author, version, about = "Move files into folders by name patterns")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Organize files once
    Run {
        /// Path to config file (defaults to the last one used)
        config: Option<PathBuf>,

        /// Only show what would happen
        #[arg(long)]
        dry_run: bool,

        /// Print the result log as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate config file
    Check {
        /// Path to config file to validate
        config: Option<PathBuf>,
    },

    /// List all rules
    List {
        /// Path to config file
        config: Option<PathBuf>,
    },

    /// Choose a config file and remember it
    Select,

    /// Show the remembered config path
    Last,
}

/// Prompts for a path on stdin; empty input cancels
struct StdinPicker;

impl FilePicker for StdinPicker {
    fn pick_config(&self) -> std::io::Result<Option<PathBuf>> {
        let mut stderr = std::io::stderr();
        write!(stderr, "Config file (empty to cancel): ")?;
        stderr.flush()?;

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        let line = line.trim();
        Ok((!line.is_empty()).then(|| PathBuf::from(line)))
    }
}

/// Explicit path, then the remembered one, then the default location
fn resolve_config_path(
    explicit: Option<PathBuf>,
    store: Option<&FileLastPathStore>,
) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Some(store) = store {
        match rulesort::load_last_config_path(store) {
            Ok(Some(path)) => return Ok(path),
            Ok(None) => {}
            Err(e) => warn!("{}", e),
        }
    }
    Config::default_path().context("Could not determine config path")
}

fn remember(store: Option<&FileLastPathStore>, path: &std::path::Path) {
    if let Some(store) = store
        && let Err(e) = store.save(path)
    {
        warn!("{}", e);
    }
}

async fn run(config_path: PathBuf, dry_run: bool, json: bool) -> Result<bool> {
    let cancel = Arc::new(AtomicBool::new(false));
    let options = OrganizeOptions {
        dry_run,
        cancel: Some(Arc::clone(&cancel)),
    };
    let mut pass = tokio::task::spawn_blocking(move || {
        rulesort::organize_files_with(&config_path, options)
    });

    // Ctrl-C stops before the next file; a move in flight always finishes
    let log = tokio::select! {
        log = &mut pass => log??,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, finishing the current file");
            cancel.store(true, Ordering::SeqCst);
            pass.await??
        }
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&log).context("Failed to serialize result log")?
        );
    } else {
        for line in log.lines() {
            println!("{}", line);
        }
        for (_, name, summary) in log.rule_summaries() {
            if dry_run {
                println!("Rule '{}': {} files would be moved", name, summary.planned);
            } else {
                println!("Rule '{}': moved {} files", name, summary.relocated());
            }
        }
        if log.cancelled {
            println!("Cancelled before all files were processed");
        }
    }

    Ok(!log.has_failures())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RULESORT_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let store = FileLastPathStore::default_location();
    if store.is_none() {
        warn!("No data directory; the config path will not be remembered");
    }

    match cli.command {
        Commands::Run {
            config,
            dry_run,
            json,
        } => {
            let path = resolve_config_path(config, store.as_ref())?;
            info!("Using config {}", path.display());
            let clean = run(path.clone(), dry_run, json).await?;
            remember(store.as_ref(), &path);
            if !clean {
                std::process::exit(2);
            }
        }
        Commands::Check { config } => {
            let path = resolve_config_path(config, store.as_ref())?;
            match rulesort::load_config(&path) {
                Ok(config) => {
                    println!("✓ Config is valid");
                    println!("  {} rules", config.rules.len());
                }
                Err(e) => {
                    eprintln!("✗ Config error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::List { config } => {
            let path = resolve_config_path(config, store.as_ref())?;
            let config = rulesort::load_config(&path)?;
            println!("Rules:");
            for (i, rule) in config.rules.iter().enumerate() {
                let status = if rule.enabled { "✓" } else { "✗" };
                println!(
                    "  {} [{}] {}: {} [{}] -> {}",
                    status,
                    i + 1,
                    rule.name,
                    rule.source_folder.display(),
                    rule.pattern,
                    rule.destination_folder.display()
                );
            }
        }
        Commands::Select => match rulesort::select_file(&StdinPicker, true)? {
            Selection::Chosen { path, config } => {
                let rules = config.map(|c| c.rules.len()).unwrap_or(0);
                println!("Selected {} ({} rules)", path.display(), rules);
                remember(store.as_ref(), &path);
            }
            Selection::Cancelled => println!("No selection"),
        },
        Commands::Last => {
            let last = match store.as_ref() {
                Some(store) => rulesort::load_last_config_path(store)?,
                None => None,
            };
            match last {
                Some(path) => println!("{}", path.display()),
                None => println!("No remembered config"),
            }
        }
    }

    Ok(())
}
