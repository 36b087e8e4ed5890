use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use hash_expand::config::{self, Config};
use hash_expand::error::ResultExt;
use hash_expand::expand::ExpansionEngine;
use hash_expand::logging;
use hash_expand::simulate::{simulate_flat, simulate_tree, ExpansionReport};
use hash_expand::templates::FileTemplateStore;

/// Expand `#token` into stored templates on a simulated keystroke
#[derive(Parser, Debug)]
#[command(name = "hash-expand", version, about)]
struct Cli {
    /// Config file (default: ~/.hash-expand/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Templates file, overriding `templatesPath` from the config
    #[arg(long, global = true)]
    templates: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Press a key in a textarea holding TEXT
    Flat {
        #[arg(long)]
        text: String,
        /// Caret offset in chars (default: end of text)
        #[arg(long)]
        caret: Option<usize>,
        /// Key to press (default: the configured trigger key)
        #[arg(long)]
        key: Option<String>,
    },
    /// Press a key in a content-editable region, one text node per segment
    Tree {
        #[arg(long = "segment", required = true)]
        segments: Vec<String>,
        /// Key to press (default: the configured trigger key)
        #[arg(long)]
        key: Option<String>,
    },
    /// Watch the templates file and expand each stdin line as a textarea
    Watch,
}

fn main() -> Result<()> {
    let _guard = logging::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => config::load_config_at(path),
        None => config::load_config(),
    };
    let templates_path = cli
        .templates
        .clone()
        .unwrap_or_else(|| config.templates_path());

    let mut store = FileTemplateStore::new(&templates_path);
    let engine = ExpansionEngine::connect(&store, config.expansion_settings())
        .with_context(|| format!("Failed to load templates from {}", templates_path.display()))?;
    info!(
        templates = engine.templates().len(),
        path = %templates_path.display(),
        "Templates loaded"
    );

    match cli.command {
        Command::Flat { text, caret, key } => {
            let key = key.unwrap_or_else(|| config.trigger_key.clone());
            print_report(&simulate_flat(&engine, &text, caret, &key))
        }
        Command::Tree { segments, key } => {
            let key = key.unwrap_or_else(|| config.trigger_key.clone());
            print_report(&simulate_tree(&engine, &segments, &key))
        }
        Command::Watch => {
            store
                .watch()
                .with_context(|| format!("Failed to watch {}", templates_path.display()))?;
            run_watch(&engine, &config)
        }
    }
}

fn run_watch(engine: &ExpansionEngine, config: &Config) -> Result<()> {
    info!("Reading lines from stdin");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to read stdin, stopping");
                break;
            }
        };
        let report = simulate_flat(engine, &line, None, &config.trigger_key);
        if print_report(&report).log_err().is_none() {
            break;
        }
    }
    Ok(())
}

fn print_report(report: &ExpansionReport) -> Result<()> {
    let json = serde_json::to_string(report).context("Failed to serialize report")?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", json).context("Failed to write report")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}
