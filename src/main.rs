// SPDX-License-Identifier: PMPL-1.0-or-later

//! fuzzy-infer: a fuzzy forward-chaining production rule engine CLI.
//!
//! A thin demonstration surface over `fuzzy_infer`: load a knowledge base
//! from its text schema, saturate it, query the result, or merge two
//! knowledge bases. File navigation, logging configuration, and the choice
//! of on-disk encoding beyond JSON/YAML are deliberately out of scope here
//! (spec.md §1) — this binary only exercises the library.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use fuzzy_infer::merge::{MergeConfig, MergeStrategy};
use fuzzy_infer::KnowledgeBase;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fuzzy-infer")]
#[command(version = "0.1.0")]
#[command(about = "A fuzzy forward-chaining production rule engine")]
#[command(long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, default_value_t = false, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a knowledge base, run inference to a fixed point, and print the
    /// resulting facts.
    Run {
        /// Knowledge-base file (.json, .yaml, or .yml)
        #[arg(value_name = "KB")]
        kb: PathBuf,

        /// Write the saturated knowledge base back out here
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Maximum driver passes before giving up
        #[arg(long, default_value_t = 1000)]
        max_iterations: u32,
    },

    /// Load a knowledge base and query its facts without running inference.
    Query {
        /// Knowledge-base file (.json, .yaml, or .yml)
        #[arg(value_name = "KB")]
        kb: PathBuf,

        /// Predicate to query
        #[arg(value_name = "PREDICATE")]
        predicate: String,

        /// Positional args, `_` as a wildcard slot
        #[arg(value_name = "ARG")]
        args: Vec<String>,
    },

    /// Merge two knowledge bases under a strategy and print the result.
    Merge {
        /// First knowledge-base file
        #[arg(value_name = "KB1")]
        kb1: PathBuf,

        /// Second knowledge-base file
        #[arg(value_name = "KB2")]
        kb2: PathBuf,

        /// Merge strategy
        #[arg(short, long, value_enum, default_value_t = MergeStrategyArg::Union)]
        strategy: MergeStrategyArg,

        /// Weight for KB1, required by --strategy weighted
        #[arg(long)]
        weight1: Option<f64>,

        /// Weight for KB2, required by --strategy weighted
        #[arg(long)]
        weight2: Option<f64>,

        /// Automatically resolve conflicts, only meaningful with --strategy smart
        #[arg(long, default_value_t = false)]
        auto_resolve: bool,

        /// Fail instead of falling back to UNION when --strategy smart finds
        /// conflicts and --auto-resolve is not set
        #[arg(long, default_value_t = false)]
        strict: bool,

        /// Fact-contradiction severity cutoff
        #[arg(long, default_value_t = 0.5)]
        threshold: f64,

        /// Write the merged knowledge base here
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Validate a knowledge-base file without running it.
    Check {
        /// Knowledge-base file (.json, .yaml, or .yml)
        #[arg(value_name = "KB")]
        kb: PathBuf,
    },
}

#[derive(Copy, Clone, clap::ValueEnum)]
enum MergeStrategyArg {
    Union,
    Override,
    Complement,
    Weighted,
    Smart,
}

macro_rules! qprintln {
    ($quiet:expr, $($arg:tt)+) => {
        if !$quiet {
            println!($($arg)+);
        }
    };
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            kb,
            output,
            max_iterations,
        } => run_command(&kb, output.as_deref(), max_iterations, cli.quiet),
        Commands::Query { kb, predicate, args } => query_command(&kb, &predicate, &args, cli.quiet),
        Commands::Merge {
            kb1,
            kb2,
            strategy,
            weight1,
            weight2,
            auto_resolve,
            strict,
            threshold,
            output,
        } => merge_command(
            &kb1,
            &kb2,
            strategy,
            weight1,
            weight2,
            auto_resolve,
            strict,
            threshold,
            output.as_deref(),
            cli.quiet,
        ),
        Commands::Check { kb } => check_command(&kb),
    }
}

fn run_command(kb_path: &std::path::Path, output: Option<&std::path::Path>, max_iterations: u32, quiet: bool) -> Result<()> {
    let mut kb = KnowledgeBase::load_from_file(kb_path)
        .with_context(|| format!("loading knowledge base from {}", kb_path.display()))?;

    qprintln!(quiet, "{}", format!("loaded {} fact(s), {} rule(s)", kb.get_facts().len(), kb.get_rules().len()).dimmed());

    kb.run(max_iterations).context("running inference")?;

    let facts = kb.get_facts();
    qprintln!(quiet, "{}", format!("saturated: {} fact(s)", facts.len()).green());
    for fact in &facts {
        println!("{}({}) = {}", fact.predicate, fact.args.join(", "), fact.degree);
    }

    if let Some(path) = output {
        kb.save_to_file(path)
            .with_context(|| format!("writing knowledge base to {}", path.display()))?;
        qprintln!(quiet, "{}", format!("wrote {}", path.display()).dimmed());
    }

    Ok(())
}

fn query_command(kb_path: &std::path::Path, predicate: &str, args: &[String], quiet: bool) -> Result<()> {
    let kb = KnowledgeBase::load_from_file(kb_path)
        .with_context(|| format!("loading knowledge base from {}", kb_path.display()))?;

    let pattern: Option<Vec<Option<String>>> = if args.is_empty() {
        None
    } else {
        Some(
            args.iter()
                .map(|a| if a == "_" { None } else { Some(a.clone()) })
                .collect(),
        )
    };
    let results = kb.query(predicate, pattern.as_deref());

    qprintln!(quiet, "{}", format!("{} match(es)", results.len()).dimmed());
    for fact in &results {
        println!("{}({}) = {}", fact.predicate, fact.args.join(", "), fact.degree);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn merge_command(
    kb1_path: &std::path::Path,
    kb2_path: &std::path::Path,
    strategy: MergeStrategyArg,
    weight1: Option<f64>,
    weight2: Option<f64>,
    auto_resolve: bool,
    strict: bool,
    threshold: f64,
    output: Option<&std::path::Path>,
    quiet: bool,
) -> Result<()> {
    let kb1 = KnowledgeBase::load_from_file(kb1_path)
        .with_context(|| format!("loading knowledge base from {}", kb1_path.display()))?;
    let kb2 = KnowledgeBase::load_from_file(kb2_path)
        .with_context(|| format!("loading knowledge base from {}", kb2_path.display()))?;

    let strategy = match strategy {
        MergeStrategyArg::Union => MergeStrategy::Union,
        MergeStrategyArg::Override => MergeStrategy::Override,
        MergeStrategyArg::Complement => MergeStrategy::Complement,
        MergeStrategyArg::Weighted => MergeStrategy::Weighted(weight1.unwrap_or(1.0), weight2.unwrap_or(1.0)),
        MergeStrategyArg::Smart => MergeStrategy::Smart,
    };
    let config = MergeConfig {
        threshold,
        exclusion_families: Vec::new(),
        auto_resolve,
        strict,
    };

    let merged = kb1.merge(&kb2, strategy, &config).context("merging knowledge bases")?;

    qprintln!(
        quiet,
        "{}",
        format!(
            "merged: {} fact(s), {} rule(s), {} conflict(s)",
            merged.get_facts().len(),
            merged.get_rules().len(),
            merged.conflict_report().len()
        )
        .green()
    );
    for conflict in merged.conflict_report() {
        println!(
            "{} {:?}: {} (severity {:.2}) -> {}",
            "conflict".yellow(),
            conflict.kind,
            conflict.description,
            conflict.severity,
            conflict.suggested_resolution
        );
    }

    if let Some(path) = output {
        merged
            .save_to_file(path)
            .with_context(|| format!("writing knowledge base to {}", path.display()))?;
        qprintln!(quiet, "{}", format!("wrote {}", path.display()).dimmed());
    }

    Ok(())
}

fn check_command(kb_path: &std::path::Path) -> Result<()> {
    let kb = KnowledgeBase::load_from_file(kb_path)
        .with_context(|| format!("loading knowledge base from {}", kb_path.display()))?;
    println!(
        "{} {} fact(s), {} rule(s)",
        "ok:".green(),
        kb.get_facts().len(),
        kb.get_rules().len()
    );
    Ok(())
}
