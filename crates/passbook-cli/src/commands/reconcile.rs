//! Reconcile command - extract, de-duplicate and categorize many statements.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use passbook_core::categorize::{CategoryRules, CategoryStore, Categorizer, SubscriptionRules, SubscriptionTagger};
use passbook_core::statement::StatementParser;
use passbook_core::{CollapsedTransaction, DocumentOutcome, ReconciledResult, Reconciler};

use super::process::parse_file;
use super::{data_dir, load_config};

/// Arguments for the reconcile command.
#[derive(Args)]
pub struct ReconcileArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: ReportFormat,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Password for encrypted PDFs
    #[arg(long)]
    password: Option<String>,

    /// Directory holding custom categories and overrides
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ReportFormat {
    /// Full report as JSON
    Json,
    /// Collapsed transactions as CSV
    Csv,
}

pub async fn run(args: ReconcileArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(ext.to_lowercase().as_str(), "pdf" | "txt" | "text")
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to reconcile",
        style("ℹ").blue(),
        files.len()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let parser = Arc::new(StatementParser::new().with_config(config.extraction.clone()));
    let password = args.password.clone();
    let permits = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut tasks = JoinSet::new();

    for (index, path) in files.into_iter().enumerate() {
        let parser = Arc::clone(&parser);
        let password = password.clone();
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("statement")
                .to_string();
            let parsed = tokio::task::spawn_blocking(move || {
                parse_file(&parser, &path, password.as_deref())
            })
            .await;

            let outcome = match parsed {
                Ok(Ok(result)) => DocumentOutcome::Parsed(result),
                Ok(Err(e)) => DocumentOutcome::Unreadable {
                    source_file: name,
                    error: e.to_string(),
                },
                Err(e) => DocumentOutcome::Unreadable {
                    source_file: name,
                    error: format!("worker failed: {}", e),
                },
            };
            (index, outcome)
        });
    }

    let mut indexed = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        indexed.push(joined?);
        pb.inc(1);
    }
    pb.finish_and_clear();
    indexed.sort_by_key(|(index, _)| *index);
    let outcomes: Vec<DocumentOutcome> = indexed.into_iter().map(|(_, outcome)| outcome).collect();

    let store_dir = data_dir(&config, args.data_dir.as_deref());
    debug!("Using category data in {}", store_dir.display());
    let store = CategoryStore::open(store_dir, config.categories.definitions.clone());
    let categorizer = Categorizer::new(CategoryRules::from_config(&config.categories), store.snapshot());
    let tagger = SubscriptionTagger::new(SubscriptionRules::from_config(&config.subscriptions)?);

    let result = Reconciler::new(&categorizer, &tagger).reconcile(outcomes);
    info!(
        "Reconciled {} transactions into {} in {:?}",
        result.summary.total_transactions,
        result.summary.collapsed_transactions,
        start.elapsed()
    );

    let output = match args.format {
        ReportFormat::Json => serde_json::to_string_pretty(&result)?,
        ReportFormat::Csv => format_collapsed_csv(&result.collapsed_transactions)?,
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    print_summary(&result);
    Ok(())
}

fn format_collapsed_csv(transactions: &[CollapsedTransaction]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "group_key",
        "count",
        "date",
        "description",
        "type",
        "amount",
        "currency",
        "category",
        "category_source",
        "subscription",
        "source_file",
    ])?;

    for tx in transactions {
        wtr.write_record([
            tx.duplicate_group_key.as_str(),
            &tx.duplicate_count.to_string(),
            &tx.date.map(|d| d.to_string()).unwrap_or_default(),
            &tx.description,
            tx.tx_type.as_str(),
            &tx.amount_value.map(|v| v.to_string()).unwrap_or_default(),
            tx.currency.code(),
            &tx.category,
            tx.category_source.as_str(),
            if tx.is_subscription { "yes" } else { "no" },
            &tx.source_file,
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn print_summary(result: &ReconciledResult) {
    let summary = &result.summary;

    eprintln!();
    eprintln!("{}", style("Reconciliation Summary").bold());
    eprintln!("  Files: {}/{}", summary.processed_files, summary.total_files);
    eprintln!("  Transactions: {}", summary.total_transactions);
    eprintln!("  Collapsed: {}", summary.collapsed_transactions);
    eprintln!(
        "  Duplicate groups: {} ({} transactions collapsed)",
        summary.duplicate_groups, summary.duplicates_collapsed
    );

    let failed: Vec<_> = summary.files.iter().filter(|f| f.error.is_some()).collect();
    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for file in failed {
            let error = file.error.as_deref().unwrap_or_default();
            warn!("{}: {}", file.filename, error);
            eprintln!("  - {}: {}", file.filename, error);
        }
    }
}
