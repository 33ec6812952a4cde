//! Process command - extract transactions from a single statement.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tracing::{debug, info};

use passbook_core::document::extractor_for_path;
use passbook_core::statement::{ExtractionResult, StatementFormat, StatementParser};
use passbook_core::Transaction;

use super::load_config;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or extracted text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Password for encrypted PDFs
    #[arg(long)]
    password: Option<String>,

    /// Skip format detection and parse with this layout
    #[arg(long, value_enum)]
    layout: Option<Layout>,

    /// Balance before the first transaction
    #[arg(long)]
    opening_balance: Option<Decimal>,

    /// Print extraction issues to stderr
    #[arg(long)]
    show_issues: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum Layout {
    Wallet,
    Bank,
    Card,
    Generic,
}

impl From<Layout> for StatementFormat {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Wallet => StatementFormat::WalletTransfer,
            Layout::Bank => StatementFormat::BankAccountStatement,
            Layout::Card => StatementFormat::CreditCardStatement,
            Layout::Generic => StatementFormat::GenericBankStatement,
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Extracting text...");

    let mut parser = StatementParser::new().with_config(config.extraction);
    if let Some(layout) = args.layout {
        parser = parser.with_format(layout.into());
    }
    if let Some(balance) = args.opening_balance {
        parser = parser.with_opening_balance(balance);
    }

    let result = parse_file(&parser, &args.input, args.password.as_deref())?;
    pb.finish_and_clear();

    if args.show_issues && !result.issues.is_empty() {
        eprintln!("{}", style("Extraction issues:").yellow());
        for issue in &result.issues {
            eprintln!("  - {}", issue);
        }
    }

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        OutputFormat::Csv => format_transactions_csv(&result.transactions)?,
        OutputFormat::Text => format_result_text(&result),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());
    Ok(())
}

/// Read a file through the matching text backend and parse it.
pub fn parse_file(
    parser: &StatementParser,
    path: &Path,
    password: Option<&str>,
) -> anyhow::Result<ExtractionResult> {
    let backend = extractor_for_path(path, password)?;
    let data = fs::read(path)?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("statement");
    Ok(parser.process_bytes(backend.as_ref(), &data, name)?)
}

pub fn format_transactions_csv(transactions: &[Transaction]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "date",
        "original_date",
        "time",
        "description",
        "type",
        "amount",
        "currency",
        "balance",
        "source_file",
        "page",
    ])?;

    for tx in transactions {
        wtr.write_record([
            &tx.date.map(|d| d.to_string()).unwrap_or_default(),
            &tx.original_date,
            tx.time.as_deref().unwrap_or(""),
            &tx.description,
            tx.tx_type.as_str(),
            &tx.amount_value.map(|v| v.to_string()).unwrap_or_default(),
            tx.currency.code(),
            &tx.balance.map(|v| v.to_string()).unwrap_or_default(),
            &tx.source_file,
            &tx.page.to_string(),
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_result_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Statement: {}\n", result.source_file));
    output.push_str(&format!("Format: {}\n", result.metadata.format));
    output.push_str(&format!(
        "Transactions: {} ({} blocks, {} dropped)\n\n",
        result.metadata.total_transactions,
        result.metadata.total_blocks,
        result.metadata.dropped_blocks
    ));

    for tx in &result.transactions {
        let date = tx
            .date
            .map(|d| d.format("%d %b %Y").to_string())
            .unwrap_or_else(|| tx.original_date.clone());
        output.push_str(&format!(
            "{:<12} {:<7} {:>16}  {}\n",
            date,
            tx.tx_type.as_str(),
            tx.display_amount().unwrap_or_else(|| "-".to_string()),
            tx.description
        ));
    }

    output
}
