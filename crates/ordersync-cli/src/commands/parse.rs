//! Parse command - extract orders from saved emails without touching a ledger.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use ordersync_core::{EmailOrderParser, ParsedOrder, RawEmail, parse_emails};

use super::load_config;
use crate::mailbox::{EmlMailbox, read_messages};

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Input files, directories or glob patterns (.eml or .json)
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output, one row per line item
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ParseArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let parser = EmailOrderParser::from_config(&config.extraction)?;

    let files = collect_files(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No message files found in: {}", args.inputs.join(", "));
    }

    eprintln!(
        "{} Found {} message files",
        style("ℹ").blue(),
        files.len()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut emails: Vec<RawEmail> = Vec::new();
    let mut unreadable = Vec::new();
    for path in &files {
        match read_messages(path) {
            Ok(messages) => emails.extend(messages),
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                unreadable.push((path.clone(), e.to_string()));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    let outcome = parse_emails(&parser, &emails);

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&outcome.orders)?,
        OutputFormat::Csv => format_orders_csv(&outcome.orders)?,
        OutputFormat::Text => format_orders_text(&outcome.orders),
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

    eprintln!(
        "{} Parsed {} orders from {} emails",
        style("✓").green(),
        outcome.parsed_count(),
        emails.len()
    );

    if !outcome.failures.is_empty() {
        eprintln!(
            "{} {} emails failed to parse:",
            style("!").yellow(),
            outcome.failed_count()
        );
        for failure in &outcome.failures {
            eprintln!("  - {} ({}): {}", failure.email_id, failure.subject, failure.reason);
        }
    }

    if !unreadable.is_empty() {
        eprintln!("{}", style("Unreadable files:").red());
        for (path, reason) in &unreadable {
            eprintln!("  - {}: {}", path.display(), reason);
        }
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Expand inputs: directories are scanned like a mailbox, other inputs are
/// taken as files or glob patterns.
fn collect_files(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let path = Path::new(input);
        if path.is_dir() {
            files.extend(EmlMailbox::new(path).message_files()?);
        } else if path.is_file() {
            files.push(path.to_path_buf());
        } else {
            files.extend(
                glob(input)?
                    .filter_map(|r| r.ok())
                    .filter(|p| is_message_file(p)),
            );
        }
    }

    files.dedup();
    Ok(files)
}

fn is_message_file(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(ext.to_lowercase().as_str(), "eml" | "json")
}

fn amount(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn format_orders_csv(orders: &[ParsedOrder]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "order_number",
        "order_date",
        "order_status",
        "payment_status",
        "customer_name",
        "sku",
        "item_name",
        "quantity",
        "unit_price",
        "line_subtotal",
        "shipping_fee",
        "discount",
        "total_amount",
    ])?;

    for order in orders {
        let head = [
            order.order_number.clone(),
            order.order_date.clone(),
            order.order_status.label().to_string(),
            order.payment_status.label().to_string(),
            order.customer_name.clone(),
        ];
        let tail = [
            amount(order.shipping_fee),
            order.discount.to_string(),
            amount(order.total_amount),
        ];

        if order.items.is_empty() {
            let mut record = head.to_vec();
            record.extend(std::iter::repeat_n(String::new(), 5));
            record.extend(tail.iter().cloned());
            wtr.write_record(&record)?;
            continue;
        }

        for item in &order.items {
            let mut record = head.to_vec();
            record.extend([
                item.sku.clone().unwrap_or_default(),
                item.name.clone(),
                item.quantity.to_string(),
                item.unit_price.to_string(),
                item.subtotal.to_string(),
            ]);
            record.extend(tail.iter().cloned());
            wtr.write_record(&record)?;
        }
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_orders_text(orders: &[ParsedOrder]) -> String {
    let mut output = String::new();

    for order in orders {
        output.push_str(&format!("Order: {}\n", order.order_number));
        if !order.order_date.is_empty() {
            output.push_str(&format!("Date: {}\n", order.order_date));
        }
        output.push_str(&format!(
            "Status: {} / {}\n",
            order.order_status.label(),
            order.payment_status.label()
        ));
        if !order.customer_name.is_empty() {
            output.push_str(&format!("Customer: {}\n", order.customer_name));
        }
        if !order.tracking_number.is_empty() {
            output.push_str(&format!(
                "Shipped: {} {}\n",
                order.shipping_date, order.tracking_number
            ));
        }

        if !order.items.is_empty() {
            output.push_str("Items:\n");
            for item in &order.items {
                output.push_str(&format!(
                    "  {} x{} @ {} = {}\n",
                    item.name, item.quantity, item.unit_price, item.subtotal
                ));
            }
        }

        if let Some(total) = order.total_amount {
            output.push_str(&format!("Total: {}\n", total));
        }
        output.push('\n');
    }

    output
}
