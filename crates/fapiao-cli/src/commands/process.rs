//! Process command - extract data from a single invoice image.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use fapiao_core::export::{ColumnHeaders, CsvExporter};
use fapiao_core::pipeline::NoopObserver;
use fapiao_core::{BatchPipeline, InputFile, InvoiceRecord};

use super::{load_config, load_recognizer};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input image
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Language data / model directory
    #[arg(short, long)]
    data_path: Option<PathBuf>,

    /// Recognition language profile
    #[arg(short, long)]
    language: Option<String>,
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

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(data_path) = &args.data_path {
        config.ocr.data_path = data_path.clone();
    }
    if let Some(language) = &args.language {
        config.ocr.language = language.clone();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());
    let file = InputFile::read(&args.input)?;

    let recognizer = load_recognizer(&config.ocr).await?;
    let mut pipeline = BatchPipeline::new(recognizer, &config);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Recognizing {}...", file.name));

    let report = pipeline.run(vec![file], &mut NoopObserver).await;
    pipeline.shutdown();
    pb.finish_and_clear();

    let record = report
        .records
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Pipeline produced no record"))?;

    let output = format_record(&record, args.format)?;

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

    if !record.is_complete() {
        eprintln!("{} {}", style("!").yellow(), record.msg);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_record(record: &InvoiceRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Csv => {
            let mut buf = Vec::new();
            CsvExporter::new(ColumnHeaders::english()).write_to(std::slice::from_ref(record), &mut buf)?;
            Ok(String::from_utf8(buf)?.trim_end().to_string())
        }
        OutputFormat::Text => Ok(format_record_text(record)),
    }
}

pub(crate) fn format_record_text(record: &InvoiceRecord) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    let status = if record.msg.is_empty() {
        "ok"
    } else {
        record.msg.as_str()
    };

    let mut output = String::new();
    output.push_str(&format!("File:   {}\n", record.file));
    output.push_str(&format!("Code:   {}\n", field(&record.code)));
    output.push_str(&format!("Number: {}\n", field(&record.num)));
    output.push_str(&format!("Date:   {}\n", field(&record.date)));
    output.push_str(&format!("Amount: {}\n", field(&record.amount)));
    output.push_str(&format!("Status: {}", status));
    output
}
