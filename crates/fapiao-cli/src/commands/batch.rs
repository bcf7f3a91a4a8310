//! Batch processing command for multiple invoice images.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use fapiao_core::export::{export_to_dir, ColumnHeaders, CsvExporter, Exporter, XlsxExporter};
use fapiao_core::models::config::HeaderLanguage;
use fapiao_core::pipeline::completion_message;
use fapiao_core::{
    BatchPipeline, InputFile, InvoiceRecord, Progress, ProgressObserver,
    Session,
};

use super::{load_config, load_recognizer};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for exports
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Skip the XLSX export
    #[arg(long)]
    no_xlsx: bool,

    /// Also export CSV
    #[arg(long)]
    csv: bool,

    /// Column header language
    #[arg(long, value_enum)]
    headers: Option<Headers>,

    /// Language data / model directory
    #[arg(short, long)]
    data_path: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum Headers {
    En,
    Zh,
}

impl From<Headers> for HeaderLanguage {
    fn from(headers: Headers) -> Self {
        match headers {
            Headers::En => HeaderLanguage::En,
            Headers::Zh => HeaderLanguage::Zh,
        }
    }
}

/// Drives the progress bar from pipeline notifications.
struct BarObserver {
    pb: ProgressBar,
}

impl ProgressObserver for BarObserver {
    fn on_record(&mut self, record: &InvoiceRecord) {
        if !record.is_complete() {
            self.pb.println(format!(
                "{} {}: {}",
                style("!").yellow(),
                record.file,
                record.msg
            ));
        }
    }

    fn on_progress(&mut self, progress: Progress) {
        self.pb.set_position(progress.current as u64);
        self.pb.set_message(progress.to_string());
    }

    fn on_complete(&mut self, total: usize) {
        self.pb.finish_with_message(completion_message(total));
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    if let Some(data_path) = &args.data_path {
        config.ocr.data_path = data_path.clone();
    }
    if let Some(headers) = args.headers {
        config.export.headers = headers.into();
    }

    let files = expand_inputs(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let inputs: Vec<InputFile> = files.iter().map(|p| InputFile::read_or_failed(p)).collect();

    let recognizer = load_recognizer(&config.ocr).await?;
    let mut pipeline = BatchPipeline::new(recognizer, &config);
    let mut session = Session::new();

    let pb = ProgressBar::new(inputs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    let mut observer = BarObserver { pb };

    session.begin_parse()?;
    let report = pipeline.run(inputs, &mut observer).await;
    pipeline.shutdown();
    session.finish_parse(report.records)?;

    print_table(session.records());

    let failed = session.records().iter().filter(|r| !r.is_complete()).count();
    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        session.records().len(),
        start.elapsed()
    );
    println!(
        "   {} complete, {} with issues, total amount {}",
        style(session.records().len() - failed).green(),
        style(failed).red(),
        total_amount(session.records())
    );

    let headers = ColumnHeaders::for_language(config.export.headers);
    let mut exporters: Vec<Box<dyn Exporter>> = Vec::new();
    if !args.no_xlsx {
        exporters.push(Box::new(XlsxExporter::new(headers.clone())));
    }
    if args.csv {
        exporters.push(Box::new(CsvExporter::new(headers)));
    }

    if !exporters.is_empty() {
        let records = session.begin_export()?;
        let mut written = Vec::new();
        for exporter in &exporters {
            match export_to_dir(exporter.as_ref(), records, &args.output_dir, &config.export.file_prefix) {
                Ok(path) => written.push(path),
                Err(e) => warn!("{} export failed: {}", exporter.extension(), e),
            }
        }
        session.finish_export()?;

        for path in written {
            println!(
                "{} Exported to {}",
                style("✓").green(),
                path.display()
            );
        }
    }

    Ok(())
}

/// Expand the glob, keeping image files in sorted order.
fn expand_inputs(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = glob(pattern)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
        })
        .collect();
    files.sort();
    debug!("Pattern {} matched {} images", pattern, files.len());
    Ok(files)
}

/// Sum of every parsed amount.
fn total_amount(records: &[InvoiceRecord]) -> Decimal {
    records
        .iter()
        .filter_map(|r| r.amount.as_deref())
        .filter_map(|a| Decimal::from_str(a).ok())
        .sum()
}

fn print_table(records: &[InvoiceRecord]) {
    println!();
    println!(
        "{:>3}  {:<12}  {:<8}  {:<8}  {:>10}  {:<24}  {}",
        "#", "Code", "Num", "Date", "Amount", "File", "Message"
    );
    for record in records {
        let [code, num, date, amount, file, msg] = record.cells();
        let line = format!(
            "{:>3}  {:<12}  {:<8}  {:<8}  {:>10}  {:<24}  {}",
            record.order, code, num, date, amount, file, msg
        );
        if record.is_complete() {
            println!("{}", line);
        } else {
            println!("{}", style(line).yellow());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(amount: Option<&str>) -> InvoiceRecord {
        InvoiceRecord {
            amount: amount.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_total_amount_skips_missing() {
        let records = vec![record(Some("100.10")), record(None), record(Some("0.90"))];
        assert_eq!(total_amount(&records), Decimal::from_str("101.00").unwrap());
    }

    #[test]
    fn test_expand_inputs_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let pattern = format!("{}/*", dir.path().display());
        let files = expand_inputs(&pattern).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(names, vec!["a.jpg", "b.PNG"]);
    }
}
