//! Spreadsheet export of batch records.
//!
//! Columns always follow the same order: code, number, date, amount,
//! filename, status message. Header text is supplied by the caller.

mod csv_writer;
mod xlsx;

pub use csv_writer::CsvExporter;
pub use xlsx::XlsxExporter;

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::error::ExportError;
use crate::models::config::HeaderLanguage;
use crate::models::invoice::InvoiceRecord;

/// Number of exported columns.
pub const COLUMN_COUNT: usize = 6;

/// Localized column headers in export order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeaders {
    pub code: String,
    pub num: String,
    pub date: String,
    pub amount: String,
    pub file: String,
    pub msg: String,
}

impl ColumnHeaders {
    pub fn english() -> Self {
        Self {
            code: "Code".to_string(),
            num: "Num".to_string(),
            date: "Date".to_string(),
            amount: "Amount".to_string(),
            file: "File".to_string(),
            msg: "Message".to_string(),
        }
    }

    pub fn chinese() -> Self {
        Self {
            code: "发票代码".to_string(),
            num: "发票号码".to_string(),
            date: "开票日期".to_string(),
            amount: "价税合计".to_string(),
            file: "文件".to_string(),
            msg: "备注".to_string(),
        }
    }

    pub fn for_language(language: HeaderLanguage) -> Self {
        match language {
            HeaderLanguage::En => Self::english(),
            HeaderLanguage::Zh => Self::chinese(),
        }
    }

    pub fn cells(&self) -> [&str; COLUMN_COUNT] {
        [
            &self.code,
            &self.num,
            &self.date,
            &self.amount,
            &self.file,
            &self.msg,
        ]
    }
}

impl Default for ColumnHeaders {
    fn default() -> Self {
        Self::english()
    }
}

/// Writes a record sequence to a file.
pub trait Exporter {
    /// File extension without the dot.
    fn extension(&self) -> &'static str;

    /// Write header row plus one row per record to `path`.
    fn export(&self, records: &[InvoiceRecord], path: &Path) -> Result<(), ExportError>;
}

/// Timestamped export name, e.g. `invoice_20240102_030405.xlsx`.
pub fn export_file_name(prefix: &str, now: NaiveDateTime, extension: &str) -> String {
    format!("{}_{}.{}", prefix, now.format("%Y%m%d_%H%M%S"), extension)
}

/// Export into `dir` under a UTC-timestamped name, returning the written
/// path.
pub fn export_to_dir(
    exporter: &dyn Exporter,
    records: &[InvoiceRecord],
    dir: &Path,
    prefix: &str,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let name = export_file_name(prefix, chrono::Utc::now().naive_utc(), exporter.extension());
    let path = dir.join(name);
    exporter.export(records, &path)?;
    Ok(path)
}

#[cfg(test)]
pub(crate) fn sample_records() -> Vec<InvoiceRecord> {
    vec![
        InvoiceRecord {
            order: 1,
            code: Some("044031900111".into()),
            num: Some("12345678".into()),
            date: Some("20230315".into()),
            amount: Some("1200.00".into()),
            file: "one.png".into(),
            msg: String::new(),
        },
        InvoiceRecord {
            order: 2,
            file: "two.jpg".into(),
            msg: "image decode failed".into(),
            ..Default::default()
        },
    ]
}
