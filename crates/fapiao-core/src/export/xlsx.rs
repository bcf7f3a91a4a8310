//! XLSX export via `rust_xlsxwriter`.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::debug;

use super::{ColumnHeaders, Exporter, COLUMN_COUNT};
use crate::error::ExportError;
use crate::models::invoice::InvoiceRecord;

const SHEET_NAME: &str = "Invoices";

pub struct XlsxExporter {
    headers: ColumnHeaders,
}

impl XlsxExporter {
    pub fn new(headers: ColumnHeaders) -> Self {
        Self { headers }
    }

    /// Build the workbook in memory.
    pub fn build(&self, records: &[InvoiceRecord]) -> Result<Workbook, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        let header_format = Format::new()
            .set_bold()
            .set_background_color(rust_xlsxwriter::Color::RGB(0x2563EB))
            .set_font_color(rust_xlsxwriter::Color::RGB(0xFFFFFF));
        let text_format = Format::new();

        for (col, header) in self.headers.cells().iter().enumerate() {
            write_text_cell(worksheet, 0, col as u16, header, &header_format)?;
        }

        for (index, record) in records.iter().enumerate() {
            let row = (index + 1) as u32;
            for (col, value) in record.cells().iter().enumerate() {
                write_text_cell(worksheet, row, col as u16, value, &text_format)?;
            }
        }

        for (col, width) in column_widths(&self.headers, records).iter().enumerate() {
            worksheet.set_column_width(col as u16, *width)?;
        }

        worksheet.set_freeze_panes(1, 0)?;
        Ok(workbook)
    }
}

impl Exporter for XlsxExporter {
    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn export(&self, records: &[InvoiceRecord], path: &Path) -> Result<(), ExportError> {
        let mut workbook = self.build(records)?;
        workbook.save(path)?;
        debug!("Wrote {} records to {}", records.len(), path.display());
        Ok(())
    }
}

/// Drop characters that break the sheet XML.
fn sanitize_cell(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            let u = c as u32;
            c == '\t' || c == '\n' || !(u < 0x20 || u == 0x7F || u == 0xFFFE || u == 0xFFFF)
        })
        .collect()
}

// Amounts are written as text so the printed decimals survive.
fn write_text_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    text: &str,
    format: &Format,
) -> Result<(), XlsxError> {
    worksheet
        .write_string_with_format(row, col, sanitize_cell(text), format)
        .map(|_| ())
}

/// Widest cell per column, wide glyphs counted double, clamped 10-50.
fn column_widths(headers: &ColumnHeaders, records: &[InvoiceRecord]) -> [f64; COLUMN_COUNT] {
    let mut widths = headers.cells().map(display_width);
    for record in records {
        for (width, cell) in widths.iter_mut().zip(record.cells()) {
            *width = width.max(display_width(cell));
        }
    }
    widths.map(|w| (w * 1.2).clamp(10.0, 50.0))
}

fn display_width(text: &str) -> f64 {
    text.chars()
        .map(|c| if c.is_ascii() { 1.0 } else { 2.0 })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::sample_records;

    #[test]
    fn test_sanitize_cell() {
        assert_eq!(sanitize_cell("a\u{1}b\tc"), "ab\tc");
    }

    #[test]
    fn test_column_widths_count_wide_chars() {
        let widths = column_widths(&ColumnHeaders::chinese(), &sample_records());
        assert!((widths[0] - 14.4).abs() < 1e-9);
        assert!(widths.iter().all(|w| (10.0..=50.0).contains(w)));
    }

    #[test]
    fn test_export_writes_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");

        XlsxExporter::new(ColumnHeaders::chinese())
            .export(&sample_records(), &path)
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
