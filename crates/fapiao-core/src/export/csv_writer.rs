//! CSV export.

use std::path::Path;

use tracing::debug;

use super::{ColumnHeaders, Exporter};
use crate::error::ExportError;
use crate::models::invoice::InvoiceRecord;

pub struct CsvExporter {
    headers: ColumnHeaders,
}

impl CsvExporter {
    pub fn new(headers: ColumnHeaders) -> Self {
        Self { headers }
    }

    /// Write to any writer, e.g. stdout.
    pub fn write_to<W: std::io::Write>(
        &self,
        records: &[InvoiceRecord],
        writer: W,
    ) -> Result<(), ExportError> {
        let mut wtr = csv::Writer::from_writer(writer);

        wtr.write_record(self.headers.cells())?;
        for record in records {
            wtr.write_record(record.cells())?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl Exporter for CsvExporter {
    fn extension(&self) -> &'static str {
        "csv"
    }

    fn export(&self, records: &[InvoiceRecord], path: &Path) -> Result<(), ExportError> {
        let file = std::fs::File::create(path)?;
        self.write_to(records, file)?;
        debug!("Wrote {} records to {}", records.len(), path.display());
        Ok(())
    }
}
