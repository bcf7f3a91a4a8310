//! Assembles one `InvoiceRecord` per input file.

use crate::models::config::Messages;
use crate::models::invoice::{InvoiceRecord, QrPayload};

/// Merges QR payload fields and the OCR amount into records.
///
/// Field mapping is purely positional and unvalidated: code, number and
/// date come from QR positions 2, 3 and 5.
#[derive(Debug, Clone, Default)]
pub struct InvoiceRecordBuilder {
    messages: Messages,
}

impl InvoiceRecordBuilder {
    pub fn new(messages: Messages) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Build a record; a missing amount marks the record as failed
    /// recognition.
    pub fn build(
        &self,
        payload: &QrPayload,
        amount: Option<String>,
        order: usize,
        file: &str,
    ) -> InvoiceRecord {
        let msg = if amount.is_none() {
            self.messages.recognition_failed.clone()
        } else {
            String::new()
        };

        InvoiceRecord {
            order,
            code: payload.code().map(str::to_string),
            num: payload.number().map(str::to_string),
            date: payload.date().map(str::to_string),
            amount,
            file: file.to_string(),
            msg,
        }
    }

    /// Record for a file whose raster could not be produced.
    pub fn failed(&self, order: usize, file: &str, msg: impl Into<String>) -> InvoiceRecord {
        InvoiceRecord {
            order,
            file: file.to_string(),
            msg: msg.into(),
            ..Default::default()
        }
    }
}

/// Append a status annotation, `; `-separated.
pub fn annotate(record: &mut InvoiceRecord, note: &str) {
    if note.is_empty() || record.msg.split("; ").any(|m| m == note) {
        return;
    }
    if !record.msg.is_empty() {
        record.msg.push_str("; ");
    }
    record.msg.push_str(note);
}
