//! Invoice data models: QR payload and extracted records.

use serde::{Deserialize, Serialize};

/// Field positions of the tax-invoice QR payload.
pub mod qr_field {
    pub const VERSION: usize = 0;
    pub const KIND: usize = 1;
    pub const CODE: usize = 2;
    pub const NUMBER: usize = 3;
    pub const PRETAX_AMOUNT: usize = 4;
    pub const DATE: usize = 5;
    pub const CHECK_CODE: usize = 6;
}

/// Ordered fields decoded from an invoice QR code.
///
/// Field order is fixed by the tax-invoice QR schema. Nothing here
/// validates the content of a position; a short or empty payload simply
/// yields `None` for the missing positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    fields: Vec<String>,
}

impl QrPayload {
    /// Split a raw QR string on `delimiter`. Fields are passed through
    /// as-is, whitespace included.
    pub fn parse(raw: &str, delimiter: char) -> Self {
        Self {
            fields: raw.split(delimiter).map(str::to_string).collect(),
        }
    }

    /// Payload with no fields, used when no QR code was found.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Vec<String>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field at `index`, `None` when the payload is shorter.
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    pub fn code(&self) -> Option<&str> {
        self.field(qr_field::CODE)
    }

    pub fn number(&self) -> Option<&str> {
        self.field(qr_field::NUMBER)
    }

    pub fn date(&self) -> Option<&str> {
        self.field(qr_field::DATE)
    }

    pub fn pretax_amount(&self) -> Option<&str> {
        self.field(qr_field::PRETAX_AMOUNT)
    }

    pub fn check_code(&self) -> Option<&str> {
        self.field(qr_field::CHECK_CODE)
    }
}

/// One extracted invoice, one per input file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// 1-based position in the batch.
    pub order: usize,

    /// Invoice code (QR field 2).
    pub code: Option<String>,

    /// Invoice number (QR field 3).
    pub num: Option<String>,

    /// Issue date as printed in the QR code (QR field 5).
    pub date: Option<String>,

    /// Price-tax total from OCR, decimals preserved.
    pub amount: Option<String>,

    /// Source filename.
    pub file: String,

    /// Status annotation, empty on success.
    pub msg: String,
}

impl InvoiceRecord {
    /// Whether every stage succeeded.
    pub fn is_complete(&self) -> bool {
        self.msg.is_empty()
    }

    /// Whether no data field could be filled.
    pub fn is_blank(&self) -> bool {
        self.code.is_none() && self.num.is_none() && self.date.is_none() && self.amount.is_none()
    }

    /// Cells in export column order: code, number, date, amount, file, msg.
    pub fn cells(&self) -> [&str; 6] {
        [
            self.code.as_deref().unwrap_or_default(),
            self.num.as_deref().unwrap_or_default(),
            self.date.as_deref().unwrap_or_default(),
            self.amount.as_deref().unwrap_or_default(),
            &self.file,
            &self.msg,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_full_payload() {
        let payload = QrPayload::parse(
            "01,10,044031900111,12345678,1061.95,20230315,12345678901234567890,A1B2,",
            ',',
        );

        assert_eq!(payload.code(), Some("044031900111"));
        assert_eq!(payload.number(), Some("12345678"));
        assert_eq!(payload.date(), Some("20230315"));
        assert_eq!(payload.pretax_amount(), Some("1061.95"));
        assert_eq!(payload.len(), 9);
    }

    #[test]
    fn test_short_payload_yields_none() {
        let payload = QrPayload::parse("01,10,044031900111,12345678", ',');

        assert_eq!(payload.code(), Some("044031900111"));
        assert_eq!(payload.number(), Some("12345678"));
        assert_eq!(payload.date(), None);
        assert_eq!(payload.check_code(), None);
        assert_eq!(QrPayload::empty().code(), None);
    }

    #[test]
    fn test_parse_keeps_fields_verbatim() {
        let payload = QrPayload::parse("01, 10,044031900111 ,12345678", ',');

        assert_eq!(payload.fields()[1], " 10");
        assert_eq!(payload.code(), Some("044031900111 "));
        assert_eq!(payload.number(), Some("12345678"));
    }

    #[test]
    fn test_record_cells_order() {
        let record = InvoiceRecord {
            order: 1,
            code: Some("c".into()),
            num: Some("n".into()),
            date: None,
            amount: Some("1.00".into()),
            file: "a.png".into(),
            msg: String::new(),
        };

        assert_eq!(record.cells(), ["c", "n", "", "1.00", "a.png", ""]);
        assert!(record.is_complete());
        assert!(!record.is_blank());
    }
}
