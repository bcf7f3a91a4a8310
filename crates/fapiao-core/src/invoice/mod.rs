//! Invoice field extraction module.

mod builder;
pub mod rules;

pub use builder::{annotate, InvoiceRecordBuilder};
pub use rules::AmountExtractor;
