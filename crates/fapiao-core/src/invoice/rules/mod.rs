//! Rule-based extraction of invoice fields from recognized text.

pub mod amounts;
pub mod patterns;

pub use amounts::AmountExtractor;
