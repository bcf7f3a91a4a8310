//! Regex patterns for Chinese VAT invoice text.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Price-tax total (价税合计), optionally followed by the lowercase-figures
    // marker （小写）, a non-digit separator and a two-decimal amount. Digit
    // classes are ASCII only.
    pub static ref PRICE_TAX_TOTAL: Regex = Regex::new(
        r"价\s*税\s*合\s*计(?:[^\n]*?[\(（]\s*小\s*写\s*[\)）])?\s*[^0-9]\s*([0-9]+\.[0-9]{2})(?:[^0-9]|$)"
    ).unwrap();

    // Same as above, anchored to the end of a single line.
    pub static ref PRICE_TAX_TOTAL_LINE: Regex = Regex::new(
        r"价\s*税\s*合\s*计(?:.*?[\(（]\s*小\s*写\s*[\)）])?\s*[^0-9]\s*([0-9]+\.[0-9]{2})\s*$"
    ).unwrap();

    // （小写）¥N.NN on its own, for text where OCR garbled 价税合计.
    pub static ref LOWERCASE_TOTAL: Regex = Regex::new(
        r"[\(（]\s*小\s*写\s*[\)）]\s*[^0-9]\s*([0-9]+\.[0-9]{2})(?:[^0-9]|$)"
    ).unwrap();

    pub static ref LOWERCASE_TOTAL_LINE: Regex = Regex::new(
        r"[\(（]\s*小\s*写\s*[\)）]\s*[^0-9]\s*([0-9]+\.[0-9]{2})\s*$"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_with_spaces() {
        let caps = PRICE_TAX_TOTAL.captures("价 税 合 计 （小写） ¥ 88.00").unwrap();
        assert_eq!(&caps[1], "88.00");
    }

    #[test]
    fn test_three_decimals_rejected() {
        assert!(PRICE_TAX_TOTAL_LINE.captures("价税合计 ¥12.345").is_none());
    }

    #[test]
    fn test_full_width_digits_not_captured() {
        assert!(PRICE_TAX_TOTAL.captures("价税合计 ¥１２３４.５６").is_none());
        assert!(PRICE_TAX_TOTAL_LINE.captures("价税合计 ¥１２３４.５６").is_none());
    }

    #[test]
    fn test_lowercase_marker_ascii_parens() {
        let caps = LOWERCASE_TOTAL.captures("(小写)￥1061.95").unwrap();
        assert_eq!(&caps[1], "1061.95");
    }
}
