//! Settlement amount extraction.

use std::borrow::Cow;

use regex::Regex;

use super::patterns::{
    LOWERCASE_TOTAL, LOWERCASE_TOTAL_LINE, PRICE_TAX_TOTAL, PRICE_TAX_TOTAL_LINE,
};
use crate::models::config::AmountStrategy;
use crate::ocr::RecognizedText;

/// Locates the price-tax total in recognized text.
///
/// The amount is returned as the matched string so the printed decimal
/// formatting survives. `None` means no label matched; that is an expected
/// outcome for poorly recognized scans, not an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmountExtractor {
    strategy: AmountStrategy,
}

impl AmountExtractor {
    pub fn new(strategy: AmountStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> AmountStrategy {
        self.strategy
    }

    /// Extract from an OCR result using the configured strategy.
    pub fn extract_amount(&self, text: &RecognizedText) -> Option<String> {
        match self.strategy {
            AmountStrategy::WholeText => whole_text_match(&ascii_digits(&text.text)),
            AmountStrategy::PerLine => last_line_match(text.line_texts()),
        }
    }
}

/// First capture over the whole text; the price-tax label wins over the
/// bare lowercase marker.
fn whole_text_match(text: &str) -> Option<String> {
    first_capture(&PRICE_TAX_TOTAL, text).or_else(|| first_capture(&LOWERCASE_TOTAL, text))
}

/// Line-anchored match on every line; later lines overwrite earlier ones.
fn last_line_match<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<String> {
    lines
        .into_iter()
        .fold(None, |found, line| line_match(line).or(found))
}

fn line_match(line: &str) -> Option<String> {
    let line = ascii_digits(line);
    let line = line.trim_end();
    first_capture(&PRICE_TAX_TOTAL_LINE, line)
        .or_else(|| first_capture(&LOWERCASE_TOTAL_LINE, line))
}

fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Fold full-width digits and the full-width full stop, which OCR emits on
/// some scans, into ASCII.
fn ascii_digits(text: &str) -> Cow<'_, str> {
    let is_wide = |c: char| ('０'..='９').contains(&c) || c == '．';
    if !text.chars().any(is_wide) {
        return Cow::Borrowed(text);
    }

    text.chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            '．' => '.',
            other => other,
        })
        .collect::<String>()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::TextLine;
    use pretty_assertions::assert_eq;

    fn amount(text: &str, strategy: AmountStrategy) -> Option<String> {
        AmountExtractor::new(strategy).extract_amount(&RecognizedText::from_text(text))
    }

    #[test]
    fn test_whole_text_lowercase_total() {
        assert_eq!(
            amount("价税合计（小写）¥1234.56", AmountStrategy::WholeText),
            Some("1234.56".to_string())
        );
    }

    #[test]
    fn test_per_line_lowercase_total() {
        assert_eq!(
            amount("价税合计（小写）¥1234.56", AmountStrategy::PerLine),
            Some("1234.56".to_string())
        );
    }

    #[test]
    fn test_per_line_last_match_wins() {
        let text = RecognizedText::from_lines(vec![
            TextLine::plain("价税合计 ¥100.00"),
            TextLine::plain("价税合计 ¥200.00"),
        ]);

        let extractor = AmountExtractor::new(AmountStrategy::PerLine);
        assert_eq!(extractor.extract_amount(&text), Some("200.00".to_string()));
    }

    #[test]
    fn test_whole_text_first_match_wins() {
        let text = "价税合计 ¥100.00\n价税合计 ¥200.00";
        assert_eq!(
            amount(text, AmountStrategy::WholeText),
            Some("100.00".to_string())
        );
    }

    #[test]
    fn test_capital_amount_before_marker() {
        let line = "价税合计（大写） ⊗壹仟贰佰圆整 （小写）¥1200.00";
        assert_eq!(
            amount(line, AmountStrategy::PerLine),
            Some("1200.00".to_string())
        );
        assert_eq!(
            amount(line, AmountStrategy::WholeText),
            Some("1200.00".to_string())
        );
    }

    #[test]
    fn test_garbled_label_falls_back_to_marker() {
        let text = "价税台it（大写）壹佰圆整\n(小写)￥100.00";
        assert_eq!(
            amount(text, AmountStrategy::PerLine),
            Some("100.00".to_string())
        );
    }

    #[test]
    fn test_per_line_requires_amount_at_line_end() {
        let text = RecognizedText::from_lines(vec![
            TextLine::plain("价税合计 ¥300.00"),
            TextLine::plain("价税合计 ¥400.00 备注"),
        ]);

        let extractor = AmountExtractor::new(AmountStrategy::PerLine);
        assert_eq!(extractor.extract_amount(&text), Some("300.00".to_string()));
    }

    #[test]
    fn test_no_label_is_none() {
        let text = RecognizedText::from_text("购买方\n合计 ¥100.00\n销售方");

        for strategy in [AmountStrategy::WholeText, AmountStrategy::PerLine] {
            assert_eq!(AmountExtractor::new(strategy).extract_amount(&text), None);
        }
    }

    #[test]
    fn test_full_width_digits_become_ascii() {
        for strategy in [AmountStrategy::WholeText, AmountStrategy::PerLine] {
            assert_eq!(
                amount("价税合计（小写）¥１２３４.５６", strategy),
                Some("1234.56".to_string())
            );
            assert_eq!(
                amount("价税合计（小写）¥８８．００", strategy),
                Some("88.00".to_string())
            );
        }
    }

    #[test]
    fn test_ascii_digits_borrows_plain_text() {
        assert!(matches!(ascii_digits("¥12.00"), Cow::Borrowed(_)));
        assert_eq!(ascii_digits("１０"), "10");
    }
}
