use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Debit/credit marker printed after an amount, e.g. `1,200.00(Dr)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrCr {
    Dr,
    Cr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedAmount {
    pub value: Decimal,
    pub side: Option<DrCr>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Empty amount")]
    Empty,
    #[error("Invalid amount: {0}")]
    Invalid(String),
}

const SIDE_SUFFIXES: &[(&str, DrCr)] = &[
    ("(dr)", DrCr::Dr),
    ("(cr)", DrCr::Cr),
    ("dr", DrCr::Dr),
    ("cr", DrCr::Cr),
];

/// Removes thousands separators and every whitespace character.
pub fn strip_separators(s: &str) -> String {
    s.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect()
}

/// Parses a statement amount.
///
/// Accepts thousands separators, a leading sign, accounting parentheses for
/// negatives and a trailing `Dr`/`Cr` marker (with or without parentheses).
/// The marker is reported in [`ParsedAmount::side`] and does not change the sign.
pub fn parse_amount(text: &str) -> Result<ParsedAmount, AmountError> {
    let mut s = text.trim();
    let mut side = None;

    let lower = s.to_ascii_lowercase();
    for (suffix, tag) in SIDE_SUFFIXES {
        if lower.ends_with(suffix) && lower.len() > suffix.len() {
            s = s[..s.len() - suffix.len()].trim_end();
            side = Some(*tag);
            break;
        }
    }

    let (negative, s) = if s.starts_with('(') && s.ends_with(')') && s.len() >= 2 {
        (true, &s[1..s.len() - 1])
    } else {
        (false, s)
    };

    let clean = strip_separators(s);
    let clean = clean.strip_prefix('+').unwrap_or(&clean);
    if clean.is_empty() {
        return Err(AmountError::Empty);
    }

    let mut value =
        Decimal::from_str(clean).map_err(|_| AmountError::Invalid(text.trim().to_string()))?;
    if negative {
        value = -value;
    }
    Ok(ParsedAmount { value, side })
}

/// True for text that parses to exactly zero.
pub fn is_zero_amount(text: &str) -> bool {
    parse_amount(text).is_ok_and(|a| a.value.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn parse_plain() {
        assert_eq!(parse_amount("123.45").unwrap().value, dec("123.45"));
    }

    #[test]
    fn parse_with_commas_and_spaces() {
        assert_eq!(parse_amount(" 1,23,456.50 ").unwrap().value, dec("123456.50"));
    }

    #[test]
    fn parse_signed() {
        assert_eq!(parse_amount("-50.00").unwrap().value, dec("-50.00"));
        assert_eq!(parse_amount("+50").unwrap().value, dec("50"));
    }

    #[test]
    fn parse_accounting_parens() {
        assert_eq!(parse_amount("(75.25)").unwrap().value, dec("-75.25"));
    }

    #[test]
    fn parse_dr_cr_suffix() {
        let a = parse_amount("1,000.00(Dr)").unwrap();
        assert_eq!(a.value, dec("1000.00"));
        assert_eq!(a.side, Some(DrCr::Dr));

        let a = parse_amount("250.00 Cr").unwrap();
        assert_eq!(a.value, dec("250.00"));
        assert_eq!(a.side, Some(DrCr::Cr));
    }

    #[test]
    fn parse_empty_is_empty_error() {
        assert_eq!(parse_amount("   "), Err(AmountError::Empty));
        assert_eq!(parse_amount(","), Err(AmountError::Empty));
    }

    #[test]
    fn parse_garbage_is_invalid() {
        assert!(matches!(parse_amount("12abc"), Err(AmountError::Invalid(_))));
        assert!(matches!(parse_amount("Dr"), Err(AmountError::Invalid(_))));
    }

    #[test]
    fn zero_detection() {
        assert!(is_zero_amount("0"));
        assert!(is_zero_amount("0.00"));
        assert!(!is_zero_amount("0.01"));
        assert!(!is_zero_amount(""));
    }
}
