//! Pure cell predicates shared by every stage.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use rowmend_core::amount::strip_separators;
use rowmend_core::DrCr;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_date_day_first,
    r"^(?P<d>\d{1,2})[/-](?P<m>\d{1,2})[/-](?P<y>\d{2,4})(?:\D|$)");
re!(re_date_year_first,
    r"^(?P<y>\d{2,4})[/-](?P<m>\d{1,2})[/-](?P<d>\d{1,2})(?:\D|$)");
re!(re_date_abbr_month,
    r"(?i)^(?P<d>\d{1,2})\s+(?P<mon>jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)\s+(?P<y>\d{2,4})(?:\D|$)");
re!(re_decimal,
    r"^[+-]?(?:\d+\.?\d*|\.\d+)$");
re!(re_drcr_token,
    r"(?i)(\d[\d,]*(?:\.\d*)?)\s*\((dr|cr)\)");

/// Coarse kind of a cell, derived on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Blank,
    DateLike,
    AmountLike,
    Text,
}

pub fn classify(text: &str) -> CellKind {
    if is_blank(text) {
        CellKind::Blank
    } else if is_date_like(text) {
        CellKind::DateLike
    } else if is_amount_like(text) {
        CellKind::AmountLike
    } else {
        CellKind::Text
    }
}

/// Empty after trimming, or a textual null left behind by the extractor.
pub fn is_blank(text: &str) -> bool {
    let t = text.trim();
    t.is_empty() || ["nan", "none", "null"].iter().any(|n| t.eq_ignore_ascii_case(n))
}

/// The trimmed text starts with a calendar date. Trailing text is allowed.
pub fn is_date_like(text: &str) -> bool {
    date_captures(text.trim()).is_some()
}

/// After dropping thousands separators and whitespace the text is a decimal number.
pub fn is_amount_like(text: &str) -> bool {
    if is_blank(text) {
        return false;
    }
    re_decimal().is_match(&strip_separators(text))
}

/// Splits a cell into its leading date and whatever follows it.
pub fn split_date_prefix(text: &str) -> Option<(&str, &str)> {
    let t = text.trim();
    let caps = date_captures(t)?;
    let end = caps.name("y")?.end();
    Some((&t[..end], t[end..].trim()))
}

/// Every `amount(Dr)` / `amount(Cr)` token in a cell, in order.
pub fn drcr_tokens(text: &str) -> Vec<(&str, DrCr)> {
    re_drcr_token()
        .captures_iter(text)
        .filter_map(|c| {
            let whole = c.get(0)?.as_str();
            let side = if c[2].eq_ignore_ascii_case("dr") { DrCr::Dr } else { DrCr::Cr };
            Some((whole, side))
        })
        .collect()
}

/// Parses the leading date of a cell. Numeric dates are read day-first unless
/// the first group has four digits; two-digit years become 20YY.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let t = text.trim();
    if let Some(c) = re_date_abbr_month().captures(t) {
        let day: u32 = c.name("d")?.as_str().parse().ok()?;
        let month = abbr_month_to_num(c.name("mon")?.as_str())?;
        let year = expand_year(c.name("y")?.as_str().parse().ok()?);
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Some(c) = re_date_year_first().captures(t) {
        if c.name("y")?.as_str().len() == 4 {
            return ymd(&c);
        }
    }
    let c = re_date_day_first().captures(t)?;
    ymd(&c)
}

fn date_captures(t: &str) -> Option<Captures<'_>> {
    re_date_day_first()
        .captures(t)
        .or_else(|| re_date_year_first().captures(t))
        .or_else(|| re_date_abbr_month().captures(t))
}

fn ymd(c: &Captures<'_>) -> Option<NaiveDate> {
    let y = expand_year(c.name("y")?.as_str().parse().ok()?);
    let m: u32 = c.name("m")?.as_str().parse().ok()?;
    let d: u32 = c.name("d")?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

fn expand_year(y: i32) -> i32 {
    if y < 100 { 2000 + y } else { y }
}

fn abbr_month_to_num(name: &str) -> Option<u32> {
    match name.to_lowercase().as_str() {
        "jan" => Some(1), "feb" => Some(2), "mar" => Some(3), "apr" => Some(4),
        "may" => Some(5), "jun" => Some(6), "jul" => Some(7), "aug" => Some(8),
        "sep" => Some(9), "oct" => Some(10), "nov" => Some(11), "dec" => Some(12),
        _ => None,
    }
}
