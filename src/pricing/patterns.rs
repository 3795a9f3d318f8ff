// src/pricing/patterns.rs

use lazy_static::lazy_static;
use regex::Regex;

/// Common plan names, in the order the keyword scans probe them.
pub const TIER_KEYWORDS: [&str; 12] = [
    "starter",
    "pro",
    "enterprise",
    "basic",
    "premium",
    "free",
    "business",
    "team",
    "individual",
    "professional",
    "plus",
    "growth",
];

/// Anything at or above this is a phone number, a year or some other stray numeral.
pub const MAX_PLAUSIBLE_PRICE: f64 = 10_000.0;

const PRICE_PATTERN: &str = r"\$\s*(\d+(?:,\d{3})*(?:\.\d{1,2})?)";

lazy_static! {
    /// `$29`, `$ 1,299.00`, `$9.5`
    pub static ref PRICE_REGEX: Regex = Regex::new(PRICE_PATTERN).unwrap();

    /// Any known tier keyword as a whole word; leftmost occurrence wins.
    pub static ref TIER_REGEX: Regex =
        Regex::new(&format!(r"(?i)\b({})\b", TIER_KEYWORDS.join("|"))).unwrap();

    /// Per keyword: `Keyword ... $Price` with no other `$` in between.
    pub static ref FORWARD_PATTERNS: Vec<(&'static str, Regex)> = TIER_KEYWORDS
        .iter()
        .map(|kw| {
            let re = Regex::new(&format!(r"(?i)\b{kw}\b[^$]*?{PRICE_PATTERN}")).unwrap();
            (*kw, re)
        })
        .collect();

    /// Per keyword: `$Price ... Keyword` with no letters in between.
    pub static ref REVERSE_PATTERNS: Vec<(&'static str, Regex)> = TIER_KEYWORDS
        .iter()
        .map(|kw| {
            let re = Regex::new(&format!(r"(?i){PRICE_PATTERN}[^a-z]*\b{kw}\b")).unwrap();
            (*kw, re)
        })
        .collect();
}

/// Parses the numeric part of a currency match, e.g. `"1,299.00"`.
/// Returns `None` for non-positive or implausibly large values.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let price: f64 = cleaned.trim().parse().ok()?;
    is_plausible_price(price).then_some(price)
}

pub fn is_plausible_price(price: f64) -> bool {
    price.is_finite() && price > 0.0 && price < MAX_PLAUSIBLE_PRICE
}

/// First plausible `$<number>` in `text`.
pub fn find_price(text: &str) -> Option<f64> {
    PRICE_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| parse_price(m.as_str()))
}

/// Leftmost tier keyword in `text`, as a display name (`"pro"` -> `"Pro"`).
pub fn find_tier(text: &str) -> Option<String> {
    TIER_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| display_name(m.as_str()))
}

/// Whether `keyword` occurs in `text` as a whole word, ignoring case.
pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    let lower = text.to_lowercase();
    lower
        .match_indices(keyword)
        .any(|(start, _)| is_word_at(&lower, start, keyword.len()))
}

fn is_word_at(text: &str, start: usize, len: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[start + len..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

/// `"ENTERPRISE"` -> `"Enterprise"`
pub fn display_name(keyword: &str) -> String {
    let lower = keyword.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
