//! Pure text normalizers turning scraped display strings into record fields.

use crate::utils::error::{Result, ScrapeError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

pub const DEFAULT_COUNTRY_CODE: &str = "+49";
pub const ELLIPSIS: &str = "...";

const POINT_MARKERS: &[char] = &['👍', '👎', '✓', '✔', '✅', '✗', '❌', '\u{fe0f}'];

static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4,5}\b").expect("postal code pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

/// Which address parser a run uses. The two are never combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressPolicy {
    /// `street, ..., POSTAL CITY`; anything else is an error.
    Strict,
    /// Locate a 4-5 digit postal code anywhere; fall back to street-only.
    Lenient,
}

impl AddressPolicy {
    pub fn parse(self, raw: &str) -> Result<ParsedAddress> {
        match self {
            AddressPolicy::Strict => parse_address(raw),
            AddressPolicy::Lenient => Ok(parse_address_lenient(raw)),
        }
    }
}

pub fn parse_address(raw: &str) -> Result<ParsedAddress> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() < 2 {
        return Err(ScrapeError::AddressFormatError {
            address: raw.to_string(),
            reason: "expected 'street, postal code city'".to_string(),
        });
    }

    let street = parts[0].trim();
    let location: Vec<&str> = parts[parts.len() - 1].split_whitespace().collect();
    if location.len() < 2 {
        return Err(ScrapeError::AddressFormatError {
            address: raw.to_string(),
            reason: "expected postal code followed by city".to_string(),
        });
    }

    Ok(ParsedAddress {
        street: street.to_string(),
        postal_code: location[0].to_string(),
        city: location[1..].join(" "),
    })
}

pub fn parse_address_lenient(raw: &str) -> ParsedAddress {
    let raw = raw.trim();
    match POSTAL_CODE.find(raw) {
        Some(m) => ParsedAddress {
            street: raw[..m.start()]
                .trim_end_matches(|c: char| c == ',' || c.is_whitespace())
                .to_string(),
            postal_code: m.as_str().to_string(),
            city: raw[m.end()..]
                .trim_start_matches(|c: char| c == ',' || c.is_whitespace())
                .trim_end()
                .to_string(),
        },
        None => ParsedAddress {
            street: raw.to_string(),
            postal_code: String::new(),
            city: String::new(),
        },
    }
}

pub fn clean_phone_number(raw: &str) -> String {
    clean_phone_number_with(raw, DEFAULT_COUNTRY_CODE)
}

/// Keeps digits (and a leading `+`); local numbers get `country_code` in place of their trunk `0`.
pub fn clean_phone_number_with(raw: &str, country_code: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_digit() || (c == '+' && cleaned.is_empty()) {
            cleaned.push(c);
        }
    }

    if cleaned.starts_with('+') {
        return cleaned;
    }

    let local = cleaned.strip_prefix('0').unwrap_or(&cleaned);
    format!("{}{}", country_code, local)
}

pub fn validate_rating(value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(ScrapeError::InvalidRatingError {
            value: value.to_string(),
            reason: "rating must be a number".to_string(),
        });
    }
    if !(0.0..=5.0).contains(&value) {
        return Err(ScrapeError::InvalidRatingError {
            value: value.to_string(),
            reason: "rating must be between 0 and 5".to_string(),
        });
    }

    Ok((value * 10.0).round() / 10.0)
}

/// Parses a displayed rating such as `"4.5"` or `"4,5"`.
pub fn parse_rating(text: &str) -> Result<f64> {
    let normalized = text.trim().replace(',', ".");
    let value: f64 = normalized
        .parse()
        .map_err(|_| ScrapeError::InvalidRatingError {
            value: text.to_string(),
            reason: "rating must be a number".to_string(),
        })?;
    validate_rating(value)
}

/// Leading numeral of an accessible label, e.g. `"4 stars"` or `"4,0 Sterne"`.
pub fn parse_rating_label(label: &str) -> Result<f64> {
    let first = label.split_whitespace().next().unwrap_or_default();
    parse_rating(first)
}

/// Digits-only reading of a count like `"(1,234 reviews)"`; no digits means zero.
pub fn parse_count(text: &str) -> u64 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

pub fn format_review_points<S: AsRef<str>>(points: &[S]) -> Vec<String> {
    points
        .iter()
        .filter_map(|point| {
            let stripped = point
                .as_ref()
                .trim_start_matches(|c: char| POINT_MARKERS.contains(&c) || c.is_whitespace())
                .trim_end();
            capitalize_first(stripped)
        })
        .collect()
}

fn capitalize_first(text: &str) -> Option<String> {
    let mut chars = text.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

/// Shortens `text` to at most `max_length` characters, ellipsis included.
///
/// The cut is made within the first `max_length - 3` characters so the result
/// never exceeds `max_length`, which keeps the function idempotent. It backs up
/// to the last whitespace in that span, so a word ending between
/// `max_length - 3` and `max_length` is still cut: `truncate_text("abcdef gh", 8)`
/// gives `"abcde..."`. A single word longer than the span is cut mid-word.
pub fn truncate_text(text: &str, max_length: usize) -> String {
    let length = text.chars().count();
    if length <= max_length {
        return text.to_string();
    }

    let ellipsis_length = ELLIPSIS.chars().count();
    if max_length < ellipsis_length {
        return text.chars().take(max_length).collect();
    }

    let budget = max_length - ellipsis_length;
    let kept: String = text.chars().take(budget).collect();
    let cut_at_boundary = text
        .chars()
        .nth(budget)
        .is_some_and(char::is_whitespace);

    let kept = if cut_at_boundary {
        kept.as_str()
    } else {
        match kept.rfind(char::is_whitespace) {
            Some(index) => &kept[..index],
            None => kept.as_str(),
        }
    };

    format!("{}{}", kept.trim_end(), ELLIPSIS)
}
