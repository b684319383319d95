//! HTML extraction by CSS selector
//!
//! Every function takes raw HTML text and a selector string. A selector string
//! may chain several independent selectors with `||`; each alternative is
//! evaluated in order and the results are concatenated (or, for single-value
//! lookups, the first non-empty value wins).
//!
//! When a selector ends in an attribute clause such as `a[href]`, text lookups
//! return that attribute's value instead of the element text.

use crate::{ExtractError, ExtractResult};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Separator between alternative selectors
pub const SELECTOR_SEPARATOR: &str = "||";

/// Format name for relative dates such as "3 hours ago"
pub const RELATIVE_DATE_FORMAT: &str = "ago";

/// Format name for RFC 3339 timestamps
pub const RFC3339_FORMAT: &str = "rfc3339";

static TRAILING_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([a-zA-Z0-9\-_]+)(?:[~|^$*]?=.*?)?\]$").expect("valid attribute pattern")
});

static NUMBER_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9\-.]+").expect("valid number pattern"));

static RELATIVE_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s+(second|minute|hour|day|week|month|year)s?\s+ago")
        .expect("valid relative date pattern")
});

/// Splits a selector string into its `||`-separated alternatives
pub fn split_selectors(selector: &str) -> Vec<&str> {
    selector.split(SELECTOR_SEPARATOR).map(str::trim).collect()
}

/// Returns the attribute named by a trailing attribute clause, if any
///
/// When several clauses are chained at the end, the first of them names the
/// attribute: `a[rel=next][href]` reads `rel`.
///
/// # Examples
///
/// ```
/// use sumi_scraper::crawler::attr_name;
///
/// assert_eq!(attr_name("a[href]"), Some("href"));
/// assert_eq!(attr_name("input[type='text']"), Some("type"));
/// assert_eq!(attr_name("div.class"), None);
/// ```
pub fn attr_name(selector: &str) -> Option<&str> {
    TRAILING_ATTR
        .captures(selector.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// A parsed alternative together with the attribute it reads, if any
struct Alternative<'a> {
    selector: Selector,
    attr: Option<&'a str>,
}

fn compile(selector: &str) -> ExtractResult<Vec<Alternative<'_>>> {
    split_selectors(selector)
        .into_iter()
        .map(|alt| {
            let parsed = Selector::parse(alt).map_err(|e| ExtractError::InvalidSelector {
                selector: alt.to_string(),
                message: format!("{:?}", e),
            })?;
            Ok(Alternative {
                selector: parsed,
                attr: attr_name(alt),
            })
        })
        .collect()
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extracts the outer HTML of every element matching the selector
///
/// Malformed HTML is parsed leniently and never produces an error; only an
/// invalid selector does.
///
/// # Example
///
/// ```
/// use sumi_scraper::crawler::get_outer_html;
///
/// let html = r#"<div class="item">A</div><span class="other">B</span>"#;
/// let found = get_outer_html(html, "div.item||span.other").unwrap();
/// assert_eq!(found, vec![
///     r#"<div class="item">A</div>"#.to_string(),
///     r#"<span class="other">B</span>"#.to_string(),
/// ]);
/// ```
pub fn get_outer_html(html: &str, selector: &str) -> ExtractResult<Vec<String>> {
    let alternatives = compile(selector)?;
    let document = Html::parse_document(html);

    Ok(alternatives
        .iter()
        .flat_map(|alt| document.select(&alt.selector).map(|el| el.html()))
        .collect())
}

/// Extracts the text (or attribute value) of every matching element
///
/// Text is trimmed; attribute values are returned as written. Empty values are
/// skipped.
pub fn get_text(html: &str, selector: &str) -> ExtractResult<Vec<String>> {
    let alternatives = compile(selector)?;
    let document = Html::parse_document(html);

    let mut results = Vec::new();
    for alt in &alternatives {
        for element in document.select(&alt.selector) {
            let value = match alt.attr {
                Some(attr) => element.value().attr(attr).unwrap_or_default().to_string(),
                None => element_text(&element),
            };
            if !value.is_empty() {
                results.push(value);
            }
        }
    }

    Ok(results)
}

/// Extracts the trimmed text (or attribute value) of the first match
///
/// Alternatives are tried in order and the first non-empty value is returned.
/// No match yields an empty string.
pub fn get_text_single(html: &str, selector: &str) -> ExtractResult<String> {
    let alternatives = compile(selector)?;
    let document = Html::parse_document(html);

    for alt in &alternatives {
        let Some(element) = document.select(&alt.selector).next() else {
            continue;
        };
        let value = match alt.attr {
            Some(attr) => element.value().attr(attr).unwrap_or_default().trim().to_string(),
            None => element_text(&element),
        };
        if !value.is_empty() {
            return Ok(value);
        }
    }

    Ok(String::new())
}

fn parse_number(text: &str, target: &'static str) -> ExtractResult<f64> {
    let cleaned = NUMBER_NOISE.replace_all(text, "");
    cleaned.parse::<f64>().map_err(|_| ExtractError::ParseNumber {
        text: text.to_string(),
        target,
    })
}

/// Reads the first match as a float, ignoring currency symbols, commas and spaces
///
/// No match yields `0.0`; text with no parseable number is an error.
pub fn get_float(html: &str, selector: &str) -> ExtractResult<f64> {
    let text = get_text_single(html, selector)?;
    if text.is_empty() {
        return Ok(0.0);
    }
    parse_number(&text, "float")
}

/// Reads the first match as an integer, truncating any fractional part
///
/// # Example
///
/// ```
/// use sumi_scraper::crawler::get_int;
///
/// assert_eq!(get_int(r#"<div class="count">1,234</div>"#, "div.count").unwrap(), 1234);
/// assert!(get_int(r#"<div class="count">not a number</div>"#, "div.count").is_err());
/// ```
pub fn get_int(html: &str, selector: &str) -> ExtractResult<i64> {
    let text = get_text_single(html, selector)?;
    if text.is_empty() {
        return Ok(0);
    }
    parse_number(&text, "int").map(|value| value as i64)
}

/// Reads the first match as a timestamp
///
/// `format` is one of:
/// - `"ago"`: relative text such as `3 hours ago` (a month is 30 days, a year 365)
/// - `"rfc3339"`: an RFC 3339 timestamp
/// - any chrono `strftime` format; date-only formats resolve to midnight UTC
pub fn get_time(html: &str, selector: &str, format: &str) -> ExtractResult<DateTime<Utc>> {
    let text = get_text_single(html, selector)?;
    if text.is_empty() {
        return Err(ExtractError::MissingText);
    }
    if format.is_empty() {
        return Err(ExtractError::MissingFormat);
    }

    match format {
        RELATIVE_DATE_FORMAT => parse_relative(&text),
        RFC3339_FORMAT => DateTime::parse_from_rfc3339(&text)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| date_error(&text, format, e.to_string())),
        _ => parse_with_format(&text, format),
    }
}

fn date_error(text: &str, format: &str, message: impl Into<String>) -> ExtractError {
    ExtractError::ParseDate {
        text: text.to_string(),
        format: format.to_string(),
        message: message.into(),
    }
}

fn parse_relative(text: &str) -> ExtractResult<DateTime<Utc>> {
    let caps = RELATIVE_DATE
        .captures(text)
        .ok_or_else(|| date_error(text, RELATIVE_DATE_FORMAT, "not a relative date"))?;

    let amount: i64 = caps[1]
        .parse()
        .map_err(|_| date_error(text, RELATIVE_DATE_FORMAT, "amount out of range"))?;
    let unit_seconds = match caps[2].to_lowercase().as_str() {
        "second" => 1,
        "minute" => 60,
        "hour" => 60 * 60,
        "day" => 24 * 60 * 60,
        "week" => 7 * 24 * 60 * 60,
        "month" => 30 * 24 * 60 * 60,
        _ => 365 * 24 * 60 * 60,
    };

    amount
        .checked_mul(unit_seconds)
        .and_then(Duration::try_seconds)
        .and_then(|delta| Utc::now().checked_sub_signed(delta))
        .ok_or_else(|| date_error(text, RELATIVE_DATE_FORMAT, "amount out of range"))
}

fn parse_with_format(text: &str, format: &str) -> ExtractResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_str(text, format) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    match NaiveDate::parse_from_str(text, format) {
        Ok(date) => date
            .and_hms_opt(0, 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .ok_or_else(|| date_error(text, format, "invalid time of day")),
        Err(e) => Err(date_error(text, format, e.to_string())),
    }
}
