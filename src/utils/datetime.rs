//! Date and time utility functions
//!
//! The graph stores dates using a date-fns style pattern chosen by the user
//! (`yyyy-MM-dd`, `MMM do, yyyy`, `EEE, dd.MM.yyyy`, ...), while the remote
//! service speaks RFC 3339 timestamps whose time part is always midnight UTC
//! for `due` and `completed`. This module converts between the two and the
//! compact `yyyymmdd` integer the graph uses for deadlines.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::fmt::Write;

/// Default page-title date pattern for new graphs
pub const DEFAULT_DATE_FORMAT: &str = "yyyy-MM-dd";

/// Errors raised while compiling a date pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateFormatError {
    #[error("Unsupported date token '{0}'")]
    UnsupportedToken(String),

    #[error("Unterminated quoted literal in date pattern")]
    UnterminatedLiteral,

    #[error("Date pattern is empty")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DateToken {
    Year4,
    Year2,
    MonthLong,
    MonthShort,
    Month2,
    Month1,
    Day2,
    Day1,
    DayOrdinal,
    WeekdayLong,
    WeekdayShort,
    Literal(String),
}

/// A compiled date-fns style pattern, as used for journal page titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphDateFormat {
    pattern: String,
    tokens: Vec<DateToken>,
}

impl GraphDateFormat {
    /// Compile a pattern such as `yyyy-MM-dd` or `MMM do, yyyy`.
    pub fn new(pattern: &str) -> Result<Self, DateFormatError> {
        if pattern.trim().is_empty() {
            return Err(DateFormatError::Empty);
        }
        Ok(Self {
            pattern: pattern.to_string(),
            tokens: tokenize(pattern)?,
        })
    }

    /// The pattern this format was compiled from
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the pattern names a year, a month and a day, so that
    /// formatting and parsing a date gives back the same date.
    pub fn is_unambiguous(&self) -> bool {
        let has_year = self
            .tokens
            .iter()
            .any(|t| matches!(t, DateToken::Year4 | DateToken::Year2));
        let has_month = self.tokens.iter().any(|t| {
            matches!(
                t,
                DateToken::MonthLong | DateToken::MonthShort | DateToken::Month2 | DateToken::Month1
            )
        });
        let has_day = self
            .tokens
            .iter()
            .any(|t| matches!(t, DateToken::Day2 | DateToken::Day1 | DateToken::DayOrdinal));
        has_year && has_month && has_day
    }

    /// Render a calendar date with this pattern.
    pub fn format(&self, date: NaiveDate) -> String {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                DateToken::Year4 => {
                    let _ = write!(out, "{:04}", date.year());
                }
                DateToken::Year2 => {
                    let _ = write!(out, "{:02}", date.year() % 100);
                }
                DateToken::MonthLong => out.push_str(&date.format("%B").to_string()),
                DateToken::MonthShort => out.push_str(&date.format("%b").to_string()),
                DateToken::Month2 => {
                    let _ = write!(out, "{:02}", date.month());
                }
                DateToken::Month1 => {
                    let _ = write!(out, "{}", date.month());
                }
                DateToken::Day2 => {
                    let _ = write!(out, "{:02}", date.day());
                }
                DateToken::Day1 => {
                    let _ = write!(out, "{}", date.day());
                }
                DateToken::DayOrdinal => {
                    let _ = write!(out, "{}{}", date.day(), ordinal_suffix(date.day()));
                }
                DateToken::WeekdayLong => out.push_str(&date.format("%A").to_string()),
                DateToken::WeekdayShort => out.push_str(&date.format("%a").to_string()),
                DateToken::Literal(text) => out.push_str(text),
            }
        }
        out
    }

    /// Parse text written with this pattern. Returns `None` when the text does not match.
    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        let mut chrono_fmt = String::new();
        let mut has_ordinal = false;
        for token in &self.tokens {
            match token {
                DateToken::Year4 => chrono_fmt.push_str("%Y"),
                DateToken::Year2 => chrono_fmt.push_str("%y"),
                DateToken::MonthLong => chrono_fmt.push_str("%B"),
                DateToken::MonthShort => chrono_fmt.push_str("%b"),
                DateToken::Month2 | DateToken::Month1 => chrono_fmt.push_str("%m"),
                DateToken::Day2 | DateToken::Day1 => chrono_fmt.push_str("%d"),
                DateToken::DayOrdinal => {
                    has_ordinal = true;
                    chrono_fmt.push_str("%d");
                }
                DateToken::WeekdayLong => chrono_fmt.push_str("%A"),
                DateToken::WeekdayShort => chrono_fmt.push_str("%a"),
                DateToken::Literal(lit) => chrono_fmt.push_str(&lit.replace('%', "%%")),
            }
        }

        let input = if has_ordinal {
            strip_ordinal_suffixes(text.trim())
        } else {
            text.trim().to_string()
        };
        NaiveDate::parse_from_str(&input, &chrono_fmt).ok()
    }
}

impl Default for GraphDateFormat {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_DATE_FORMAT.to_string(),
            tokens: vec![
                DateToken::Year4,
                DateToken::Literal("-".to_string()),
                DateToken::Month2,
                DateToken::Literal("-".to_string()),
                DateToken::Day2,
            ],
        }
    }
}

fn tokenize(pattern: &str) -> Result<Vec<DateToken>, DateFormatError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            // Quoted literal; '' is an escaped quote
            let mut j = i + 1;
            let mut closed = false;
            while j < chars.len() {
                if chars[j] == '\'' {
                    if j + 1 < chars.len() && chars[j + 1] == '\'' {
                        literal.push('\'');
                        j += 2;
                        continue;
                    }
                    closed = true;
                    break;
                }
                literal.push(chars[j]);
                j += 1;
            }
            if !closed {
                return Err(DateFormatError::UnterminatedLiteral);
            }
            i = j + 1;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            literal.push(c);
            i += 1;
            continue;
        }

        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == c {
            run += 1;
        }

        let token = match (c, run) {
            ('y', 4) => DateToken::Year4,
            ('y', 2) => DateToken::Year2,
            ('M', 4) => DateToken::MonthLong,
            ('M', 3) => DateToken::MonthShort,
            ('M', 2) => DateToken::Month2,
            ('M', 1) => DateToken::Month1,
            ('d', 2) => DateToken::Day2,
            ('d', 1) if chars.get(i + 1) == Some(&'o') => {
                run = 2;
                DateToken::DayOrdinal
            }
            ('d', 1) => DateToken::Day1,
            ('E', 4) => DateToken::WeekdayLong,
            ('E', 1..=3) => DateToken::WeekdayShort,
            _ => {
                let raw: String = chars[i..i + run].iter().collect();
                return Err(DateFormatError::UnsupportedToken(raw));
            }
        };

        if !literal.is_empty() {
            tokens.push(DateToken::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(token);
        i += run;
    }

    if !literal.is_empty() {
        tokens.push(DateToken::Literal(literal));
    }
    Ok(tokens)
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Remove `st`/`nd`/`rd`/`th` when they directly follow a digit.
fn strip_ordinal_suffixes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        if i > 0 && chars[i - 1].is_ascii_digit() && i + 1 < chars.len() {
            let pair: String = chars[i..i + 2].iter().collect::<String>().to_ascii_lowercase();
            if matches!(pair.as_str(), "st" | "nd" | "rd" | "th") {
                i += 2;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// Extract the UTC calendar date from a remote timestamp.
///
/// Accepts full RFC 3339 timestamps and bare `YYYY-MM-DD` dates.
pub fn parse_remote_date(timestamp: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    timestamp
        .get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Render a date the way the remote service stores date-only fields.
pub fn to_remote_date(date: NaiveDate) -> String {
    format!("{}T00:00:00.000Z", date.format("%Y-%m-%d"))
}

/// Encode a date as the compact `yyyymmdd` integer used for block deadlines.
pub fn date_to_deadline(date: NaiveDate) -> i32 {
    date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32
}

/// Decode a compact `yyyymmdd` deadline. Values that are not 8 digits are rejected.
pub fn deadline_to_date(deadline: i32) -> Option<NaiveDate> {
    if !(10_000_000..=99_999_999).contains(&deadline) {
        return None;
    }
    let year = deadline / 10_000;
    let month = (deadline / 100 % 100) as u32;
    let day = (deadline % 100) as u32;
    NaiveDate::from_ymd_opt(year, month, day)
}
