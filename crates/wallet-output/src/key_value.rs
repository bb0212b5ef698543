//! Flat `key: value` diagnostics.
//!
//! Balance and similar reports are printed as one `key: value` pair per
//! line, preceded by launch banners and sometimes wrapped in bare brackets.
//! Values that look numeric are coerced to numbers once digit-group
//! separators are removed; everything else stays a string.

use serde_json::{Number, Value};
use tracing::debug;

use crate::outcome::ParseOutcome;
use crate::response::{Record, Response};

const KEY_VALUE_TARGET: &str = "wallet_output::key_value";

/// Line prefixes the tool prints around its reports.
pub const DEFAULT_NOISE_PREFIXES: [&str; 3] = ["Launching", "Save", "Zingo"];

const STRUCTURAL_LINES: [&str; 4] = ["[", "]", "{", "}"];

/// Parser for flat `key: value` output with configurable noise prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueParser {
    noise_prefixes: Vec<String>,
}

impl Default for KeyValueParser {
    fn default() -> Self {
        Self::new(DEFAULT_NOISE_PREFIXES)
    }
}

impl KeyValueParser {
    /// Creates a parser that ignores lines starting with any of `prefixes`.
    #[must_use]
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            noise_prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses `text` into a single record.
    ///
    /// A repeated key keeps its last value. Lines that are neither noise nor
    /// a well-formed pair are reported as residue.
    #[must_use]
    pub fn parse(&self, text: &str) -> ParseOutcome {
        let mut record = Record::new();
        let mut residue = Vec::new();

        for line in text.lines().map(str::trim) {
            if line.is_empty() || STRUCTURAL_LINES.contains(&line) || self.is_noise(line) {
                continue;
            }

            match split_pair(line) {
                Some((key, value)) => {
                    record.insert(key.to_owned(), coerce(value));
                }
                None => {
                    debug!(target: KEY_VALUE_TARGET, line, "ignoring line without key and value");
                    residue.push(line.to_owned());
                }
            }
        }

        ParseOutcome::with_residue(Response::One(record), &residue)
    }

    fn is_noise(&self, line: &str) -> bool {
        self.noise_prefixes
            .iter()
            .any(|prefix| line.starts_with(prefix.as_str()))
    }
}

/// Parses `text` with the default noise prefixes.
#[must_use]
pub fn parse_key_values(text: &str) -> ParseOutcome {
    KeyValueParser::default().parse(text)
}

fn split_pair(line: &str) -> Option<(&str, &str)> {
    let (raw_key, raw_value) = line.split_once(':')?;
    let key = raw_key.trim();
    let value = raw_value.trim().trim_end_matches(',');
    (!key.is_empty() && !value.is_empty()).then_some((key, value))
}

/// Converts `value` to a number when it reads as an optionally signed
/// integer or decimal after removing `_` separators.
pub(crate) fn coerce(value: &str) -> Value {
    let digits: String = value.chars().filter(|&ch| ch != '_').collect();
    if !is_numeric(&digits) {
        return Value::String(value.to_owned());
    }

    if let Ok(integer) = digits.parse::<i64>() {
        return Value::Number(integer.into());
    }
    if let Ok(unsigned) = digits.parse::<u64>() {
        return Value::Number(unsigned.into());
    }
    digits
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map_or_else(|| Value::String(value.to_owned()), Value::Number)
}

fn is_numeric(text: &str) -> bool {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let all_digits = |part: &str| !part.is_empty() && part.chars().all(|ch| ch.is_ascii_digit());
    all_digits(whole) && fraction.is_none_or(all_digits)
}
