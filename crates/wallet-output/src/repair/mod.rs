//! Repair parsing for JSON-like objects.
//!
//! The wallet tool prints objects that are almost JSON: keys are often bare
//! identifiers, numbers carry `_` digit-group separators and lists end with
//! trailing commas. [`repair_json`] rewrites those constructs, always in the
//! same order, touching only text outside string literals:
//!
//! 1. remove digit-group separators inside number literals;
//! 2. quote bare identifiers immediately followed by `:`;
//! 3. remove trailing commas before `}` or `]`.

use serde_json::Value;
use tracing::{debug, warn};

use crate::extract::extract_objects;
use crate::outcome::ParseOutcome;
use crate::response::{Record, Response};

const REPAIR_TARGET: &str = "wallet_output::repair";

/// Key under which the unparsed text is kept when repair fails.
pub const RAW_KEY: &str = "raw";

/// Applies the textual repairs that turn tool output into strict JSON.
#[must_use]
pub fn repair_json(text: &str) -> String {
    let without_separators = map_code(text, remove_digit_separators);
    let quoted = map_code(&without_separators, quote_bare_keys);
    map_code(&quoted, drop_trailing_commas)
}

/// Parses the object spanning the first `{` to the last `}` in `text`.
///
/// Never fails on malformed text: when the repaired object still does not
/// parse, the outcome is partial and carries a record holding the matched
/// text under [`RAW_KEY`].
#[must_use]
pub fn parse_object(text: &str) -> ParseOutcome {
    let Some(matched) = outermost_object(text) else {
        return ParseOutcome::failed("no object found in output");
    };

    match repair_record(matched) {
        Ok(record) => ParseOutcome::Complete(Response::One(record)),
        Err(reason) => {
            warn!(
                target: REPAIR_TARGET,
                reason = %reason,
                bytes = matched.len(),
                "object did not parse after repair; keeping raw text"
            );
            let mut fallback = Record::new();
            fallback.insert(RAW_KEY.to_owned(), Value::String(matched.to_owned()));
            ParseOutcome::Partial {
                response: Response::One(fallback),
                residue: matched.to_owned(),
            }
        }
    }
}

/// Parses every balanced object in `text`, dropping the ones that fail.
#[must_use]
pub fn parse_objects(text: &str) -> ParseOutcome {
    let regions = extract_objects(text);
    if regions.is_empty() {
        return ParseOutcome::failed("no object found in output");
    }

    let mut records = Vec::with_capacity(regions.len());
    let mut residue = Vec::new();
    for region in regions {
        match repair_record(region) {
            Ok(record) => records.push(record),
            Err(reason) => {
                debug!(
                    target: REPAIR_TARGET,
                    reason = %reason,
                    "skipping object that did not parse"
                );
                residue.push(region.to_owned());
            }
        }
    }

    ParseOutcome::with_residue(Response::from_records(records), &residue)
}

fn repair_record(text: &str) -> Result<Record, String> {
    match serde_json::from_str::<Value>(&repair_json(text)) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(other) => Err(format!("expected an object, found {other}")),
        Err(error) => Err(error.to_string()),
    }
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    text.get(start..=end)
}

/// Rewrites the parts of `text` outside double-quoted string literals.
fn map_code(text: &str, rewrite: fn(&str) -> String) -> String {
    let mut output = String::with_capacity(text.len());
    let mut code = String::new();
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '"' {
            code.push(ch);
            continue;
        }

        output.push_str(&rewrite(&code));
        code.clear();
        output.push(ch);
        copy_string_body(&mut chars, &mut output);
    }

    output.push_str(&rewrite(&code));
    output
}

/// Copies a string literal body up to and including its closing quote.
fn copy_string_body(chars: &mut std::str::Chars<'_>, output: &mut String) {
    let mut escaped = false;
    for ch in chars.by_ref() {
        output.push(ch);
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            return;
        }
    }
}

const fn is_word(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn remove_digit_separators(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    let mut output = String::with_capacity(code.len());
    let mut previous: Option<char> = None;

    for (index, &ch) in chars.iter().enumerate() {
        let next = chars.get(index + 1).copied();
        let in_number = previous.is_some_and(|p| p.is_ascii_digit())
            && next.is_some_and(|n| n.is_ascii_digit())
            && starts_number_literal(&chars, index);
        if ch == '_' && in_number {
            continue;
        }
        output.push(ch);
        previous = Some(ch);
    }
    output
}

/// Whether the word containing `index` begins with a digit, making it a
/// number literal rather than an identifier such as `block_2_hash`.
fn starts_number_literal(chars: &[char], index: usize) -> bool {
    let mut start = index;
    while start > 0
        && chars
            .get(start - 1)
            .is_some_and(|&ch| is_word(ch) || ch == '.')
    {
        start -= 1;
    }
    chars.get(start).is_some_and(char::is_ascii_digit)
}

fn quote_bare_keys(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    let mut output = String::with_capacity(code.len() + 8);
    let mut index = 0;

    while let Some(&ch) = chars.get(index) {
        let after_word = index
            .checked_sub(1)
            .and_then(|before| chars.get(before))
            .is_some_and(|&before| is_word(before));
        let starts_word = is_word(ch) && !after_word;
        if !starts_word {
            output.push(ch);
            index += 1;
            continue;
        }

        let end = chars
            .iter()
            .skip(index)
            .position(|&c| !is_word(c))
            .map_or(chars.len(), |offset| index + offset);
        let word: String = chars.iter().skip(index).take(end - index).collect();
        if chars.get(end) == Some(&':') {
            output.push('"');
            output.push_str(&word);
            output.push('"');
        } else {
            output.push_str(&word);
        }
        index = end;
    }
    output
}

fn drop_trailing_commas(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    let mut output = String::with_capacity(code.len());

    for (index, &ch) in chars.iter().enumerate() {
        if ch == ',' {
            let closes = chars
                .iter()
                .skip(index + 1)
                .find(|c| !c.is_whitespace())
                .is_some_and(|&c| c == '}' || c == ']');
            if closes {
                continue;
            }
        }
        output.push(ch);
    }
    output
}
