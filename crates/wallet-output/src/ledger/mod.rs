//! Nested block ("ledger") output.
//!
//! Transaction listings are printed as top-level blocks, each opened by a
//! line holding only `{` and closed by a line holding only `}`. Inside a
//! block, `key: value` lines assign scalars, a `key:` line names the key the
//! next nested block attaches to, and nested blocks may repeat under the
//! same key. The grammar has no array syntax, so a repeated nested key
//! turns its value into a list in order of appearance.

use serde_json::Value;
use tracing::debug;

use crate::outcome::ParseOutcome;
use crate::response::{Record, Response};

const LEDGER_TARGET: &str = "wallet_output::ledger";

/// Parses every top-level block in `text`.
///
/// One block yields [`Response::One`]; zero or several yield
/// [`Response::Many`]. Text between blocks is ignored, and lines inside a
/// block that fit no rule are reported as residue. A block still open at
/// the end of the text is dropped.
#[must_use]
pub fn parse_ledger(text: &str) -> ParseOutcome {
    let mut blocks = Vec::new();
    let mut residue = Vec::new();
    let mut current: Option<BlockBuilder> = None;

    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            continue;
        }

        let Some(builder) = current.as_mut() else {
            if line == "{" {
                current = Some(BlockBuilder::new());
            }
            continue;
        };

        if let Some(record) = builder.feed(line, &mut residue) {
            blocks.push(record);
            current = None;
        }
    }

    if current.is_some() {
        debug!(target: LEDGER_TARGET, "dropping unterminated trailing block");
        residue.push("unterminated block".to_owned());
    }

    ParseOutcome::with_residue(Response::from_records(blocks), &residue)
}

/// One open container and the key its next nested block attaches to.
#[derive(Debug, Default)]
struct Frame {
    key: Option<String>,
    record: Record,
    pending: Option<String>,
}

/// Builds a single top-level block from the lines between its braces.
#[derive(Debug)]
struct BlockBuilder {
    stack: Vec<Frame>,
}

impl BlockBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Frame::default()],
        }
    }

    /// Consumes one trimmed line, returning the finished record when the
    /// block's own closing brace is reached.
    fn feed(&mut self, line: &str, residue: &mut Vec<String>) -> Option<Record> {
        match line {
            "{" => self.open(residue),
            "}" => return self.close(),
            _ => self.assign(line, residue),
        }
        None
    }

    fn open(&mut self, residue: &mut Vec<String>) {
        let key = self.stack.last().and_then(|frame| frame.pending.clone());
        if key.is_none() {
            debug!(target: LEDGER_TARGET, "nested block has no key; discarding its contents");
            residue.push("nested block without a key".to_owned());
        }
        self.stack.push(Frame {
            key,
            ..Frame::default()
        });
    }

    fn close(&mut self) -> Option<Record> {
        let frame = self.stack.pop()?;
        let Some(parent) = self.stack.last_mut() else {
            return Some(frame.record);
        };
        if let Some(key) = frame.key {
            attach(&mut parent.record, key, frame.record);
        }
        None
    }

    fn assign(&mut self, line: &str, residue: &mut Vec<String>) {
        let Some(frame) = self.stack.last_mut() else {
            return;
        };
        let Some((raw_key, raw_value)) = line.split_once(':') else {
            residue.push(line.to_owned());
            return;
        };
        let key = raw_key.trim();
        let value = raw_value.trim();
        if key.is_empty() {
            residue.push(line.to_owned());
            return;
        }

        match value {
            "" => frame.pending = Some(key.to_owned()),
            "{" => {
                frame.pending = Some(key.to_owned());
                self.open(residue);
            }
            scalar => {
                frame.record.insert(key.to_owned(), coerce_scalar(scalar));
            }
        }
    }
}

/// Stores `child` under `key`, turning an existing value into a list.
fn attach(record: &mut Record, key: String, nested: Record) {
    let child = Value::Object(nested);
    match record.get_mut(&key) {
        Some(Value::Array(items)) => items.push(child),
        Some(existing) => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, child]);
        }
        None => {
            record.insert(key, child);
        }
    }
}

fn coerce_scalar(value: &str) -> Value {
    value
        .bytes()
        .all(|byte| byte.is_ascii_digit())
        .then(|| value.parse::<u64>().ok())
        .flatten()
        .map_or_else(|| Value::String(value.to_owned()), |number| Value::Number(number.into()))
}
