//! Selection of the parser applied to a command's output.

use std::fmt;

use crate::key_value::parse_key_values;
use crate::ledger::parse_ledger;
use crate::outcome::ParseOutcome;
use crate::repair::{parse_object, parse_objects};

/// The textual shapes the wallet tool emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    /// One JSON-like object spanning the first `{` to the last `}`.
    Object,
    /// Every balanced JSON-like object, in order.
    Objects,
    /// Flat `key: value` lines.
    KeyValue,
    /// Brace-delimited blocks of nested `key: value` lines.
    Ledger,
}

impl Grammar {
    /// Runs this grammar over `text`.
    #[must_use]
    pub fn parse(self, text: &str) -> ParseOutcome {
        match self {
            Self::Object => parse_object(text),
            Self::Objects => parse_objects(text),
            Self::KeyValue => parse_key_values(text),
            Self::Ledger => parse_ledger(text),
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Objects => "objects",
            Self::KeyValue => "key_value",
            Self::Ledger => "ledger",
        }
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
