//! Parsers for the wallet tool's textual output.
//!
//! The wallet tool was written for people at a terminal, so its output mixes
//! launch banners, colour codes and several ad hoc grammars. This crate turns
//! a captured text blob into structured data without ever failing on
//! malformed input: every parser returns a [`ParseOutcome`] that says whether
//! the text was fully understood, partly understood, or not understood at
//! all.
//!
//! Four grammars are supported, selected through [`Grammar`]:
//!
//! - [`Grammar::Object`]: a single JSON-like object surrounded by noise and
//!   written with bare keys, digit-group separators and trailing commas.
//! - [`Grammar::Objects`]: every balanced object in the text, each repaired
//!   as above.
//! - [`Grammar::KeyValue`]: flat `key: value` diagnostic lines.
//! - [`Grammar::Ledger`]: brace-delimited blocks of nested `key: value`
//!   lines, where a repeated nested key becomes a list.
//!
//! Whatever the grammar, a successful parse produces a [`Response`]: either
//! one [`Record`] or an ordered list of them, never a mix.
//!
//! # Example
//!
//! ```
//! use wallet_output::{Grammar, Response};
//!
//! let outcome = Grammar::KeyValue.parse("Launching wallet\nconfirmed_orchard_balance: 190_000\n");
//! let response = outcome.into_result().expect("balance parses");
//! let Response::One(record) = response else { panic!("expected one record") };
//! assert_eq!(record["confirmed_orchard_balance"], 190_000);
//! ```

mod extract;
mod grammar;
mod key_value;
mod ledger;
mod outcome;
mod repair;
mod response;

#[cfg(test)]
mod tests;

pub use extract::{extract_object, extract_objects, strip_ansi};
pub use grammar::Grammar;
pub use key_value::{DEFAULT_NOISE_PREFIXES, KeyValueParser, parse_key_values};
pub use ledger::parse_ledger;
pub use outcome::{OutputError, ParseOutcome};
pub use repair::{parse_object, parse_objects, repair_json};
pub use response::{Record, Response};
