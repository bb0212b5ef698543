//! Brace matching and terminal-noise removal.
//!
//! The extractor counts raw `{`/`}` bytes and does not track string
//! literals, so a brace inside a quoted value (a memo, say) closes or opens
//! a region early.

use std::ops::Range;

/// Removes ANSI colour and cursor escape sequences.
#[must_use]
pub fn strip_ansi(text: &str) -> String {
    strip_ansi_escapes::strip_str(text)
}

/// Returns the minimal balanced `{...}` region starting at the first `{`.
///
/// Returns `None` when there is no `{` or when the region is still open at
/// the end of the text, which is how a response that is still streaming in
/// looks.
#[must_use]
pub fn extract_object(text: &str) -> Option<&str> {
    balanced_region(text, 0).and_then(|range| text.get(range))
}

/// Returns every consecutive balanced `{...}` region, in order.
///
/// Scanning resumes after each region's closing brace and stops at the first
/// region that never closes.
#[must_use]
pub fn extract_objects(text: &str) -> Vec<&str> {
    let mut regions = Vec::new();
    let mut from = 0;
    while let Some(range) = balanced_region(text, from) {
        from = range.end;
        if let Some(region) = text.get(range) {
            regions.push(region);
        }
    }
    regions
}

fn balanced_region(text: &str, from: usize) -> Option<Range<usize>> {
    let start = from + text.get(from..)?.find('{')?;
    let mut depth = 0_usize;
    for (index, byte) in text.bytes().enumerate().skip(start) {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start..index + 1);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("{}", "{}")]
    #[case("noise {\"a\": 1} trailing", "{\"a\": 1}")]
    #[case("Launching...\n{ a: { b: 1 } }\n{ c: 2 }", "{ a: { b: 1 } }")]
    #[case("} stray close { x: 1 }", "{ x: 1 }")]
    fn returns_minimal_region_from_first_brace(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(extract_object(input), Some(expected));
    }

    #[rstest]
    #[case("")]
    #[case("no braces at all")]
    #[case("{ a: { b: 1 }")]
    #[case("banner\n{\n  sync_id: 4,\n")]
    fn incomplete_input_yields_none(#[case] input: &str) {
        assert_eq!(extract_object(input), None);
    }

    #[rstest]
    fn prefix_noise_does_not_shift_region() {
        let body = "{ outer: { inner: [1, 2] }, other: 3 }";
        for prefix in ["", "x", "Saving wallet...\n", "\u{1b}[0m ]] ) "] {
            let input = format!("{prefix}{body} tail {{");
            assert_eq!(extract_object(&input), Some(body), "prefix {prefix:?}");
        }
    }

    #[rstest]
    fn extracts_all_consecutive_regions() {
        let input = "a {1} b {2 {3}} c {unterminated";

        assert_eq!(extract_objects(input), vec!["{1}", "{2 {3}}"]);
    }

    #[rstest]
    fn brace_inside_a_string_cuts_the_region_short() {
        let input = "{ memo: \"paid } thanks\", value: 1 }";

        let region = extract_object(input);

        assert_eq!(region, Some("{ memo: \"paid }"));
        let outcome = crate::parse_object(region.unwrap_or_default());
        let record = outcome
            .response()
            .and_then(crate::Response::as_one)
            .expect("fallback record");
        assert_eq!(record[crate::repair::RAW_KEY], "{ memo: \"paid }");
        assert!(outcome.residue().is_some());
    }

    #[rstest]
    fn whole_text_parse_keeps_braces_inside_strings() {
        let input = "{ memo: \"paid } thanks\", value: 1 }";

        let record = crate::parse_object(input)
            .into_result()
            .expect("object parses")
            .into_one()
            .expect("one record");

        assert_eq!(record["memo"], "paid } thanks");
        assert_eq!(record["value"], 1);
    }

    #[rstest]
    fn strips_colour_codes() {
        let input = "\u{1b}[32m{ ok: 1 }\u{1b}[0m";

        assert_eq!(strip_ansi(input), "{ ok: 1 }");
    }
}
