//! Crate-level integration and BDD tests.

use serde_json::json;

use crate::{Grammar, Response, extract_object, strip_ansi};


/// Captured tool sessions used across the behaviour scenarios.
pub(crate) fn sample_output(name: &str) -> &'static str {
    match name {
        "balance" => {
            "Launching sync task...\nZingo CLI 1.4\n[\nconfirmed_orchard_balance: 190_000\nunverified_sapling_balance: 12\n]\nSave task shutdown successfully.\n"
        }
        "sync status" => {
            "\u{1b}[32m{\n  sync_id: 4,\n  in_progress: false,\n  last_error: null,\n  synced_blocks: 2_400_001,\n}\u{1b}[0m\n"
        }
        "addresses" => {
            "{ address: \"u1alpha\", receivers: { orchard: true } }\n{ address: \"u1beta\", receivers: { orchard: false } }\n"
        }
        "transactions" => {
            "{\n  txid: aa\n  outgoing_tx_data:\n  {\n    value: 10\n  }\n  outgoing_tx_data:\n  {\n    value: 20\n  }\n}\n{\n  txid: bb\n  outgoing_tx_data:\n  {\n    value: 30\n  }\n  outgoing_tx_data:\n  {\n    value: 40\n  }\n}\n"
        }
        "garbage" => "Error: wallet is locked\n",
        _ => "",
    }
}

#[test]
fn coloured_object_parses_end_to_end() {
    let stripped = strip_ansi(sample_output("sync status"));
    let region = extract_object(&stripped).expect("balanced object");

    let response = Grammar::Object
        .parse(region)
        .into_result()
        .expect("sync status parses");

    assert_eq!(
        response,
        Response::One(
            json!({
                "sync_id": 4,
                "in_progress": false,
                "last_error": null,
                "synced_blocks": 2_400_001,
            })
            .as_object()
            .cloned()
            .expect("object literal")
        )
    );
}
