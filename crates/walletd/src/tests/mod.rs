//! Crate-level tests driving the service against a scripted wallet tool.

#![cfg(unix)]


use std::fs;
use std::ffi::OsString;
use std::io::Cursor;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::OnceLock;

use rstest::{fixture, rstest};
use serde_json::Value;
use tempfile::TempDir;
use wallet_config::Config;
use wallet_session::{Chain, WalletIdentity};

use crate::{AccountRef, WalletLayout, WalletService, run, serve};

/// Stand-in for the wallet tool: answers `sync status` with a coloured
/// object, echoes any other line as an object and exits on `exit`.
const FAKE_TOOL: &str = r#"#!/bin/sh
data_dir="$6"
shift 6
if [ "$#" -gt 0 ]; then
  case "$1" in
    balance)
      printf 'Launching sync task...\nconfirmed_orchard_balance: 42\nconfirmed_sapling_balance: 7\nSave task shutdown successfully.\n'
      exit 0
      ;;
  esac
  echo "unsupported command $1" >&2
  exit 2
fi
echo "spawn $$" >> "$data_dir/spawn.log"
while IFS= read -r line; do
  case "$line" in
    "sync status")
      printf '\033[1m{ sync_id: 9, in_progress: false, synced_blocks: 1_024, }\033[0m\n'
      ;;
    exit)
      exit 0
      ;;
    *)
      printf '{ "echo": "%s" }\n' "$line"
      ;;
  esac
done
"#;

static TOOL_DIR: OnceLock<TempDir> = OnceLock::new();

fn fake_tool_path() -> PathBuf {
    let dir = TOOL_DIR.get_or_init(|| {
        let created = TempDir::new().expect("create tool dir");
        let tool = created.path().join("fake-wallet-tool");
        fs::write(&tool, FAKE_TOOL).expect("write fake tool");
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).expect("chmod fake tool");
        created
    });
    dir.path().join("fake-wallet-tool")
}

/// A wallets root served by the fake tool.
pub(crate) struct Wallets {
    root: TempDir,
    config: Config,
}

impl Wallets {
    pub(crate) fn new() -> Self {
        let root = TempDir::new().expect("create wallets root");
        let config = Config {
            tool_path: Some(
                camino::Utf8PathBuf::from_path_buf(fake_tool_path()).expect("utf-8 tool path"),
            ),
            wallets_root: Some(
                camino::Utf8PathBuf::from_path_buf(root.path().to_path_buf())
                    .expect("utf-8 wallets root"),
            ),
            command_timeout_ms: Some(5_000),
            poll_interval_ms: Some(20),
            ..Config::default()
        };
        Self { root, config }
    }

    pub(crate) fn service(&self) -> WalletService<wallet_session::ProcessOneShot> {
        WalletService::from_config(&self.config)
    }

    pub(crate) fn identity(&self, owner: &str, account: &str, chain: Chain) -> WalletIdentity {
        let layout = WalletLayout::new(self.config.wallets_root().to_owned());
        layout
            .identity(&AccountRef {
                owner_id: owner.to_owned(),
                account_name: account.to_owned(),
                chain,
                server: "http://127.0.0.1:9067".to_owned(),
            })
            .expect("valid account")
    }

    pub(crate) fn root(&self) -> &std::path::Path {
        self.root.path()
    }
}

#[fixture]
fn wallets() -> Wallets {
    Wallets::new()
}

fn documents(output: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(output)
        .lines()
        .map(|line| serde_json::from_str(line).expect("one JSON document per line"))
        .collect()
}

#[rstest]
fn serve_answers_each_line_and_skips_blank_ones(wallets: Wallets) {
    let service = wallets.service();
    let identity = wallets.identity("owner", "main", Chain::Testnet);
    service.prepare_wallet(&identity).expect("create wallet dir");
    let mut output = Vec::new();

    serve(
        &service,
        &identity,
        Cursor::new("sync status\n\n   \nhello\nquit\nignored\n"),
        &mut output,
    )
    .expect("serve");

    let answers = documents(&output);
    assert_eq!(answers.len(), 2);
    assert_eq!(answers.first().map(|doc| doc["synced_blocks"].clone()), Some(1024.into()));
    assert_eq!(answers.get(1).map(|doc| doc["echo"].clone()), Some("hello".into()));
    assert!(!service.sessions().contains(&identity));
}

#[rstest]
fn serve_reports_errors_as_documents(wallets: Wallets) {
    let service = wallets.service();
    let identity = wallets.identity("owner", "crashy", Chain::Testnet);
    service.prepare_wallet(&identity).expect("create wallet dir");
    let mut output = Vec::new();

    serve(&service, &identity, Cursor::new("exit\n"), &mut output).expect("serve");

    let answers = documents(&output);
    let [answer] = answers.as_slice() else {
        panic!("expected one answer, got {answers:?}");
    };
    assert_eq!(answer["retryable"], Value::Bool(true));
    assert!(answer["error"].as_str().is_some_and(|text| text.contains("exited")));
}

#[rstest]
fn one_shot_balance_through_real_process(wallets: Wallets) {
    let service = wallets.service();
    let identity = wallets.identity("owner", "main", Chain::Mainnet);

    assert_eq!(service.spendable_balance(&identity).expect("balance"), 7);
}

#[rstest]
fn wallets_are_laid_out_per_owner_account_and_chain(wallets: Wallets) {
    let service = wallets.service();
    let identity = wallets.identity("owner", "main", Chain::Regtest);

    service.prepare_wallet(&identity).expect("create wallet dir");

    assert!(wallets.root().join("owner/main/regtest").is_dir());
}

#[rstest]
fn removing_a_wallet_stops_its_session_first(wallets: Wallets) {
    let service = wallets.service();
    let identity = wallets.identity("owner", "retired", Chain::Testnet);
    service.prepare_wallet(&identity).expect("create wallet dir");
    service.sync_status(&identity).expect("warm session");
    assert!(service.sessions().contains(&identity));

    assert!(service.remove_wallet(&identity).expect("remove"));

    assert!(!service.sessions().contains(&identity));
    assert!(!identity.data_dir().exists());
    assert!(!service.remove_wallet(&identity).expect("remove again"));
}

#[rstest]
fn run_loads_flags_and_serves_until_quit() {
    let data_dir = TempDir::new().expect("create data dir");
    let args = [
        OsString::from("walletd"),
        OsString::from("--tool-path"),
        fake_tool_path().into_os_string(),
        OsString::from("--data-dir"),
        data_dir.path().join("session").into_os_string(),
        OsString::from("--default-chain"),
        OsString::from("testnet"),
    ];
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();

    let code = run(
        args,
        Cursor::new("sync status\nquit\n"),
        &mut stdout,
        &mut stderr,
    );

    assert_eq!(code, ExitCode::SUCCESS, "{}", String::from_utf8_lossy(&stderr));
    let answers = documents(&stdout);
    assert_eq!(
        answers.first().map(|doc| doc["sync_id"].clone()),
        Some(9.into())
    );
    assert!(data_dir.path().join("session/spawn.log").is_file());
}
