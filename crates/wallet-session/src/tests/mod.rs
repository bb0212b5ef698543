//! Process-level tests against a scripted stand-in for the wallet tool.

#![cfg(unix)]


use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

use rstest::{fixture, rstest};
use tempfile::TempDir;
use wallet_output::Grammar;

use crate::{
    Chain, CommandDispatcher, OneShotRunner, ProcessOneShot, ProcessPool, SessionError,
    SessionSettings, ToolCommand, WalletIdentity,
};

/// Stand-in for the wallet tool. Arguments six onwards form a one-shot
/// command; without them it reads commands from stdin. Every start is
/// logged to `spawn.log` in the data directory.
const FAKE_TOOL: &str = r#"#!/bin/sh
data_dir="$6"
shift 6
echo "spawn $$" >> "$data_dir/spawn.log"
if [ "$#" -gt 0 ]; then
  case "$1" in
    balance)
      printf 'Launching sync task...\n[\nconfirmed_orchard_balance: 190_000\nconfirmed_sapling_balance: 5_000\n]\nSave task shutdown successfully.\n'
      ;;
    fail)
      echo "Error: wallet is locked" >&2
      exit 3
      ;;
    hang)
      exec sleep 5
      ;;
    *)
      echo "unknown command $1" >&2
      exit 2
      ;;
  esac
  exit 0
fi
echo "Zingo CLI ready"
while IFS= read -r line; do
  case "$line" in
    "sync status")
      printf '\033[32m{\n  sync_id: 4,\n  synced_blocks: 2_500,\n}\033[0m\n'
      ;;
    slow)
      sleep 1
      printf '{ "late": true }\n'
      ;;
    silent)
      ;;
    quit)
      exit 0
      ;;
    *)
      printf '{ "echo": "%s" }\n' "$line"
      ;;
  esac
done
"#;

/// Directory holding the fake tool, written once before any test spawns it
/// so no forked child can inherit the script's open write handle.
static TOOL_DIR: OnceLock<TempDir> = OnceLock::new();

fn fake_tool_path() -> PathBuf {
    let dir = TOOL_DIR.get_or_init(|| {
        let dir = TempDir::new().expect("create tool dir");
        let tool = dir.path().join("fake-wallet-tool");
        fs::write(&tool, FAKE_TOOL).expect("write fake tool");
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).expect("chmod fake tool");
        dir
    });
    dir.path().join("fake-wallet-tool")
}

/// A temporary wallet data directory served by the fake tool.
pub(crate) struct FakeTool {
    dir: TempDir,
    tool: PathBuf,
}

impl FakeTool {
    pub(crate) fn install() -> Self {
        let tool = fake_tool_path();
        let dir = TempDir::new().expect("create data dir");
        Self { dir, tool }
    }

    pub(crate) fn settings(&self) -> SessionSettings {
        SessionSettings::new(&self.tool)
            .with_command_timeout(Duration::from_secs(5))
            .with_poll_interval(Duration::from_millis(20))
            .with_one_shot_timeout(Duration::from_secs(5))
    }

    pub(crate) fn identity(&self) -> WalletIdentity {
        WalletIdentity::new(Chain::Testnet, "http://127.0.0.1:9067", self.dir.path())
    }

    pub(crate) fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    /// Number of times the tool has been started.
    pub(crate) fn spawn_count(&self) -> usize {
        fs::read_to_string(self.dir.path().join("spawn.log"))
            .map(|log| log.lines().count())
            .unwrap_or(0)
    }
}

/// Polls `condition` for up to two seconds.
pub(crate) fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    condition()
}

#[fixture]
fn fake_tool() -> FakeTool {
    FakeTool::install()
}

#[rstest]
fn acquire_reuses_the_live_handle(fake_tool: FakeTool) {
    let pool = ProcessPool::new(fake_tool.settings());
    let identity = fake_tool.identity();

    let first = pool.acquire(&identity).expect("spawn");
    let second = pool.acquire(&identity).expect("reuse");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(pool.len(), 1);
}

#[rstest]
fn concurrent_acquire_spawns_once(fake_tool: FakeTool) {
    let pool = ProcessPool::new(fake_tool.settings());
    let identity = fake_tool.identity();

    let ids: Vec<u64> = thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| pool.acquire(&identity).expect("acquire").id()))
            .collect();
        workers
            .into_iter()
            .map(|worker| worker.join().expect("worker thread"))
            .collect()
    });

    assert!(ids.windows(2).all(|pair| pair.first() == pair.last()));
    let dispatcher = CommandDispatcher::new(pool);
    dispatcher
        .send(&identity, "ping", Grammar::Object)
        .expect("process answers");
    assert_eq!(fake_tool.spawn_count(), 1);
}

#[rstest]
fn pooled_command_returns_parsed_response(fake_tool: FakeTool) {
    let dispatcher = CommandDispatcher::new(ProcessPool::new(fake_tool.settings()));

    let response = dispatcher
        .send(&fake_tool.identity(), "sync status", Grammar::Object)
        .expect("sync status answers")
        .into_result()
        .expect("usable response")
        .into_one()
        .expect("one record");

    assert_eq!(response["synced_blocks"], 2500);
}

#[rstest]
fn responses_follow_their_commands(fake_tool: FakeTool) {
    let dispatcher = CommandDispatcher::new(ProcessPool::new(fake_tool.settings()));
    let identity = fake_tool.identity();

    for word in ["alpha", "beta", "gamma"] {
        let record = dispatcher
            .send(&identity, word, Grammar::Object)
            .expect("echo answers")
            .into_result()
            .expect("usable response")
            .into_one()
            .expect("one record");
        assert_eq!(record["echo"], word);
    }
}

#[rstest]
fn late_response_is_not_attributed_to_next_command(fake_tool: FakeTool) {
    let settings = fake_tool
        .settings()
        .with_command_timeout(Duration::from_millis(200))
        .with_stale_grace(Duration::from_secs(3));
    let dispatcher = CommandDispatcher::new(ProcessPool::new(settings));
    let identity = fake_tool.identity();

    let error = dispatcher
        .send(&identity, "slow", Grammar::Object)
        .expect_err("slow command times out");
    assert!(matches!(error, SessionError::CommandTimeout { .. }));

    let record = dispatcher
        .send(&identity, "after", Grammar::Object)
        .expect("handle still usable")
        .into_result()
        .expect("usable response")
        .into_one()
        .expect("one record");
    assert_eq!(record["echo"], "after");
}

#[rstest]
fn process_exit_fails_pending_command_and_heals_pool(fake_tool: FakeTool) {
    let pool = ProcessPool::new(fake_tool.settings());
    let dispatcher = CommandDispatcher::new(pool.clone());
    let identity = fake_tool.identity();
    let first = pool.acquire(&identity).expect("spawn").id();

    let error = dispatcher
        .send(&identity, "quit", Grammar::Object)
        .expect_err("process exits without answering");
    assert!(matches!(error, SessionError::ProcessExited { .. }));
    assert!(eventually(|| !pool.contains(&identity)));

    let second = pool.acquire(&identity).expect("respawn").id();
    assert_ne!(first, second);
}

#[rstest]
fn evict_then_acquire_spawns_a_new_process(fake_tool: FakeTool) {
    let pool = ProcessPool::new(fake_tool.settings());
    let identity = fake_tool.identity();
    let evicted = pool.acquire(&identity).expect("spawn");

    assert!(pool.evict(&identity));
    assert!(evicted.is_exited() || eventually(|| evicted.is_exited()));
    assert!(!pool.evict(&identity));

    let replacement = pool.acquire(&identity).expect("respawn");
    assert_ne!(evicted.id(), replacement.id());
}

#[rstest]
fn destroy_is_idempotent(fake_tool: FakeTool) {
    let pool = ProcessPool::new(fake_tool.settings());
    let handle = pool.acquire(&fake_tool.identity()).expect("spawn");

    handle.destroy();
    handle.destroy();

    assert!(eventually(|| handle.is_exited()));
    assert!(matches!(
        handle.write_line("ping"),
        Err(SessionError::ProcessExited { .. })
    ));
}

#[rstest]
fn missing_tool_is_reported_before_spawning(fake_tool: FakeTool) {
    let settings = SessionSettings::new(fake_tool.data_dir().join("absent"));
    let pool = ProcessPool::new(settings);

    let error = pool
        .acquire(&fake_tool.identity())
        .expect_err("tool is missing");

    assert!(matches!(error, SessionError::ToolNotFound { .. }));
    assert!(pool.is_empty());
}

#[rstest]
fn one_shot_parses_entire_output(fake_tool: FakeTool) {
    let runner = ProcessOneShot::new(fake_tool.settings());

    let record = runner
        .run(&fake_tool.identity(), &ToolCommand::new("balance"), Grammar::KeyValue)
        .expect("balance runs")
        .into_result()
        .expect("usable response")
        .into_one()
        .expect("one record");

    assert_eq!(record["confirmed_orchard_balance"], 190_000);
    assert_eq!(record["confirmed_sapling_balance"], 5_000);
}

#[rstest]
fn one_shot_timeout_kills_the_tool(fake_tool: FakeTool) {
    let settings = fake_tool
        .settings()
        .with_one_shot_timeout(Duration::from_millis(200));
    let runner = ProcessOneShot::new(settings);

    let error = runner
        .run(&fake_tool.identity(), &ToolCommand::new("hang"), Grammar::Object)
        .expect_err("hang times out");

    assert!(matches!(error, SessionError::OneShotTimeout { .. }));
}
