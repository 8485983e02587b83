mod support;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use brewvisor::{
    Brew, BrewConfig, ErrorKind, Event, EventKind, Operation, OperationKind, Script,
    ScriptedLauncher,
};
use tokio::sync::broadcast;

use support::{Call, Recorder, eventually, within};

fn engine(cfg: BrewConfig, launcher: &Arc<ScriptedLauncher>) -> Brew {
    Brew::builder(cfg)
        .with_launcher_ref(launcher.clone())
        .build()
        .unwrap()
}

fn serial() -> BrewConfig {
    BrewConfig {
        concurrent: false,
        ..BrewConfig::default()
    }
}

/// Collects events for `entry` until its terminal event arrives.
async fn events_of(rx: &mut broadcast::Receiver<Event>, entry: u64) -> Vec<EventKind> {
    within(async {
        let mut kinds = Vec::new();
        loop {
            let ev = rx.recv().await.unwrap();
            if ev.entry != Some(entry) {
                continue;
            }
            kinds.push(ev.kind);
            if ev.kind.is_terminal() {
                return kinds;
            }
        }
    })
    .await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn install_streams_each_line_then_finishes() {
    let launcher = Arc::new(ScriptedLauncher::new().push(
        Script::exit(0)
            .with_lines(["Downloading...", "Installed"])
            .with_delay(Duration::from_millis(20)),
    ));
    let brew = engine(serial(), &launcher);
    let rec = Recorder::new();

    brew.submit(Operation::install("wget").into_ref(), rec.clone());
    assert_eq!(brew.pending_count(), 1);

    let calls = rec.done().await;
    assert_eq!(
        calls,
        vec![
            Call::Output("Downloading...".into()),
            Call::Output("Installed".into()),
            Call::Finished,
        ]
    );
    assert_eq!(brew.pending_count(), 0);
    assert_eq!(launcher.invocations()[0].command_line(), "install wget");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn failed_search_delivers_no_output() {
    let launcher =
        Arc::new(ScriptedLauncher::new().push(Script::exit(1).with_lines(["Error: no formula"])));
    let brew = engine(BrewConfig::default(), &launcher);
    let rec = Recorder::new();

    brew.submit(Operation::search(Some("wget")).into_ref(), rec.clone());

    assert_eq!(rec.done().await, vec![Call::Failed(ErrorKind::Unknown)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn successful_batch_output_arrives_once_before_finish() {
    let launcher =
        Arc::new(ScriptedLauncher::new().push(Script::exit(0).with_lines(["wget", "curl", "git"])));
    let brew = engine(BrewConfig::default(), &launcher);
    let rec = Recorder::new();

    brew.submit(Operation::list().into_ref(), rec.clone());

    assert_eq!(
        rec.done().await,
        vec![Call::Output("wget\ncurl\ngit\n".into()), Call::Finished]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn silent_batch_operation_gets_only_the_terminal_call() {
    let launcher = Arc::new(ScriptedLauncher::new());
    let brew = engine(BrewConfig::default(), &launcher);
    let rec = Recorder::new();

    brew.submit(Operation::update().into_ref(), rec.clone());

    assert_eq!(rec.done().await, vec![Call::Finished]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn streaming_relays_every_line_before_the_terminal_call() {
    let lines: Vec<String> = (0..25).map(|i| format!("==> step {i}")).collect();
    let launcher = Arc::new(ScriptedLauncher::new().push(Script::exit(0).with_lines(lines.clone())));
    let brew = engine(BrewConfig::default(), &launcher);
    let rec = Recorder::new();

    brew.submit(Operation::install("git").into_ref(), rec.clone());

    let calls = rec.done().await;
    let mut expected: Vec<Call> = lines.into_iter().map(Call::Output).collect();
    expected.push(Call::Finished);
    assert_eq!(calls, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn relay_policy_can_be_overridden() {
    let launcher = Arc::new(ScriptedLauncher::new().push(Script::exit(0).with_lines(["a", "b"])));
    let brew = engine(BrewConfig::default(), &launcher);
    let rec = Recorder::new();

    let op = Operation::custom("outdated", ["--verbose"]).with_relay(brewvisor::RelayPolicy::Streaming);
    brew.submit(op.into_ref(), rec.clone());

    assert_eq!(
        rec.done().await,
        vec![Call::Output("a".into()), Call::Output("b".into()), Call::Finished]
    );
    assert_eq!(launcher.invocations()[0].command_line(), "outdated --verbose");
}

#[tokio::test]
async fn cancel_right_after_submit_never_launches() {
    // Single-threaded runtime: the runner task cannot start before we yield.
    let launcher = Arc::new(ScriptedLauncher::new());
    let brew = engine(BrewConfig::default(), &launcher);
    let mut rx = brew.subscribe();
    let rec = Recorder::new();

    let op = Operation::install("wget").into_ref();
    let id = brew.submit(op.clone(), rec.clone());
    assert_eq!(brew.cancel(&op), 1);

    assert_eq!(rec.done().await, vec![Call::Failed(ErrorKind::OperationCancelled)]);
    assert_eq!(launcher.launches(), 0);

    let kinds = events_of(&mut rx, id).await;
    assert!(!kinds.contains(&EventKind::OperationStarted));
    assert_eq!(kinds.last(), Some(&EventKind::OperationCancelled));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelling_a_pending_entry_never_spawns_it() {
    let launcher = Arc::new(ScriptedLauncher::new().push(Script::hang()));
    let brew = engine(serial(), &launcher);
    let first = Recorder::new();
    let second = Recorder::new();

    brew.submit(Operation::update().into_ref(), first.clone());
    let pending = Operation::install("wget").into_ref();
    brew.submit(pending.clone(), second.clone());
    eventually(|| launcher.launches() == 1).await;

    assert_eq!(brew.cancel(&pending), 1);
    assert_eq!(second.done().await, vec![Call::Failed(ErrorKind::OperationCancelled)]);
    assert_eq!(brew.pending_count(), 1);

    brew.cancel_all();
    assert_eq!(first.done().await, vec![Call::Failed(ErrorKind::OperationCancelled)]);
    assert_eq!(launcher.launches(), 1);
    assert_eq!(launcher.invocations().len(), 1);
    assert_eq!(brew.pending_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelling_a_running_entry_terminates_its_process() {
    let launcher = Arc::new(
        ScriptedLauncher::new().push(Script::hang().with_lines(["==> Fetching"])),
    );
    let brew = engine(BrewConfig::default(), &launcher);
    let mut rx = brew.subscribe();
    let rec = Recorder::new();

    let op = Operation::install("ffmpeg").into_ref();
    let id = brew.submit(op.clone(), rec.clone());
    eventually(|| rec.calls().len() == 1).await;
    assert_eq!(brew.running_count(), 1);

    assert_eq!(brew.cancel(&op), 1);
    assert_eq!(
        rec.done().await,
        vec![
            Call::Output("==> Fetching".into()),
            Call::Failed(ErrorKind::OperationCancelled),
        ]
    );
    assert_eq!(launcher.alive(), 0);

    let kinds = events_of(&mut rx, id).await;
    let terminals = kinds.iter().filter(|k| k.is_terminal()).count();
    assert_eq!(terminals, 1);
    assert!(kinds.contains(&EventKind::CancelRequested));
    assert_eq!(kinds.last(), Some(&EventKind::OperationCancelled));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn repeated_cancel_delivers_one_failure() {
    let launcher = Arc::new(ScriptedLauncher::new().push(Script::hang()));
    let brew = engine(BrewConfig::default(), &launcher);
    let rec = Recorder::new();

    let op = Operation::update().into_ref();
    brew.submit(op.clone(), rec.clone());
    eventually(|| launcher.launches() == 1).await;

    brew.cancel(&op);
    brew.cancel(&op);
    brew.cancel_all();
    rec.done().await;
    eventually(|| brew.pending_count() == 0).await;

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(rec.calls(), vec![Call::Failed(ErrorKind::OperationCancelled)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelling_nothing_is_a_no_op() {
    let launcher = Arc::new(ScriptedLauncher::new());
    let brew = engine(BrewConfig::default(), &launcher);

    assert_eq!(brew.cancel(&Operation::install("wget")), 0);
    assert_eq!(brew.cancel_all(), 0);
    assert_eq!(brew.cancel_all_of_kind(&OperationKind::Search), 0);
    assert!(!brew.cancel_entry(42));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn serial_mode_runs_one_at_a_time_in_order() {
    let launcher = Arc::new(
        ScriptedLauncher::new()
            .with_default(Script::exit(0).with_lines(["ok"]).with_delay(Duration::from_millis(10))),
    );
    let brew = engine(serial(), &launcher);

    let recorders: Vec<_> = ["a", "b", "c", "d"]
        .into_iter()
        .map(|name| {
            let rec = Recorder::new();
            brew.submit(Operation::install(name).into_ref(), rec.clone());
            rec
        })
        .collect();
    assert_eq!(brew.pending_count(), 4);

    for rec in &recorders {
        assert_eq!(rec.done().await.last(), Some(&Call::Finished));
    }
    assert_eq!(launcher.peak_alive(), 1);

    let order: Vec<String> = launcher
        .invocations()
        .iter()
        .map(|inv| inv.command_line())
        .collect();
    assert_eq!(order, ["install a", "install b", "install c", "install d"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mode_respects_the_bound() {
    let launcher = Arc::new(
        ScriptedLauncher::new().with_default(
            Script::exit(0)
                .with_lines(["x", "y"])
                .with_delay(Duration::from_millis(15)),
        ),
    );
    let cfg = BrewConfig {
        max_concurrent: 2,
        ..BrewConfig::default()
    };
    let brew = engine(cfg, &launcher);

    let recorders: Vec<_> = (0..6)
        .map(|i| {
            let rec = Recorder::new();
            brew.submit(Operation::options(format!("f{i}")).into_ref(), rec.clone());
            rec
        })
        .collect();
    assert!(brew.running_count() <= 2);

    for rec in &recorders {
        assert_eq!(rec.done().await.last(), Some(&Call::Finished));
    }
    assert_eq!(launcher.launches(), 6);
    assert_eq!(launcher.peak_alive(), 2);
    eventually(|| brew.pending_count() == 0).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_all_of_kind_spares_other_kinds() {
    let launcher = Arc::new(ScriptedLauncher::new().push(Script::hang()));
    let brew = engine(serial(), &launcher);
    let running = Recorder::new();
    let listed = Recorder::new();
    let pending = Recorder::new();

    brew.submit(Operation::install("a").into_ref(), running.clone());
    brew.submit(Operation::list().into_ref(), listed.clone());
    brew.submit(Operation::install("b").into_ref(), pending.clone());
    eventually(|| launcher.launches() == 1).await;

    assert_eq!(brew.cancel_all_of_kind(&OperationKind::Install), 2);

    assert_eq!(pending.done().await, vec![Call::Failed(ErrorKind::OperationCancelled)]);
    assert_eq!(running.done().await, vec![Call::Failed(ErrorKind::OperationCancelled)]);
    assert_eq!(listed.done().await, vec![Call::Finished]);
    assert_eq!(launcher.launches(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_matches_equivalent_operations_not_identity() {
    let launcher = Arc::new(ScriptedLauncher::new().with_default(Script::hang()));
    let brew = engine(serial(), &launcher);
    let a = Recorder::new();
    let b = Recorder::new();
    let other = Recorder::new();

    brew.submit(Operation::uninstall("wget").into_ref(), a.clone());
    brew.submit(Operation::uninstall("wget").into_ref(), b.clone());
    brew.submit(Operation::uninstall("curl").into_ref(), other.clone());
    eventually(|| launcher.launches() == 1).await;

    assert_eq!(brew.cancel(&Operation::uninstall("wget")), 2);
    assert_eq!(a.done().await, vec![Call::Failed(ErrorKind::OperationCancelled)]);
    assert_eq!(b.done().await, vec![Call::Failed(ErrorKind::OperationCancelled)]);

    eventually(|| launcher.launches() == 2).await;
    assert_eq!(brew.pending_count(), 1);
    brew.cancel_all();
    assert_eq!(other.done().await, vec![Call::Failed(ErrorKind::OperationCancelled)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_entry_targets_one_submission() {
    let launcher = Arc::new(ScriptedLauncher::new().with_default(Script::hang()));
    let brew = engine(serial(), &launcher);
    let first = Recorder::new();
    let second = Recorder::new();

    let op = Operation::update().into_ref();
    brew.submit(op.clone(), first.clone());
    let id = brew.submit(op.clone(), second.clone());

    assert!(brew.cancel_entry(id));
    assert_eq!(second.done().await, vec![Call::Failed(ErrorKind::OperationCancelled)]);
    assert!(first.calls().is_empty());

    brew.cancel_all();
    first.done().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn mode_switch_only_affects_later_submissions() {
    let launcher = Arc::new(ScriptedLauncher::new().push(Script::hang()));
    let brew = engine(serial(), &launcher);
    brew.set_brew_path(Some(Path::new("/opt/a/brew"))).unwrap();

    let first = Recorder::new();
    let second = Recorder::new();
    let third = Recorder::new();
    let blocker = Operation::update().into_ref();
    brew.submit(blocker.clone(), first.clone());
    brew.submit(Operation::list().into_ref(), second.clone());

    brew.set_concurrent_operations(true);
    brew.set_brew_path(Some(Path::new("/opt/b/brew"))).unwrap();
    brew.submit(Operation::search(None).into_ref(), third.clone());

    // The serial entry behind the running one blocks everything after it.
    eventually(|| launcher.launches() == 1).await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(brew.running_count(), 1);
    assert_eq!(launcher.launches(), 1);

    brew.cancel(&blocker);
    assert_eq!(second.done().await, vec![Call::Finished]);
    assert_eq!(third.done().await, vec![Call::Finished]);

    let programs: Vec<PathBuf> = launcher.invocations().into_iter().map(|i| i.program).collect();
    assert_eq!(
        programs,
        [
            PathBuf::from("/opt/a/brew"),
            PathBuf::from("/opt/a/brew"),
            PathBuf::from("/opt/b/brew"),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn environment_override_is_snapshotted() {
    let launcher = Arc::new(ScriptedLauncher::new());
    let brew = engine(BrewConfig::default(), &launcher);

    let env = HashMap::from([("HOMEBREW_NO_AUTO_UPDATE".to_string(), "1".to_string())]);
    brew.set_environment(Some(env.clone()));
    assert_eq!(brew.environment(), env);

    let rec = Recorder::new();
    brew.submit(Operation::list().into_ref(), rec.clone());
    brew.set_environment(None);
    rec.done().await;

    assert_eq!(launcher.invocations()[0].environment.as_ref(), Some(&env));
    assert_eq!(brew.environment(), std::env::vars().collect::<HashMap<_, _>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn configuration_accessors() {
    let launcher = Arc::new(ScriptedLauncher::new());
    let brew = engine(BrewConfig::default(), &launcher);

    assert_eq!(brew.brew_path(), PathBuf::from(brewvisor::DEFAULT_BREW_PATH));
    assert!(brew.concurrent_operations());

    brew.set_max_concurrent(0);
    assert_eq!(brew.max_concurrent(), 1);
    brew.set_concurrent_operations(false);
    assert!(!brew.concurrent_operations());

    assert!(brew.set_brew_path(Some(Path::new(""))).is_err());
    brew.set_brew_path(Some(Path::new("/opt/homebrew/bin/brew"))).unwrap();
    assert_eq!(brew.config().brew_path, PathBuf::from("/opt/homebrew/bin/brew"));
    brew.set_brew_path(None).unwrap();
    assert_eq!(brew.brew_path(), PathBuf::from(brewvisor::DEFAULT_BREW_PATH));

    assert_eq!(brew.terminate_grace(), brewvisor::DEFAULT_TERMINATE_GRACE);
    brew.set_terminate_grace(Duration::from_millis(250));
    let rec = Recorder::new();
    brew.submit(Operation::list().into_ref(), rec.clone());
    rec.done().await;
    assert_eq!(launcher.invocations()[0].terminate_grace, Duration::from_millis(250));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn launch_failure_is_an_unknown_failure() {
    let launcher = Arc::new(ScriptedLauncher::new().push(Script::fail_to_launch("No such file")));
    let brew = engine(BrewConfig::default(), &launcher);
    let mut rx = brew.subscribe();
    let rec = Recorder::new();

    let id = brew.submit(Operation::install("wget").into_ref(), rec.clone());

    assert_eq!(rec.done().await, vec![Call::Failed(ErrorKind::Unknown)]);
    let kinds = events_of(&mut rx, id).await;
    assert_eq!(
        kinds,
        [
            EventKind::OperationQueued,
            EventKind::OperationStarted,
            EventKind::LaunchFailed,
            EventKind::OperationFailed,
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn busy_while_any_submission_is_live() {
    let launcher = Arc::new(
        ScriptedLauncher::new().with_default(Script::exit(0).with_delay(Duration::from_millis(20))),
    );
    let brew = engine(serial(), &launcher);
    let op = Operation::install("wget").into_ref();
    assert!(!op.is_busy());

    let first = Recorder::new();
    let second = Recorder::new();
    brew.submit(op.clone(), first.clone());
    brew.submit(op.clone(), second.clone());
    assert!(op.is_busy());

    first.done().await;
    assert!(op.is_busy());
    second.done().await;
    assert!(!op.is_busy());
    assert_eq!(launcher.launches(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pending_count_drains_to_zero() {
    let launcher = Arc::new(
        ScriptedLauncher::new()
            .push(Script::exit(1))
            .push(Script::fail_to_launch("gone"))
            .with_default(Script::exit(0).with_lines(["done"])),
    );
    let brew = engine(BrewConfig::default(), &launcher);

    let recorders: Vec<_> = (0..8)
        .map(|i| {
            let rec = Recorder::new();
            brew.submit(Operation::install(format!("pkg{i}")).into_ref(), rec.clone());
            rec
        })
        .collect();
    brew.cancel(&Operation::install("pkg7"));

    for rec in &recorders {
        let calls = rec.done().await;
        assert_eq!(calls.iter().filter(|c| c.is_terminal()).count(), 1);
    }
    assert_eq!(brew.pending_count(), 0);
    assert_eq!(brew.running_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dropping_the_engine_cancels_live_work() {
    let launcher = Arc::new(ScriptedLauncher::new().with_default(Script::hang()));
    let brew = engine(serial(), &launcher);
    let running = Recorder::new();
    let queued = Recorder::new();

    brew.submit(Operation::update().into_ref(), running.clone());
    brew.submit(Operation::list().into_ref(), queued.clone());
    eventually(|| launcher.launches() == 1).await;

    drop(brew);
    assert_eq!(running.done().await, vec![Call::Failed(ErrorKind::OperationCancelled)]);
    assert_eq!(queued.done().await, vec![Call::Failed(ErrorKind::OperationCancelled)]);
    eventually(|| launcher.alive() == 0).await;
    assert_eq!(launcher.launches(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submit_from_a_plain_thread() {
    let launcher = Arc::new(ScriptedLauncher::new().push(Script::exit(0).with_lines(["hi"])));
    let brew = Arc::new(engine(BrewConfig::default(), &launcher));
    let rec = Recorder::new();

    let handle = {
        let (brew, rec) = (brew.clone(), rec.clone());
        std::thread::spawn(move || brew.submit(Operation::install("hi").into_ref(), rec))
    };
    handle.join().unwrap();

    assert_eq!(rec.done().await, vec![Call::Output("hi".into()), Call::Finished]);
}
