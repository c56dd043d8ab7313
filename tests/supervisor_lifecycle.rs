// tests/supervisor_lifecycle.rs

mod common;
use crate::common::{FakeLauncher, init_tracing};

use std::error::Error;
use std::path::{Path, PathBuf};

use devloop::exec::{Supervisor, SupervisorState, artifact_path};

type TestResult = Result<(), Box<dyn Error>>;

fn supervisor(launcher: &FakeLauncher) -> Supervisor<FakeLauncher> {
    Supervisor::new(launcher.clone(), "/src/weather/weather", vec![])
}

#[test]
fn restart_from_not_running_registers_a_process() {
    init_tracing();
    let launcher = FakeLauncher::new();
    let mut sup = supervisor(&launcher);
    assert_eq!(sup.state(), SupervisorState::NotRunning);

    let started = sup.restart().map(|p| p.generation());

    assert_eq!(started, Some(1));
    assert_eq!(sup.state(), SupervisorState::Running);
    let log = launcher.log.lock().unwrap();
    assert_eq!(log.launched, vec![1]);
    assert!(log.terminated.is_empty());
    assert_eq!(log.artifacts, vec![PathBuf::from("/src/weather/weather")]);
}

#[test]
fn restart_while_running_signals_previous_exactly_once() {
    init_tracing();
    let launcher = FakeLauncher::new();
    let mut sup = supervisor(&launcher);

    sup.restart();
    sup.restart();

    assert_eq!(sup.current().map(|p| p.generation()), Some(2));
    let log = launcher.log.lock().unwrap();
    assert_eq!(log.launched, vec![1, 2]);
    assert_eq!(log.terminated, vec![1]);
    assert_eq!(log.alive(), vec![2]);
}

#[test]
fn rapid_restarts_kill_and_relaunch_each_time() {
    let launcher = FakeLauncher::new();
    let mut sup = supervisor(&launcher);

    for _ in 0..5 {
        sup.restart();
    }

    let log = launcher.log.lock().unwrap();
    assert_eq!(log.launched, vec![1, 2, 3, 4, 5]);
    assert_eq!(log.terminated, vec![1, 2, 3, 4]);
    assert_eq!(log.alive(), vec![5]);
}

#[test]
fn missing_artifact_leaves_supervisor_not_running() {
    init_tracing();
    let launcher = FakeLauncher::new();
    launcher.set_artifact_present(false);
    let mut sup = supervisor(&launcher);

    assert!(sup.restart().is_none());
    assert_eq!(sup.state(), SupervisorState::NotRunning);
    assert!(launcher.log.lock().unwrap().launched.is_empty());
}

#[test]
fn failed_relaunch_still_terminates_the_old_process() {
    let launcher = FakeLauncher::new();
    let mut sup = supervisor(&launcher);
    sup.restart();

    launcher.set_artifact_present(false);
    assert!(sup.restart().is_none());

    assert_eq!(sup.state(), SupervisorState::NotRunning);
    assert_eq!(launcher.log.lock().unwrap().terminated, vec![1]);

    // The next successful build gets another go.
    launcher.set_artifact_present(true);
    assert_eq!(sup.restart().map(|p| p.generation()), Some(3));
}

#[test]
fn exit_of_current_generation_marks_not_running() {
    let launcher = FakeLauncher::new();
    let mut sup = supervisor(&launcher);
    sup.restart();

    assert!(sup.handle_exit(1, Some(1)));
    assert_eq!(sup.state(), SupervisorState::NotRunning);

    // No automatic relaunch.
    assert_eq!(launcher.log.lock().unwrap().launched, vec![1]);
}

#[test]
fn exit_of_replaced_generation_is_ignored() {
    let launcher = FakeLauncher::new();
    let mut sup = supervisor(&launcher);
    sup.restart();
    sup.restart();

    assert!(!sup.handle_exit(1, None));
    assert_eq!(sup.state(), SupervisorState::Running);
    assert_eq!(sup.current().map(|p| p.generation()), Some(2));
}

#[test]
fn terminate_without_process_is_a_no_op() {
    let launcher = FakeLauncher::new();
    let mut sup = supervisor(&launcher);

    sup.terminate();

    assert_eq!(sup.state(), SupervisorState::NotRunning);
    assert!(launcher.log.lock().unwrap().terminated.is_empty());
}

#[test]
fn artifact_is_named_after_project_root() -> TestResult {
    let path = artifact_path(Path::new("/home/dev/weather-api"), None)?;

    if cfg!(windows) {
        assert_eq!(path, PathBuf::from("/home/dev/weather-api/weather-api.exe"));
    } else {
        assert_eq!(path, PathBuf::from("/home/dev/weather-api/weather-api"));
    }
    Ok(())
}

#[test]
fn artifact_override_is_resolved_against_root() -> TestResult {
    let root = Path::new("/home/dev/weather-api");
    assert_eq!(
        artifact_path(root, Some("bin/server"))?,
        PathBuf::from("/home/dev/weather-api/bin/server")
    );
    Ok(())
}

#[test]
fn root_without_a_name_is_rejected() {
    assert!(artifact_path(Path::new("/"), None).is_err());
}

#[cfg(unix)]
mod real_processes {
    use super::*;

    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio::time::timeout;

    use devloop::engine::LoopEvent;
    use devloop::exec::{Launcher, ProcessLauncher};

    /// Make the artifact a link to `/bin/sh` and return args running `script`.
    fn shell_artifact(path: &Path, script: &str) -> std::io::Result<Vec<String>> {
        std::os::unix::fs::symlink("/bin/sh", path)?;
        Ok(vec!["-c".to_string(), script.to_string()])
    }

    #[tokio::test]
    async fn restart_terminates_the_running_child() -> TestResult {
        init_tracing();
        let dir = tempfile::tempdir()?;
        let root = dir.path().canonicalize()?;
        let artifact = artifact_path(&root, None)?;
        let args = shell_artifact(&artifact, "exec sleep 30")?;

        let (tx, mut rx) = mpsc::channel::<LoopEvent>(8);
        let mut sup = Supervisor::new(ProcessLauncher::new(&root, tx), artifact, args);

        assert!(sup.restart().and_then(|p| p.id()).is_some());
        assert!(sup.restart().is_some());
        assert_eq!(sup.current().map(|p| p.generation()), Some(2));

        let event = timeout(Duration::from_secs(5), rx.recv()).await?;
        match event {
            Some(LoopEvent::ProcessExited { generation, .. }) => assert_eq!(generation, 1),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(!sup.handle_exit(1, None));
        assert_eq!(sup.state(), SupervisorState::Running);

        sup.terminate();
        let event = timeout(Duration::from_secs(5), rx.recv()).await?;
        assert!(matches!(
            event,
            Some(LoopEvent::ProcessExited { generation: 2, .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn child_exiting_on_its_own_is_reported() -> TestResult {
        init_tracing();
        let dir = tempfile::tempdir()?;
        let root = dir.path().canonicalize()?;
        let artifact = artifact_path(&root, None)?;
        let args = shell_artifact(
            &artifact,
            "echo 'listen tcp :8000: address already in use' >&2; exit 1",
        )?;

        let (tx, mut rx) = mpsc::channel::<LoopEvent>(8);
        let mut sup = Supervisor::new(ProcessLauncher::new(&root, tx), artifact, args);
        sup.restart();

        let event = timeout(Duration::from_secs(5), rx.recv()).await?;
        assert_eq!(
            event,
            Some(LoopEvent::ProcessExited {
                generation: 1,
                code: Some(1)
            })
        );
        assert!(sup.handle_exit(1, Some(1)));
        assert_eq!(sup.state(), SupervisorState::NotRunning);
        Ok(())
    }

    #[tokio::test]
    async fn missing_binary_is_not_registered() -> TestResult {
        init_tracing();
        let dir = tempfile::tempdir()?;
        let root = dir.path().canonicalize()?;
        let artifact = artifact_path(&root, None)?;

        let (tx, _rx) = mpsc::channel::<LoopEvent>(8);
        let mut sup = Supervisor::new(ProcessLauncher::new(&root, tx), artifact, vec![]);

        assert!(sup.restart().is_none());
        assert_eq!(sup.state(), SupervisorState::NotRunning);
        Ok(())
    }

    #[tokio::test]
    async fn reaped_child_has_no_pid_and_is_not_signalled() -> TestResult {
        init_tracing();
        let dir = tempfile::tempdir()?;
        let root = dir.path().canonicalize()?;
        let artifact = artifact_path(&root, None)?;
        let args = shell_artifact(&artifact, "exit 0")?;

        let (tx, mut rx) = mpsc::channel::<LoopEvent>(8);
        let mut launcher = ProcessLauncher::new(&root, tx);
        let mut handle = launcher.launch(&artifact, &args, 1)?;
        assert!(handle.id().is_some());

        let event = timeout(Duration::from_secs(5), rx.recv()).await?;
        assert_eq!(
            event,
            Some(LoopEvent::ProcessExited {
                generation: 1,
                code: Some(0)
            })
        );

        // The pid may already belong to someone else.
        assert_eq!(handle.id(), None);
        handle.terminate()?;
        handle.terminate()?;
        assert!(rx.try_recv().is_err());
        Ok(())
    }
}
