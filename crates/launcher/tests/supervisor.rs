#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use libadmin_kernel::settings::LauncherSettings;
use libadmin_launcher::{run_api, run_dev, supervise, ChildSpec, Outcome};

const GRACE: Duration = Duration::from_secs(5);

fn sh(name: &str, script: &str) -> ChildSpec {
    ChildSpec::new(name, "sh").args(["-c", script])
}

/// Executable shell script that ignores its arguments
fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn first_exit_decides_and_stops_siblings() {
    let started = Instant::now();
    let outcome = supervise(
        vec![sh("slow", "sleep 30"), sh("fast", "exit 3")],
        std::future::pending(),
        GRACE,
    )
    .await;

    assert_eq!(
        outcome,
        Outcome::Exited {
            name: "fast".to_string(),
            code: Some(3),
            signal: None
        }
    );
    assert_eq!(outcome.exit_code(), 3);
    assert!(started.elapsed() < Duration::from_secs(20));
}

#[tokio::test]
async fn stopped_sibling_runs_its_term_handler() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("cleaned");
    let backend = sh(
        "backend",
        &format!(
            "trap 'echo cleaned > \"{}\"; exit 0' TERM; sleep 30 & wait",
            marker.display()
        ),
    );

    let outcome = supervise(
        vec![backend, sh("frontend", "sleep 0.5; exit 0")],
        std::future::pending(),
        GRACE,
    )
    .await;

    assert_eq!(
        outcome,
        Outcome::Exited {
            name: "frontend".to_string(),
            code: Some(0),
            signal: None
        }
    );
    assert_eq!(fs::read_to_string(&marker).unwrap().trim(), "cleaned");
}

#[tokio::test]
async fn sibling_ignoring_term_is_killed_after_grace() {
    let started = Instant::now();
    let outcome = supervise(
        vec![
            sh("stubborn", "trap '' TERM; sleep 30 & wait"),
            sh("frontend", "sleep 0.5; exit 2"),
        ],
        std::future::pending(),
        Duration::from_millis(300),
    )
    .await;

    assert_eq!(outcome.exit_code(), 2);
    assert!(started.elapsed() < Duration::from_secs(20));
}

#[tokio::test]
async fn spawn_failure_stops_started_children() {
    let started = Instant::now();
    let outcome = supervise(
        vec![
            sh("backend", "sleep 30"),
            ChildSpec::new("frontend", "libadmin-no-such-program"),
        ],
        std::future::pending(),
        GRACE,
    )
    .await;

    assert_eq!(
        outcome,
        Outcome::SpawnFailed {
            name: "frontend".to_string()
        }
    );
    assert_eq!(outcome.exit_code(), 1);
    assert!(started.elapsed() < Duration::from_secs(20));
}

#[tokio::test]
async fn shutdown_interrupts_with_success() {
    let outcome = supervise(
        vec![sh("backend", "sleep 30"), sh("frontend", "sleep 30")],
        tokio::time::sleep(Duration::from_millis(200)),
        GRACE,
    )
    .await;

    assert_eq!(outcome, Outcome::Interrupted);
    assert_eq!(outcome.exit_code(), 0);
}

#[tokio::test]
async fn shutdown_wins_over_a_simultaneous_exit() {
    let outcome = supervise(vec![sh("backend", "exit 130")], async {}, GRACE).await;
    assert_eq!(outcome, Outcome::Interrupted);
}

#[tokio::test]
async fn signalled_child_maps_to_shell_code() {
    let outcome = supervise(
        vec![sh("api", "kill -9 $$")],
        std::future::pending(),
        GRACE,
    )
    .await;

    assert_eq!(
        outcome,
        Outcome::Exited {
            name: "api".to_string(),
            code: None,
            signal: Some(9)
        }
    );
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(outcome.forwarded_exit_code(), 137);
}

#[tokio::test]
async fn api_propagates_build_tool_status() {
    let settings = LauncherSettings {
        build_tool: "sh".to_string(),
        ..LauncherSettings::default()
    };

    let args = vec!["-c".to_string(), "exit 7".to_string()];
    assert_eq!(run_api(&settings, &args, std::future::pending()).await, 7);
    assert_eq!(run_api(&settings, &[], std::future::pending()).await, 1);

    let missing = LauncherSettings {
        build_tool: "libadmin-no-such-tool".to_string(),
        ..LauncherSettings::default()
    };
    let args = vec!["build".to_string()];
    assert_eq!(run_api(&missing, &args, std::future::pending()).await, 1);
}

#[tokio::test]
async fn api_passes_shutdown_to_build_tool() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("stopped");
    let settings = LauncherSettings {
        build_tool: "sh".to_string(),
        ..LauncherSettings::default()
    };
    let args = vec![
        "-c".to_string(),
        format!(
            "trap 'echo stopped > \"{}\"; exit 0' TERM; sleep 30 & wait",
            marker.display()
        ),
    ];

    let code = run_api(&settings, &args, tokio::time::sleep(Duration::from_millis(300))).await;

    assert_eq!(code, 0);
    assert_eq!(fs::read_to_string(&marker).unwrap().trim(), "stopped");
}

#[tokio::test]
async fn dev_returns_code_of_first_exit() {
    let dir = tempfile::tempdir().unwrap();
    let backend = script(dir.path(), "backend", "exit 5");
    let frontend = script(dir.path(), "frontend", "exec sleep 30");
    let settings = LauncherSettings {
        web_tool: frontend.display().to_string(),
        ..LauncherSettings::default()
    };

    let started = Instant::now();
    let code = run_dev(&settings, &backend, std::future::pending()).await;

    assert_eq!(code, 5);
    assert!(started.elapsed() < Duration::from_secs(20));
}

#[tokio::test]
async fn dev_shutdown_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let backend = script(dir.path(), "backend", "exec sleep 30");
    let frontend = script(dir.path(), "frontend", "exec sleep 30");
    let settings = LauncherSettings {
        web_tool: frontend.display().to_string(),
        ..LauncherSettings::default()
    };

    let code = run_dev(
        &settings,
        &backend,
        tokio::time::sleep(Duration::from_millis(300)),
    )
    .await;

    assert_eq!(code, 0);
}
