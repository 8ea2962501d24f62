use std::net::TcpListener;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// URL of a local port nothing is listening on.
fn unreachable_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

struct Sandbox {
    home: TempDir,
    server: String,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
            server: unreachable_server(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("rollcall").unwrap();
        cmd.env("HOME", self.home.path())
            .env("ROLLCALL_SERVER", &self.server)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.cmd().args(args).args(["-o", "json"]).output().unwrap();
        assert!(
            output.status.success(),
            "{args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn add(&self, name: &str) -> serde_json::Value {
        self.json(&["student", "add", "--name", name, "--birth-date", "2012-03-14"])
    }
}

#[test]
fn help_lists_command_groups() {
    Command::cargo_bin("rollcall")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("student"))
        .stdout(predicate::str::contains("queue"));
}

#[test]
fn health_reports_unreachable_service() {
    let sandbox = Sandbox::new();
    let payload = sandbox.json(&["health"]);
    assert_eq!(payload["available"], false);
}

#[test]
fn offline_add_is_queued_and_survives_restart() {
    let sandbox = Sandbox::new();

    let payload = sandbox.add("Ana Silva");
    assert_eq!(payload["submission"]["result"], "queued");
    assert_eq!(payload["badge"]["pending"], 1);

    sandbox.add("Bruno Santos");

    let queue = sandbox.json(&["queue", "list"]);
    assert_eq!(queue["count"], 2);
    assert_eq!(queue["items"][0]["operation"]["name"], "Ana Silva");
    assert_eq!(queue["items"][1]["operation"]["name"], "Bruno Santos");

    let status = sandbox.json(&["queue", "status"]);
    assert_eq!(status["pending"], 2);
    assert_eq!(status["available"], false);
}

#[test]
fn offline_delete_by_id_is_queued() {
    let sandbox = Sandbox::new();

    let payload = sandbox.json(&["student", "delete", "5"]);
    assert_eq!(payload["submission"]["result"], "queued");

    let queue = sandbox.json(&["queue", "list"]);
    assert_eq!(queue["items"][0]["operation"]["type"], "delete_student");
    assert_eq!(queue["items"][0]["operation"]["id"], 5);
}

#[test]
fn pending_student_can_be_deleted_locally() {
    let sandbox = Sandbox::new();
    sandbox.add("Ana Silva");

    let payload = sandbox.json(&["student", "delete", "--pending", "1"]);
    assert_eq!(payload["submission"]["result"], "discarded");
    assert_eq!(payload["badge"]["pending"], 0);
}

#[test]
fn queue_remove_and_discard() {
    let sandbox = Sandbox::new();
    sandbox.add("Ana Silva");
    sandbox.add("Bruno Santos");

    sandbox.json(&["queue", "remove", "1"]);
    sandbox.json(&["queue", "discard", "bruno santos"]);

    let queue = sandbox.json(&["queue", "list"]);
    assert_eq!(queue["count"], 0);
}

#[test]
fn queue_remove_out_of_range_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["queue", "remove", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn queue_run_offline_keeps_everything() {
    let sandbox = Sandbox::new();
    sandbox.add("Ana Silva");

    let payload = sandbox.json(&["queue", "run"]);
    assert_eq!(payload["outcome"], "deferred");
    assert_eq!(payload["remaining"], 1);

    let queue = sandbox.json(&["queue", "list"]);
    assert_eq!(queue["count"], 1);
}

#[test]
fn queue_clear_requires_force() {
    let sandbox = Sandbox::new();
    sandbox.add("Ana Silva");

    sandbox
        .cmd()
        .args(["queue", "clear"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    let payload = sandbox.json(&["queue", "clear", "--force"]);
    assert_eq!(payload["cleared"], 1);
}

#[test]
fn invalid_student_is_not_queued() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["student", "add", "--name", "Al", "--birth-date", "2012-03-14"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid name"));

    let queue = sandbox.json(&["queue", "list"]);
    assert_eq!(queue["count"], 0);
}

#[test]
fn completions_are_generated() {
    Command::cargo_bin("rollcall")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rollcall"));
}
