#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const GOOD_WIDGET: &str = "import React from 'react';\n\nexport default function MyWidget() {\n  return <div className=\"widget\">hello</div>;\n}\n";

fn appdeck(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("appdeck").unwrap();
    cmd.current_dir(dir.path())
        .env("APPDECK_ROOT", dir.path())
        .env_remove("APPDECK_ENDPOINT")
        .env_remove("APPDECK_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

fn write_app(root: &Path, category: &str, name: &str, text: &str) {
    let dir = root.join("apps").join(category);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{name}.tsx")), text).unwrap();
}

fn write_config(root: &Path, yaml: &str) {
    let dir = root.join(".appdeck");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.yaml"), yaml).unwrap();
}

fn project_with_widget() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_app(dir.path(), "widgets", "my-widget", GOOD_WIDGET);
    dir
}

// ---------------------------------------------------------------------------
// appdeck deploy
// ---------------------------------------------------------------------------

#[test]
fn deploy_prints_live_url() {
    let dir = project_with_widget();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/live/my-widget")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "category": "widgets",
            "name": "my-widget",
        })))
        .with_status(200)
        .create();

    appdeck(&dir)
        .args(["deploy", "my-widget", "--endpoint", &server.url()])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "{}/live/my-widget",
            server.url()
        )));

    mock.assert();
}

#[test]
fn deploy_reads_endpoint_from_config_and_sends_token() {
    let dir = project_with_widget();
    let mut server = mockito::Server::new();
    write_config(
        dir.path(),
        &format!("deploy:\n  endpoint: {}\n", server.url()),
    );
    let mock = server
        .mock("POST", "/live/my-widget")
        .match_header("authorization", "Bearer s3cret")
        .with_status(201)
        .with_body(r#"{"url":"https://cdn.example.dev/my-widget"}"#)
        .create();

    appdeck(&dir)
        .args(["deploy", "widgets/my-widget"])
        .env("APPDECK_TOKEN", "s3cret")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://cdn.example.dev/my-widget"));

    mock.assert();
}

#[test]
fn deploy_oversized_app_fails_without_network() {
    let dir = project_with_widget();
    write_config(dir.path(), "validation:\n  max_bytes: 16\n");
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", mockito::Matcher::Any)
        .expect(0)
        .create();

    appdeck(&dir)
        .args(["deploy", "my-widget", "--endpoint", &server.url()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("[max-size]"))
        .stderr(predicate::str::contains("validating failed"));

    mock.assert();
}

#[test]
fn deploy_reports_host_rejection() {
    let dir = project_with_widget();
    let mut server = mockito::Server::new();
    server
        .mock("POST", "/live/my-widget")
        .with_status(500)
        .with_body(r#"{"error":"disk full"}"#)
        .create();

    appdeck(&dir)
        .args(["deploy", "my-widget", "--endpoint", &server.url()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP 500"))
        .stderr(predicate::str::contains("disk full"));
}

#[test]
fn deploy_without_endpoint_fails() {
    let dir = project_with_widget();
    appdeck(&dir)
        .args(["deploy", "my-widget"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid deploy endpoint"));
}

#[test]
fn deploy_without_endpoint_still_lists_violations() {
    let dir = project_with_widget();
    write_config(dir.path(), "validation:\n  max_bytes: 16\n");
    appdeck(&dir)
        .args(["deploy", "my-widget"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("[max-size]"))
        .stderr(predicate::str::contains("invalid deploy endpoint").not());
}

#[test]
fn deploy_rejects_path_traversal() {
    let dir = project_with_widget();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", mockito::Matcher::Any)
        .expect(0)
        .create();

    appdeck(&dir)
        .args(["deploy", "../secrets", "--endpoint", &server.url()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid app identity"));

    mock.assert();
}

#[test]
fn deploy_unknown_app_fails() {
    let dir = project_with_widget();
    appdeck(&dir)
        .args(["deploy", "no-such-app", "--endpoint", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn deploy_json_reports_outcome() {
    let dir = project_with_widget();
    let mut server = mockito::Server::new();
    server.mock("POST", "/live/my-widget").with_status(200).create();

    let output = appdeck(&dir)
        .args(["deploy", "my-widget", "--json", "--endpoint", &server.url()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["outcome"], "deployed");
    assert_eq!(value["identity"]["name"], "my-widget");
}

// ---------------------------------------------------------------------------
// appdeck prompt
// ---------------------------------------------------------------------------

#[test]
fn prompt_uses_initial_phase_by_default() {
    let dir = project_with_widget();
    appdeck(&dir)
        .args(["prompt", "my-widget"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Prompt: widgets/my-widget"))
        .stdout(predicate::str::contains("**Phase:** draft"))
        .stdout(predicate::str::contains("export default function MyWidget"));
}

#[test]
fn prompt_explicit_phase_is_not_persisted() {
    let dir = project_with_widget();
    appdeck(&dir)
        .args(["prompt", "my-widget", "live"])
        .assert()
        .success()
        .stdout(predicate::str::contains("**Phase:** live"));

    assert!(!dir.path().join(".appdeck/phases.yaml").exists());
}

#[test]
fn prompt_without_template_is_unknown_phase() {
    let dir = project_with_widget();
    write_config(
        dir.path(),
        "prompts:\n  templates:\n    draft: \"Build {name}.\"\n    live: \"Maintain {name}.\"\n",
    );

    appdeck(&dir)
        .args(["prompt", "my-widget", "reviewed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown phase: reviewed"));
}

#[test]
fn prompt_rejects_phase_outside_order() {
    let dir = project_with_widget();
    appdeck(&dir)
        .args(["prompt", "my-widget", "shipped"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown phase: shipped"));
}

#[test]
fn prompt_refuses_invalid_app() {
    let dir = TempDir::new().unwrap();
    write_app(dir.path(), "widgets", "broken", "const x = 1;\n");
    appdeck(&dir)
        .args(["prompt", "broken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("[default-export]"));
}

// ---------------------------------------------------------------------------
// appdeck validate / list
// ---------------------------------------------------------------------------

#[test]
fn validate_passes_good_app() {
    let dir = project_with_widget();
    appdeck(&dir)
        .args(["validate", "my-widget"])
        .assert()
        .success()
        .stdout(predicate::str::contains("widgets/my-widget: ok"));
}

#[test]
fn validate_lists_every_violation() {
    let dir = TempDir::new().unwrap();
    write_app(
        dir.path(),
        "widgets",
        "bad-widget",
        "import fs from 'fs';\nexport default function lower() {}\n",
    );

    appdeck(&dir)
        .args(["validate", "bad-widget"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[component-name]"))
        .stdout(predicate::str::contains("[disallowed-import]"));
}

#[test]
fn validate_ambiguous_name_fails() {
    let dir = project_with_widget();
    write_app(dir.path(), "games", "my-widget", GOOD_WIDGET);

    appdeck(&dir)
        .args(["validate", "my-widget"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ambiguous"));

    appdeck(&dir)
        .args(["validate", "games/my-widget"])
        .assert()
        .success();
}

#[test]
fn list_shows_apps_with_phase() {
    let dir = project_with_widget();
    write_app(dir.path(), "games", "snake", GOOD_WIDGET);

    appdeck(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("CATEGORY"))
        .stdout(predicate::str::contains("snake"))
        .stdout(predicate::str::contains("my-widget"))
        .stdout(predicate::str::contains("draft"));
}

#[test]
fn list_empty_catalog() {
    let dir = TempDir::new().unwrap();
    appdeck(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No apps found"));
}

// ---------------------------------------------------------------------------
// appdeck phase
// ---------------------------------------------------------------------------

#[test]
fn phase_advance_walks_to_terminal() {
    let dir = project_with_widget();

    appdeck(&dir)
        .args(["phase", "advance", "my-widget"])
        .assert()
        .success()
        .stdout(predicate::str::contains("widgets/my-widget: draft -> reviewed"));

    appdeck(&dir)
        .args(["phase", "advance", "my-widget"])
        .assert()
        .success()
        .stdout(predicate::str::contains("reviewed -> live"));

    let before = std::fs::read_to_string(dir.path().join(".appdeck/phases.yaml")).unwrap();
    appdeck(&dir)
        .args(["phase", "advance", "my-widget"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("terminal"));
    let after = std::fs::read_to_string(dir.path().join(".appdeck/phases.yaml")).unwrap();
    assert_eq!(before, after);

    appdeck(&dir)
        .args(["prompt", "my-widget"])
        .assert()
        .success()
        .stdout(predicate::str::contains("**Phase:** live"));
}

#[test]
fn phase_set_can_move_backwards() {
    let dir = project_with_widget();
    appdeck(&dir)
        .args(["phase", "set", "my-widget", "live"])
        .assert()
        .success();
    appdeck(&dir)
        .args(["phase", "set", "my-widget", "draft"])
        .assert()
        .success()
        .stdout(predicate::str::contains("live -> draft"));

    appdeck(&dir)
        .args(["phase", "show", "my-widget"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Phase:  draft (next: reviewed)"))
        .stdout(predicate::str::contains("History:"));
}

#[test]
fn phase_set_unknown_phase_fails() {
    let dir = project_with_widget();
    appdeck(&dir)
        .args(["phase", "set", "my-widget", "archived"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown phase: archived"));
}

// ---------------------------------------------------------------------------
// appdeck config
// ---------------------------------------------------------------------------

#[test]
fn config_init_writes_defaults_once() {
    let dir = TempDir::new().unwrap();
    appdeck(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));
    let written = std::fs::read_to_string(dir.path().join(".appdeck/config.yaml")).unwrap();
    assert!(written.contains("max_bytes: 65536"));
    assert!(written.contains("reviewed"));

    appdeck(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    appdeck(&dir).args(["config", "validate"]).assert().success();
}

#[test]
fn config_validate_defaults_are_clean() {
    let dir = TempDir::new().unwrap();
    appdeck(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_flags_bad_endpoint() {
    let dir = TempDir::new().unwrap();
    write_config(dir.path(), "deploy:\n  endpoint: ftp://files.example.dev\n");
    appdeck(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn config_show_hides_token() {
    let dir = TempDir::new().unwrap();
    write_config(
        dir.path(),
        "deploy:\n  endpoint: https://apps.example.dev\n  token: hunter2\n",
    );
    appdeck(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://apps.example.dev"))
        .stdout(predicate::str::contains("hunter2").not());
}
