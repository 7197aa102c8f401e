//! Integration tests for the `onevisitor` CLI binary.
//!
//! Argument parsing, offline commands, and error exit codes run without a
//! backend; the remaining tests point the binary at a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const ENV_VARS: [&str; 10] = [
    "ONEVISITOR_PROFILE",
    "ONEVISITOR_API_URL",
    "ONEVISITOR_TENANT",
    "ONEVISITOR_OUTPUT",
    "ONEVISITOR_INSECURE",
    "ONEVISITOR_TIMEOUT",
    "ONEVISITOR_EMAIL",
    "ONEVISITOR_PASSWORD",
    "ONEVISITOR_NO_KEYRING",
    "RUST_LOG",
];

/// `onevisitor` with env isolation: config lives under `home`, no
/// `ONEVISITOR_*` leaks in, and sessions never touch the keyring.
fn onevisitor_in(home: &std::path::Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("onevisitor");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .arg("--no-keyring");
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

fn onevisitor_cmd() -> assert_cmd::Command {
    onevisitor_in(std::path::Path::new("/tmp/onevisitor-cli-test-nonexistent"))
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_usage() {
    let output = onevisitor_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_command_groups() {
    onevisitor_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("sites")
            .and(predicate::str::contains("visitors"))
            .and(predicate::str::contains("checkin"))
            .and(predicate::str::contains("permissions")),
    );
}

#[test]
fn test_version_flag() {
    onevisitor_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("onevisitor"));
}

#[test]
fn test_completions_zsh() {
    onevisitor_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_subcommand() {
    let output = onevisitor_cmd().arg("foobar").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("foobar"));
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_tenant_from_site_path() {
    onevisitor_cmd()
        .args(["tenant", "--path", "globex-lobby"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("globex")
                .and(predicate::str::contains("Globex Industries"))
                .and(predicate::str::contains("site-path")),
        );
}

#[test]
fn test_tenant_from_subdomain_as_json() {
    let output = onevisitor_cmd()
        .args(["tenant", "--host", "stark-ind.onevisitor.app", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["id"], "stark-ind");
    assert_eq!(value["source"], "subdomain");
    assert_eq!(value["recognition"], "recognized");
}

#[test]
fn test_unknown_tenant_falls_back_to_default_branding() {
    onevisitor_cmd()
        .args(["tenant", "--host", "initech.onevisitor.app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unrecognized").and(predicate::str::contains("OneVisitor")));
}

#[test]
fn test_fields_library_needs_no_session() {
    onevisitor_cmd()
        .args(["fields", "library", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name").and(predicate::str::contains("nda")));
}

#[test]
fn test_config_set_then_show() {
    let home = tempfile::tempdir().unwrap();

    onevisitor_in(home.path())
        .args(["config", "set", "tenant", "globex"])
        .assert()
        .success();
    onevisitor_in(home.path())
        .args(["config", "set", "email", "ada@globex.test"])
        .assert()
        .success();

    onevisitor_in(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.default]")
                .and(predicate::str::contains("tenant = \"globex\""))
                .and(predicate::str::contains("ada@globex.test")),
        );
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    onevisitor_in(home.path())
        .args(["config", "set", "controller", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown config key"));
}

// ── Error exit codes ────────────────────────────────────────────────

#[test]
fn test_whoami_without_session_exits_auth() {
    onevisitor_cmd().arg("whoami").assert().code(3);
}

#[test]
fn test_missing_profile_exits_not_found() {
    onevisitor_cmd()
        .args(["--profile", "nope", "sites", "list"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_unreachable_backend_exits_connection() {
    let output = onevisitor_cmd()
        .env("ONEVISITOR_EMAIL", "ada@acme.test")
        .env("ONEVISITOR_PASSWORD", "secret")
        .args(["--api-url", "http://127.0.0.1:9/api", "--timeout", "2"])
        .args(["sites", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
    assert!(combined_output(&output).contains("127.0.0.1"));
}

// ── Against a mock backend ──────────────────────────────────────────

fn site_json() -> serde_json::Value {
    json!({
        "id": "s1",
        "tenantId": "acme-corp",
        "name": "HQ Lobby",
        "url": "acme-corp-lobby",
        "published": true,
        "visitorTypes": [{ "id": "guest", "name": "Guest" }],
        "formFields": [
            { "id": "name", "label": "Full Name", "type": "text", "required": true },
            { "id": "email", "label": "Email", "type": "email", "required": true },
            { "id": "host", "label": "Host", "type": "select" }
        ],
        "hosts": [{ "id": "h1", "name": "Grace Hopper", "email": "grace@acme.test" }]
    })
}

async fn mock_backend() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/users/login/"))
        .and(body_string_contains("ada@acme.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "access-1",
            "refresh_token": "refresh-1",
            "user": { "id": 7, "email": "ada@acme.test", "first_name": "Ada", "last_name": "Lovelace" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/sites/site"))
        .and(query_param("tenantId", "acme-corp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([site_json()])))
        .mount(&server)
        .await;

    server
}

fn logged_in(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = onevisitor_cmd();
    cmd.env("ONEVISITOR_EMAIL", "ada@acme.test")
        .env("ONEVISITOR_PASSWORD", "correct horse")
        .args(["--api-url", &format!("{}/api", server.uri())]);
    cmd
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sites_list_logs_in_on_demand() {
    let server = mock_backend().await;

    logged_in(&server)
        .args(["sites", "list", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::diff("s1\n"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_sites_get_by_path_shows_detail() {
    let server = mock_backend().await;

    logged_in(&server)
        .args(["sites", "get", "acme-corp-lobby"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("HQ Lobby")
                .and(predicate::str::contains("/acme-corp-lobby"))
                .and(predicate::str::contains("name*")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_hosts_list_for_site() {
    let server = mock_backend().await;

    logged_in(&server)
        .args(["hosts", "list", "--site", "HQ Lobby", "-o", "json-compact"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Grace Hopper\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_site_scoped_command_requires_site() {
    let server = mock_backend().await;

    logged_in(&server)
        .args(["hosts", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--site"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_login_exits_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/users/login/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    logged_in(&server).args(["sites", "list"]).assert().code(3);
}
