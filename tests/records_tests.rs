//! Integration tests for record commands on the local backend

#![allow(deprecated)]

use cbcimath::server::{self, AppState, KvTable};
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tokio::net::TcpListener;

mod common;
use common::{cbcimath_cmd, init_logged_in, site_cmd};

#[test]
fn test_list_no_records() {
    let temp = TempDir::new().unwrap();
    cbcimath_cmd().arg("init").arg(temp.path()).assert().success();

    site_cmd(temp.path())
        .args(["list", "notices"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No notices found"));
}

#[test]
fn test_unknown_kind() {
    let temp = TempDir::new().unwrap();
    cbcimath_cmd().arg("init").arg(temp.path()).assert().success();

    site_cmd(temp.path())
        .args(["list", "posts"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Valid kinds"));
}

#[test]
fn test_mutations_require_login() {
    let temp = TempDir::new().unwrap();
    cbcimath_cmd().arg("init").arg(temp.path()).assert().success();

    site_cmd(temp.path())
        .args(["create", "notices", "--data", r#"{"title":"A","content":"x"}"#])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Not logged in"));

    site_cmd(temp.path())
        .args(["delete", "notices", "n1"])
        .assert()
        .code(5);
}

#[test]
fn test_notice_lifecycle() {
    let temp = TempDir::new().unwrap();
    init_logged_in(temp.path());

    site_cmd(temp.path())
        .args([
            "create",
            "notices",
            "--data",
            r#"{"id":"n1","title":"A","content":"x","date":"2025.01.01"}"#,
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created notices n1"));

    site_cmd(temp.path())
        .args(["update", "notices", "n1", "--data", r#"{"title":"B"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated notices n1"));

    site_cmd(temp.path())
        .args(["list", "notices", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""title": "B""#))
        .stdout(predicate::str::contains(r#""content": "x""#))
        .stdout(predicate::str::contains(r#""date": "2025.01.01""#));

    site_cmd(temp.path())
        .args(["delete", "notices", "n1"])
        .assert()
        .success();

    site_cmd(temp.path())
        .args(["list", "notices"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No notices found"));

    site_cmd(temp.path())
        .args(["update", "notices", "n1", "--data", r#"{"title":"C"}"#])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Notice not found"));
}

#[test]
fn test_delete_absent_id_succeeds() {
    let temp = TempDir::new().unwrap();
    init_logged_in(temp.path());

    site_cmd(temp.path())
        .args(["delete", "cbci", "missing"])
        .assert()
        .success();
}

#[test]
fn test_create_missing_required_field_fails() {
    let temp = TempDir::new().unwrap();
    init_logged_in(temp.path());

    site_cmd(temp.path())
        .args(["create", "lessons", "--data", r#"{"title":"No unit"}"#])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("unit is required"));

    site_cmd(temp.path())
        .args(["list", "lessons"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No lessons found"));
}

#[test]
fn test_create_generates_id_and_defaults() {
    let temp = TempDir::new().unwrap();
    init_logged_in(temp.path());

    site_cmd(temp.path())
        .args(["create", "evaluations", "--data", r#"{"title":"기말고사","grade":"2"}"#])
        .assert()
        .success();

    site_cmd(temp.path())
        .args(["list", "evaluations", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""type": "시험""#))
        .stdout(predicate::str::contains(r#""status": "예정""#))
        .stdout(predicate::str::contains(r#""schoolType": "middle""#));
}

#[test]
fn test_research_newest_first_and_grade_filter() {
    let temp = TempDir::new().unwrap();
    init_logged_in(temp.path());

    for (id, school) in [("r1", "middle"), ("other", "high"), ("r2", "middle")] {
        let data = format!(
            r#"{{"id":"{}","title":"{}","unit":"u","schoolType":"{}","grade":"1"}}"#,
            id, id, school
        );
        site_cmd(temp.path())
            .args(["create", "research", "--data", &data])
            .assert()
            .success();
    }

    let output = site_cmd(temp.path())
        .args(["list", "research", "--school", "middle", "--grade", "1"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("r2"));
    assert!(lines[1].starts_with("r1"));
}

#[test]
fn test_show_research_counts_views() {
    let temp = TempDir::new().unwrap();
    init_logged_in(temp.path());

    site_cmd(temp.path())
        .args([
            "create",
            "research",
            "--data",
            r#"{"id":"r1","title":"탐구","unit":"u"}"#,
        ])
        .assert()
        .success();

    site_cmd(temp.path())
        .args(["show", "research", "r1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""views": 1"#));

    site_cmd(temp.path())
        .args(["show", "research", "r1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""views": 2"#));

    site_cmd(temp.path())
        .args(["show", "notices", "nope"])
        .assert()
        .code(4);
}

#[test]
fn test_create_with_html_attachment() {
    let temp = TempDir::new().unwrap();
    init_logged_in(temp.path());
    let html = temp.path().join("lesson.html");
    fs::write(&html, "<html><body><h1>소인수분해</h1></body></html>").unwrap();

    site_cmd(temp.path())
        .args([
            "create",
            "lessons",
            "--data",
            r#"{"id":"l1","title":"소인수분해","unit":"수와 연산"}"#,
            "--attach",
        ])
        .arg(&html)
        .assert()
        .success();

    site_cmd(temp.path())
        .args(["show", "lessons", "l1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""fileType": "html""#))
        .stdout(predicate::str::contains(r#""fileName": "lesson.html""#))
        .stdout(predicate::str::contains(r#""files": 1"#))
        .stdout(predicate::str::contains("data:image/svg+xml;base64,"));
}

#[test]
fn test_update_replaces_attachment() {
    let temp = TempDir::new().unwrap();
    init_logged_in(temp.path());
    let image = temp.path().join("graph.png");
    fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();
    let pdf = temp.path().join("sheet.pdf");
    fs::write(&pdf, b"%PDF-1.4").unwrap();

    site_cmd(temp.path())
        .args(["create", "cbci", "--data", r#"{"id":"c1","title":"t","unit":"u"}"#, "--attach"])
        .arg(&image)
        .assert()
        .success();

    site_cmd(temp.path())
        .args(["update", "cbci", "c1", "--attach"])
        .arg(&pdf)
        .assert()
        .success();

    site_cmd(temp.path())
        .args(["show", "cbci", "c1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""fileType": "file""#))
        .stdout(predicate::str::contains("sheet.pdf"))
        .stdout(predicate::str::contains("image/png").not());
}

#[test]
fn test_data_from_file() {
    let temp = TempDir::new().unwrap();
    init_logged_in(temp.path());
    let data = temp.path().join("notice.json");
    fs::write(&data, r#"{"id":"n9","title":"파일에서","content":"본문"}"#).unwrap();

    site_cmd(temp.path())
        .args(["create", "notices", "--data"])
        .arg(format!("@{}", data.display()))
        .assert()
        .success()
        .stdout(predicate::str::contains("Created notices n9"));
}

#[test]
fn test_search_across_kinds() {
    let temp = TempDir::new().unwrap();
    cbcimath_cmd()
        .arg("init")
        .arg(temp.path())
        .arg("--samples")
        .assert()
        .success();

    site_cmd(temp.path())
        .args(["search", "제곱근"])
        .assert()
        .success()
        .stdout(predicate::str::contains("실생활 속 제곱근 찾기"))
        .stdout(predicate::str::contains("제곱근과 실수 CBCI 설계"))
        .stdout(predicate::str::contains("2025년 1학기").not());

    site_cmd(temp.path())
        .args(["search", "--limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[공지사항]"))
        .stdout(predicate::str::contains("[탐구자료]").not());

    site_cmd(temp.path())
        .args(["search", "없는검색어"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches found"));
}

#[test]
fn test_unreachable_remote_degrades_listing_and_fails_mutations() {
    let temp = TempDir::new().unwrap();
    init_logged_in(temp.path());
    site_cmd(temp.path())
        .args(["config", "remote.base_url", "http://127.0.0.1:9"])
        .assert()
        .success();

    site_cmd(temp.path())
        .env("CBCIMATH_BACKEND", "remote")
        .args(["list", "notices"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No notices found"))
        .stderr(predicate::str::contains("Warning"));

    site_cmd(temp.path())
        .env("CBCIMATH_BACKEND", "remote")
        .args(["create", "notices", "--data", r#"{"title":"A","content":"x"}"#])
        .assert()
        .code(6);
}

/// Record service on a background runtime that only accepts `token`
fn guarded_service(token: &str) -> (tokio::runtime::Runtime, String) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let state = AppState::new(KvTable::memory()).with_token(token);
    let base = runtime.block_on(async {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(server::serve(listener, state));
        format!("http://{}", addr)
    });
    (runtime, base)
}

fn point_at(site: &Path, base: &str, key: &str) {
    for (name, value) in [("remote.base_url", base), ("remote.anon_key", key)] {
        site_cmd(site).args(["config", name, value]).assert().success();
    }
}

#[test]
fn test_rejected_service_key_exits_as_auth_failure() {
    let temp = TempDir::new().unwrap();
    init_logged_in(temp.path());
    let (_runtime, base) = guarded_service("secret");

    point_at(temp.path(), &base, "wrong");
    site_cmd(temp.path())
        .env("CBCIMATH_BACKEND", "remote")
        .args(["create", "notices", "--data", r#"{"title":"A","content":"x"}"#])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("Authentication error: Unauthorized"));

    site_cmd(temp.path())
        .env("CBCIMATH_BACKEND", "remote")
        .args(["delete", "notices", "n1"])
        .assert()
        .code(5);

    point_at(temp.path(), &base, "secret");
    site_cmd(temp.path())
        .env("CBCIMATH_BACKEND", "remote")
        .args(["create", "notices", "--data", r#"{"id":"n1","title":"A","content":"x"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created notices n1"));

    site_cmd(temp.path())
        .env("CBCIMATH_BACKEND", "remote")
        .args(["create", "notices", "--data", r#"{"id":"n1","title":"B","content":"x"}"#])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("a record with id n1 already exists"));
}
