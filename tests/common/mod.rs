#![allow(dead_code, deprecated)]

use assert_cmd::Command;
use std::path::Path;

pub const ADMIN_PASSWORD: &str = "admin-pass!";

pub fn cbcimath_cmd() -> Command {
    let mut cmd = Command::cargo_bin("cbcimath").unwrap();
    cmd.env_remove("CBCIMATH_ROOT");
    cmd.env_remove("CBCIMATH_BACKEND");
    cmd.env_remove("CBCIMATH_LOG_JSON");
    cmd.env("RUST_LOG", "warn");
    cmd
}

/// Command running inside an initialized site
pub fn site_cmd(site: &Path) -> Command {
    let mut cmd = cbcimath_cmd();
    cmd.current_dir(site);
    cmd
}

/// Initialize a local-backend site and log in as its administrator
pub fn init_logged_in(site: &Path) {
    cbcimath_cmd().arg("init").arg(site).assert().success();
    site_cmd(site)
        .args(["config", "admin.password", ADMIN_PASSWORD])
        .assert()
        .success();
    site_cmd(site)
        .args(["login", "master", "--password", ADMIN_PASSWORD])
        .assert()
        .success();
}
