//! End-to-end tests of the `clawctl` binary.
//!
//! No controller is running; the configured address refuses connections.

use assert_cmd::Command;
use predicates::prelude::*;

const UNREACHABLE: &str = "ws://127.0.0.1:9";

fn clawctl() -> Command {
    let mut cmd = Command::cargo_bin("clawctl").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("CLAWCTL_ALL")
        .env_remove("CLAWCTL_BACKUP_CONTROLLER")
        .env("CLAWCTL_CONTROLLER", UNREACHABLE)
        .args(["--timeout", "2"]);
    cmd
}

#[test]
fn version_flag() {
    clawctl()
        .arg("-V")
        .assert()
        .success()
        .stdout(format!("clawctl {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn help_flag_prints_usage() {
    clawctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Valid <COMMAND> values are:"));
}

#[test]
fn unknown_option_is_a_startup_error() {
    clawctl()
        .arg("--bogus")
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("--bogus"));
}

#[test]
fn verbose_flag_reaches_the_command() {
    clawctl()
        .args(["-v", "version"])
        .assert()
        .success()
        .stdout(predicate::str::contains("control protocol version"));
}

#[test]
fn session_command_from_arguments() {
    clawctl()
        .arg("all")
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::is_empty());
}

#[test]
fn unknown_command_fails() {
    clawctl()
        .arg("frobnicate")
        .assert()
        .code(1)
        .stderr("invalid keyword: frobnicate\n");
}

#[test]
fn update_without_entity_fails_before_connecting() {
    clawctl()
        .args(["update", "State=DOWN"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("No valid entity in update command"));
}

#[test]
fn ping_reports_down_controllers() {
    clawctl()
        .arg("ping")
        .assert()
        .success()
        .stdout(format!(
            "Controller(primary/backup) at {UNREACHABLE}/(none) are DOWN/DOWN\n"
        ));
}

#[test]
fn unreachable_controller_fails_the_command() {
    clawctl()
        .arg("reconfigure")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("connection error"));
}

#[test]
fn quiet_suppresses_controller_errors() {
    clawctl()
        .args(["-q", "reconfigure"])
        .assert()
        .code(1)
        .stderr(predicate::str::is_empty());
}

#[test]
fn piped_commands_until_exit() {
    clawctl()
        .write_stdin("all\noneliner\nexit\nfrobnicate\n")
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn error_status_is_sticky() {
    clawctl()
        .write_stdin("frobnicate\nall\nhelp\n")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("clawctl [<OPTION>]"))
        .stderr("invalid keyword: frobnicate\n");
}

#[test]
fn repeat_replays_last_line() {
    clawctl()
        .write_stdin("version\n!!\n")
        .assert()
        .success()
        .stdout(format!("clawctl {0}\nclawctl {0}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn too_few_arguments() {
    clawctl()
        .arg("requeue")
        .assert()
        .code(1)
        .stderr("too few arguments for keyword:requeue\n");
}

#[test]
fn invalid_controller_url() {
    clawctl()
        .args(["--controller", "http://ctl:1", "ping"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid controller URL"));
}
