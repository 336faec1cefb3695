//! End-to-end runs of the CLI runtime against a scripted bridge.

use std::ffi::OsString;
use std::process::ExitCode;

use rstest::rstest;
use serde_json::{Value, json};

use conduit_config::Config;

use super::support::{FakeBridge, Scripted, StaticConfigLoader, closed_port, quiet_config};

struct Outcome {
    exit: ExitCode,
    stdout: String,
    stderr: String,
}

fn run_cli(config: Config, args: &[&str]) -> Outcome {
    let argv: Vec<OsString> = std::iter::once("conduit")
        .chain(args.iter().copied())
        .map(OsString::from)
        .collect();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let exit = crate::run_with_loader(
        argv,
        &mut stdout,
        &mut stderr,
        &StaticConfigLoader::new(config),
    );
    Outcome {
        exit,
        stdout: String::from_utf8(stdout).expect("stdout utf8"),
        stderr: String::from_utf8(stderr).expect("stderr utf8"),
    }
}

#[rstest]
fn prints_the_result_and_forwards_arguments() {
    let bridge = FakeBridge::spawn(vec![Scripted::Respond(json!({}))]).expect("spawn bridge");
    let outcome = run_cli(
        bridge.config(),
        &[
            "set_parameter",
            "--args",
            r#"{"node_id": "nodeA"}"#,
            "--arg",
            "parameter_id=scale",
            "--arg",
            "value=[2,2,2]",
        ],
    );

    assert_eq!(outcome.exit, ExitCode::SUCCESS, "{}", outcome.stderr);
    let printed: Value = serde_json::from_str(&outcome.stdout).expect("stdout is JSON");
    assert_eq!(printed, json!({}));
    assert_eq!(
        bridge.finish().expect("bridge finished"),
        vec![json!({
            "command": "set_parameter",
            "args": {"node_id": "nodeA", "parameter_id": "scale", "value": [2, 2, 2]},
        })]
    );
}

#[rstest]
fn host_failures_exit_one() {
    let bridge = FakeBridge::spawn(vec![Scripted::Respond(json!({
        "error": "TypeMismatchError",
        "detail": "cannot set nodeA.mode (declared enum)",
    }))])
    .expect("spawn bridge");
    let outcome = run_cli(bridge.config(), &["set_parameter"]);

    assert_eq!(outcome.exit, ExitCode::from(1));
    assert!(outcome.stdout.is_empty());
    assert!(outcome.stderr.contains("TypeMismatchError"), "{}", outcome.stderr);
    bridge.finish().expect("bridge finished");
}

#[rstest]
fn unreachable_bridge_exits_two() {
    let config = Config {
        retry_attempts: 1,
        connect_timeout_secs: 1,
        ..quiet_config(closed_port().expect("free port"))
    };
    let outcome = run_cli(config, &["ping"]);

    assert_eq!(outcome.exit, ExitCode::from(2));
    assert!(outcome.stderr.contains("could not reach"), "{}", outcome.stderr);
}

#[rstest]
#[case(&[])]
#[case(&["ping", "--args", "[1]"])]
#[case(&["ping", "--arg", "novalue"])]
fn usage_errors_exit_two(#[case] args: &[&str]) {
    let outcome = run_cli(quiet_config(closed_port().expect("free port")), args);
    assert_eq!(outcome.exit, ExitCode::from(2));
    assert!(!outcome.stderr.is_empty());
}

#[rstest]
fn help_goes_to_stdout() {
    let outcome = run_cli(quiet_config(9881), &["--help"]);
    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stdout.contains("Usage"), "{}", outcome.stdout);
}
