use std::{path::PathBuf, process::Command};

fn asset(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("assets")
        .join(name)
}

fn skirmish(extra: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_skirmish"))
        .arg("--rules")
        .arg(asset("rules.toml"))
        .arg("--map")
        .arg(asset("map.toml"))
        .args(extra)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch skirmish")
}

#[test]
fn sample_battle_runs_to_completion() {
    let config = asset("config.toml");
    let config = config.to_str().expect("utf-8 path");
    let output = skirmish(&["--config", config, "--ticks", "60"]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("ticks=60 "), "unexpected summary: {stdout}");
    assert!(stdout.contains("rejected=0 "), "unexpected summary: {stdout}");
}

#[test]
fn identical_runs_share_a_fingerprint() {
    let first = skirmish(&["--ticks", "45", "--debug"]);
    let second = skirmish(&["--ticks", "45", "--debug"]);

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn missing_rules_file_is_reported() {
    let output = Command::new(env!("CARGO_BIN_EXE_skirmish"))
        .arg("--rules")
        .arg(asset("absent.toml"))
        .arg("--map")
        .arg(asset("map.toml"))
        .output()
        .expect("failed to launch skirmish");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to read rules"));
}
