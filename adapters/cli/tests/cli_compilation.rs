use std::process::Command;

#[test]
fn cli_compiles_without_warnings() {
    let status = Command::new(env!("CARGO"))
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["check", "--quiet", "--bin", "grid-siege"])
        .status()
        .expect("failed to invoke cargo check for grid-siege CLI binary");

    assert!(status.success(), "cargo check --bin grid-siege should succeed");
}

#[test]
fn cli_prints_banner_and_exports_layout() {
    let output = Command::new(env!("CARGO_BIN_EXE_grid-siege"))
        .args([
            "--ticks",
            "3",
            "--random-barriers",
            "0.2",
            "--seed",
            "9",
            "--export-layout",
        ])
        .env("RUST_LOG", "off")
        .output()
        .expect("failed to run grid-siege");

    assert!(output.status.success(), "grid-siege should exit cleanly");
    let stdout = String::from_utf8(output.stdout).expect("stdout is utf-8");
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("Welcome to Grid Siege."));
    let exported = stdout.lines().last().expect("layout string printed");
    assert!(exported.starts_with("siege:v1:28x45:"));
}

#[test]
fn cli_logs_how_many_barriers_were_scattered() {
    let output = Command::new(env!("CARGO_BIN_EXE_grid-siege"))
        .args(["--ticks", "1", "--random-barriers", "0.1", "--seed", "3"])
        .env("RUST_LOG", "info")
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run grid-siege");

    assert!(output.status.success(), "grid-siege should exit cleanly");
    let stderr = String::from_utf8(output.stderr).expect("stderr is utf-8");
    let line = stderr
        .lines()
        .find(|line| line.contains("random barriers scattered"))
        .expect("scatter count is logged");
    assert!(line.contains("placed"));
}
