use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{contents}").unwrap();
    file
}

fn static_config() -> NamedTempFile {
    write_config(r#"{"tps": 200.0, "duration_secs": 0.2}"#)
}

#[test]
fn test_validate_command_success() -> Result<(), Box<dyn std::error::Error>> {
    let config_file = static_config();

    let output = Command::new(assert_cmd::cargo::cargo_bin!("pulsegen"))
        .arg("validate")
        .arg("--pattern")
        .arg("static")
        .arg("--pattern-config")
        .arg(config_file.path())
        .output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Pattern config OK"));

    Ok(())
}

#[test]
fn test_validate_command_unknown_pattern() -> Result<(), Box<dyn std::error::Error>> {
    let config_file = static_config();

    let output = Command::new(assert_cmd::cargo::cargo_bin!("pulsegen"))
        .arg("validate")
        .arg("--pattern")
        .arg("not-a-real-pattern")
        .arg("--pattern-config")
        .arg(config_file.path())
        .output()?;

    assert!(!output.status.success());

    Ok(())
}

#[test]
fn test_validate_command_malformed_json() -> Result<(), Box<dyn std::error::Error>> {
    let config_file = write_config("{ this is not json }");

    let output = Command::new(assert_cmd::cargo::cargo_bin!("pulsegen"))
        .arg("validate")
        .arg("--pattern")
        .arg("static")
        .arg("--pattern-config")
        .arg(config_file.path())
        .output()?;

    assert!(!output.status.success());

    Ok(())
}

#[test]
fn test_run_command_with_noop_task_and_console_exporter() -> Result<(), Box<dyn std::error::Error>> {
    let config_file = static_config();

    let output = Command::new(assert_cmd::cargo::cargo_bin!("pulsegen"))
        .arg("run")
        .arg("--task")
        .arg("noop")
        .arg("--pattern")
        .arg("static")
        .arg("--pattern-config")
        .arg(config_file.path())
        .arg("--exporter")
        .arg("console")
        .output()?;

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("executions:"));

    Ok(())
}

#[test]
fn test_run_command_writes_a_json_report() -> Result<(), Box<dyn std::error::Error>> {
    let config_file = static_config();
    let report_file = NamedTempFile::new()?;

    let output = Command::new(assert_cmd::cargo::cargo_bin!("pulsegen"))
        .arg("run")
        .arg("--task")
        .arg("synthetic-latency")
        .arg("--task-latency-ms")
        .arg("1")
        .arg("--pattern")
        .arg("static")
        .arg("--pattern-config")
        .arg(config_file.path())
        .arg("--exporter")
        .arg(format!("json:{}", report_file.path().display()))
        .output()?;

    assert!(output.status.success());
    let report = std::fs::read_to_string(report_file.path())?;
    let parsed: serde_json::Value = serde_json::from_str(&report)?;
    assert!(parsed["snapshot"]["total_executions"].as_u64().unwrap() > 0);

    Ok(())
}

#[test]
fn test_run_command_rejects_an_unknown_task() -> Result<(), Box<dyn std::error::Error>> {
    let config_file = static_config();

    let output = Command::new(assert_cmd::cargo::cargo_bin!("pulsegen"))
        .arg("run")
        .arg("--task")
        .arg("not-a-real-task")
        .arg("--pattern")
        .arg("static")
        .arg("--pattern-config")
        .arg(config_file.path())
        .output()?;

    assert!(!output.status.success());

    Ok(())
}

#[test]
fn test_run_command_rejects_an_invalid_threads_flag() -> Result<(), Box<dyn std::error::Error>> {
    let config_file = static_config();

    let output = Command::new(assert_cmd::cargo::cargo_bin!("pulsegen"))
        .arg("run")
        .arg("--task")
        .arg("noop")
        .arg("--pattern")
        .arg("static")
        .arg("--pattern-config")
        .arg(config_file.path())
        .arg("--threads")
        .arg("bogus")
        .output()?;

    assert!(!output.status.success());

    Ok(())
}
