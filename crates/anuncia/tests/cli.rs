use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn anuncia() -> Command {
    let mut cmd: Command = cargo_bin_cmd!("anuncia").into();
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Writes an input dump into a tempdir and returns (guard, input, output).
fn scoring_fixture(content: &str) -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("announcements.json");
    let output = tmp.path().join("scored.csv");
    fs::write(&input, content).unwrap();
    (tmp, input, output)
}

/// Nothing listens on port 9; every batch fails fast without touching the
/// network beyond loopback.
const DEAD_ENDPOINT: &str = "http://127.0.0.1:9/score";

fn score_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "score".into(),
        "--input".into(),
        input.display().to_string(),
        "--output".into(),
        output.display().to_string(),
        "--endpoint".into(),
        DEAD_ENDPOINT.into(),
        "--delay-ms".into(),
        "0".into(),
    ]
}

#[test]
fn binary_runs() {
    anuncia()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("anuncia"));
}

#[test]
fn score_requires_arguments() {
    anuncia()
        .arg("score")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--input"));
}

#[test]
fn missing_input_file_fails() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("missing.json");
    let output = tmp.path().join("out.csv");

    anuncia()
        .args(score_args(&input, &output))
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading input file"));
}

#[test]
fn empty_dataset_is_an_error() {
    let (_tmp, input, output) = scoring_fixture("[]");

    anuncia()
        .args(score_args(&input, &output))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no usable records"));
    assert!(!output.exists());
}

#[test]
fn invalid_json_is_an_error() {
    let (_tmp, input, output) = scoring_fixture("definitely not json");

    anuncia()
        .args(score_args(&input, &output))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Ingest error"));
}

#[test]
fn unreachable_scorer_marks_records_failed() {
    let (_tmp, input, output) = scoring_fixture(
        r#"[
            {"title":"A","community":"North","description":"<p>Hello&nbsp;world</p>"},
            {"title":"B","community":"South","description":"Plain"}
        ]"#,
    );

    anuncia().args(score_args(&input, &output)).assert().success();

    let csv_text = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv_text.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("\"title\""));
    assert!(lines[1].contains("\"Hello world\""));
    assert!(lines[1].ends_with("\"0\",\"\",\"failed\""));
    assert!(lines[2].ends_with("\"0\",\"\",\"failed\""));
}

#[test]
fn community_filter_limits_exported_rows() {
    let (_tmp, input, output) = scoring_fixture(
        r#"[
            {"title":"A","community":"North Tower"},
            {"title":"B","community":"South"},
            {"title":"C","community":"north annex"}
        ]"#,
    );

    let mut args = score_args(&input, &output);
    args.extend(["--community".into(), "north".into()]);

    anuncia().args(args).assert().success();

    let csv_text = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv_text.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(lines[1].starts_with("\"A\""));
    assert!(lines[2].starts_with("\"C\""));
}

#[test]
fn bare_objects_are_repaired_and_ingested() {
    let (_tmp, input, output) =
        scoring_fixture(r#"{"title":"A"}{"title":"B"}"#);

    anuncia().args(score_args(&input, &output)).assert().success();

    let csv_text = fs::read_to_string(&output).unwrap();
    assert_eq!(csv_text.lines().count(), 3);
}
