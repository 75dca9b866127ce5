//! End-to-end tests of the `ko-merge` binary.
//!
//! Each test builds its own sample file, reference tables and registry in a
//! temporary directory, so nothing depends on the bundled data files.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLES: &str = ">SampleA\nK00001\nK00002\n>SampleB\nK00001\nK00404\n";

const KEGG: &str = "ko;pathname;genesymbol\nK00001;Toluene;adhA\nK00002;Benzoate;benA\n";
const HADEG: &str = "Gene;ko;Pathway\nalkB;K00001;Alkanes\nalkM;K00001;Alkanes\n";

fn ko_merge() -> Command {
    Command::cargo_bin("ko-merge").unwrap()
}

/// Workspace with a sample file, two database tables and a registry that
/// also lists a database whose file does not exist.
fn workspace() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir(&data).unwrap();
    std::fs::write(data.join("kegg_db.csv"), KEGG).unwrap();
    std::fs::write(data.join("hadeg_db.csv"), HADEG).unwrap();

    let registry = dir.path().join("registry.json");
    std::fs::write(
        &registry,
        r#"{
            "version": "1.0.0",
            "databases": [
                { "name": "biorempp", "path": "biorempp_db.csv" },
                { "name": "kegg", "path": "kegg_db.csv", "required_columns": ["pathname"] },
                { "name": "hadeg", "path": "hadeg_db.csv" }
            ]
        }"#,
    )
    .unwrap();

    let input = dir.path().join("samples.txt");
    std::fs::write(&input, SAMPLES).unwrap();

    (dir, registry, input)
}

fn with_registry(cmd: &mut Command, dir: &Path, registry: &Path) {
    cmd.arg("--registry")
        .arg(registry)
        .arg("--data-dir")
        .arg(dir.join("data"));
}

#[test]
fn test_validate_reports_counts() {
    let (_dir, _registry, input) = workspace();

    ko_merge()
        .arg("validate")
        .arg(&input)
        .arg("--per-sample")
        .assert()
        .success()
        .stdout(predicate::str::contains("Samples: 2"))
        .stdout(predicate::str::contains("Records: 4"))
        .stdout(predicate::str::contains("Unique identifiers: 3"))
        .stdout(predicate::str::contains("SampleA: 2"));
}

#[test]
fn test_validate_json() {
    let (_dir, _registry, input) = workspace();

    let output = ko_merge()
        .args(["--format", "json", "validate"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["valid"], true);
    assert_eq!(json["stats"]["samples"], 2);
    assert_eq!(json["stats"]["records"], 4);
}

#[test]
fn test_validate_rejects_wrong_extension() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("samples.csv");
    std::fs::write(&input, SAMPLES).unwrap();

    ko_merge()
        .arg("validate")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected a .txt file"));
}

#[test]
fn test_validate_rejects_identifier_before_header() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("samples.txt");
    std::fs::write(&input, "K00001\n>SampleA\nK00002\n").unwrap();

    ko_merge()
        .arg("validate")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid format"))
        .stderr(predicate::str::contains("line 1"));
}

#[test]
fn test_validate_rejects_empty_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("samples.txt");
    std::fs::write(&input, "\n  \n").unwrap();

    ko_merge()
        .arg("validate")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty input"));
}

#[test]
fn test_merge_single_database() {
    let (dir, registry, input) = workspace();
    let output = dir.path().join("out");

    let mut cmd = ko_merge();
    with_registry(&mut cmd, dir.path(), &registry);
    cmd.arg("merge")
        .arg(&input)
        .args(["--database", "kegg", "--output"])
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rows: 3"));

    let merged = std::fs::read_to_string(output.join("kegg_merged.csv")).unwrap();
    let lines: Vec<&str> = merged.lines().collect();
    assert_eq!(lines[0], "sample;ko;pathname;genesymbol");
    assert_eq!(lines[1], "SampleA;K00001;Toluene;adhA");
    assert_eq!(lines.len(), 4);
}

#[test]
fn test_merge_missing_database_fails() {
    let (dir, registry, input) = workspace();

    let mut cmd = ko_merge();
    with_registry(&mut cmd, dir.path(), &registry);
    cmd.arg("merge")
        .arg(&input)
        .args(["--database", "biorempp", "--output"])
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    assert!(!dir.path().join("out").join("biorempp_merged.csv").exists());
}

#[test]
fn test_merge_unknown_database_lists_available() {
    let (dir, registry, input) = workspace();

    let mut cmd = ko_merge();
    with_registry(&mut cmd, dir.path(), &registry);
    cmd.arg("merge")
        .arg(&input)
        .args(["--database", "uniprot"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("biorempp, kegg, hadeg"));
}

#[test]
fn test_merge_all_isolates_failures() {
    let (dir, registry, input) = workspace();
    let output = dir.path().join("out");

    let mut cmd = ko_merge();
    with_registry(&mut cmd, dir.path(), &registry);
    cmd.arg("merge-all")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Succeeded (2/3)"))
        .stdout(predicate::str::contains("Failed (1/3)"))
        .stdout(predicate::str::contains("biorempp"));

    assert!(output.join("kegg_merged.csv").is_file());
    assert!(output.join("hadeg_merged.csv").is_file());
    assert!(!output.join("biorempp_merged.csv").exists());
}

#[test]
fn test_merge_all_json_summary() {
    let (dir, registry, input) = workspace();

    let mut cmd = ko_merge();
    with_registry(&mut cmd, dir.path(), &registry);
    let output = cmd
        .args(["--format", "json", "merge-all"])
        .arg(&input)
        .arg("--parallel")
        .arg("--output")
        .arg(dir.path().join("out"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let summary = &json["summary"];
    assert_eq!(summary["total"], 3);
    assert_eq!(summary["success_count"], 2);
    assert_eq!(summary["failure_count"], 1);
    assert_eq!(summary["failed"][0]["name"], "biorempp");
    // SampleA/K00001 and SampleB/K00001 each match two HADEG genes
    assert_eq!(summary["succeeded"][1]["name"], "hadeg");
    assert_eq!(summary["succeeded"][1]["rows"], 4);
}

#[test]
fn test_merge_all_reports_schema_failure() {
    let (dir, registry, input) = workspace();
    std::fs::write(
        dir.path().join("data").join("kegg_db.csv"),
        "ko;genesymbol\nK00001;adhA\n",
    )
    .unwrap();

    let mut cmd = ko_merge();
    with_registry(&mut cmd, dir.path(), &registry);
    cmd.args(["--format", "tsv", "merge-all"])
        .arg(&input)
        .arg("--output")
        .arg(dir.path().join("out"))
        .assert()
        .success()
        .stdout(predicate::str::contains("kegg\tfailed"))
        .stdout(predicate::str::contains("pathname"))
        .stdout(predicate::str::contains("hadeg\tok\t4"));
}

fn write_registry(dir: &Path, databases: &str) -> PathBuf {
    let registry = dir.join("custom_registry.json");
    std::fs::write(
        &registry,
        format!(r#"{{ "version": "1.0.0", "databases": [{databases}] }}"#),
    )
    .unwrap();
    registry
}

#[test]
fn test_merge_all_unwritable_output_name_is_isolated() {
    let (dir, _registry, input) = workspace();
    let registry = write_registry(
        dir.path(),
        r#"{ "name": "kegg..v2", "path": "kegg_db.csv" },
           { "name": "hadeg", "path": "hadeg_db.csv" }"#,
    );
    let output = dir.path().join("out");

    let mut cmd = ko_merge();
    with_registry(&mut cmd, dir.path(), &registry);
    cmd.arg("merge-all")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Succeeded (1/2)"))
        .stdout(predicate::str::contains("Failed (1/2)"))
        .stdout(predicate::str::contains("cannot be used as a filename"));

    assert!(output.join("hadeg_merged.csv").is_file());
    assert_eq!(std::fs::read_dir(&output).unwrap().count(), 1);
}

#[test]
fn test_merge_all_unwritable_output_name_in_tsv() {
    let (dir, _registry, input) = workspace();
    let registry = write_registry(
        dir.path(),
        r#"{ "name": "kegg..v2", "path": "kegg_db.csv" },
           { "name": "hadeg", "path": "hadeg_db.csv" }"#,
    );

    let mut cmd = ko_merge();
    with_registry(&mut cmd, dir.path(), &registry);
    cmd.args(["--format", "tsv", "merge-all"])
        .arg(&input)
        .arg("--output")
        .arg(dir.path().join("out"))
        .assert()
        .success()
        .stdout(predicate::str::contains("kegg..v2\tfailed"))
        .stdout(predicate::str::contains("hadeg\tok\t4"));
}

#[test]
fn test_merge_all_colliding_output_names() {
    let (dir, _registry, input) = workspace();
    let registry = write_registry(
        dir.path(),
        r#"{ "name": "kegg", "path": "kegg_db.csv" },
           { "name": "kegg!", "path": "hadeg_db.csv" }"#,
    );
    let output = dir.path().join("out");

    let mut cmd = ko_merge();
    with_registry(&mut cmd, dir.path(), &registry);
    let result = cmd
        .args(["--format", "json", "merge-all"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .output()
        .unwrap();
    assert!(result.status.success());

    let json: serde_json::Value = serde_json::from_slice(&result.stdout).unwrap();
    let summary = &json["summary"];
    assert_eq!(summary["success_count"], 1);
    assert_eq!(summary["failure_count"], 1);
    assert_eq!(summary["succeeded"][0]["name"], "kegg");
    assert_eq!(summary["failed"][0]["name"], "kegg!");
    assert!(summary["failed"][0]["error"]
        .as_str()
        .unwrap()
        .contains("already used by database 'kegg'"));
    assert!(json["outputs"].get("kegg!").is_none());

    // The first database keeps its file
    let merged = std::fs::read_to_string(output.join("kegg_merged.csv")).unwrap();
    assert!(merged.starts_with("sample;ko;pathname;genesymbol\n"));
    assert_eq!(std::fs::read_dir(&output).unwrap().count(), 1);
}

#[test]
fn test_databases_list_marks_missing() {
    let (dir, registry, _input) = workspace();

    let mut cmd = ko_merge();
    with_registry(&mut cmd, dir.path(), &registry);
    cmd.args(["--format", "tsv", "databases", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("biorempp\tmissing"))
        .stdout(predicate::str::contains("kegg\tok"));
}

#[test]
fn test_databases_show() {
    let (dir, registry, _input) = workspace();

    let mut cmd = ko_merge();
    with_registry(&mut cmd, dir.path(), &registry);
    cmd.args(["databases", "show", "hadeg"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rows: 2"))
        .stdout(predicate::str::contains("Distinct identifiers: 1"))
        .stdout(predicate::str::contains("Max rows per identifier: 2"));
}

#[test]
fn test_databases_list_embedded() {
    ko_merge()
        .args(["databases", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Database Registry (4 databases)"))
        .stdout(predicate::str::contains("toxcsm"));
}

#[test]
fn test_databases_export_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let exported = dir.path().join("registry.json");

    ko_merge()
        .args(["databases", "export"])
        .arg(&exported)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 4 databases"));

    ko_merge()
        .arg("--registry")
        .arg(&exported)
        .args(["--format", "tsv", "databases", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hadeg"));
}
