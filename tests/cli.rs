//! The conceptmap binary end to end

mod common;

use common::lattice_corpus;
use std::io::Write;
use std::process::Command;

fn conceptmap() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_conceptmap"));
    cmd.env("CONCEPTMAP_LOG", "error");
    cmd
}

#[test]
fn test_config_prints_default_yaml() {
    let out = conceptmap().arg("config").output().unwrap();
    assert!(out.status.success());
    let yaml = String::from_utf8(out.stdout).unwrap();
    let config = conceptmap::PipelineConfig::from_yaml_str(&yaml).unwrap();
    assert_eq!(config, conceptmap::PipelineConfig::default());
}

#[test]
fn test_schema_describes_document() {
    let out = conceptmap().arg("schema").output().unwrap();
    assert!(out.status.success());
    let schema: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let text = schema.to_string();
    assert!(text.contains("roots"));
    assert!(text.contains("confidenceScore"));
}

#[test]
fn test_build_from_json_lines() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for paper in lattice_corpus() {
        writeln!(file, "{}", serde_json::to_string(&paper).unwrap()).unwrap();
    }

    let out = conceptmap()
        .args(["build", "--papers"])
        .arg(file.path())
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let doc: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(!doc["roots"].as_array().unwrap().is_empty());
    assert_eq!(doc["metadata"]["papers"]["processed"], 3);
}

#[test]
fn test_build_from_directory_to_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let papers = lattice_corpus();
    std::fs::write(
        dir.path().join("batch.json"),
        serde_json::to_string(&papers).unwrap(),
    )
    .unwrap();
    std::fs::write(dir.path().join("notes.txt"), "not a paper").unwrap();
    let output = dir.path().join("hierarchy.json");

    let out = conceptmap()
        .args(["build", "--seed", "3", "--papers"])
        .arg(dir.path())
        .arg("--output")
        .arg(&output)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let doc: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(doc["metadata"]["randomSeed"], 3);
}

#[test]
fn test_build_failure_exits_with_error() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let out = conceptmap()
        .args(["build", "--papers"])
        .arg(file.path())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Error:"));
}
