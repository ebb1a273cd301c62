//! Integration tests for the headless runner

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::TempDir;

use vault_tui::{run_headless, HeadlessOptions, OutputFormat};

const FIXTURE: &str = r#"{
  "mounts": [
    { "path": "secret/", "type": "kv", "version": 2 },
    { "path": "pki/", "type": "pki" }
  ],
  "secrets": ["secret/app/db", "secret/app/api-key", "secret/top"],
  "capabilities": { "secret/app/db": ["read", "list"] }
}"#;

/// Helper to write the sample fixture into a temp dir
fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("tree.json");
    fs::write(&path, FIXTURE).unwrap();
    path
}

#[tokio::test]
async fn test_text_output_lists_discovered_tree() {
    let temp = TempDir::new().unwrap();
    let options = HeadlessOptions::new(write_fixture(temp.path()));

    let output = run_headless(options).await.unwrap();

    assert!(output.contains("secret/"), "{output}");
    assert!(output.contains("app/"), "{output}");
    assert!(output.contains("api-key"), "{output}");
    assert!(output.contains("top"), "{output}");
    assert!(!output.contains("pki"), "{output}");
    assert!(output.contains("3 secrets, 2 listings"), "{output}");
    assert!(!output.contains("partial"), "{output}");
}

#[tokio::test]
async fn test_json_output_is_sorted_and_annotated() {
    let temp = TempDir::new().unwrap();
    let mut options = HeadlessOptions::new(write_fixture(temp.path()));
    options.format = OutputFormat::Json;

    let output = run_headless(options).await.unwrap();
    let report: Value = serde_json::from_str(&output).unwrap();

    assert_eq!(report["list_requests"], 2);
    assert_eq!(report["annotated"], true);

    let roots = report["tree"].as_array().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["path"], "secret/");
    assert!(roots[0].get("incomplete").is_none());

    let children: Vec<&str> = roots[0]["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["path"].as_str().unwrap())
        .collect();
    assert_eq!(children, vec!["secret/app/", "secret/top"]);

    let app = &roots[0]["children"][0];
    let db = app["children"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["path"] == "secret/app/db")
        .unwrap();
    assert!(db["capabilities"].is_array());
}

#[tokio::test]
async fn test_budget_exhaustion_marks_partial() {
    let temp = TempDir::new().unwrap();
    let mut options = HeadlessOptions::new(write_fixture(temp.path()));
    options.settings.discovery.max_requests = 2;

    let output = run_headless(options).await.unwrap();
    assert!(output.contains("partial"), "{output}");
    assert!(output.contains("1 listings"), "{output}");
}

#[tokio::test]
async fn test_missing_fixture_is_an_error() {
    let temp = TempDir::new().unwrap();
    let options = HeadlessOptions::new(temp.path().join("absent.json"));

    let err = run_headless(options).await.unwrap_err();
    assert!(err.to_string().contains("absent.json"));
}

#[tokio::test]
async fn test_periodic_refresh_does_not_hold_the_run_open() {
    let temp = TempDir::new().unwrap();
    let mut options = HeadlessOptions::new(write_fixture(temp.path()));
    options.settings.ui.refresh_interval_secs = 60;
    options.latency = std::time::Duration::from_millis(5);

    let output = tokio::time::timeout(std::time::Duration::from_secs(10), run_headless(options))
        .await
        .expect("headless run should finish after the first discovery")
        .unwrap();
    assert!(output.contains("3 secrets, 2 listings"), "{output}");
}
