use assert_cmd::Command;

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("cocotile").unwrap();
    cmd.assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("cocotile").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("cocotile 0.1.0\n");
}

// New subcommand tests

#[test]
fn new_creates_empty_document_at_version_zero() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("dataset.json");

    let mut cmd = Command::cargo_bin("cocotile").unwrap();
    cmd.args([
        "new",
        json_path.to_str().unwrap(),
        "--description",
        "test run",
        "--contributor",
        "tester",
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Created new dataset"));

    let text = std::fs::read_to_string(&json_path).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc["info"]["version"], "0.0.0");
    assert_eq!(doc["info"]["description"], "test run");
    assert_eq!(doc["images"].as_array().unwrap().len(), 0);
}

// Copy subcommand tests

#[test]
fn copy_preserves_document() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("copy.json");

    let mut cmd = Command::cargo_bin("cocotile").unwrap();
    cmd.args([
        "copy",
        "tests/fixtures/sample_valid.json",
        dest.to_str().unwrap(),
    ]);
    cmd.assert().success();

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&dest).unwrap()).unwrap();
    assert_eq!(doc["info"]["version"], "1.2.0");
    assert_eq!(doc["annotations"].as_array().unwrap().len(), 2);
}

#[test]
fn copy_updates_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("copy.json");

    let mut cmd = Command::cargo_bin("cocotile").unwrap();
    cmd.args([
        "copy",
        "tests/fixtures/sample_valid.json",
        dest.to_str().unwrap(),
        "--set-version",
        "2.0.0",
        "--contributor",
        "new team",
    ]);
    cmd.assert().success();

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&dest).unwrap()).unwrap();
    assert_eq!(doc["info"]["version"], "2.0.0");
    assert_eq!(doc["info"]["contributor"], "new team");
    // metadata updates refresh the timestamp
    assert_ne!(doc["info"]["date_created"], "2024-03-18T09:30:00+00:00");
}

#[test]
fn copy_rejects_malformed_version() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("copy.json");

    let mut cmd = Command::cargo_bin("cocotile").unwrap();
    cmd.args([
        "copy",
        "tests/fixtures/sample_valid.json",
        dest.to_str().unwrap(),
        "--set-version",
        "not-a-version",
    ]);
    cmd.assert().failure();
    assert!(!dest.exists());
}

// Validate subcommand tests

#[test]
fn validate_valid_dataset_succeeds() {
    let mut cmd = Command::cargo_bin("cocotile").unwrap();
    cmd.args(["validate", "tests/fixtures/sample_valid.json"]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("Validation passed"));
}

#[test]
fn validate_invalid_dataset_fails() {
    let mut cmd = Command::cargo_bin("cocotile").unwrap();
    cmd.args(["validate", "tests/fixtures/sample_invalid.json"]);
    cmd.assert()
        .failure()
        .stdout(predicates::str::contains("error(s)"));
}

#[test]
fn validate_reports_duplicate_ids() {
    let mut cmd = Command::cargo_bin("cocotile").unwrap();
    cmd.args(["validate", "tests/fixtures/sample_invalid.json"]);
    cmd.assert()
        .failure()
        .stdout(predicates::str::contains("DuplicateImageId"));
}

#[test]
fn validate_reports_missing_refs() {
    let mut cmd = Command::cargo_bin("cocotile").unwrap();
    cmd.args(["validate", "tests/fixtures/sample_invalid.json"]);
    cmd.assert()
        .failure()
        .stdout(predicates::str::contains("MissingImageRef"))
        .stdout(predicates::str::contains("MissingCategoryRef"))
        .stdout(predicates::str::contains("MissingSourceRef"));
}

#[test]
fn validate_reports_malformed_version() {
    let mut cmd = Command::cargo_bin("cocotile").unwrap();
    cmd.args(["validate", "tests/fixtures/sample_invalid.json"]);
    cmd.assert()
        .failure()
        .stdout(predicates::str::contains("InvalidVersion"));
}

#[test]
fn validate_json_output_format() {
    let mut cmd = Command::cargo_bin("cocotile").unwrap();
    cmd.args([
        "validate",
        "tests/fixtures/sample_valid.json",
        "--output",
        "json",
    ]);
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"error_count\": 0"))
        .stdout(predicates::str::contains("\"warning_count\": 0"));
}

#[test]
fn validate_strict_escalates_warnings() {
    let mut cmd = Command::cargo_bin("cocotile").unwrap();
    cmd.args(["validate", "tests/fixtures/sample_warnings.json"]);
    cmd.assert().success();

    let mut cmd = Command::cargo_bin("cocotile").unwrap();
    cmd.args([
        "validate",
        "tests/fixtures/sample_warnings.json",
        "--strict",
    ]);
    cmd.assert().failure();
}

#[test]
fn validate_nonexistent_file_fails() {
    let mut cmd = Command::cargo_bin("cocotile").unwrap();
    cmd.args(["validate", "nonexistent_file.json"]);
    cmd.assert().failure();
}
