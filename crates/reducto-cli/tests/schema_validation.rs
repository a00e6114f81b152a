#![cfg(unix)]

use assert_cmd::cargo::cargo_bin_cmd;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn repo_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn load_schema() -> JSONSchema {
    let schema_path = repo_root().join("schemas").join("reducto-report.schema.json");
    let schema_text = fs::read_to_string(schema_path).expect("read schema");
    let schema_json: Value = serde_json::from_str(&schema_text).expect("parse schema");
    JSONSchema::compile(&schema_json).expect("compile schema")
}

fn prepare(dir: &Path, test_script: &str) {
    fs::write(
        dir.join("Sample.java"),
        "class SampleTest {\n    @Test\n    void repro() {\n        int a = 1;\n        int boom = a;\n        check(boom);\n    }\n}\n",
    )
    .expect("write container");
    fs::write(dir.join("pom.xml"), "<project/>\n").expect("write project");
    fs::write(
        dir.join("reducto.yaml"),
        format!("test:\n  cmd: [\"sh\", \"-c\", {test_script:?}]\n"),
    )
    .expect("write config");
}

fn run_json(dir: &Path, extra: &[&str]) -> Value {
    let output = cargo_bin_cmd!("reducto")
        .current_dir(dir)
        .args(["Sample.java", "repro", "pom.xml", "--config", "reducto.yaml", "--no-build"])
        .args(extra)
        .output()
        .expect("run reducto");
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    serde_json::from_str(&stdout).expect("parse json")
}

fn assert_valid(schema: &JSONSchema, actual: &Value) {
    if let Err(errors) = schema.validate(actual) {
        let details: Vec<String> = errors.map(|err| err.to_string()).collect();
        panic!("report does not match schema:\n{}", details.join("\n"));
    }
}

#[test]
fn schema_minimized_report() {
    let schema = load_schema();
    let temp = TempDir::new().expect("tmp dir");
    prepare(temp.path(), "if grep -q 'int boom' '{container}'; then exit 1; fi");

    let actual = run_json(temp.path(), &["out", "--timeout-ms", "60000"]);

    assert_valid(&schema, &actual);
    assert_eq!(actual["status"], "minimized");
    assert_eq!(actual["invocation"]["timeout_ms"], 60000);
    assert_eq!(actual["invocation"]["build"], false);
}

#[test]
fn schema_not_reproducible_report() {
    let schema = load_schema();
    let temp = TempDir::new().expect("tmp dir");
    prepare(temp.path(), "exit 0");

    let actual = run_json(temp.path(), &[]);

    assert_valid(&schema, &actual);
    assert_eq!(actual["status"], "not_reproducible");
    assert_eq!(actual["result"]["written"]["simplified"], Value::Null);
}

#[test]
fn schema_rejects_unknown_status() {
    let schema = load_schema();
    let temp = TempDir::new().expect("tmp dir");
    prepare(temp.path(), "exit 0");

    let mut actual = run_json(temp.path(), &["--skip-initial-check"]);
    assert_valid(&schema, &actual);
    actual["status"] = Value::String("pass".to_string());

    assert!(schema.validate(&actual).is_err());
}
