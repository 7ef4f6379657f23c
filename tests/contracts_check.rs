#![cfg(unix)]

mod common;

use common::{serve_healthy, TestEnv};
use jsonschema::JSONSchema;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

fn load_schema(name: &str) -> Value {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let raw = fs::read_to_string(root.join("docs/contracts").join(name)).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn validate(schema_name: &str, data: &Value) {
    let schema = load_schema(schema_name);
    let validator = JSONSchema::compile(&schema).expect("compile schema");
    let msgs: Vec<String> = match validator.validate(data) {
        Ok(()) => return,
        Err(errors) => errors.map(|e| e.to_string()).collect(),
    };
    panic!("schema validation failed: {}", msgs.join(" | "));
}

#[test]
fn contracts_check() {
    let env = TestEnv::new();
    env.recording_tool("dev");
    env.recording_tool("ssh");
    env.write_nodes(&["127.0.0.1"]);

    let plan = env.run_json(&["release", "--dry-run"]);
    assert_eq!(plan["ok"], true);
    validate("plan.schema.json", &plan["data"]);

    let release = env.run_json(&["release"]);
    assert_eq!(release["ok"], true);
    validate("run-report.schema.json", &release["data"]);

    let http = serve_healthy();
    let port = http.port().to_string();
    let deploy = env.run_json(&["deploy", "0.0.44", "--port", &port]);
    assert_eq!(deploy["ok"], true);
    validate("deploy-report.schema.json", &deploy["data"]);
}

#[test]
fn error_envelope_contract() {
    let env = TestEnv::new();
    env.fake_tool("dev", "exit 1");

    let failed = env.run_json_failure(&["release"]);
    validate("error.schema.json", &failed);
    validate("run-report.schema.json", &failed["error"]["details"]);

    let missing = env.run_json_failure(&["deploy", "1.0.0", "nowhere"]);
    validate("error.schema.json", &missing);
}
