//! Validates the fixture presentations against the formal presentation
//! schema at schema/presentation-schema.json, and checks that the valid
//! ones compile.

use formc_core::{compile_json, CompileOptions};
use std::path::{Path, PathBuf};

fn workspace_file(rel: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..").join(rel)
}

fn read_json(rel: &str) -> serde_json::Value {
    let path = workspace_file(rel);
    let src = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    serde_json::from_str(&src).unwrap()
}

fn validator() -> jsonschema::Validator {
    let schema = read_json("schema/presentation-schema.json");
    jsonschema::validator_for(&schema).unwrap_or_else(|e| panic!("Failed to compile schema: {}", e))
}

#[test]
fn fixture_presentation_is_valid() {
    let validator = validator();
    let doc = read_json("fixtures/presentation.json");
    let errors: Vec<String> = validator.iter_errors(&doc).map(|e| e.to_string()).collect();
    assert!(errors.is_empty(), "schema errors:\n{}", errors.join("\n"));
}

#[test]
fn conflicting_addressing_is_rejected_by_schema() {
    let validator = validator();
    let doc = read_json("fixtures/conflicting-presentation.json");
    assert!(!validator.is_valid(&doc));
}

#[test]
fn schema_valid_fixture_compiles() {
    let out = compile_json(
        &read_json("fixtures/entrance.json"),
        &[
            read_json("fixtures/address.json"),
            read_json("fixtures/contact.json"),
        ],
        &read_json("fixtures/presentation.json"),
        &read_json("fixtures/conditionals.json"),
        &[],
        &CompileOptions::default(),
    )
    .unwrap();
    let names: Vec<&str> = out.form.pages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["personal", "exam", "contact"]);
    assert_eq!(
        serde_json::to_value(&out.meta).unwrap()["contacts"]["_id"]["format"],
        "uuid"
    );
}
