//! Schema loader scenarios against real files.

use std::path::Path;

use gate::{
    file::{Mode, ScopedFile},
    schema::load_schema,
};
use serde_json::Value;

mod fixture;

#[test]
fn nonexistent_path_is_absent() {
    fixture::init_logging();
    assert!(load_schema(Path::new("/nonexistent/message.schema.json")).is_none());
}

#[test]
fn invalid_json_is_absent() {
    fixture::init_logging();
    let path = fixture::write_temp_file("bad-json", "{ not json at all");
    assert!(load_schema(&path).is_none());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn non_schema_document_is_absent() {
    fixture::init_logging();
    let path = fixture::write_temp_file("bad-schema", r#"{"type": "definitely-not-a-type"}"#);
    assert!(load_schema(&path).is_none());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn valid_schema_accepts_its_declared_examples() {
    fixture::init_logging();

    // Write the schema file through the scoped resource itself.
    let path = fixture::write_temp_file("good-schema", "");
    {
        let mut file = ScopedFile::acquire(&path, Mode::Write).unwrap();
        file.write_all(fixture::MESSAGE_SCHEMA.as_bytes()).unwrap();
    }

    let schema = load_schema(&path).expect("Expected the schema to load");

    // Every document the schema declares as an example must validate.
    let document: Value = serde_json::from_str(fixture::MESSAGE_SCHEMA).unwrap();
    let examples = document["examples"].as_array().unwrap();
    assert!(!examples.is_empty());
    for example in examples {
        schema
            .check(example)
            .unwrap_or_else(|e| panic!("Example {example} should validate: {e}"));
    }

    let _ = std::fs::remove_file(&path);
}

#[test]
fn schema_rejects_non_conforming_document() {
    fixture::init_logging();
    let path = fixture::write_temp_file("schema", fixture::MESSAGE_SCHEMA);
    let schema = load_schema(&path).expect("Expected the schema to load");

    let bad: Value = serde_json::from_str(r#"{"type": 42}"#).unwrap();
    assert!(schema.check(&bad).is_err());

    let _ = std::fs::remove_file(&path);
}
