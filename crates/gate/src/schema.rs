//! Schema loading and compilation.
//!
//! A [`Schema`] is a compiled, immutable specification of which JSON
//! structures are valid protocol messages. It is built once at startup from a
//! schema definition file and reused for every inbound message. Loading is
//! all-or-nothing: any failure yields an absent result with a diagnostic,
//! never a fallback or partially compiled schema.

use std::path::Path;

use jsonschema::Validator;
use serde_json::Value;

use crate::file::{Mode, ScopedFile};
use crate::{parse_document, GateError};

/// A compiled JSON Schema. Immutable after construction and reusable across
/// any number of validations.
pub struct Schema {
    validator: Validator,
}

impl Schema {
    /// Compile a parsed JSON Schema document.
    pub fn compile(document: &Value) -> Option<Schema> {
        match jsonschema::validator_for(document) {
            Ok(validator) => Some(Schema { validator }),
            Err(e) => {
                log::error!("Schema failed to compile: {e}");
                None
            }
        }
    }

    /// Check one parsed document against the schema, reporting the first
    /// violation as schema pointer, failing keyword, and document pointer.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::InvalidDocument`] describing the violation.
    pub fn check(&self, document: &Value) -> Result<(), GateError> {
        match self.validator.iter_errors(document).next() {
            None => Ok(()),
            Some(err) => {
                let schema_pointer = err.schema_path().to_string();
                // The violated keyword anchors the last segment of the
                // schema pointer.
                let keyword = schema_pointer
                    .rsplit('/')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                Err(GateError::InvalidDocument {
                    schema_pointer,
                    keyword,
                    document_pointer: err.instance_path().to_string(),
                })
            }
        }
    }
}

/// Load and compile a schema definition file.
///
/// Returns `None` if the file cannot be opened or read, if its content is not
/// valid JSON, or if the document does not compile as a schema. Nothing is
/// raised to the caller beyond the absent result.
pub fn load_schema(path: &Path) -> Option<Schema> {
    let mut file = match ScopedFile::acquire(path, Mode::Read) {
        Ok(file) => file,
        Err(e) => {
            log::error!("Cannot open schema file {}: {e}", path.display());
            return None;
        }
    };
    let buf = match file.read_all() {
        Ok(buf) => buf,
        Err(e) => {
            log::error!("Cannot read schema file {}: {e}", path.display());
            return None;
        }
    };
    let document = match parse_document(&buf) {
        Ok(document) => document,
        Err(e) => {
            log::error!("Schema file {} is not valid JSON. {e}", path.display());
            return None;
        }
    };
    Schema::compile(&document)
}
