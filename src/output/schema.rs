//! JSON Schema for the run summary.
//!
//! The schema and its compiled validator are built once per process.

use std::sync::LazyLock;

use jsonschema::Validator;
use schemars::schema_for;
use serde_json::Value;

use super::types::RunSummary;
use crate::error::{ItdError, Result};

static SCHEMA: LazyLock<Value> = LazyLock::new(|| schema_for!(RunSummary).to_value());

static VALIDATOR: LazyLock<std::result::Result<Validator, String>> =
    LazyLock::new(|| jsonschema::validator_for(&SCHEMA).map_err(|e| e.to_string()));

/// Pretty-printed schema, as printed by the `schema` subcommand
pub fn schema_json_pretty() -> String {
    format!("{:#}", *SCHEMA)
}

/// Whether summaries are checked before writing: always in debug builds,
/// otherwise only with `FGFR1_ITD_VALIDATE_OUTPUT=1` (or `true`).
pub fn enabled() -> bool {
    cfg!(debug_assertions)
        || std::env::var("FGFR1_ITD_VALIDATE_OUTPUT")
            .is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

pub fn validate(summary: &RunSummary) -> Result<()> {
    let value = serde_json::to_value(summary).map_err(|e| ItdError::Schema(e.to_string()))?;
    validate_value(&value)
}

/// Check an arbitrary JSON value, collecting every violation into one error.
pub fn validate_value(value: &Value) -> Result<()> {
    let validator = VALIDATOR
        .as_ref()
        .map_err(|e| ItdError::Schema(format!("schema did not compile: {}", e)))?;

    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|e| format!("{}: {}", e.instance_path, e))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ItdError::Schema(errors.join("; ")))
    }
}
