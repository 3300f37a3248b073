//! Submission payload construction
//!
//! Per-module transform from raw form state to the wire payload expected by
//! the scoring service. Numeric fields are coerced from text, categoricals
//! pass through as strings, and cardio converts age from years to days before
//! transmission. A missing or unparseable required field fails with
//! `Error::InvalidPayload` before any network call.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::models::module::{FieldKind, Module, ModuleKind};

/// Days per year used by the scoring service's cardio model
const DAYS_PER_YEAR: f64 = 365.0;

/// Raw form state: field name to raw text value
pub type RawForm = BTreeMap<String, String>;

/// Wire payload for one submission; transient, exists only for the duration
/// of one submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionPayload(Map<String, Value>);

impl SubmissionPayload {
    /// Field value as sent on the wire
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }
}

/// Build the wire payload for a module from raw form state
pub fn build(module: &Module, form: &RawForm) -> Result<SubmissionPayload> {
    let mut payload = Map::with_capacity(module.fields.len());

    for field in module.fields {
        let raw = form
            .get(field.name)
            .ok_or_else(|| Error::InvalidPayload(field.name.to_string()))?;

        let value = match field.kind {
            FieldKind::Numeric => {
                let mut number: f64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| Error::InvalidPayload(field.name.to_string()))?;
                // Cardio model is trained on age in days; the form supplies years
                if module.kind == ModuleKind::Cardio && field.name == "age" {
                    number *= DAYS_PER_YEAR;
                }
                number_value(number)
            }
            FieldKind::Categorical => Value::String(raw.clone()),
        };

        payload.insert(field.name.to_string(), value);
    }

    Ok(SubmissionPayload(payload))
}

/// Integral values are sent as JSON integers so strict schemas accept them
fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Value::from(n)
    }
}
