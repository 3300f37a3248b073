//! Clinical-risk module catalog
//!
//! Static registry mapping each module to its payload schema and scoring
//! endpoints. Defined once at process start; lookups are pure.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Clinical-risk module identifier
///
/// Wire tags match the scoring service: `cardio`, `diabetes`, `ipf`, `cbc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    Cardio,
    Diabetes,
    Ipf,
    Cbc,
}

impl ModuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::Cardio => "cardio",
            ModuleKind::Diabetes => "diabetes",
            ModuleKind::Ipf => "ipf",
            ModuleKind::Cbc => "cbc",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a form field is coerced before transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Coerced from text to a number; fails the payload on parse error
    Numeric,
    /// Passed through as a string
    Categorical,
}

/// One required field of a module's submission payload
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn numeric(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Numeric,
    }
}

const fn categorical(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Categorical,
    }
}

/// Module descriptor: endpoints and payload schema
///
/// Immutable; one per `ModuleKind`, defined at process start.
#[derive(Debug, Clone)]
pub struct Module {
    pub kind: ModuleKind,
    pub label: &'static str,
    /// Mandatory result call endpoint
    pub result_path: &'static str,
    /// Optional best-effort explanation call endpoint
    pub explanation_path: Option<&'static str>,
    /// Required fields, in wire order
    pub fields: &'static [FieldSpec],
}

const CARDIO_FIELDS: &[FieldSpec] = &[
    numeric("age"),
    numeric("gender"),
    numeric("height"),
    numeric("weight"),
    numeric("ap_hi"),
    numeric("ap_lo"),
    numeric("cholesterol"),
    numeric("gluc"),
    numeric("smoke"),
    numeric("alco"),
    numeric("active"),
];

const DIABETES_FIELDS: &[FieldSpec] = &[
    numeric("age"),
    categorical("gender"),
    numeric("hypertension"),
    numeric("heart_disease"),
    categorical("smoking_history"),
    numeric("bmi"),
    numeric("HbA1c_level"),
    numeric("blood_glucose_level"),
];

const IPF_FIELDS: &[FieldSpec] = &[
    numeric("age"),
    categorical("gender"),
    categorical("smoking_history"),
];

const CBC_FIELDS: &[FieldSpec] = &[
    categorical("sex"),
    numeric("wbc"),
    numeric("rbc"),
    numeric("hemoglobin"),
    numeric("hematocrit"),
    numeric("platelets"),
    numeric("mcv"),
    numeric("mch"),
    numeric("mchc"),
    numeric("rdw"),
];

static CATALOG: Lazy<Vec<Module>> = Lazy::new(|| {
    vec![
        Module {
            kind: ModuleKind::Cardio,
            label: "Cardio",
            result_path: "/predict/cardiovascular/result",
            explanation_path: Some("/predict/cardiovascular/explanation"),
            fields: CARDIO_FIELDS,
        },
        Module {
            kind: ModuleKind::Diabetes,
            label: "Diabetes",
            result_path: "/predict/diabetes",
            explanation_path: None,
            fields: DIABETES_FIELDS,
        },
        Module {
            kind: ModuleKind::Ipf,
            label: "Pulmonary",
            result_path: "/predict/idiopathic",
            explanation_path: None,
            fields: IPF_FIELDS,
        },
        Module {
            kind: ModuleKind::Cbc,
            label: "Blood",
            result_path: "/analyze_cbc",
            explanation_path: None,
            fields: CBC_FIELDS,
        },
    ]
});

/// Static module registry
pub struct ModuleCatalog;

impl ModuleCatalog {
    /// Look up a module descriptor by kind (infallible: every kind is
    /// registered)
    pub fn lookup(kind: ModuleKind) -> &'static Module {
        CATALOG
            .iter()
            .find(|m| m.kind == kind)
            .expect("every ModuleKind is registered in the catalog")
    }

    /// Look up a module descriptor by wire id
    pub fn lookup_id(id: &str) -> Result<&'static Module> {
        CATALOG
            .iter()
            .find(|m| m.kind.as_str() == id)
            .ok_or_else(|| Error::UnknownModule(id.to_string()))
    }

    /// All registered modules, in display order
    pub fn all() -> &'static [Module] {
        &CATALOG
    }
}
