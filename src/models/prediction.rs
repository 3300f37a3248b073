//! Prediction result and factor explanation types
//!
//! Wire shapes for the scoring service's result and explanation responses,
//! and the merged result the session stores. At most one `PredictionResult`
//! is live per session; it is only valid for the module and member that
//! produced it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::module::ModuleKind;

/// Effect direction of a contributing factor, as reported by the scoring
/// service's explainer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increases,
    Decreases,
}

/// One ranked contributing factor; ordering is significant (rank by
/// contribution) and preserved as received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorExplanation {
    pub feature: String,
    pub impact: Direction,
}

/// Result response body shared by all module result endpoints
///
/// Modules differ in which fields they populate: cardio and diabetes return
/// `risk_probability` + `risk_category`, IPF returns `risk_probability` +
/// `prediction`, CBC returns whatever subset its analyzer computed.
#[derive(Debug, Clone, Deserialize)]
pub struct ResultBody {
    pub risk_probability: Option<f64>,
    pub risk_category: Option<String>,
    pub prediction: Option<Value>,
}

/// Explanation response body: `explanations.top_factors[]`
#[derive(Debug, Clone, Deserialize)]
pub struct ExplanationBody {
    pub explanations: Option<ExplanationSet>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplanationSet {
    #[serde(default)]
    pub top_factors: Vec<FactorExplanation>,
}

/// Merged prediction result stored by the session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    /// Module that produced this result
    pub module: ModuleKind,
    /// Risk probability in [0, 1]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_probability: Option<f64>,
    /// Categorical risk label from the scoring service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_category: Option<String>,
    /// Categorical prediction label (e.g. "IPF" / "Normal")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<Value>,
    /// Ranked contributing factors; empty when the explanation call was
    /// skipped or failed
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explanations: Vec<FactorExplanation>,
}

impl PredictionResult {
    /// Build the base result from the mandatory result call's body
    pub fn from_wire(module: ModuleKind, body: ResultBody) -> Self {
        Self {
            module,
            risk_probability: body.risk_probability,
            risk_category: body.risk_category,
            prediction: body.prediction,
            explanations: Vec::new(),
        }
    }

    /// Attach explanations from the best-effort explanation call, preserving
    /// server-provided ordering; an empty list leaves the result unchanged
    pub fn attach_explanations(&mut self, factors: Vec<FactorExplanation>) {
        if !factors.is_empty() {
            self.explanations = factors;
        }
    }

    /// Prediction label rendered for display
    pub fn prediction_label(&self) -> Option<String> {
        self.prediction.as_ref().map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Probability band used by the scoring service; mirrored locally only for
/// display when the server omits `risk_category`
pub fn risk_band(probability: f64) -> &'static str {
    if probability < 0.3 {
        "Low"
    } else if probability < 0.7 {
        "Medium"
    } else {
        "High"
    }
}
