//! Scoring service client
//!
//! Executes the network calls for one module submission: the mandatory
//! result call, then the optional best-effort explanation call, merged into
//! a single `PredictionResult`.

use std::time::Duration;

use crate::error::{Error, Result};
use crate::models::module::Module;
use crate::models::payload::SubmissionPayload;
use crate::models::prediction::{ExplanationBody, FactorExplanation, PredictionResult, ResultBody};

const USER_AGENT: &str = concat!("fedhealth-client/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP client for the remote scoring service
pub struct PredictionClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl PredictionClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
        })
    }

    /// Submit a payload to a module's scoring endpoints
    ///
    /// The result call is fail-fast: any network error or non-success status
    /// fails the whole submission and the explanation call is never issued.
    /// The explanation call is best-effort: its failure is logged and
    /// swallowed, and the base result is returned without explanations.
    pub async fn submit(
        &self,
        module: &Module,
        payload: &SubmissionPayload,
    ) -> Result<PredictionResult> {
        let url = format!("{}{}", self.base_url, module.result_path);

        tracing::debug!(module = %module.kind, url = %url, "Submitting prediction request");

        let response = self
            .http_client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::PredictionFailed(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::PredictionFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let body: ResultBody = response
            .json()
            .await
            .map_err(|e| Error::PredictionFailed(e.to_string()))?;

        let mut result = PredictionResult::from_wire(module.kind, body);

        if let Some(explanation_path) = module.explanation_path {
            match self.fetch_explanations(explanation_path, payload).await {
                Ok(factors) => result.attach_explanations(factors),
                Err(e) => {
                    // Best-effort: the submission already has its result
                    tracing::warn!(
                        module = %module.kind,
                        error = %e,
                        "Explanation call failed, returning result without explanations"
                    );
                }
            }
        }

        tracing::info!(
            module = %module.kind,
            risk_probability = ?result.risk_probability,
            risk_category = ?result.risk_category,
            explanations = result.explanations.len(),
            "Prediction received"
        );

        Ok(result)
    }

    async fn fetch_explanations(
        &self,
        explanation_path: &str,
        payload: &SubmissionPayload,
    ) -> Result<Vec<FactorExplanation>> {
        let url = format!("{}{}", self.base_url, explanation_path);

        tracing::debug!(url = %url, "Fetching explanations");

        let response = self
            .http_client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| Error::PredictionFailed(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            return Err(Error::PredictionFailed(format!("HTTP {}", status.as_u16())));
        }

        let body: ExplanationBody = response
            .json()
            .await
            .map_err(|e| Error::PredictionFailed(e.to_string()))?;

        Ok(body
            .explanations
            .map(|set| set.top_factors)
            .unwrap_or_default())
    }
}
