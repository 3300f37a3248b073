//! Narrative report orchestration
//!
//! On-demand secondary flow: captures a snapshot of the current prediction,
//! requests a narrative report, and tracks its own loading/error state
//! independently of the session's prediction phase. The report is never
//! written into the session's result slot, and a response that arrives after
//! the session has moved on is discarded, not displayed.

use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::services::session::{PredictionPhase, SessionState};

const USER_AGENT: &str = concat!("fedhealth-client/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;
const REPORT_PATH: &str = "/generate_report";

/// Report sub-state, independent of the session's prediction phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportPhase {
    /// No report requested for the current result
    Idle,
    /// A report request is in flight
    Loading,
    /// Narrative report text
    Ready(String),
    /// Report generation failed; the prediction it was requested for is
    /// still valid
    Failed(String),
}

#[derive(Debug, Deserialize)]
struct ReportBody {
    report: String,
}

/// Orchestrates report generation against the shared session state
pub struct ReportOrchestrator {
    http_client: reqwest::Client,
    base_url: String,
    session: Arc<Mutex<SessionState>>,
    phase: Arc<Mutex<ReportPhase>>,
}

impl ReportOrchestrator {
    pub fn new(base_url: impl Into<String>, session: Arc<Mutex<SessionState>>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into(),
            session,
            phase: Arc::new(Mutex::new(ReportPhase::Idle)),
        })
    }

    pub async fn phase(&self) -> ReportPhase {
        self.phase.lock().await.clone()
    }

    /// Generate a narrative report for the session's current result
    ///
    /// Only meaningful while the session is `Ready`. Re-invoking while a
    /// request is already in flight is a no-op, so at most one report
    /// request is outstanding per orchestrator. If the session transitions
    /// away before the response arrives, the response is discarded and the
    /// sub-state returns to `Idle`.
    pub async fn generate(&self) -> Result<()> {
        // Snapshot the result and the generation token under the lock
        let (snapshot, token) = {
            let session = self.session.lock().await;
            match session.phase() {
                PredictionPhase::Ready(result) => (result.clone(), session.token()),
                other => {
                    return Err(Error::ReportFailed(format!(
                        "no prediction available (session is {})",
                        other.name()
                    )))
                }
            }
        };

        {
            let mut phase = self.phase.lock().await;
            if *phase == ReportPhase::Loading {
                tracing::debug!("Report request already in flight, ignoring");
                return Ok(());
            }
            *phase = ReportPhase::Loading;
        }

        // Snapshot serializes with its module tag; the context strings
        // identify the module for the report writer
        let module = snapshot.module;
        let body = json!({
            "prediction": snapshot,
            "symptoms": [
                format!("Analyzed via {} module", module),
                "Clinical data provided",
            ],
        });

        tracing::info!(%module, seq = token.seq, "Report generation started");

        let outcome = self.request_report(&body).await;

        // Resolution-time staleness check: the session must still hold the
        // same (module, member, sequence) the snapshot was taken under
        let still_current = {
            let session = self.session.lock().await;
            session.token() == token
        };

        let mut phase = self.phase.lock().await;

        if !still_current {
            tracing::debug!(seq = token.seq, "Discarding report for superseded session state");
            *phase = ReportPhase::Idle;
            return Ok(());
        }

        match outcome {
            Ok(text) => {
                tracing::info!(chars = text.len(), "Report generated");
                *phase = ReportPhase::Ready(text);
                Ok(())
            }
            Err(e) => {
                *phase = ReportPhase::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Clear the report sub-state (e.g. when the presentation layer closes
    /// the report view)
    pub async fn reset(&self) {
        *self.phase.lock().await = ReportPhase::Idle;
    }

    async fn request_report(&self, body: &serde_json::Value) -> Result<String> {
        let url = format!("{}{}", self.base_url, REPORT_PATH);

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::ReportFailed(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::ReportFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_text
            )));
        }

        let body: ReportBody = response
            .json()
            .await
            .map_err(|e| Error::ReportFailed(e.to_string()))?;

        Ok(body.report)
    }
}
