//! FedHealth diagnostic client
//!
//! Client-side orchestrator for diagnostic sessions against a remote
//! clinical scoring service: module selection, payload normalization, the
//! mandatory-result / best-effort-explanation call sequence, session state
//! transitions, and staleness guarantees across module and member switches.
//!
//! The session state machine lives in [`services::session`]; network
//! collaborators are [`services::prediction_client`], [`services::report`],
//! and [`services::chat`].

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use crate::config::ClientConfig;
pub use crate::error::{Error, Result};
pub use crate::models::{Member, ModuleCatalog, ModuleKind, PredictionResult, RawForm};
pub use crate::services::{
    DiagnosticSession, PredictionPhase, ReportOrchestrator, ReportPhase, RequestToken,
};
