//! Session orchestration and remote service clients

pub mod chat;
pub mod prediction_client;
pub mod report;
pub mod session;

pub use chat::{ChatClient, ChatTurn};
pub use prediction_client::PredictionClient;
pub use report::{ReportOrchestrator, ReportPhase};
pub use session::{
    DiagnosticSession, PredictionPhase, RequestToken, SessionEvent, SessionState, Transition,
};
