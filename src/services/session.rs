//! Diagnostic session state machine and async driver
//!
//! The session progresses through four phases per (member, module) pair:
//! NoResult → Loading → Ready / Failed. Selecting a module or member always
//! returns to NoResult and supersedes any in-flight submission. Every
//! request is tagged with a `RequestToken` at issue time and compared
//! against the session's latest token at resolution time; mismatches are
//! silently dropped so a stale response is never observable.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::models::member::Member;
use crate::models::module::{ModuleCatalog, ModuleKind};
use crate::models::payload::{self, RawForm};
use crate::models::prediction::PredictionResult;
use crate::services::prediction_client::PredictionClient;

/// Transition broadcast channel capacity
const TRANSITION_CHANNEL_CAPACITY: usize = 64;

/// Prediction phase of the session
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionPhase {
    /// No result for the current (member, module) pair
    NoResult,
    /// A submission is in flight
    Loading,
    /// The current result
    Ready(PredictionResult),
    /// The last submission failed; user must resubmit
    Failed(String),
}

impl PredictionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            PredictionPhase::NoResult => "no_result",
            PredictionPhase::Loading => "loading",
            PredictionPhase::Ready(_) => "ready",
            PredictionPhase::Failed(_) => "failed",
        }
    }
}

/// Generation token identifying one submission under one selection
///
/// Captured when a request is issued; a response whose token no longer
/// matches the session's current token belongs to a superseded selection
/// and is dropped on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    pub module: ModuleKind,
    pub member_id: Uuid,
    pub seq: u64,
}

/// Session state transition, broadcast to subscribers
#[derive(Debug, Clone)]
pub struct Transition {
    pub token: RequestToken,
    pub old_phase: &'static str,
    pub new_phase: &'static str,
    pub transitioned_at: DateTime<Utc>,
}

/// Events the session state machine reduces over
#[derive(Debug, Clone)]
pub enum SessionEvent {
    ModuleSelected(ModuleKind),
    MemberSelected(Uuid),
    MemberAdded(Member),
    SubmissionStarted,
    SubmissionCompleted {
        token: RequestToken,
        result: PredictionResult,
    },
    SubmissionFailed {
        token: RequestToken,
        message: String,
    },
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::ModuleSelected(_) => "module_selected",
            SessionEvent::MemberSelected(_) => "member_selected",
            SessionEvent::MemberAdded(_) => "member_added",
            SessionEvent::SubmissionStarted => "submission_started",
            SessionEvent::SubmissionCompleted { .. } => "submission_completed",
            SessionEvent::SubmissionFailed { .. } => "submission_failed",
        }
    }
}

/// Session state: active member, active module, current prediction phase,
/// and the submission sequence counter backing the generation token
#[derive(Debug)]
pub struct SessionState {
    members: Vec<Member>,
    active_member_id: Uuid,
    active_module: ModuleKind,
    phase: PredictionPhase,
    seq: u64,
}

impl SessionState {
    pub fn new(initial_member: Member) -> Self {
        Self {
            active_member_id: initial_member.member_id,
            members: vec![initial_member],
            active_module: ModuleKind::Cardio,
            phase: PredictionPhase::NoResult,
            seq: 0,
        }
    }

    /// Token identifying the current (module, member, sequence) selection
    pub fn token(&self) -> RequestToken {
        RequestToken {
            module: self.active_module,
            member_id: self.active_member_id,
            seq: self.seq,
        }
    }

    pub fn active_module(&self) -> ModuleKind {
        self.active_module
    }

    pub fn active_member(&self) -> &Member {
        self.members
            .iter()
            .find(|m| m.member_id == self.active_member_id)
            .expect("active member is always in the roster")
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn phase(&self) -> &PredictionPhase {
        &self.phase
    }

    pub fn current_result(&self) -> Option<&PredictionResult> {
        match &self.phase {
            PredictionPhase::Ready(result) => Some(result),
            _ => None,
        }
    }

    /// Reduce one event into the state
    ///
    /// Returns the resulting transition, or `None` when the event was
    /// dropped (stale token, or a selection that names an unknown member).
    pub fn apply(&mut self, event: SessionEvent) -> Option<Transition> {
        let old_phase = self.phase.name();
        let event_name = event.name();

        match event {
            SessionEvent::ModuleSelected(kind) => {
                self.active_module = kind;
                self.invalidate();
            }
            SessionEvent::MemberSelected(member_id) => {
                if !self.members.iter().any(|m| m.member_id == member_id) {
                    tracing::debug!(%member_id, "Dropping selection of unknown member");
                    return None;
                }
                self.active_member_id = member_id;
                self.invalidate();
            }
            SessionEvent::MemberAdded(member) => {
                self.active_member_id = member.member_id;
                self.members.push(member);
                self.invalidate();
            }
            SessionEvent::SubmissionStarted => {
                self.seq += 1;
                self.phase = PredictionPhase::Loading;
            }
            SessionEvent::SubmissionCompleted { token, result } => {
                if token != self.token() {
                    tracing::debug!(
                        seq = token.seq,
                        current_seq = self.seq,
                        "Dropping stale submission result"
                    );
                    return None;
                }
                self.phase = PredictionPhase::Ready(result);
            }
            SessionEvent::SubmissionFailed { token, message } => {
                if token != self.token() {
                    tracing::debug!(
                        seq = token.seq,
                        current_seq = self.seq,
                        "Dropping stale submission failure"
                    );
                    return None;
                }
                self.phase = PredictionPhase::Failed(message);
            }
        }

        let transition = Transition {
            token: self.token(),
            old_phase,
            new_phase: self.phase.name(),
            transitioned_at: Utc::now(),
        };

        tracing::debug!(
            event = event_name,
            old_phase = transition.old_phase,
            new_phase = transition.new_phase,
            "Session transition"
        );

        Some(transition)
    }

    /// Discard the current result and supersede any in-flight submission
    fn invalidate(&mut self) {
        self.seq += 1;
        self.phase = PredictionPhase::NoResult;
    }
}

/// Async driver for one diagnostic session
///
/// Owns the session state behind a shared handle, the scoring client, and
/// the transition broadcast. All mutation flows through `SessionState::apply`.
pub struct DiagnosticSession {
    state: Arc<Mutex<SessionState>>,
    client: PredictionClient,
    transitions: broadcast::Sender<Transition>,
}

impl DiagnosticSession {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = PredictionClient::new(&config.api_base_url)?;
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);

        Ok(Self {
            state: Arc::new(Mutex::new(SessionState::new(Member::new("Guest")))),
            client,
            transitions,
        })
    }

    /// Subscribe to session transitions (for a presentation layer)
    pub fn subscribe(&self) -> broadcast::Receiver<Transition> {
        self.transitions.subscribe()
    }

    /// Shared handle to the session state, for collaborators that must
    /// validate generation tokens at resolution time
    pub fn state_handle(&self) -> Arc<Mutex<SessionState>> {
        Arc::clone(&self.state)
    }

    pub async fn select_module(&self, kind: ModuleKind) {
        let mut state = self.state.lock().await;
        self.reduce(&mut state, SessionEvent::ModuleSelected(kind));
    }

    pub async fn select_member(&self, member_id: Uuid) {
        let mut state = self.state.lock().await;
        self.reduce(&mut state, SessionEvent::MemberSelected(member_id));
    }

    /// Create a member and make it active
    pub async fn add_member(&self, name: impl Into<String>) -> Member {
        let member = Member::new(name);
        let mut state = self.state.lock().await;
        self.reduce(&mut state, SessionEvent::MemberAdded(member.clone()));
        member
    }

    pub async fn active_module(&self) -> ModuleKind {
        self.state.lock().await.active_module()
    }

    pub async fn active_member(&self) -> Member {
        self.state.lock().await.active_member().clone()
    }

    pub async fn members(&self) -> Vec<Member> {
        self.state.lock().await.members().to_vec()
    }

    pub async fn phase(&self) -> PredictionPhase {
        self.state.lock().await.phase().clone()
    }

    pub async fn current_result(&self) -> Option<PredictionResult> {
        self.state.lock().await.current_result().cloned()
    }

    /// Build the payload for the active module and run the submission
    ///
    /// `InvalidPayload` surfaces before any network call and leaves the
    /// state machine untouched. The completion is applied under the token
    /// captured at issue time, so a submission superseded by a module or
    /// member switch resolves into a dropped event rather than a visible
    /// result.
    pub async fn submit_form(&self, form: &RawForm) -> Result<()> {
        let (module, submission, token) = {
            let mut state = self.state.lock().await;
            let module = ModuleCatalog::lookup(state.active_module());
            let submission = payload::build(module, form)?;
            self.reduce(&mut state, SessionEvent::SubmissionStarted);
            (module, submission, state.token())
        };

        tracing::info!(
            module = %module.kind,
            seq = token.seq,
            "Submission started"
        );

        match self.client.submit(module, &submission).await {
            Ok(result) => {
                let mut state = self.state.lock().await;
                self.reduce(&mut state, SessionEvent::SubmissionCompleted { token, result });
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                let mut state = self.state.lock().await;
                self.reduce(&mut state, SessionEvent::SubmissionFailed { token, message });
                Err(e)
            }
        }
    }

    fn reduce(&self, state: &mut SessionState, event: SessionEvent) {
        if let Some(transition) = state.apply(event) {
            // Send fails only when no subscriber is listening
            let _ = self.transitions.send(transition);
        }
    }
}
