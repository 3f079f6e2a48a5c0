//! Chat session: an explicit state updated only through [`SessionEvent`]s.
//!
//! [`SessionState::reduce`] is the single place the conversation, the
//! active agent, the system log and the hospital database change.
//! [`Session`] drives the reducer around a [`Mediator`] run and never
//! holds its lock across a model call.

use std::sync::Arc;

use medcoord_agents::HospitalDb;
use medcoord_agents::dashboard::{self, Dashboard};
use medcoord_common::{AgentKind, MedcoordError, Result, Turn, TurnRole};
use medcoord_llm::{ChatMessage, build_llm_client};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::{CoordinatorConfig, SessionConfig};
use crate::mediator::{Exchange, Mediator};

pub const WELCOME_MESSAGE: &str =
    "Sistem Rumah Sakit Terpadu aktif. Silakan masukkan kebutuhan Anda.";
pub const CONNECTION_ERROR_MESSAGE: &str =
    "Terjadi kesalahan koneksi dengan Koordinator Pusat.";
pub const MULTIPLE_DELEGATION_MESSAGE: &str = "Koordinator menerima lebih dari satu delegasi \
     dalam satu permintaan. Silakan ulangi dengan permintaan yang lebih spesifik.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Model unreachable, HTTP error or undecodable response
    Transport,
    MultipleToolCalls,
}

impl FailureKind {
    pub fn from_error(err: &MedcoordError) -> Self {
        match err {
            MedcoordError::MultipleToolCalls(_) => Self::MultipleToolCalls,
            _ => Self::Transport,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Transport => CONNECTION_ERROR_MESSAGE,
            Self::MultipleToolCalls => MULTIPLE_DELEGATION_MESSAGE,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SessionEvent {
    Submitted(Turn),
    Completed(Exchange),
    Failed(FailureKind),
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub turns: Vec<Turn>,
    pub active_agent: AgentKind,
    pub system_log: String,
    pub loading: bool,
    #[serde(skip)]
    pub db: HospitalDb,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(HospitalDb::seeded())
    }
}

impl SessionState {
    pub fn new(db: HospitalDb) -> Self {
        Self {
            turns: vec![Turn::system(AgentKind::Coordinator, WELCOME_MESSAGE)],
            active_agent: AgentKind::Coordinator,
            system_log: String::new(),
            loading: false,
            db,
        }
    }

    pub fn reduce(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Submitted(turn) => {
                self.turns.push(turn);
                self.loading = true;
                self.system_log.clear();
                self.active_agent = AgentKind::Coordinator;
            }
            SessionEvent::Completed(mut exchange) => {
                if let Some(record) = exchange.take_record() {
                    self.db.apply(record);
                }
                self.system_log = exchange.log().to_string();
                if let Some(run) = &exchange.tool {
                    self.turns
                        .push(Turn::tool_trace(run.outcome.agent, &run.outcome.output));
                    self.active_agent = exchange.agent;
                }
                self.turns.push(Turn::assistant(exchange.agent, exchange.reply));
                self.loading = false;
            }
            SessionEvent::Failed(kind) => {
                self.turns
                    .push(Turn::system(AgentKind::Coordinator, kind.message()));
                self.loading = false;
            }
        }
    }

    /// User and assistant turns as model messages, newest `window` only.
    ///
    /// System turns (welcome, tool traces, errors) are never sent. The
    /// window is trimmed further so it starts at a user turn.
    pub fn history(&self, window: usize) -> Vec<ChatMessage> {
        let messages: Vec<ChatMessage> = self
            .turns
            .iter()
            .filter_map(|turn| match turn.role {
                TurnRole::User => Some(ChatMessage::user(turn.content.clone())),
                TurnRole::Assistant => Some(ChatMessage::assistant(turn.content.clone())),
                TurnRole::System => None,
            })
            .collect();

        let start = messages.len().saturating_sub(window.max(1));
        let mut windowed = messages[start..].to_vec();
        let leading_assistant = windowed
            .iter()
            .take_while(|m| m.role != medcoord_llm::Role::User)
            .count();
        windowed.drain(..leading_assistant);
        windowed
    }
}

/// Turns produced by one submission.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub turns: Vec<Turn>,
    pub active_agent: AgentKind,
    pub system_log: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

/// Releases the session if a submission never reaches the reducer, as when
/// its task panics or is cancelled during a model call.
struct PendingSubmission<'a> {
    state: &'a RwLock<SessionState>,
    armed: bool,
}

impl PendingSubmission<'_> {
    fn finish(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.state.try_write() {
            Ok(mut state) => {
                warn!("Submission abandoned, releasing session");
                state.reduce(SessionEvent::Failed(FailureKind::Transport));
            }
            Err(_) => error!("Submission abandoned while session was locked"),
        }
    }
}

pub struct Session {
    state: RwLock<SessionState>,
    mediator: Mediator,
    config: SessionConfig,
}

impl Session {
    pub fn new(mediator: Mediator, config: SessionConfig) -> Self {
        Self::with_state(mediator, config, SessionState::default())
    }

    pub fn with_state(mediator: Mediator, config: SessionConfig, state: SessionState) -> Self {
        Self {
            state: RwLock::new(state),
            mediator,
            config,
        }
    }

    /// Build the model client from `config.provider` and start a fresh session.
    pub fn from_config(config: &CoordinatorConfig) -> Result<Self> {
        let client = build_llm_client(&config.provider)?;
        info!(
            provider = %config.provider.provider_type,
            model = %client.model_name(),
            history_window = config.session.history_window,
            "Initializing coordinator session"
        );
        let mediator = Mediator::new(Arc::clone(&client))
            .with_sampling(config.provider.temperature, config.provider.max_tokens);
        Ok(Self::new(mediator, config.session.clone()))
    }

    pub fn model_name(&self) -> &str {
        self.mediator.model_name()
    }

    /// Submit a user message and wait for the exchange to finish.
    ///
    /// Blank messages are refused with `EmptyMessage`, and a second
    /// submission while one is outstanding with `SessionBusy`. Model
    /// failures do not surface as `Err`: they are recorded as an error turn
    /// and reported in [`Reply::failure`].
    pub async fn submit(&self, content: &str) -> Result<Reply> {
        let content = content.trim();
        if content.is_empty() {
            return Err(MedcoordError::EmptyMessage);
        }

        let (history, db) = {
            let mut state = self.state.write().await;
            if state.loading {
                return Err(MedcoordError::SessionBusy);
            }
            state.reduce(SessionEvent::Submitted(Turn::user(content)));
            (state.history(self.config.history_window), state.db.clone())
        };
        let pending = PendingSubmission {
            state: &self.state,
            armed: true,
        };

        info!(
            content_preview = %content.chars().take(50).collect::<String>(),
            history = history.len(),
            "Submitting to coordinator"
        );

        let result = self.mediator.run(&history, &db).await;

        let mut state = self.state.write().await;
        let first_new = state.turns.len();
        let failure = match result {
            Ok(exchange) => {
                info!(agent = %exchange.agent, tool = ?exchange.tool_name(), "Exchange completed");
                state.reduce(SessionEvent::Completed(exchange));
                None
            }
            Err(err) => {
                let kind = FailureKind::from_error(&err);
                match kind {
                    FailureKind::MultipleToolCalls => warn!(error = %err, "Exchange rejected"),
                    FailureKind::Transport => error!(error = %err, "Exchange failed"),
                }
                state.reduce(SessionEvent::Failed(kind));
                Some(kind)
            }
        };
        pending.finish();

        Ok(Reply {
            turns: state.turns[first_new..].to_vec(),
            active_agent: state.active_agent,
            system_log: state.system_log.clone(),
            failure,
        })
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn dashboard(&self) -> Dashboard {
        let state = self.state.read().await;
        dashboard::build(state.active_agent, &state.db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mediator::ToolRun;
    use medcoord_agents::{NewRecord, ToolOutcome};
    use medcoord_common::{Patient, ToolInvocation};
    use medcoord_llm::Role;
    use serde_json::json;

    fn registration_exchange() -> Exchange {
        Exchange {
            reply: "Pasien berhasil didaftarkan.".into(),
            agent: AgentKind::PatientManagement,
            tool: Some(ToolRun {
                invocation: ToolInvocation::new("c", "patientManagement", json!({})),
                outcome: ToolOutcome::new(
                    AgentKind::PatientManagement,
                    "Berhasil. Pasien baru terdaftar dengan ID sementara P42.",
                    "[DB] PatientMgmt Action: register",
                )
                .with_record(NewRecord::Patient(Patient {
                    id: "P42".into(),
                    name: "Dewi".into(),
                    dob: "1990-01-01".into(),
                    contact: "08123456789".into(),
                    last_visit: "2024-01-01".into(),
                })),
            }),
        }
    }

    #[test]
    fn starts_with_welcome_turn() {
        let state = SessionState::default();
        assert_eq!(state.turns.len(), 1);
        assert_eq!(state.turns[0].role, TurnRole::System);
        assert_eq!(state.turns[0].content, WELCOME_MESSAGE);
        assert!(!state.loading);
    }

    #[test]
    fn submitted_sets_loading_and_resets_agent() {
        let mut state = SessionState::default();
        state.active_agent = AgentKind::MedicalRecords;
        state.system_log = "old".into();

        state.reduce(SessionEvent::Submitted(Turn::user("Halo")));

        assert!(state.loading);
        assert!(state.system_log.is_empty());
        assert_eq!(state.active_agent, AgentKind::Coordinator);
        assert_eq!(state.turns.len(), 2);
    }

    #[test]
    fn completed_commits_record_and_appends_trace() {
        let mut state = SessionState::default();
        state.reduce(SessionEvent::Submitted(Turn::user("Daftar Dewi")));
        state.reduce(SessionEvent::Completed(registration_exchange()));

        assert!(!state.loading);
        assert_eq!(state.db.patients.len(), 4);
        assert_eq!(state.active_agent, AgentKind::PatientManagement);
        assert_eq!(state.system_log, "[DB] PatientMgmt Action: register");

        let trace = &state.turns[2];
        assert!(trace.is_tool_trace);
        assert_eq!(
            trace.content,
            ">> Sub-Agen PATIENT_MANAGEMENT aktif.\n>> Output: Berhasil. Pasien baru terdaftar dengan ID sementara P42."
        );
        let reply = state.turns.last().unwrap();
        assert_eq!(reply.role, TurnRole::Assistant);
        assert_eq!(reply.agent, Some(AgentKind::PatientManagement));
    }

    #[test]
    fn failed_appends_error_turn_only() {
        let mut state = SessionState::default();
        state.reduce(SessionEvent::Submitted(Turn::user("Halo")));
        let before = state.db.clone();
        state.reduce(SessionEvent::Failed(FailureKind::Transport));

        assert!(!state.loading);
        assert_eq!(state.db, before);
        let last = state.turns.last().unwrap();
        assert_eq!(last.role, TurnRole::System);
        assert_eq!(last.content, CONNECTION_ERROR_MESSAGE);
        assert_eq!(last.agent, Some(AgentKind::Coordinator));
    }

    #[test]
    fn history_skips_system_turns_and_windows() {
        let mut state = SessionState::default();
        for i in 0..3 {
            state.reduce(SessionEvent::Submitted(Turn::user(format!("u{i}"))));
            state.reduce(SessionEvent::Completed(Exchange {
                reply: format!("a{i}"),
                agent: AgentKind::Coordinator,
                tool: None,
            }));
        }
        state.reduce(SessionEvent::Failed(FailureKind::Transport));

        let all = state.history(100);
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].content, "u0");

        // Window of 3 would start at "a1"; it is trimmed to begin at a user turn.
        let windowed = state.history(3);
        assert_eq!(windowed.len(), 2);
        assert_eq!(windowed[0].role, Role::User);
        assert_eq!(windowed[0].content, "u2");
    }
}
