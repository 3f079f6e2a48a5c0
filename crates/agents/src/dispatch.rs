//! Exhaustive dispatch from a [`ToolCall`] to its sub-agent.

use medcoord_common::{AgentKind, ToolInvocation};
use serde::Serialize;
use tracing::{info, warn};

use crate::call::ToolCall;
use crate::db::{HospitalDb, NewRecord};
use crate::{billing, patient, records, scheduler, support};

/// Result string for tool names outside the catalog.
pub const GENERIC_RESULT: &str = "Action completed successfully.";

/// What a sub-agent did with a tool call.
///
/// `record` is staged, not applied: the session inserts it only after the
/// whole exchange has succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutcome {
    pub agent: AgentKind,
    pub output: String,
    pub log: String,
    pub record: Option<NewRecord>,
}

impl ToolOutcome {
    pub fn new(agent: AgentKind, output: impl Into<String>, log: impl Into<String>) -> Self {
        Self {
            agent,
            output: output.into(),
            log: log.into(),
            record: None,
        }
    }

    pub fn with_record(mut self, record: NewRecord) -> Self {
        self.record = Some(record);
        self
    }
}

pub fn execute(call: &ToolCall, db: &HospitalDb) -> ToolOutcome {
    let outcome = match call {
        ToolCall::PatientManagement(args) => patient::handle(args, db),
        ToolCall::AppointmentScheduler(args) => scheduler::handle(args, db),
        ToolCall::MedicalRecords(args) => records::handle(args),
        ToolCall::BillingAndInsurance(args) => billing::handle(args),
        ToolCall::TechnicalSupport(args) => support::handle(args),
    };
    info!(
        tool = call.name(),
        agent = %outcome.agent,
        staged = outcome.record.is_some(),
        "{}",
        outcome.log
    );
    outcome
}

/// Run a raw invocation. Names outside the catalog run nothing and report
/// the generic result on behalf of the coordinator.
pub fn execute_invocation(invocation: &ToolInvocation, db: &HospitalDb) -> ToolOutcome {
    match ToolCall::parse(invocation) {
        Some(call) => execute(&call, db),
        None => {
            warn!(tool = %invocation.name, "Model requested a tool outside the catalog");
            ToolOutcome::new(AgentKind::Coordinator, GENERIC_RESULT, "")
        }
    }
}
