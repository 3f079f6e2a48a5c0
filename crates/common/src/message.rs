//! Conversation turns and the agents they are attributed to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    System,
}

/// The coordinator and the five hospital sub-agents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentKind {
    #[default]
    Coordinator,
    PatientManagement,
    AppointmentScheduler,
    MedicalRecords,
    BillingInsurance,
    TechnicalSupport,
}

impl AgentKind {
    pub const ALL: [AgentKind; 6] = [
        AgentKind::Coordinator,
        AgentKind::PatientManagement,
        AgentKind::AppointmentScheduler,
        AgentKind::MedicalRecords,
        AgentKind::BillingInsurance,
        AgentKind::TechnicalSupport,
    ];

    /// Map a tool name to the agent that owns it. Unknown names fall back to
    /// the coordinator.
    pub fn from_tool_name(name: &str) -> Self {
        match name {
            "patientManagement" => Self::PatientManagement,
            "appointmentScheduler" => Self::AppointmentScheduler,
            "medicalRecords" => Self::MedicalRecords,
            "billingAndInsurance" => Self::BillingInsurance,
            "technicalSupport" => Self::TechnicalSupport,
            _ => Self::Coordinator,
        }
    }

    /// Wire identifier, e.g. `APPOINTMENT_SCHEDULER`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coordinator => "COORDINATOR",
            Self::PatientManagement => "PATIENT_MANAGEMENT",
            Self::AppointmentScheduler => "APPOINTMENT_SCHEDULER",
            Self::MedicalRecords => "MEDICAL_RECORDS",
            Self::BillingInsurance => "BILLING_INSURANCE",
            Self::TechnicalSupport => "TECHNICAL_SUPPORT",
        }
    }

    /// Short badge shown next to a turn.
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Coordinator => "Koordinator",
            Self::PatientManagement => "PATIENT",
            Self::AppointmentScheduler => "APPOINTMENT",
            Self::MedicalRecords => "MEDICAL",
            Self::BillingInsurance => "BILLING",
            Self::TechnicalSupport => "TECHNICAL",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Coordinator => "Sistem Inti: Menganalisis intent & mendelegasikan tugas.",
            Self::PatientManagement => "Sub-Agen: Manajemen data demografis & pendaftaran.",
            Self::AppointmentScheduler => "Sub-Agen: Manajemen jadwal dokter & klinik.",
            Self::MedicalRecords => "Sub-Agen: Akses data klinis (EMR) aman.",
            Self::BillingInsurance => "Sub-Agen: Manajemen keuangan & asuransi.",
            Self::TechnicalSupport => "Sub-Agen: Dukungan teknis & pemeliharaan sistem.",
        }
    }

    /// Workspace title: the part of the description before the colon.
    pub fn label(&self) -> &'static str {
        let description = self.description();
        description.split(':').next().unwrap_or(description)
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in the conversation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn ID
    pub id: String,

    pub role: TurnRole,

    pub content: String,

    /// Agent responsible for this turn (never set on user turns)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentKind>,

    /// Marks a system turn that traces a sub-agent execution
    #[serde(default)]
    pub is_tool_trace: bool,

    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn new(role: TurnRole, content: impl Into<String>, agent: Option<AgentKind>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            agent,
            is_tool_trace: false,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content, None)
    }

    pub fn assistant(agent: AgentKind, content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content, Some(agent))
    }

    pub fn system(agent: AgentKind, content: impl Into<String>) -> Self {
        Self::new(TurnRole::System, content, Some(agent))
    }

    /// System turn recording what a sub-agent did.
    pub fn tool_trace(agent: AgentKind, output: &str) -> Self {
        let mut turn = Self::system(
            agent,
            format!(">> Sub-Agen {agent} aktif.\n>> Output: {output}"),
        );
        turn.is_tool_trace = true;
        turn
    }
}
