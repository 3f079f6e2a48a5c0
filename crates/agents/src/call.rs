//! Typed tool calls.
//!
//! The model names tools by string; [`ToolCall::parse`] turns that claim
//! into one of the five known variants. Arguments are read leniently:
//! anything missing or of the wrong shape becomes an empty string.

use medcoord_common::{AgentKind, ToolInvocation};
use serde::Serialize;

use crate::registry::{
    APPOINTMENT_SCHEDULER, BILLING_AND_INSURANCE, MEDICAL_RECORDS, PATIENT_MANAGEMENT,
    TECHNICAL_SUPPORT,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientArgs {
    pub action: String,
    pub patient_details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleArgs {
    pub action: String,
    pub patient_id: String,
    pub appointment_details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordsArgs {
    pub patient_id: String,
    pub requested_summary_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingArgs {
    pub action: String,
    pub patient_id: String,
    pub financial_details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportArgs {
    pub action: String,
    pub issue_details: String,
}

/// A tool call the coordinator knows how to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tool", content = "args", rename_all = "camelCase")]
pub enum ToolCall {
    PatientManagement(PatientArgs),
    AppointmentScheduler(ScheduleArgs),
    MedicalRecords(RecordsArgs),
    BillingAndInsurance(BillingArgs),
    TechnicalSupport(SupportArgs),
}

impl ToolCall {
    /// `None` when the name is not in the catalog.
    pub fn parse(invocation: &ToolInvocation) -> Option<Self> {
        let arg = |key: &str| invocation.str_arg(key);
        let call = match invocation.name.as_str() {
            PATIENT_MANAGEMENT => Self::PatientManagement(PatientArgs {
                action: arg("action"),
                patient_details: arg("patient_details"),
            }),
            APPOINTMENT_SCHEDULER => Self::AppointmentScheduler(ScheduleArgs {
                action: arg("action"),
                patient_id: arg("patient_id"),
                appointment_details: arg("appointment_details"),
            }),
            MEDICAL_RECORDS => Self::MedicalRecords(RecordsArgs {
                patient_id: arg("patient_id"),
                requested_summary_type: arg("requested_summary_type"),
            }),
            BILLING_AND_INSURANCE => Self::BillingAndInsurance(BillingArgs {
                action: arg("action"),
                patient_id: arg("patient_id"),
                financial_details: arg("financial_details"),
            }),
            TECHNICAL_SUPPORT => Self::TechnicalSupport(SupportArgs {
                action: arg("action"),
                issue_details: arg("issue_details"),
            }),
            _ => return None,
        };
        Some(call)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PatientManagement(_) => PATIENT_MANAGEMENT,
            Self::AppointmentScheduler(_) => APPOINTMENT_SCHEDULER,
            Self::MedicalRecords(_) => MEDICAL_RECORDS,
            Self::BillingAndInsurance(_) => BILLING_AND_INSURANCE,
            Self::TechnicalSupport(_) => TECHNICAL_SUPPORT,
        }
    }

    pub fn agent(&self) -> AgentKind {
        match self {
            Self::PatientManagement(_) => AgentKind::PatientManagement,
            Self::AppointmentScheduler(_) => AgentKind::AppointmentScheduler,
            Self::MedicalRecords(_) => AgentKind::MedicalRecords,
            Self::BillingAndInsurance(_) => AgentKind::BillingInsurance,
            Self::TechnicalSupport(_) => AgentKind::TechnicalSupport,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tool_catalog;
    use serde_json::json;

    #[test]
    fn parses_scheduler_call() {
        let invocation = ToolInvocation::new(
            "c1",
            "appointmentScheduler",
            json!({
                "action": "schedule",
                "patient_id": "P12345",
                "appointment_details": "Dr. Bima, Senin pagi"
            }),
        );
        let call = ToolCall::parse(&invocation).unwrap();
        assert_eq!(
            call,
            ToolCall::AppointmentScheduler(ScheduleArgs {
                action: "schedule".into(),
                patient_id: "P12345".into(),
                appointment_details: "Dr. Bima, Senin pagi".into(),
            })
        );
        assert_eq!(call.agent(), AgentKind::AppointmentScheduler);
    }

    #[test]
    fn missing_arguments_default_to_empty() {
        let invocation = ToolInvocation::new("c1", "billingAndInsurance", json!({"action": "pay"}));
        let Some(ToolCall::BillingAndInsurance(args)) = ToolCall::parse(&invocation) else {
            panic!("expected billing call");
        };
        assert_eq!(args.action, "pay");
        assert_eq!(args.patient_id, "");
        assert_eq!(args.financial_details, "");
    }

    #[test]
    fn unknown_tool_does_not_parse() {
        let invocation = ToolInvocation::new("c1", "pharmacy", json!({}));
        assert!(ToolCall::parse(&invocation).is_none());
    }

    #[test]
    fn every_catalog_tool_parses_and_round_trips_name() {
        for tool in tool_catalog() {
            let call = ToolCall::parse(&ToolInvocation::new("c", tool.name, json!({}))).unwrap();
            assert_eq!(call.name(), tool.name);
            assert_eq!(call.agent(), AgentKind::from_tool_name(tool.name));
        }
    }

    #[test]
    fn serializes_with_tool_tag() {
        let call = ToolCall::TechnicalSupport(SupportArgs {
            action: "status_sistem".into(),
            issue_details: "".into(),
        });
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["tool"], "technicalSupport");
        assert_eq!(json["args"]["action"], "status_sistem");
    }
}
