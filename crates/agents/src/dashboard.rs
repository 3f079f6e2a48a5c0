//! Read-only views backing the per-agent dashboard panels.

use medcoord_common::{AgentKind, Appointment, Invoice, MedicalRecord, Patient, Vitals};
use serde::Serialize;

use crate::db::HospitalDb;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VitalPoint {
    pub month: &'static str,
    pub heart_rate: u32,
    pub bp_systolic: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenuePoint {
    pub day: &'static str,
    /// Rupiah
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStatus {
    pub status: &'static str,
    pub uptime: &'static str,
    pub active_tickets: u32,
    pub recent_tickets: Vec<TicketSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketSummary {
    pub title: &'static str,
    pub status: &'static str,
}

/// Panel content for whichever agent is active.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "panel", rename_all = "snake_case")]
pub enum Panel {
    Overview {
        patients: usize,
        appointments: usize,
        pending_invoices: usize,
    },
    Patients {
        patients: Vec<Patient>,
    },
    Appointments {
        appointments: Vec<Appointment>,
    },
    MedicalRecords {
        latest: MedicalRecord,
        vitals_trend: Vec<VitalPoint>,
    },
    Billing {
        revenue_trend: Vec<RevenuePoint>,
        pending_invoices: Vec<Invoice>,
    },
    TechnicalSupport(SystemStatus),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub active_agent: AgentKind,
    pub panel: Panel,
}

pub fn vitals_trend() -> Vec<VitalPoint> {
    [
        ("Jan", 72, 120),
        ("Feb", 75, 118),
        ("Mar", 70, 122),
        ("Apr", 78, 130),
        ("May", 74, 125),
    ]
    .into_iter()
    .map(|(month, heart_rate, bp_systolic)| VitalPoint {
        month,
        heart_rate,
        bp_systolic,
    })
    .collect()
}

pub fn revenue_trend() -> Vec<RevenuePoint> {
    [
        ("Sen", 4_000_000),
        ("Sel", 3_000_000),
        ("Rab", 5_500_000),
        ("Kam", 2_000_000),
        ("Jum", 6_000_000),
    ]
    .into_iter()
    .map(|(day, amount)| RevenuePoint { day, amount })
    .collect()
}

fn latest_record() -> MedicalRecord {
    MedicalRecord {
        date: "2023-11-01".into(),
        diagnosis: "Hipertensi ringan, kondisi stabil".into(),
        vitals: Vitals {
            bp: "125/80".into(),
            heart_rate: 74,
        },
    }
}

fn system_status() -> SystemStatus {
    SystemStatus {
        status: "Operational",
        uptime: "99.9%",
        active_tickets: 2,
        recent_tickets: vec![TicketSummary {
            title: "Printer Error - Poli Gigi",
            status: "Resolved",
        }],
    }
}

pub fn build(active_agent: AgentKind, db: &HospitalDb) -> Dashboard {
    let panel = match active_agent {
        AgentKind::Coordinator => Panel::Overview {
            patients: db.patients.len(),
            appointments: db.appointments.len(),
            pending_invoices: db.pending_invoices().count(),
        },
        AgentKind::PatientManagement => Panel::Patients {
            patients: db.patients.clone(),
        },
        AgentKind::AppointmentScheduler => Panel::Appointments {
            appointments: db.appointments.clone(),
        },
        AgentKind::MedicalRecords => Panel::MedicalRecords {
            latest: latest_record(),
            vitals_trend: vitals_trend(),
        },
        AgentKind::BillingInsurance => Panel::Billing {
            revenue_trend: revenue_trend(),
            pending_invoices: db.pending_invoices().cloned().collect(),
        },
        AgentKind::TechnicalSupport => Panel::TechnicalSupport(system_status()),
    };
    Dashboard {
        active_agent,
        panel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overview_counts_collections() {
        let dashboard = build(AgentKind::Coordinator, &HospitalDb::seeded());
        assert_eq!(
            dashboard.panel,
            Panel::Overview {
                patients: 3,
                appointments: 2,
                pending_invoices: 1,
            }
        );
    }

    #[test]
    fn billing_panel_lists_pending_only() {
        let dashboard = build(AgentKind::BillingInsurance, &HospitalDb::seeded());
        let Panel::Billing {
            pending_invoices,
            revenue_trend,
        } = dashboard.panel
        else {
            panic!("expected billing panel");
        };
        assert_eq!(pending_invoices.len(), 1);
        assert_eq!(pending_invoices[0].id, "INV-001");
        assert_eq!(revenue_trend.len(), 5);
    }

    #[test]
    fn panel_is_tagged_in_json() {
        let dashboard = build(AgentKind::TechnicalSupport, &HospitalDb::seeded());
        let json = serde_json::to_value(&dashboard).unwrap();
        assert_eq!(json["active_agent"], "TECHNICAL_SUPPORT");
        assert_eq!(json["panel"]["panel"], "technical_support");
        assert_eq!(json["panel"]["uptime"], "99.9%");
    }
}
