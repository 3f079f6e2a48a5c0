//! Patient management sub-agent: registration and contact updates.

use chrono::Utc;
use medcoord_common::{AgentKind, Patient};

use crate::call::PatientArgs;
use crate::db::{HospitalDb, NewRecord, fresh_id};
use crate::dispatch::ToolOutcome;

const DEFAULT_NAME: &str = "Pasien Baru";
const PLACEHOLDER_DOB: &str = "1990-01-01";
const PLACEHOLDER_CONTACT: &str = "08123456789";

pub fn handle(args: &PatientArgs, db: &HospitalDb) -> ToolOutcome {
    let log = format!("[DB] PatientMgmt Action: {}", args.action);

    if args.action == "register" || args.action.contains("update") {
        let id = fresh_id("P", 90_000, |candidate| db.has_patient_id(candidate));
        let patient = Patient {
            id: id.clone(),
            name: name_from_details(&args.patient_details),
            dob: PLACEHOLDER_DOB.into(),
            contact: PLACEHOLDER_CONTACT.into(),
            last_visit: Utc::now().date_naive().to_string(),
        };
        return ToolOutcome::new(
            AgentKind::PatientManagement,
            format!("Berhasil. Pasien baru terdaftar dengan ID sementara {id}."),
            log,
        )
        .with_record(NewRecord::Patient(patient));
    }

    ToolOutcome::new(
        AgentKind::PatientManagement,
        format!("Data pasien ditemukan untuk: {}", args.patient_details),
        log,
    )
}

fn name_from_details(details: &str) -> String {
    let name = details.split(',').next().unwrap_or_default().trim();
    if name.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        name.to_string()
    }
}
