//! Appointment scheduler sub-agent.

use medcoord_common::{AgentKind, Appointment, AppointmentStatus};

use crate::call::ScheduleArgs;
use crate::db::{HospitalDb, NewRecord, fresh_id};
use crate::dispatch::ToolOutcome;

pub fn handle(args: &ScheduleArgs, db: &HospitalDb) -> ToolOutcome {
    let log = format!(
        "[DB] Scheduler Action: {} for {}",
        args.action, args.patient_id
    );

    if args.action != "schedule" {
        return ToolOutcome::new(
            AgentKind::AppointmentScheduler,
            format!(
                "Permintaan {} diproses untuk jadwal {}.",
                args.action, args.appointment_details
            ),
            log,
        );
    }

    let id = fresh_id("APT-", 1000, |candidate| db.has_appointment_id(candidate));
    let doctor = if args.appointment_details.contains("Bima") {
        "Dr. Bima"
    } else {
        "Dr. Umum"
    };
    let appointment = Appointment {
        id: id.clone(),
        patient_id: args.patient_id.clone(),
        doctor: doctor.into(),
        date: "Minggu Depan".into(),
        status: AppointmentStatus::Scheduled,
    };

    ToolOutcome::new(
        AgentKind::AppointmentScheduler,
        format!(
            "Janji temu berhasil dijadwalkan. ID Tiket: {id} untuk {}.",
            args.patient_id
        ),
        log,
    )
    .with_record(NewRecord::Appointment(appointment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_with_bima() {
        let db = HospitalDb::seeded();
        let outcome = handle(
            &ScheduleArgs {
                action: "schedule".into(),
                patient_id: "P12345".into(),
                appointment_details: "dengan Dr. Bima".into(),
            },
            &db,
        );
        let Some(NewRecord::Appointment(apt)) = outcome.record else {
            panic!("expected a staged appointment");
        };
        assert_eq!(apt.patient_id, "P12345");
        assert_eq!(apt.doctor, "Dr. Bima");
        assert_eq!(apt.date, "Minggu Depan");
        assert_eq!(apt.status, AppointmentStatus::Scheduled);
        assert!(apt.id.starts_with("APT-"));
        assert!(!db.has_appointment_id(&apt.id));
        assert_eq!(outcome.log, "[DB] Scheduler Action: schedule for P12345");
    }

    #[test]
    fn other_doctor_defaults_to_general() {
        let db = HospitalDb::seeded();
        let outcome = handle(
            &ScheduleArgs {
                action: "schedule".into(),
                patient_id: "P9876".into(),
                appointment_details: "poli umum".into(),
            },
            &db,
        );
        let Some(NewRecord::Appointment(apt)) = outcome.record else {
            panic!("expected a staged appointment");
        };
        assert_eq!(apt.doctor, "Dr. Umum");
    }

    #[test]
    fn cancel_only_reports() {
        let db = HospitalDb::seeded();
        let outcome = handle(
            &ScheduleArgs {
                action: "cancel".into(),
                patient_id: "P12345".into(),
                appointment_details: "APT-001".into(),
            },
            &db,
        );
        assert!(outcome.record.is_none());
        assert_eq!(outcome.output, "Permintaan cancel diproses untuk jadwal APT-001.");
    }
}
