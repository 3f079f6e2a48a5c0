//! In-memory mock hospital database.
//!
//! Collections are seeded with fixed sample data and only ever appended to.
//! Handlers never write here directly; they return a [`NewRecord`] which
//! the session commits once the whole exchange has succeeded.

use medcoord_common::{Appointment, AppointmentStatus, Invoice, InvoiceStatus, Patient};
use rand::Rng;
use serde::Serialize;

/// A record a handler wants inserted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum NewRecord {
    Patient(Patient),
    Appointment(Appointment),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HospitalDb {
    pub patients: Vec<Patient>,
    pub appointments: Vec<Appointment>,
    pub invoices: Vec<Invoice>,
}

impl Default for HospitalDb {
    fn default() -> Self {
        Self::seeded()
    }
}

impl HospitalDb {
    pub fn empty() -> Self {
        Self {
            patients: Vec::new(),
            appointments: Vec::new(),
            invoices: Vec::new(),
        }
    }

    /// The sample data every session starts with.
    pub fn seeded() -> Self {
        let patient = |id: &str, name: &str, dob: &str, contact: &str, last_visit: &str| Patient {
            id: id.into(),
            name: name.into(),
            dob: dob.into(),
            contact: contact.into(),
            last_visit: last_visit.into(),
        };

        Self {
            patients: vec![
                patient("P12345", "Budi Santoso", "1980-05-15", "08123456789", "2023-10-10"),
                patient("P9876", "Siti Aminah", "1992-11-20", "08198765432", "2023-11-01"),
                patient("P5555", "Rudi Hartono", "1975-03-30", "08111222333", "2023-09-15"),
            ],
            appointments: vec![
                Appointment {
                    id: "APT-001".into(),
                    patient_id: "P12345".into(),
                    doctor: "Dr. Bima".into(),
                    date: "2023-12-01 10:00".into(),
                    status: AppointmentStatus::Scheduled,
                },
                Appointment {
                    id: "APT-002".into(),
                    patient_id: "P9876".into(),
                    doctor: "Dr. Sari".into(),
                    date: "2023-11-01 14:00".into(),
                    status: AppointmentStatus::Completed,
                },
            ],
            invoices: vec![
                Invoice {
                    id: "INV-001".into(),
                    patient_id: "P12345".into(),
                    amount: 500_000,
                    status: InvoiceStatus::Pending,
                    description: "Konsultasi Spesialis Jantung".into(),
                },
                Invoice {
                    id: "INV-002".into(),
                    patient_id: "P9876".into(),
                    amount: 150_000,
                    status: InvoiceStatus::Paid,
                    description: "Cek Darah Lengkap".into(),
                },
            ],
        }
    }

    pub fn apply(&mut self, record: NewRecord) {
        match record {
            NewRecord::Patient(patient) => self.patients.push(patient),
            NewRecord::Appointment(appointment) => self.appointments.push(appointment),
        }
    }

    pub fn has_patient_id(&self, id: &str) -> bool {
        self.patients.iter().any(|p| p.id == id)
    }

    pub fn has_appointment_id(&self, id: &str) -> bool {
        self.appointments.iter().any(|a| a.id == id)
    }

    pub fn pending_invoices(&self) -> impl Iterator<Item = &Invoice> {
        self.invoices
            .iter()
            .filter(|i| i.status == InvoiceStatus::Pending)
    }
}

/// Random `<prefix><n>` with `n < upper` that `taken` rejects. After a few
/// collisions it counts upward from `upper` so it always terminates.
pub fn fresh_id(prefix: &str, upper: u32, taken: impl Fn(&str) -> bool) -> String {
    let mut rng = rand::thread_rng();
    for _ in 0..32 {
        let candidate = format!("{prefix}{}", rng.gen_range(0..upper.max(1)));
        if !taken(&candidate) {
            return candidate;
        }
    }
    let mut n = upper;
    loop {
        let candidate = format!("{prefix}{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n = n.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_collections_match_sample_data() {
        let db = HospitalDb::seeded();
        assert_eq!(db.patients.len(), 3);
        assert_eq!(db.appointments.len(), 2);
        assert_eq!(db.invoices.len(), 2);
        assert!(db.has_patient_id("P12345"));
        assert!(db.has_appointment_id("APT-002"));
        assert_eq!(db.pending_invoices().count(), 1);
    }

    #[test]
    fn apply_appends() {
        let mut db = HospitalDb::empty();
        db.apply(NewRecord::Appointment(Appointment {
            id: "APT-9".into(),
            patient_id: "P-unknown".into(),
            doctor: "Dr. Umum".into(),
            date: "Minggu Depan".into(),
            status: AppointmentStatus::Scheduled,
        }));
        assert_eq!(db.appointments.len(), 1);
        assert!(db.patients.is_empty());
    }

    #[test]
    fn fresh_id_avoids_taken_ids() {
        let id = fresh_id("P", 3, |candidate| matches!(candidate, "P0" | "P1" | "P2"));
        assert_eq!(id, "P3");
    }

    #[test]
    fn fresh_id_uses_prefix() {
        let id = fresh_id("APT-", 1000, |_| false);
        let n: u32 = id.strip_prefix("APT-").unwrap().parse().unwrap();
        assert!(n < 1000);
    }
}
