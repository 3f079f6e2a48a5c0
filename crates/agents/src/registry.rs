//! The fixed tool catalog advertised to the model.
//!
//! Adding a sub-agent means one descriptor here, one [`ToolCall`] variant
//! and one handler.
//!
//! [`ToolCall`]: crate::call::ToolCall

use std::sync::LazyLock;

use medcoord_common::{ParamKind, ParamSpec, ToolDescriptor};

pub const PATIENT_MANAGEMENT: &str = "patientManagement";
pub const APPOINTMENT_SCHEDULER: &str = "appointmentScheduler";
pub const MEDICAL_RECORDS: &str = "medicalRecords";
pub const BILLING_AND_INSURANCE: &str = "billingAndInsurance";
pub const TECHNICAL_SUPPORT: &str = "technicalSupport";

fn string_param(name: &'static str, description: &'static str, required: bool) -> ParamSpec {
    ParamSpec {
        name,
        kind: ParamKind::String,
        description,
        required,
    }
}

static CATALOG: LazyLock<Vec<ToolDescriptor>> = LazyLock::new(|| {
    vec![
        ToolDescriptor {
            name: PATIENT_MANAGEMENT,
            description: "Menangani pendaftaran pasien baru, memperbarui informasi kontak, dan mengambil data demografi dasar.",
            params: vec![
                string_param(
                    "action",
                    "Tindakan yang dilakukan: 'register', 'update', 'get_info'",
                    true,
                ),
                string_param(
                    "patient_details",
                    "Detail pasien (Nama, ID, dll) dalam string deskriptif.",
                    true,
                ),
            ],
        },
        ToolDescriptor {
            name: APPOINTMENT_SCHEDULER,
            description: "Menangani penjadwalan, penjadwalan ulang, atau pembatalan janji temu.",
            params: vec![
                string_param(
                    "action",
                    "Tindakan: 'schedule', 'reschedule', 'cancel', 'check_availability'",
                    true,
                ),
                string_param("patient_id", "ID Pasien.", true),
                string_param(
                    "appointment_details",
                    "Detail janji temu (Dokter, Waktu, Keluhan).",
                    true,
                ),
            ],
        },
        ToolDescriptor {
            name: MEDICAL_RECORDS,
            description: "Mengambil dan merangkum riwayat medis, hasil lab, diagnosis. Privasi tinggi.",
            params: vec![
                string_param("patient_id", "ID Pasien.", true),
                string_param(
                    "requested_summary_type",
                    "Jenis data: 'history', 'lab_results', 'diagnosis', 'vitals'",
                    true,
                ),
            ],
        },
        ToolDescriptor {
            name: BILLING_AND_INSURANCE,
            description: "Mengelola pertanyaan penagihan, memproses pembayaran, faktur, dan asuransi.",
            params: vec![
                string_param(
                    "action",
                    "Tindakan: 'check_bill', 'pay', 'insurance_claim'",
                    true,
                ),
                string_param("patient_id", "ID Pasien.", true),
                string_param(
                    "financial_details",
                    "Detail transaksi atau pertanyaan keuangan.",
                    false,
                ),
            ],
        },
        ToolDescriptor {
            name: TECHNICAL_SUPPORT,
            description: "Menangani pertanyaan masalah teknis sistem, pemecahan masalah umum (troubleshooting), dan eskalasi tiket IT.",
            params: vec![
                string_param(
                    "action",
                    "Tindakan: 'laporkan_masalah', 'tanya_solusi', 'status_sistem'",
                    true,
                ),
                string_param(
                    "issue_details",
                    "Detail masalah teknis atau pertanyaan support.",
                    true,
                ),
            ],
        },
    ]
});

/// All tool descriptors, in a stable order.
pub fn tool_catalog() -> &'static [ToolDescriptor] {
    &CATALOG
}

pub fn find_tool(name: &str) -> Option<&'static ToolDescriptor> {
    CATALOG.iter().find(|tool| tool.name == name)
}
