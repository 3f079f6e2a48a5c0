//! Keyword-based stand-in for a real model.
//!
//! Lets the coordinator run without network access or API keys: the
//! decision phase picks a tool by Indonesian keywords, the confirmation
//! phase wraps the tool result in a short reply.

use std::sync::LazyLock;

use async_trait::async_trait;
use medcoord_common::Result;
use regex::Regex;
use serde_json::{Value, json};
use tracing::debug;

use crate::client::{LlmClient, LlmRequest, LlmResponse, Role};

static PATIENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bP\d{3,}\b").expect("valid regex"));

const CLARIFICATION: &str = "Mohon jelaskan kebutuhan Anda lebih rinci, misalnya pendaftaran pasien, \
     janji temu dokter, rekam medis, tagihan, atau kendala teknis.";

pub struct OfflineClient {
    model: String,
}

impl OfflineClient {
    pub fn new() -> Self {
        Self {
            model: "offline-keyword".to_string(),
        }
    }

    fn patient_id(text: &str) -> String {
        PATIENT_ID
            .find(text)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    fn contains_any(haystack: &str, needles: &[&str]) -> bool {
        needles.iter().any(|n| haystack.contains(n))
    }

    /// Choose a tool for the user's message, or `None` to ask for
    /// clarification.
    fn route(content: &str) -> Option<(&'static str, Value)> {
        let lower = content.to_lowercase();
        let patient_id = Self::patient_id(content);

        if Self::contains_any(&lower, &["jadwal", "janji", "dokter", "dr.", "reschedule"]) {
            let action = if Self::contains_any(&lower, &["batal", "cancel"]) {
                "cancel"
            } else if Self::contains_any(&lower, &["ubah", "pindah", "reschedule"]) {
                "reschedule"
            } else if Self::contains_any(&lower, &["tersedia", "kosong", "availability"]) {
                "check_availability"
            } else {
                "schedule"
            };
            return Some((
                "appointmentScheduler",
                json!({
                    "action": action,
                    "patient_id": patient_id,
                    "appointment_details": content,
                }),
            ));
        }

        if Self::contains_any(&lower, &["daftar", "registrasi", "pasien baru", "kontak", "alamat"]) {
            let action = if Self::contains_any(&lower, &["ubah", "update", "perbarui", "kontak"]) {
                "update"
            } else if Self::contains_any(&lower, &["daftar", "registrasi", "baru"]) {
                "register"
            } else {
                "get_info"
            };
            let details = lower
                .find("nama ")
                .and_then(|pos| content.get(pos + "nama ".len()..))
                .map(|rest| rest.trim().to_string())
                .unwrap_or_else(|| content.to_string());
            return Some((
                "patientManagement",
                json!({ "action": action, "patient_details": details }),
            ));
        }

        if Self::contains_any(&lower, &["rekam", "riwayat", "lab", "diagnosis", "medis", "vital"]) {
            let summary = if lower.contains("lab") {
                "lab_results"
            } else if lower.contains("diagnosis") {
                "diagnosis"
            } else if lower.contains("vital") {
                "vitals"
            } else {
                "history"
            };
            return Some((
                "medicalRecords",
                json!({ "patient_id": patient_id, "requested_summary_type": summary }),
            ));
        }

        if Self::contains_any(&lower, &["tagihan", "bayar", "asuransi", "biaya", "klaim", "invoice"]) {
            let action = if Self::contains_any(&lower, &["asuransi", "klaim"]) {
                "insurance_claim"
            } else if lower.contains("bayar") {
                "pay"
            } else {
                "check_bill"
            };
            return Some((
                "billingAndInsurance",
                json!({
                    "action": action,
                    "patient_id": patient_id,
                    "financial_details": content,
                }),
            ));
        }

        if Self::contains_any(&lower, &["error", "masalah", "login", "aplikasi", "sistem", "teknis", "lambat"]) {
            let action = if lower.contains("status") {
                "status_sistem"
            } else if Self::contains_any(&lower, &["cara", "solusi", "bagaimana"]) {
                "tanya_solusi"
            } else {
                "laporkan_masalah"
            };
            return Some((
                "technicalSupport",
                json!({ "action": action, "issue_details": content }),
            ));
        }

        None
    }
}

impl Default for OfflineClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmClient for OfflineClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let last = request.messages.last();

        // Confirmation phase: the last message is a tool result.
        if let Some(msg) = last.filter(|m| m.role == Role::Tool) {
            return Ok(LlmResponse::text(format!(
                "Permintaan Anda telah diproses. {}",
                msg.content
            )));
        }

        let content = last.map(|m| m.content.as_str()).unwrap_or_default();
        let response = match Self::route(content) {
            Some((tool, args)) if !request.tools.is_empty() => {
                debug!(tool, "Offline keyword routing selected tool");
                LlmResponse::tool_call(tool, args)
            }
            _ => LlmResponse::text(CLARIFICATION),
        };
        Ok(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
