//! HTTP route handlers for the API.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use medcoord_agents::dashboard::{self as views, VitalPoint};
use medcoord_agents::{Panel, tool_catalog};
use medcoord_common::{AgentKind, Appointment, Invoice, MedcoordError, Patient};
use medcoord_coordinator::{Reply, SessionState};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    pub provider: String,
    pub model: String,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        provider: state.provider.clone(),
        model: state.session.model_name().to_string(),
    })
}

/// Message request body.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub code: &'static str,
}

impl From<MedcoordError> for ErrorResponse {
    fn from(err: MedcoordError) -> Self {
        let status = match err {
            MedcoordError::EmptyMessage => StatusCode::BAD_REQUEST,
            MedcoordError::SessionBusy => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            error: err.to_string(),
            code: err.code(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Send a message to the coordinator and wait for its reply.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<Reply>, ErrorResponse> {
    info!(
        content_preview = %request.content.chars().take(50).collect::<String>(),
        "Received message"
    );

    // Run detached so a dropped connection cannot leave the session loading.
    let session = Arc::clone(&state.session);
    let reply = tokio::spawn(async move { session.submit(&request.content).await })
        .await
        .map_err(|e| {
            error!(error = %e, "Submission task failed");
            ErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: format!("Submission task failed: {e}"),
                code: "internal_error",
            }
        })??;

    Ok(Json(reply))
}

/// Full conversation: turns, active agent, system log and loading flag.
pub async fn conversation(State(state): State<Arc<AppState>>) -> Json<SessionState> {
    Json(state.session.snapshot().await)
}

#[derive(Debug, Serialize)]
pub struct AgentInfo {
    pub kind: AgentKind,
    pub label: &'static str,
    pub badge: &'static str,
    pub description: &'static str,
}

pub async fn agents() -> Json<Vec<AgentInfo>> {
    Json(
        AgentKind::ALL
            .iter()
            .map(|kind| AgentInfo {
                kind: *kind,
                label: kind.label(),
                badge: kind.badge(),
                description: kind.description(),
            })
            .collect(),
    )
}

#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub agent: AgentKind,
    pub parameters: serde_json::Value,
}

pub async fn tools() -> Json<Vec<ToolInfo>> {
    Json(
        tool_catalog()
            .iter()
            .map(|tool| ToolInfo {
                name: tool.name,
                description: tool.description,
                agent: AgentKind::from_tool_name(tool.name),
                parameters: tool.parameters_schema(),
            })
            .collect(),
    )
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub active_agent: AgentKind,
    pub panel: Panel,
    pub patients: Vec<Patient>,
    pub appointments: Vec<Appointment>,
    pub invoices: Vec<Invoice>,
    pub vitals_trend: Vec<VitalPoint>,
}

pub async fn dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardResponse> {
    let snapshot = state.session.snapshot().await;
    let view = views::build(snapshot.active_agent, &snapshot.db);
    Json(DashboardResponse {
        active_agent: view.active_agent,
        panel: view.panel,
        patients: snapshot.db.patients,
        appointments: snapshot.db.appointments,
        invoices: snapshot.db.invoices,
        vitals_trend: views::vitals_trend(),
    })
}
