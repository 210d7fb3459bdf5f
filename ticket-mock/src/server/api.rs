//! HTTP surface of the mock.
//!
//! - `POST /api/now/table/incident`: the mocked upstream endpoint;
//! - `/api/test/*`: test control endpoints, used by the test harness;
//! - `GET /api/health` and `GET /`: status and dashboard.

use std::{convert::Infallible, sync::Arc};

use rama::{
    Service,
    http::{
        Request, Response, StatusCode,
        body::util::BodyExt as _,
        header::CONTENT_TYPE,
        service::web::{
            Router,
            extract::{Path, State},
            response::{Html, IntoResponse, Json},
        },
    },
    telemetry::tracing,
};
use serde::{Deserialize, Serialize};

use crate::{
    config::{Settings, SettingsPatch},
    simulator::{CreateOutcome, IncidentPayload, SimulatedUpstreamError, Simulator, Ticket},
};

pub const PATH_INCIDENT: &str = "/api/now/table/incident";
pub const PATH_TEST_TICKETS: &str = "/api/test/tickets";
pub const PATH_TEST_SETTINGS: &str = "/api/test/settings";
pub const PATH_TEST_SCENARIO: &str = "/api/test/scenario/{scenario}";
pub const PATH_HEALTH: &str = "/api/health";

pub fn web_svc(
    simulator: Simulator,
) -> impl Service<Request, Output = Response, Error = Infallible> + Clone {
    Arc::new(
        Router::new_with_state(simulator)
            .with_get("/", dashboard)
            .with_post(PATH_INCIDENT, create_incident)
            .with_get(PATH_TEST_TICKETS, list_tickets)
            .with_delete(PATH_TEST_TICKETS, clear_tickets)
            .with_get(PATH_TEST_SETTINGS, get_settings)
            .with_put(PATH_TEST_SETTINGS, update_settings)
            .with_post(PATH_TEST_SCENARIO, activate_scenario)
            .with_get(PATH_HEALTH, health),
    )
}

#[derive(Debug, Serialize)]
struct ResultEnvelope<T> {
    result: T,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'static str>,
}

impl From<SimulatedUpstreamError> for ErrorBody {
    fn from(err: SimulatedUpstreamError) -> Self {
        Self {
            error: err.error(),
            details: Some(err.details()),
        }
    }
}

#[derive(Debug, Serialize)]
struct TicketList {
    tickets: Vec<Ticket>,
    count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClearedTickets {
    message: String,
    remaining_count: usize,
}

#[derive(Debug, Serialize)]
struct SettingsChanged {
    message: String,
    settings: Settings,
}

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    timestamp: String,
    tickets: usize,
    settings: Settings,
}

#[derive(Debug, Deserialize)]
struct ScenarioParams {
    scenario: String,
}

async fn dashboard() -> impl IntoResponse {
    Html(super::dashboard::DASHBOARD_HTML)
}

async fn create_incident(State(simulator): State<Simulator>, req: Request) -> Response {
    let payload = read_incident_payload(req).await;
    tracing::info!("incident API called: {payload:?}");

    match simulator.handle_create(payload).await {
        Ok(CreateOutcome::Created(ticket)) => (
            StatusCode::CREATED,
            Json(ResultEnvelope { result: ticket }),
        )
            .into_response(),
        Ok(CreateOutcome::Suppressed(stub)) => {
            (StatusCode::CREATED, Json(ResultEnvelope { result: stub })).into_response()
        }
        Err(err) => {
            tracing::debug!("simulated upstream failure: {err}");
            (err.status(), Json(ErrorBody::from(err))).into_response()
        }
    }
}

/// Business fields of a create request.
///
/// A body which is not declared as JSON, or cannot be read,
/// gives an empty payload: the test settings decide the response.
async fn read_incident_payload(req: Request) -> IncidentPayload {
    if !is_json_content_type(&req) {
        tracing::debug!("incident body not declared as JSON: use empty payload");
        return IncidentPayload::default();
    }

    match req.into_body().collect().await {
        Ok(collected) => IncidentPayload::from_json_slice(&collected.to_bytes()),
        Err(err) => {
            tracing::debug!("failed to collect incident body: {err}; use empty payload");
            IncidentPayload::default()
        }
    }
}

fn is_json_content_type(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

async fn list_tickets(State(simulator): State<Simulator>) -> impl IntoResponse {
    let tickets = simulator.list_tickets();
    Json(TicketList {
        count: tickets.len(),
        tickets,
    })
}

async fn clear_tickets(State(simulator): State<Simulator>) -> impl IntoResponse {
    let cleared = simulator.clear_tickets();
    Json(ClearedTickets {
        message: format!("Cleared {cleared} tickets"),
        remaining_count: 0,
    })
}

async fn get_settings(State(simulator): State<Simulator>) -> impl IntoResponse {
    Json(simulator.settings())
}

async fn update_settings(
    State(simulator): State<Simulator>,
    Json(patch): Json<SettingsPatch>,
) -> impl IntoResponse {
    let settings = simulator.update_settings(&patch);
    Json(SettingsChanged {
        message: "Test settings updated".to_owned(),
        settings,
    })
}

async fn activate_scenario(
    State(simulator): State<Simulator>,
    Path(ScenarioParams { scenario }): Path<ScenarioParams>,
) -> Response {
    match simulator.activate_scenario(&scenario) {
        Ok(settings) => Json(SettingsChanged {
            message: format!("Scenario '{scenario}' activated"),
            settings,
        })
        .into_response(),
        Err(err) => {
            tracing::debug!("reject scenario activation: {err}");
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody {
                    error: "Unknown scenario",
                    details: None,
                }),
            )
                .into_response()
        }
    }
}

async fn health(State(simulator): State<Simulator>) -> impl IntoResponse {
    let report = simulator.health();
    Json(Health {
        status: "healthy",
        timestamp: humantime::format_rfc3339_millis(report.timestamp).to_string(),
        tickets: report.ticket_count,
        settings: report.settings,
    })
}
