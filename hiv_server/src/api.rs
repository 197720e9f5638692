//! HTTP routes for the simulator.
//!
//! | Method | Path         | Body                    | Response                     |
//! |--------|--------------|-------------------------|------------------------------|
//! | POST   | `/simulate`  | optional params (JSON)  | `{ time, T, V, L }`          |
//! | GET    | `/health`    | -                       | `{ status, version }`        |
//! | GET    | `/scenarios` | -                       | `[{ name, description, params }]` |
//!
//! `POST /simulate?summary=true` adds a `summary` object to the response.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Deserializer, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use hiv_core::{
    simulate_checked, ScenarioId, SimError, SimulationLimits, SimulationParams, SimulationResult,
    TrajectorySummary,
};

use crate::cors::CorsPolicy;
use crate::error::ApiError;

/// Shared, read-only state for all requests.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub limits: SimulationLimits,
}

impl AppState {
    pub fn new(limits: SimulationLimits) -> Self {
        Self { limits }
    }
}

/// Body of `POST /simulate`. Omitted fields take the model defaults;
/// an explicit `null` is a type error.
///
/// Integers are read as `i64` so that out-of-range horizons reach
/// validation instead of failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SimulationRequest {
    #[serde(default, deserialize_with = "present")]
    pub t_max: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    pub therapy_start: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    pub release_rate: Option<f64>,
    #[serde(default, deserialize_with = "present")]
    pub payload_type: Option<String>,
}

/// Deserializes a field that may be omitted but not `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

impl SimulationRequest {
    /// Applies defaults and checks the result against `limits`.
    pub fn into_params(self, limits: &SimulationLimits) -> Result<SimulationParams, SimError> {
        let defaults = SimulationParams::default();

        let t_max = match self.t_max {
            None => defaults.t_max,
            Some(n) if n < 1 => return Err(SimError::InvalidHorizon(n)),
            Some(n) => u32::try_from(n).map_err(|_| SimError::HorizonTooLarge {
                requested: n,
                limit: limits.max_steps,
            })?,
        };

        let params = SimulationParams {
            t_max,
            therapy_start: self.therapy_start.unwrap_or(defaults.therapy_start),
            release_rate: self.release_rate.unwrap_or(defaults.release_rate),
            payload_type: self.payload_type.unwrap_or(defaults.payload_type),
        };
        params.validate(limits)?;
        Ok(params)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SimulateQuery {
    /// Include a [`TrajectorySummary`] in the response
    pub summary: bool,
}

#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    #[serde(flatten)]
    pub result: SimulationResult,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TrajectorySummary>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ScenarioInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub params: SimulationParams,
}

/// Builds the application router with the given state and CORS policy.
pub fn build_router(state: AppState, cors: &CorsPolicy) -> Router {
    Router::new()
        .route("/simulate", post(run_simulation))
        .route("/health", get(health))
        .route("/scenarios", get(list_scenarios))
        .with_state(Arc::new(state))
        .layer(cors.layer())
        .layer(TraceLayer::new_for_http())
}

async fn run_simulation(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SimulateQuery>, QueryRejection>,
    body: Result<Json<SimulationRequest>, JsonRejection>,
) -> Result<Json<SimulateResponse>, ApiError> {
    let Query(query) = query?;
    let Json(request) = body?;
    let params = request.into_params(&state.limits)?;

    for note in params.warnings() {
        warn!(%note, "non-physical parameters");
    }

    info!(
        t_max = params.t_max,
        therapy_start = params.therapy_start,
        release_rate = params.release_rate,
        payload_type = %params.payload_type,
        "running simulation"
    );

    let result = simulate_checked(&params)?;
    let summary = query
        .summary
        .then(|| TrajectorySummary::from_result(&params, &result));

    Ok(Json(SimulateResponse { result, summary }))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_scenarios() -> Json<Vec<ScenarioInfo>> {
    let scenarios = ScenarioId::all()
        .into_iter()
        .map(|id| ScenarioInfo {
            name: id.name(),
            description: id.description(),
            params: id.params(),
        })
        .collect();
    Json(scenarios)
}
