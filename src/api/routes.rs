use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::domain::{DecisionSummary, PolicyRecord};
use crate::engine::{DriftMonitor, DriftReport, GovernanceService};
use crate::observability::MetricsRegistry;

use super::error::ApiError;
use super::request::{
    CreatePolicyRequest, DriftQuery, EvaluateRequest, ListDecisionsQuery, ReviewDecisionRequest,
    TenantQuery,
};
use super::response::{DecisionDetailResponse, DecisionListItem, HealthResponse, ReviewResponse};

const DASHBOARD_HTML: &str = include_str!("../../assets/dashboard.html");

/// Shared application state.
pub struct AppState {
    /// Policy, evaluation and review operations
    pub governance: GovernanceService,

    /// Bias drift checks
    pub drift: DriftMonitor,

    pub metrics: Arc<MetricsRegistry>,

    /// Application start time
    pub start_time: Instant,

    /// Application version
    pub version: String,
}

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/policies", post(handle_create_policy).get(handle_list_policies))
        .route("/evaluate", post(handle_evaluate))
        .route("/decisions", get(handle_list_decisions))
        .route("/decisions/:decision_id", post(handle_review_decision))
        .route("/decisions/:decision_id/detail", get(handle_decision_detail))
        .route("/bias/drift", get(handle_drift))
        .route("/health", get(handle_health))
        .route("/metrics", get(handle_metrics))
        .route("/dashboard", get(handle_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_create_policy(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreatePolicyRequest>, JsonRejection>,
) -> Result<Json<PolicyRecord>, ApiError> {
    let Json(req) = payload?;
    let policy = req.into_new_policy()?;

    Ok(Json(state.governance.create_policy(policy).await?))
}

async fn handle_list_policies(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TenantQuery>, QueryRejection>,
) -> Result<Json<Vec<PolicyRecord>>, ApiError> {
    let Query(query) = query?;
    query.validate()?;

    Ok(Json(state.governance.list_policies(&query.tenant_id).await?))
}

/// Evaluate an answer and record the decision.
async fn handle_evaluate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<DecisionSummary>, ApiError> {
    let Json(req) = payload?;
    let evaluation = req.into_evaluation()?;

    Ok(Json(state.governance.evaluate(evaluation).await?))
}

async fn handle_list_decisions(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListDecisionsQuery>, QueryRejection>,
) -> Result<Json<Vec<DecisionListItem>>, ApiError> {
    let Query(query) = query?;
    let (status, limit) = query.validate()?;

    let decisions = state
        .governance
        .list_decisions(&query.tenant_id, status, limit)
        .await?;

    Ok(Json(decisions.into_iter().map(DecisionListItem::from).collect()))
}

/// Reviewer update of a decision.
async fn handle_review_decision(
    State(state): State<Arc<AppState>>,
    Path(decision_id): Path<String>,
    payload: Result<Json<ReviewDecisionRequest>, JsonRejection>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let Json(req) = payload?;
    let review = req.into_review()?;

    let (id, version) = state
        .governance
        .review_decision(&decision_id, review)
        .await?;

    Ok(Json(ReviewResponse::updated(id, version)))
}

async fn handle_decision_detail(
    State(state): State<Arc<AppState>>,
    Path(decision_id): Path<String>,
) -> Result<Json<DecisionDetailResponse>, ApiError> {
    let (decision, audit) = state.governance.decision_detail(&decision_id).await?;

    Ok(Json(DecisionDetailResponse::new(decision, audit)))
}

/// Bias drift between the two most recent windows.
async fn handle_drift(
    State(state): State<Arc<AppState>>,
    query: Result<Query<DriftQuery>, QueryRejection>,
) -> Result<Json<DriftReport>, ApiError> {
    let Query(query) = query?;
    let (window, threshold) = query.validate()?;

    Ok(Json(
        state
            .drift
            .check(&query.tenant_id, window, threshold)
            .await?,
    ))
}

/// Health check endpoint.
async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Metrics endpoint (Prometheus format).
async fn handle_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state
            .metrics
            .to_prometheus(state.start_time.elapsed().as_secs()),
    )
}

/// Reviewer console.
async fn handle_dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}
