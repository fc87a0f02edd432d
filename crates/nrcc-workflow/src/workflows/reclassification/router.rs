use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationId, UserId};
use super::engine::{
    ActionInput, AppealDecisionInput, AppealInput, CreateApplication, DecisionInput,
    GazettementUpdate, RecommendationInput, ReclassificationEngine, UpdateApplication,
    VerificationReportInput, VerificationRequest, WorkflowError,
};
use super::repository::{ApplicationStore, Notifier, StoreError, UserDirectory};

/// Router builder exposing HTTP endpoints for the reclassification pipeline.
pub fn application_router<S, D, N>(engine: Arc<ReclassificationEngine<S, D, N>>) -> Router
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    Router::new()
        .route(
            "/api/v1/reclassification/applications",
            post(create_handler::<S, D, N>),
        )
        .route(
            "/api/v1/reclassification/applications/:application_id",
            get(fetch_handler::<S, D, N>)
                .put(update_handler::<S, D, N>)
                .delete(delete_handler::<S, D, N>),
        )
        .route(
            "/api/v1/reclassification/applications/:application_id/submit",
            post(submit_handler::<S, D, N>),
        )
        .route(
            "/api/v1/reclassification/applications/:application_id/ras-approve",
            post(ras_approve_handler::<S, D, N>),
        )
        .route(
            "/api/v1/reclassification/applications/:application_id/rc-approve",
            post(rc_approve_handler::<S, D, N>),
        )
        .route(
            "/api/v1/reclassification/applications/:application_id/return",
            post(return_handler::<S, D, N>),
        )
        .route(
            "/api/v1/reclassification/applications/:application_id/forward-to-chair",
            post(forward_handler::<S, D, N>),
        )
        .route(
            "/api/v1/reclassification/applications/:application_id/assign-verification",
            post(assign_verification_handler::<S, D, N>),
        )
        .route(
            "/api/v1/reclassification/applications/:application_id/submit-verification-report",
            post(verification_report_handler::<S, D, N>),
        )
        .route(
            "/api/v1/reclassification/applications/:application_id/submit-recommendation",
            post(recommendation_handler::<S, D, N>),
        )
        .route(
            "/api/v1/reclassification/applications/:application_id/decision",
            post(decision_handler::<S, D, N>),
        )
        .route(
            "/api/v1/reclassification/applications/:application_id/gazette",
            post(gazette_handler::<S, D, N>),
        )
        .route(
            "/api/v1/reclassification/applications/:application_id/appeal",
            post(appeal_handler::<S, D, N>),
        )
        .route(
            "/api/v1/reclassification/applications/:application_id/appeal-decision",
            post(appeal_decision_handler::<S, D, N>),
        )
        .with_state(engine)
}

/// Maps workflow failures onto the HTTP error taxonomy: validation to 422,
/// precondition and concurrency conflicts to 409, authorization to 403,
/// missing records to 404, infrastructure to 500.
struct ApiError(WorkflowError);

impl From<WorkflowError> for ApiError {
    fn from(error: WorkflowError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            WorkflowError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WorkflowError::Precondition { .. }
            | WorkflowError::AppealAlreadyOpen
            | WorkflowError::ReportAlreadySubmitted
            | WorkflowError::Storage(StoreError::Conflict(_))
            | WorkflowError::Storage(StoreError::VersionConflict(_)) => StatusCode::CONFLICT,
            WorkflowError::PermissionDenied { .. }
            | WorkflowError::NotApplicant
            | WorkflowError::NotCurrentOwner
            | WorkflowError::NotAssignee => StatusCode::FORBIDDEN,
            WorkflowError::ApplicationNotFound(_)
            | WorkflowError::ActorNotFound(_)
            | WorkflowError::AssignmentNotFound(_)
            | WorkflowError::RecommendationNotFound
            | WorkflowError::DecisionNotFound
            | WorkflowError::GazettementNotFound
            | WorkflowError::AppealNotFound => StatusCode::NOT_FOUND,
            WorkflowError::NoActiveRoleHolder(_)
            | WorkflowError::Storage(StoreError::NotFound(_))
            | WorkflowError::Storage(StoreError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let payload = json!({
            "error": self.0.to_string(),
        });
        (status, axum::Json(payload)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ActorQuery {
    actor: String,
}

type Engine<S, D, N> = Arc<ReclassificationEngine<S, D, N>>;

pub(crate) async fn create_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    axum::Json(input): axum::Json<CreateApplication>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    match engine.create(input) {
        Ok(application) => {
            (StatusCode::CREATED, axum::Json(application.view())).into_response()
        }
        Err(error) => ApiError(error).into_response(),
    }
}

pub(crate) async fn fetch_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    Path(application_id): Path<String>,
    Query(query): Query<ActorQuery>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    match engine.get(&ApplicationId(application_id), &UserId(query.actor)) {
        Ok(application) => axum::Json(application.view()).into_response(),
        Err(error) => ApiError(error).into_response(),
    }
}

pub(crate) async fn update_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(input): axum::Json<UpdateApplication>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    respond(engine.update(&ApplicationId(application_id), input))
}

pub(crate) async fn delete_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    Path(application_id): Path<String>,
    Query(query): Query<ActorQuery>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    match engine.delete(&ApplicationId(application_id), &UserId(query.actor)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => ApiError(error).into_response(),
    }
}

pub(crate) async fn submit_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(input): axum::Json<ActionInput>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    respond(engine.submit(&ApplicationId(application_id), input))
}

pub(crate) async fn ras_approve_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(input): axum::Json<ActionInput>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    respond(engine.ras_approve(&ApplicationId(application_id), input))
}

pub(crate) async fn rc_approve_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(input): axum::Json<ActionInput>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    respond(engine.rc_approve(&ApplicationId(application_id), input))
}

pub(crate) async fn return_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(input): axum::Json<ActionInput>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    respond(engine.return_for_correction(&ApplicationId(application_id), input))
}

pub(crate) async fn forward_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(input): axum::Json<ActionInput>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    respond(engine.forward_to_chair(&ApplicationId(application_id), input))
}

pub(crate) async fn assign_verification_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(input): axum::Json<VerificationRequest>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    respond(engine.assign_verification(&ApplicationId(application_id), input))
}

pub(crate) async fn verification_report_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(input): axum::Json<VerificationReportInput>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    respond(engine.submit_verification_report(&ApplicationId(application_id), input))
}

pub(crate) async fn recommendation_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(input): axum::Json<RecommendationInput>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    respond(engine.submit_recommendation(&ApplicationId(application_id), input))
}

pub(crate) async fn decision_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(input): axum::Json<DecisionInput>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    respond(engine.record_minister_decision(&ApplicationId(application_id), input))
}

pub(crate) async fn gazette_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(input): axum::Json<GazettementUpdate>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    respond(engine.update_gazettement(&ApplicationId(application_id), input))
}

pub(crate) async fn appeal_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(input): axum::Json<AppealInput>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    respond(engine.submit_appeal(&ApplicationId(application_id), input))
}

pub(crate) async fn appeal_decision_handler<S, D, N>(
    State(engine): State<Engine<S, D, N>>,
    Path(application_id): Path<String>,
    axum::Json(input): axum::Json<AppealDecisionInput>,
) -> Response
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    respond(engine.decide_appeal(&ApplicationId(application_id), input))
}

fn respond(result: Result<super::domain::Application, WorkflowError>) -> Response {
    match result {
        Ok(application) => axum::Json(application.view()).into_response(),
        Err(error) => ApiError(error).into_response(),
    }
}
