use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use nrcc_workflow::workflows::reclassification::{
    application_router, ApplicationStore, Notifier, ReclassificationEngine, UserDirectory,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_application_routes<S, D, N>(
    engine: Arc<ReclassificationEngine<S, D, N>>,
) -> axum::Router
where
    S: ApplicationStore,
    D: UserDirectory,
    N: Notifier,
{
    application_router(engine)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{seeded_directory, InMemoryApplicationStore, LoggingNotifier};
    use axum::body::Body;
    use axum::http::Request;
    use nrcc_workflow::workflows::reclassification::{RolePermissionPolicy, WorkflowConfig};
    use tower::ServiceExt;

    fn test_router() -> axum::Router {
        let engine = Arc::new(ReclassificationEngine::new(
            Arc::new(InMemoryApplicationStore::default()),
            Arc::new(seeded_directory()),
            Arc::new(LoggingNotifier),
            Arc::new(RolePermissionPolicy),
            WorkflowConfig::default(),
        ));
        with_application_routes(engine)
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let response = test_router()
            .oneshot(
                Request::get("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_route_is_mounted() {
        let payload = serde_json::json!({
            "actor": "applicant-1",
            "applicant_type": "individual",
            "proposed_class": "regional",
            "form_data": {
                "road_name": "Kibaha - Mlandizi",
                "road_length_km": 42.5,
                "current_class": "district",
                "starting_point": "Kibaha township junction",
                "terminal_point": "Mlandizi weighbridge",
                "reclassification_reasons": "Connects two district headquarters"
            },
            "eligibility": [{ "criterion": "R1" }]
        });
        let response = test_router()
            .oneshot(
                Request::post("/api/v1/reclassification/applications")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::to_vec(&payload).expect("serialize"),
                    ))
                    .expect("request"),
            )
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
