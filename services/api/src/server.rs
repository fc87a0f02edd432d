use crate::cli::ServeArgs;
use crate::infra::{seeded_directory, AppState, InMemoryApplicationStore, LoggingNotifier};
use crate::routes::with_application_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use nrcc_workflow::config::AppConfig;
use nrcc_workflow::error::AppError;
use nrcc_workflow::telemetry;
use nrcc_workflow::workflows::reclassification::{
    ReclassificationEngine, RolePermissionPolicy, WorkflowConfig,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryApplicationStore::default());
    let directory = Arc::new(seeded_directory());
    let notifier = Arc::new(LoggingNotifier);
    let engine = Arc::new(ReclassificationEngine::new(
        store,
        directory,
        notifier,
        Arc::new(RolePermissionPolicy),
        WorkflowConfig {
            application_number_prefix: config.workflow.application_number_prefix.clone(),
        },
    ));

    let app = with_application_routes(engine)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "road reclassification service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
