use crate::cli::ServeArgs;
use crate::infra::{load_catalog, AppState, AssessmentService};
use crate::routes::app_router;
use assessment_engine::assessment::{FileStore, PersistenceSettings};
use assessment_engine::config::AppConfig;
use assessment_engine::error::AppError;
use assessment_engine::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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

    let catalog = Arc::new(load_catalog(args.questionnaire.as_deref())?);
    let store = Arc::new(FileStore::new(&config.persistence.store_dir));
    let service = Arc::new(AssessmentService::new(
        catalog,
        store,
        PersistenceSettings::from(&config.persistence),
    ));

    let app = app_router(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        store = %config.persistence.store_dir.display(),
        "assessment engine ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
