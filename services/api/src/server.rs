use crate::cli::{read_catalog, ServeArgs};
use crate::infra::{AppState, InMemoryRequestTypeRepository};
use crate::routes::with_request_type_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use request_intake::config::AppConfig;
use request_intake::error::AppError;
use request_intake::request_types::RequestTypeService;
use request_intake::telemetry;
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
        intake: config.intake,
    };

    let repository = match args.catalog.take() {
        Some(path) => {
            let catalog = read_catalog(&path)?;
            info!(entries = catalog.len(), path = %path.display(), "seeding request types");
            InMemoryRequestTypeRepository::seeded(catalog, &config.intake)?
        }
        None => InMemoryRequestTypeRepository::default(),
    };
    let request_type_service = Arc::new(RequestTypeService::new(
        Arc::new(repository),
        &config.intake,
    ));

    let app = with_request_type_routes(request_type_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        max_extension_depth = config.intake.max_extension_depth,
        "request intake service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
