use std::{process, sync::Arc};

use tokio::signal;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use zefiro::{
    application::{
        catalog::CatalogService,
        error::AppError,
        stores::ViewStore,
        syndication::SyndicationService,
        views::ViewCounterService,
    },
    config,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        kv::{DisabledViewStore, RestKvStore},
        telemetry,
    },
    presentation::views::LayoutChrome,
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (_cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let store = build_view_store(&settings)?;
    let state = HttpState {
        catalog: Arc::new(CatalogService::new()),
        views: ViewCounterService::new(store),
        syndication: Arc::new(SyndicationService::new(&settings.site)),
        chrome: LayoutChrome::from_site(&settings.site),
    };

    serve_http(&settings, state).await
}

fn build_view_store(settings: &config::Settings) -> Result<Arc<dyn ViewStore>, AppError> {
    match RestKvStore::from_settings(&settings.views).map_err(AppError::from)? {
        Some(store) => {
            info!(
                target = "zefiro::startup",
                "view counters enabled against external store"
            );
            Ok(Arc::new(store))
        }
        None => {
            info!(
                target = "zefiro::startup",
                "no view store configured, counters render zero and increments are dropped"
            );
            Ok(Arc::new(DisabledViewStore))
        }
    }
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "zefiro::startup",
        addr = %settings.server.public_addr,
        "serving public site"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "failed to install shutdown handler");
    }
}
