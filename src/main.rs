use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use quire::{
    application::{
        assemble::PageAssembler, error::AppError, locate::ResourceLocator, page::PageService,
        produce::ScriptProducer,
    },
    cache::{CacheConfig, SystemClock, TemplateCache},
    config,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        purge, telemetry,
    },
};
use tokio::signal;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

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
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::PurgeCache(args) => run_purge(settings, args),
    }
}

fn build_page_service(settings: &config::Settings) -> PageService {
    let assembler = PageAssembler::new();
    let producer = ScriptProducer::new(
        settings.producer.interpreter.as_str(),
        settings.producer.timeout,
    );
    let cache = TemplateCache::new(
        CacheConfig::from(&settings.cache),
        Arc::new(SystemClock),
        assembler,
        Arc::new(producer),
    );
    let locator = ResourceLocator::new(
        settings.site.webpages_dir.clone(),
        settings.site.errors_dir.clone(),
        settings.producer.script_name.clone(),
    );

    PageService::new(locator, assembler, Arc::new(cache))
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    if !settings.site.webpages_dir.is_dir() {
        return Err(InfraError::configuration(format!(
            "webpages directory `{}` does not exist",
            settings.site.webpages_dir.display()
        ))
        .into());
    }

    let state = HttpState::new(Arc::new(build_page_service(&settings)));
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "quire::serve",
        addr = %settings.server.addr,
        webpages = %settings.site.webpages_dir.display(),
        errors = %settings.site.errors_dir.display(),
        cache_enabled = settings.cache.enabled,
        "Listening"
    );

    let grace = settings.server.graceful_shutdown;
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    // The drain deadline only starts once a signal arrives.
    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
        }
        _ = drain_deadline(grace) => {
            warn!(
                target = "quire::serve",
                grace_seconds = grace.as_secs(),
                "Graceful shutdown timed out; dropping open connections"
            );
        }
    }

    Ok(())
}

fn run_purge(settings: config::Settings, args: config::PurgeArgs) -> Result<(), AppError> {
    let roots = [
        settings.site.webpages_dir.as_path(),
        settings.site.errors_dir.as_path(),
    ];
    let report = purge::purge_artifacts(&roots, args.dry_run)?;

    for path in &report.artifacts {
        println!("{}", path.display());
    }
    let verb = if report.dry_run { "would remove" } else { "removed" };
    println!("{verb} {} cached artifact(s)", report.count());

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(target = "quire::serve", "Shutdown signal received; draining connections");
}

async fn drain_deadline(grace: Duration) {
    shutdown_signal().await;
    tokio::time::sleep(grace).await;
}
