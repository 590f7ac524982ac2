use std::{iter::once, sync::Arc, time::Duration};

use axum::{
    Extension, ServiceExt,
    body::Body,
    extract::Request,
    http::{HeaderName, Response},
};
use time::UtcOffset;
use tokio::{io::BufReader, sync::mpsc};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    sensitive_headers::SetSensitiveRequestHeadersLayer,
    trace::TraceLayer,
};
use tracing::{Span, error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use tailgate_server::{
    app::App,
    config::ServerConfig,
    db::{apply_migrations, connect},
    feed::LiveFeed,
    ingest::IngestCoordinator,
    layers::detection::DetectionRepoLayer,
    sources::{LocationSource, NoLocationSource, StaticLocationSource, read_sightings},
    utils::get_request_id,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Use UTC timestamps
    let offset = UtcOffset::UTC;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_timer(fmt::time::OffsetTime::new(
                    offset,
                    time::format_description::well_known::Rfc3339,
                ))
                .with_level(true)
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .with(EnvFilter::from_default_env())
        .try_init()?;

    // Load configuration
    let settings = ServerConfig::load()?;
    info!(
        msg = "Loaded configuration",
        database_path = settings.database.path,
        bind_addr = settings.server.bind_addr,
        location_timeout_ms = settings.ingest.location_timeout_ms,
        static_location = settings.location.is_some(),
    );

    // Connect to DB
    let pool = Arc::new(connect(&settings.database.path).await?);
    apply_migrations(&pool).await?;
    info!(msg = "Initialized database", path = %settings.database.path);

    let repo_layer = DetectionRepoLayer::sqlite(pool.clone());
    let repo = repo_layer.0.clone();

    let feed = LiveFeed::start(repo.clone()).await;
    feed.subscribe(|update| match update {
        Ok(summaries) => info!(
            msg = "Multi-location devices updated",
            devices = summaries.len()
        ),
        Err(e) => error!(msg = "Multi-location summary unavailable", error = %e),
    });
    info!(
        msg = "Started live feed",
        subscribers = feed.subscriber_count()
    );

    let locations: Arc<dyn LocationSource> = match settings.location {
        Some(fix) => Arc::new(StaticLocationSource(fix)),
        None => Arc::new(NoLocationSource),
    };
    let coordinator = IngestCoordinator::new(
        repo,
        locations,
        feed.clone(),
        settings.ingest.location_timeout(),
    );

    // Queue for line-oriented scan sources
    let (sightings_tx, sightings_rx) = mpsc::channel(settings.ingest.queue_capacity);
    tokio::spawn(coordinator.clone().run(sightings_rx));

    if settings.ingest.read_stdin {
        tokio::spawn(async move {
            let reader = BufReader::new(tokio::io::stdin());
            match read_sightings(reader, sightings_tx).await {
                Ok(count) => info!(msg = "Stdin scan source finished", sightings = count),
                Err(e) => error!(msg = "Stdin scan source failed", error = %e),
            }
        });
    } else {
        drop(sightings_tx);
    }

    // Build routes
    let app = App::new()
        .router()
        .layer(Extension(coordinator))
        .layer(Extension(feed))
        .layer(repo_layer)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .on_request(|req: &Request<Body>, _span: &Span| {
                    let headers = req
                        .headers()
                        .iter()
                        .filter(|(k, _)| k.as_str().to_ascii_lowercase() != "x-request-id")
                        .map(|(k, v)| {
                            let val = if v.is_sensitive() {
                                "******"
                            } else {
                                v.to_str().unwrap_or("<non-utf8>")
                            };
                            format!("{}: {}", k.as_str(), val)
                        })
                        .collect::<Vec<_>>()
                        .join("; ");

                    info!(
                        msg = "Request initiated",
                        req_id = %get_request_id(req.extensions()),
                        method = %req.method(),
                        uri = %req.uri(),
                        headers = %headers
                    )
                })
                .on_response(|res: &Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        msg = "Request processed",
                        req_id = %get_request_id(res.extensions()),
                        status = %res.status().as_u16(),
                        latency = ?latency
                    )
                }),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid::default()))
        .layer(SetSensitiveRequestHeadersLayer::new(once(
            HeaderName::from_static("authorization"),
        )));

    let listener = tokio::net::TcpListener::bind(&settings.server.bind_addr).await?;

    info!(msg = "Starting server", addr = %settings.server.bind_addr);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

    Ok(())
}
