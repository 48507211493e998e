//! Serve command - run the ingestion service
//!
//! Wires the process-scoped services together:
//!
//! ```text
//! Kafka ──→ IngestConsumer ──→ durable store
//!                 └──→ FanoutPublisher ──→ ChannelHub ──→ /ws viewers
//!                            └── metadata database
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use clap::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use shipyard_config::Config;
use shipyard_control::{ControlPlane, DeploymentDirectory};
use shipyard_pipeline::{
    FanoutMetrics, FanoutPublisher, IngestConsumer, IngestMetrics, KafkaBatchReader,
    ProcessorContext,
};
use shipyard_tap::{ChannelHub, GatewayServer, GatewayServerConfig, HubConfig, WS_PATH};

use super::{Store, load_config, open_store};
use crate::routes::{AppState, ServerMetrics, build_router};

/// Serve command arguments
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file (defaults to configs/config.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config_path = args
        .config
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(default)".to_string());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path,
        "Shipyard starting"
    );

    let config = load_config(args.config.as_deref())?;

    if let Err(e) = run_server(config).await {
        error!(error = %e, "server error");
        return Err(e);
    }

    info!("Shipyard shutdown complete");
    Ok(())
}

/// Main server run loop
async fn run_server(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();
    let shutdown_timeout = config.pipeline.shutdown_timeout;

    // Durable store
    let store = open_store(&config.sink, true).await?;
    info!(sink = store.sink.name(), "durable store ready");

    // Metadata for deployment → project resolution
    let database_path = config.metadata.database_path();
    let control = ControlPlane::new(&database_path)
        .await
        .with_context(|| format!("failed to open metadata database {}", database_path.display()))?;
    info!(database = %database_path.display(), "metadata database ready");
    let directory: Arc<dyn DeploymentDirectory> = Arc::new(control);

    // Subscription hub
    let hub = Arc::new(ChannelHub::new(
        HubConfig::default()
            .with_max_connections(config.gateway.max_connections)
            .with_connection_buffer(config.gateway.connection_buffer),
    ));
    let hub_maintenance = hub.spawn_maintenance(cancel.clone());

    // Live fan-out
    let ingest_metrics = Arc::new(IngestMetrics::new());
    let mut context = ProcessorContext::new(Arc::clone(&store.sink))
        .with_metrics(Arc::clone(&ingest_metrics))
        .with_commit_every(config.pipeline.commit_every)
        .with_heartbeat_interval(config.transport.heartbeat_interval);

    let mut fanout_metrics = None;
    let mut fanout_task = None;
    if config.fanout.enabled {
        let publisher = FanoutPublisher::new(directory, hub.clone())
            .with_lookup_timeout(config.metadata.lookup_timeout);
        fanout_metrics = Some(Arc::clone(publisher.metrics()));

        let (handle, task) = publisher.spawn(config.fanout.queue_size);
        context = context.with_fanout(handle);
        fanout_task = Some(task);
        info!(queue_size = config.fanout.queue_size, "fan-out publisher started");
    } else {
        info!("fan-out disabled, log lines are stored only");
    }

    // Ingestion
    let transport = Arc::new(
        KafkaBatchReader::new(&config.transport).context("failed to create kafka consumer")?,
    );
    let consumer = IngestConsumer::new(transport, context)
        .with_partition_queue_size(config.transport.partition_queue_size)
        .with_shutdown_timeout(shutdown_timeout);
    let mut consumer_task = tokio::spawn(consumer.run(cancel.clone()));

    // HTTP: gateway, transcripts, health and metrics
    let server_metrics = Arc::new(ServerMetrics::new(
        Arc::clone(&ingest_metrics),
        fanout_metrics.clone(),
        Arc::clone(&store.sink),
        Arc::clone(&hub),
    ));
    let http_task = if config.gateway.enabled {
        Some(start_http_server(&config, &store, &hub, Arc::clone(&server_metrics), cancel.clone()).await?)
    } else {
        info!("gateway disabled");
        None
    };

    // Periodic metrics log
    let metrics_task = if config.metrics.enabled {
        Some(tokio::spawn(report_metrics(
            config.metrics.interval,
            ingest_metrics,
            fanout_metrics,
            hub.clone(),
            cancel.clone(),
        )))
    } else {
        info!("metrics reporting disabled");
        None
    };

    info!(
        topic = %config.transport.topic,
        group_id = %config.transport.group_id,
        gateway = %config.gateway.addr(),
        "Shipyard running"
    );

    let consumer_finished = tokio::select! {
        _ = wait_for_shutdown() => {
            info!("shutdown signal received, stopping server...");
            None
        }
        result = &mut consumer_task => Some(result),
    };

    cancel.cancel();

    // Workers finish their in-flight batch and commit before the consumer returns
    let consumer_result = match consumer_finished {
        Some(result) => Ok(result),
        None => tokio::time::timeout(shutdown_timeout, consumer_task).await,
    };
    let mut failure = None;
    match consumer_result {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => {
            error!(error = %e, "ingest consumer failed");
            failure = Some(anyhow::Error::new(e).context("ingest consumer failed"));
        }
        Ok(Err(e)) => warn!(error = %e, "ingest consumer panicked"),
        Err(_) => warn!("ingest consumer did not stop within timeout"),
    }

    // Consumer is gone, so the fan-out queue is closed and drains
    if let Some(task) = fanout_task {
        match tokio::time::timeout(shutdown_timeout, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "fan-out publisher panicked"),
            Err(_) => warn!("fan-out publisher did not drain within timeout"),
        }
    }

    if let Some(task) = http_task {
        match tokio::time::timeout(shutdown_timeout, task).await {
            Ok(_) => {}
            Err(_) => warn!("http server did not stop within timeout"),
        }
    }

    if let Err(e) = store.sink.close().await {
        warn!(error = %e, "failed to close durable store");
    }

    hub_maintenance.abort();
    if let Some(task) = metrics_task {
        task.abort();
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Bind the HTTP listener serving the gateway and the HTTP routes
async fn start_http_server(
    config: &Config,
    store: &Store,
    hub: &Arc<ChannelHub>,
    metrics: Arc<ServerMetrics>,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>> {
    let gateway = GatewayServer::new(
        Arc::clone(hub),
        GatewayServerConfig::default().with_ping_interval(config.gateway.ping_interval),
        cancel.clone(),
    );

    let state = AppState {
        transcripts: Arc::clone(&store.transcripts),
        metrics,
    };

    let mut app: Router = build_router(state)
        .merge(gateway.router())
        .layer(TraceLayer::new_for_http());
    if config.gateway.cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let addr = config.gateway.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind gateway on {addr}"))?;

    info!(addr = %addr, ws_path = WS_PATH, "gateway listening");

    Ok(tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
            })
            .await
            .unwrap_or_else(|e| {
                error!(error = %e, "http server error");
            });
    }))
}

/// Log a counter summary every `interval`
async fn report_metrics(
    interval: Duration,
    ingest: Arc<IngestMetrics>,
    fanout: Option<Arc<FanoutMetrics>>,
    hub: Arc<ChannelHub>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await;
    let mut previous = ingest.snapshot();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let current = ingest.snapshot();
                let delta = current.diff(&previous);
                previous = current;

                let fanout = fanout.as_ref().map(|f| f.snapshot()).unwrap_or_default();
                let gateway = hub.stats();

                info!(
                    written = delta.events_written,
                    write_failures = delta.write_failures,
                    malformed = delta.malformed,
                    commits = delta.commits,
                    commit_failures = delta.commit_failures,
                    revocations = delta.revocations,
                    published_total = fanout.published,
                    fanout_dropped_total = fanout.queue_full,
                    viewers = gateway.connections,
                    channels = gateway.channels,
                    "pipeline metrics"
                );
            }
        }
    }
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
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
}
