//! Daemon wiring: stores, publishers, scheduler, sweep, shutdown.

use std::sync::Arc;

use async_trait::async_trait;
use miette::{IntoDiagnostic, Result};
use tracing::{error, info};

use crosspost_model::{Post, PublishReport};
use crosspost_publish::clients::{
    FacebookPublisher, InstagramPublisher, ThreadsPublisher, TwitterPublisher,
};
use crosspost_publish::{PublishOrchestrator, PublisherRegistry};
use crosspost_scheduler::{
    InMemoryJobStore, JobStore, PostPublisher, ReconciliationSweep, SchedulerService, SweepConfig,
};
use crosspost_store::{
    ConnectionStore, InMemoryConnectionStore, InMemoryPostStore, InMemoryPublishLogStore,
    PostStore, PublishLogStore,
};

/// Daemon configuration, assembled from CLI flags.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Sweep tick; the expiry check runs once per tick.
    pub sweep_tick: std::time::Duration,
    pub sweep: SweepConfig,
}

/// Adapts the orchestrator to the narrow capability the scheduler needs.
struct OrchestratorPublisher {
    orchestrator: PublishOrchestrator,
}

#[async_trait]
impl PostPublisher for OrchestratorPublisher {
    async fn publish(&self, post: &Post) -> PublishReport {
        self.orchestrator.publish_post(post).await
    }
}

/// Run the daemon until ctrl-c: restore scheduled posts, then drive the
/// worker loop and the reconciliation sweep.
pub async fn run(config: DaemonConfig) -> Result<()> {
    let posts: Arc<dyn PostStore> = Arc::new(InMemoryPostStore::new());
    let connections: Arc<dyn ConnectionStore> = Arc::new(InMemoryConnectionStore::new());
    let publish_log: Arc<dyn PublishLogStore> = Arc::new(InMemoryPublishLogStore::new());
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());

    let registry = PublisherRegistry::new()
        .register(Arc::new(FacebookPublisher::new()))
        .register(Arc::new(InstagramPublisher::new()))
        .register(Arc::new(TwitterPublisher::new()))
        .register(Arc::new(ThreadsPublisher::new()));
    info!(platforms = ?registry.platforms(), "registered platform publishers");

    let orchestrator =
        PublishOrchestrator::new(Arc::clone(&connections), Arc::clone(&publish_log), registry);

    let scheduler = Arc::new(SchedulerService::new(
        Arc::clone(&jobs),
        Arc::clone(&posts),
        Arc::new(OrchestratorPublisher { orchestrator }),
    ));

    // Crash recovery before the worker starts claiming jobs.
    let restored = scheduler
        .restore_scheduled_posts()
        .await
        .into_diagnostic()?;
    info!(restored, "startup restore complete");

    let sweep = Arc::new(ReconciliationSweep::new(
        Arc::clone(&posts),
        Arc::clone(&jobs),
        Arc::clone(&publish_log),
        config.sweep.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let worker = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        let shutdown_rx = shutdown_rx.clone();
        async move { scheduler.run(shutdown_rx).await }
    });

    let sweeper = tokio::spawn({
        let sweep = Arc::clone(&sweep);
        let tick = config.sweep_tick;
        async move { sweep.run(shutdown_rx, tick).await }
    });

    info!("daemon running, press ctrl-c to stop");
    tokio::signal::ctrl_c().await.into_diagnostic()?;
    info!("shutdown requested, draining");

    shutdown_tx.send(true).into_diagnostic()?;
    if let Err(e) = worker.await {
        error!(error = %e, "worker task panicked");
    }
    if let Err(e) = sweeper.await {
        error!(error = %e, "sweep task panicked");
    }

    info!("daemon stopped");
    Ok(())
}
