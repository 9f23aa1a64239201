//! Opennet announcer simulator.

mod cli;
mod sim;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use opennet_announcer::{AnnouncerContext, AnnouncerService};
use opennet_observability::{init_logging, install_prometheus_exporter};
use opennet_tasks::TaskExecutor;
use tracing::info;

use crate::cli::SimCli;
use crate::sim::{MeshParams, SimulatedMesh};

const PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = SimCli::parse();
    init_logging(&cli.logs)?;

    if let Some(addr) = cli.metrics {
        install_prometheus_exporter(addr)?;
    }

    let config = cli.announcer_config()?;
    let target = config.target_peers(cli.aim_peers);
    let executor = TaskExecutor::try_current()
        .ok_or_else(|| eyre::eyre!("simulator must run inside a tokio runtime"))?;

    let mesh = Arc::new(SimulatedMesh::new(
        MeshParams {
            seeds: cli.seeds,
            aim_peers: cli.aim_peers,
            connect_failure_rate: cli.connect_failure_rate,
        },
        executor.clone(),
    ));
    let ctx = AnnouncerContext::new(
        mesh.clone(),
        mesh.clone(),
        mesh.clone(),
        mesh.clone(),
        mesh.clone(),
    );

    info!(seeds = cli.seeds, aim = cli.aim_peers, target, "starting simulation");
    let service = AnnouncerService::spawn(config, ctx, &executor)?;

    let deadline = tokio::time::Instant::now() + cli.duration();
    let reached = loop {
        if mesh.opennet_peers() >= target {
            break true;
        }
        if tokio::time::Instant::now() >= deadline {
            break false;
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break false,
            _ = tokio::time::sleep(PROGRESS_INTERVAL) => {}
        }
    };

    let status = service.announcer().status_report();
    info!(
        reached,
        peers = mesh.opennet_peers(),
        alerts = mesh.alert_count(),
        "simulation finished"
    );
    println!("{status:#}");

    service.stop();
    executor.shutdown();
    service.join().await;
    Ok(())
}
