//! Prometheus metrics exporter.

use std::net::SocketAddr;

use eyre::WrapErr;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

/// Install the Prometheus recorder as the global metrics recorder and serve
/// it over HTTP on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn install_prometheus_exporter(addr: SocketAddr) -> eyre::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .wrap_err("failed to install prometheus exporter")?;

    metrics::describe_counter!(
        "opennet.announcer.announcements_sent_total",
        "Announcements dispatched to seed nodes"
    );
    metrics::describe_gauge!(
        "opennet.announcer.running_announcements",
        "Announcement sessions currently in flight"
    );

    info!(%addr, "prometheus exporter listening");
    Ok(())
}
