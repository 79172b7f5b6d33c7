// src/metrics.rs
use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder. With a port, the exporter also serves
/// the exposition format on `0.0.0.0:{port}/metrics`; without one the
/// recorder still collects so dry runs stay off the network.
pub fn init(port: Option<u16>) -> Result<()> {
    let builder = PrometheusBuilder::new();
    match port {
        Some(port) => builder
            .with_http_listener(([0, 0, 0, 0], port))
            .install()
            .context("prometheus: install recorder + listener")?,
        None => {
            builder
                .install_recorder()
                .context("prometheus: install recorder")?;
        }
    }
    Ok(())
}
