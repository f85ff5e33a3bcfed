//! Deployment reachability report
//!
//! Probes the relay nodes and the public access URL concurrently. Each probe
//! runs as its own task; a probe that panics fills its own `error` field and
//! leaves the sibling report untouched.

pub mod access_url;
pub mod relay;

pub use access_url::AccessUrlReport;
pub use relay::{RelayNode, RelayNodeReport, RelayReport};

use crate::settings::HealthSettings;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinError;
use url::Url;

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// When the report was assembled
    pub time: DateTime<Utc>,
    #[serde(rename = "pass")]
    pub healthy: bool,
    pub relay: RelayReport,
    pub access_url: AccessUrlReport,
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub relay_nodes: Vec<RelayNode>,
    pub access_url: Option<Url>,
    pub client: reqwest::Client,
    /// Per-request deadline of every probe
    pub timeout: Duration,
}

impl ReportOptions {
    /// Build probe options from settings
    ///
    /// # Errors
    ///
    /// Returns an error if the access URL or a relay node URL is not a valid URL
    pub fn from_settings(settings: &HealthSettings) -> anyhow::Result<Self> {
        let access_url = settings
            .access_url
            .as_deref()
            .map(|raw| Url::parse(raw).with_context(|| format!("Invalid access URL {raw}")))
            .transpose()?;

        let relay_nodes = settings
            .relay_nodes
            .iter()
            .map(|node| {
                Ok(RelayNode {
                    region: node.region.clone(),
                    url: Url::parse(&node.url)
                        .with_context(|| format!("Invalid relay node URL {}", node.url))?,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(Self {
            relay_nodes,
            access_url,
            client: reqwest::Client::new(),
            timeout: Duration::from_millis(settings.probe_timeout_ms),
        })
    }
}

/// Probe everything in `opts` and assemble the report
pub async fn run(opts: &ReportOptions) -> Report {
    let relay = relay::run(opts.relay_nodes.clone(), opts.client.clone(), opts.timeout);
    let access_url = access_url::run(opts.access_url.clone(), opts.client.clone(), opts.timeout);
    collect(relay, access_url).await
}

/// Run both probes as separate tasks and merge their outcomes
pub(crate) async fn collect<R, A>(relay: R, access_url: A) -> Report
where
    R: Future<Output = RelayReport> + Send + 'static,
    A: Future<Output = AccessUrlReport> + Send + 'static,
{
    let relay = tokio::spawn(relay);
    let access_url = tokio::spawn(access_url);
    let (relay, access_url) = tokio::join!(relay, access_url);

    let relay = relay.unwrap_or_else(|err| RelayReport::failed(probe_failure("relay", &err)));
    let access_url = access_url
        .unwrap_or_else(|err| AccessUrlReport::failed(probe_failure("access URL", &err)));

    let healthy = relay.healthy && access_url.healthy;
    if !healthy {
        log::warn!(
            "⚠️ Health check failed (relay: {}, access URL: {})",
            relay.healthy,
            access_url.healthy
        );
    }

    Report {
        time: Utc::now(),
        healthy,
        relay,
        access_url,
    }
}

fn probe_failure(probe: &str, err: &JoinError) -> String {
    log::error!("🔥 {probe} probe did not complete: {err}");
    if err.is_panic() {
        format!("{probe} probe panicked")
    } else {
        format!("{probe} probe was cancelled")
    }
}
