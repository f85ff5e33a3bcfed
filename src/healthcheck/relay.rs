use serde::Serialize;
use std::time::{Duration, Instant};
use url::Url;

/// A relay node to probe
#[derive(Debug, Clone)]
pub struct RelayNode {
    pub region: String,
    pub url: Url,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelayNodeReport {
    pub region: String,
    pub url: String,
    pub healthy: bool,
    pub status_code: Option<u16>,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelayReport {
    /// True when every configured node answered with a success status
    pub healthy: bool,
    pub nodes: Vec<RelayNodeReport>,
    pub error: Option<String>,
}

impl RelayReport {
    #[must_use]
    pub fn failed(error: String) -> Self {
        Self {
            healthy: false,
            nodes: Vec::new(),
            error: Some(error),
        }
    }
}

/// Probe all nodes concurrently
pub async fn run(nodes: Vec<RelayNode>, client: reqwest::Client, timeout: Duration) -> RelayReport {
    let probes: Vec<_> = nodes
        .into_iter()
        .map(|node| {
            let client = client.clone();
            let region = node.region.clone();
            let url = node.url.to_string();
            (region, url, tokio::spawn(probe_node(node, client, timeout)))
        })
        .collect();

    let mut reports = Vec::with_capacity(probes.len());
    for (region, url, handle) in probes {
        let report = handle.await.unwrap_or_else(|err| RelayNodeReport {
            region,
            url,
            healthy: false,
            status_code: None,
            latency_ms: None,
            error: Some(format!("probe did not complete: {err}")),
        });
        reports.push(report);
    }

    RelayReport {
        healthy: reports.iter().all(|node| node.healthy),
        nodes: reports,
        error: None,
    }
}

async fn probe_node(node: RelayNode, client: reqwest::Client, timeout: Duration) -> RelayNodeReport {
    let started = Instant::now();
    let result = client.get(node.url.clone()).timeout(timeout).send().await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let mut report = RelayNodeReport {
        region: node.region,
        url: node.url.to_string(),
        healthy: false,
        status_code: None,
        latency_ms: None,
        error: None,
    };

    match result {
        Ok(response) => {
            let status = response.status();
            report.status_code = Some(status.as_u16());
            report.latency_ms = Some(latency_ms);
            if status.is_success() {
                report.healthy = true;
            } else {
                report.error = Some(format!("unexpected status {status}"));
            }
        }
        Err(err) => {
            log::debug!("Relay node {} unreachable: {err}", report.url);
            report.error = Some(err.to_string());
        }
    }

    report
}
