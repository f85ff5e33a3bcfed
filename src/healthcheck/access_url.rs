use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Body the health endpoint of the deployment answers with
pub const HEALTHZ_OK: &str = "OK";

#[derive(Debug, Clone, Serialize)]
pub struct AccessUrlReport {
    pub healthy: bool,
    pub reachable: bool,
    pub status_code: Option<u16>,
    pub healthz_response: String,
    pub error: Option<String>,
}

impl AccessUrlReport {
    #[must_use]
    pub fn failed(error: String) -> Self {
        Self {
            healthy: false,
            reachable: false,
            status_code: None,
            healthz_response: String::new(),
            error: Some(error),
        }
    }
}

/// `<access_url>/healthz`, keeping any path prefix the access URL carries
fn healthz_url(access_url: &Url) -> Result<Url, String> {
    let mut url = access_url.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| format!("{access_url} cannot be a base URL"))?
        .pop_if_empty()
        .push("healthz");
    Ok(url)
}

/// GET `<access_url>/healthz` and check for a success status with body `OK`
pub async fn run(access_url: Option<Url>, client: reqwest::Client, timeout: Duration) -> AccessUrlReport {
    let Some(access_url) = access_url else {
        return AccessUrlReport::failed("access URL is not configured".to_string());
    };
    let healthz = match healthz_url(&access_url) {
        Ok(url) => url,
        Err(err) => return AccessUrlReport::failed(format!("invalid healthz URL: {err}")),
    };

    let response = match client.get(healthz.clone()).timeout(timeout).send().await {
        Ok(response) => response,
        Err(err) => {
            log::debug!("Access URL {healthz} unreachable: {err}");
            return AccessUrlReport::failed(format!("GET {healthz}: {err}"));
        }
    };

    let status = response.status();
    let mut report = AccessUrlReport {
        healthy: false,
        reachable: true,
        status_code: Some(status.as_u16()),
        healthz_response: String::new(),
        error: None,
    };

    match response.text().await {
        Ok(body) => report.healthz_response = body,
        Err(err) => {
            report.error = Some(format!("read healthz response: {err}"));
            return report;
        }
    }

    if !status.is_success() {
        report.error = Some(format!("unexpected status {status}"));
    } else if report.healthz_response.trim() != HEALTHZ_OK {
        report.error = Some(format!(
            "unexpected healthz response {:?}",
            report.healthz_response
        ));
    } else {
        report.healthy = true;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthz_url_keeps_path_prefix() {
        for (access_url, expected) in [
            ("https://coder.example.com", "https://coder.example.com/healthz"),
            ("https://coder.example.com/", "https://coder.example.com/healthz"),
            ("https://example.com/coder", "https://example.com/coder/healthz"),
            ("https://example.com/coder/", "https://example.com/coder/healthz"),
            ("https://example.com/coder/?x=1", "https://example.com/coder/healthz"),
        ] {
            let url = Url::parse(access_url).unwrap();
            assert_eq!(healthz_url(&url).unwrap().as_str(), expected, "{access_url}");
        }
    }

    #[test]
    fn test_healthz_url_rejects_non_base_url() {
        let url = Url::parse("mailto:ops@example.com").unwrap();
        assert!(healthz_url(&url).is_err());
    }

    #[actix_web::test]
    async fn test_unconfigured_access_url() {
        let report = run(None, reqwest::Client::new(), Duration::from_secs(1)).await;
        assert!(!report.healthy);
        assert!(!report.reachable);
        assert!(report.error.is_some());
    }

    #[actix_web::test]
    async fn test_unreachable_access_url() {
        let url = Url::parse("http://127.0.0.1:1").unwrap();
        let report = run(Some(url), reqwest::Client::new(), Duration::from_secs(2)).await;
        assert!(!report.healthy);
        assert!(!report.reachable);
    }
}
