//! Splunk management REST restart client.

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::config::ServiceConfig;
use crate::service::{RestartResponse, ServiceClient, ServiceCredentials, ServiceError};

const RESTART_PATH: &str = "/services/server/control/restart";

/// Restarts splunkd through `POST /services/server/control/restart`.
#[derive(Debug, Clone)]
pub struct SplunkRestClient {
    http: reqwest::Client,
    scheme: String,
    port: u16,
}

impl SplunkRestClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            scheme: config.scheme.clone(),
            port: config.port,
        })
    }

    fn restart_url(&self, host: &str) -> Result<Url, ServiceError> {
        let host = if host.contains(':') && !host.starts_with('[') {
            format!("[{host}]")
        } else {
            host.to_string()
        };
        let base = Url::parse(&format!("{}://{}:{}", self.scheme, host, self.port))?;
        Ok(base.join(RESTART_PATH)?)
    }
}

#[async_trait]
impl ServiceClient for SplunkRestClient {
    async fn restart(
        &self,
        host: &str,
        credentials: &ServiceCredentials,
    ) -> Result<RestartResponse, ServiceError> {
        let url = self.restart_url(host)?;
        tracing::debug!(url = %url, user = %credentials.user, "Sending restart request");

        let response = self
            .http
            .post(url)
            .basic_auth(&credentials.user, Some(&credentials.password))
            .send()
            .await?;

        Ok(RestartResponse {
            status: response.status().as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SplunkRestClient {
        SplunkRestClient::new(&ServiceConfig::default()).unwrap()
    }

    #[test]
    fn test_restart_url() {
        let url = client().restart_url("10.1.2.3").unwrap();
        assert_eq!(url.as_str(), "https://10.1.2.3:8089/services/server/control/restart");
    }

    #[test]
    fn test_restart_url_brackets_ipv6() {
        let url = client().restart_url("2001:db8::7").unwrap();
        assert_eq!(url.as_str(), "https://[2001:db8::7]:8089/services/server/control/restart");
    }
}
