//! Node name to routable address resolution.

use std::net::IpAddr;
use tokio::net::lookup_host;

use crate::service::ServiceError;

/// Resolve a host name to its first address, preferring IPv4.
pub async fn resolve_host(host: &str) -> Result<IpAddr, ServiceError> {
    let addrs: Vec<IpAddr> = lookup_host((host, 0))
        .await
        .map_err(|e| ServiceError::Resolve {
            host: host.to_string(),
            reason: e.to_string(),
        })?
        .map(|addr| addr.ip())
        .collect();

    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| ServiceError::Resolve {
            host: host.to_string(),
            reason: "no addresses returned".to_string(),
        })
}
