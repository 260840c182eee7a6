//! iControl REST client for F5 BIG-IP pools.
//!
//! # Responsibilities
//! - Read pool and member status from `/mgmt/tm/ltm/pool`
//! - Toggle member session state (user-enabled / user-disabled)
//! - Read server-side current connections from member stats
//! - Resolve node addresses to display names
//!
//! # Design Decisions
//! - The REST API has no session partition; the active partition is tracked
//!   client-side and checked against `/mgmt/tm/auth/partition` when changed
//! - Members live in their node's partition, not the pool's. Partition and
//!   object name are cached from the member listing; members never listed
//!   are addressed as `~{node_partition}~{address:port}`

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

use crate::config::ControlPlaneConfig;
use crate::control_plane::counter::split_u64;
use crate::control_plane::types::{
    Availability, ConnectionStats, ControlPlaneError, ControlPlaneResult, EnabledState,
    MemberStatus, ObjectStatus, PoolMember,
};
use crate::control_plane::ControlPlane;

const CURRENT_CONNECTIONS: &str = "serverside.curConns";
const AVAILABILITY_STATE: &str = "status.availabilityState";
const ENABLED_STATE: &str = "status.enabledState";

#[derive(Debug, Deserialize)]
struct Collection<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct MemberItem {
    name: String,
    address: String,
    #[serde(default)]
    partition: Option<String>,
    #[serde(default)]
    state: String,
    #[serde(default)]
    session: String,
}

#[derive(Debug, Deserialize)]
struct NodeItem {
    name: String,
    address: String,
}

/// Counter value as it appears in a stats entry.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CounterWire {
    Split { high: i32, low: i32 },
    Flat(u64),
}

impl From<CounterWire> for ConnectionStats {
    fn from(wire: CounterWire) -> Self {
        match wire {
            CounterWire::Split { high, low } => ConnectionStats { high, low },
            CounterWire::Flat(value) => {
                let (high, low) = split_u64(value);
                ConnectionStats { high, low }
            }
        }
    }
}

/// Where a member object lives: `~{partition}~{name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MemberRef {
    partition: String,
    name: String,
}

/// BIG-IP control plane client.
pub struct F5RestClient {
    http: reqwest::Client,
    base_url: Url,
    user: String,
    password: String,
    partition: Mutex<String>,
    node_partition: String,
    node_suffix: String,
    members: Mutex<HashMap<PoolMember, MemberRef>>,
}

impl F5RestClient {
    /// Build a client from configuration. No request is made.
    pub fn new(config: &ControlPlaneConfig) -> ControlPlaneResult<Self> {
        let base_url = Url::parse(&config.url)?;
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url,
            user: config.user.clone(),
            password: config.password.clone(),
            partition: Mutex::new(config.partition.clone()),
            node_partition: config.node_partition.clone(),
            node_suffix: config.node_suffix.clone(),
            members: Mutex::new(HashMap::new()),
        })
    }

    fn current_partition(&self) -> String {
        self.partition
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn pool_path(&self, pool: &str) -> String {
        format!("/mgmt/tm/ltm/pool/~{}~{}", self.current_partition(), pool)
    }

    fn member_ref(&self, member: &PoolMember) -> MemberRef {
        self.members
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(member)
            .cloned()
            .unwrap_or_else(|| MemberRef {
                partition: self.node_partition.clone(),
                name: member.to_string(),
            })
    }

    fn member_path(&self, pool: &str, member: &PoolMember) -> String {
        let MemberRef { partition, name } = self.member_ref(member);
        format!("{}/members/~{}~{}", self.pool_path(pool), partition, name)
    }

    fn url(&self, path: &str) -> ControlPlaneResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json(&self, url: Url) -> ControlPlaneResult<Value> {
        let path = url.path().to_string();
        let response = self
            .http
            .get(url)
            .basic_auth(&self.user, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ControlPlaneError::Status {
                status: status.as_u16(),
                path,
            });
        }
        Ok(response.json().await?)
    }

    async fn get_path(&self, path: &str) -> ControlPlaneResult<Value> {
        let url = self.url(path)?;
        self.get_json(url).await
    }
}

/// Entries of the first nested stats object in a stats response.
fn nested_entries(body: &Value) -> ControlPlaneResult<&Map<String, Value>> {
    body.get("entries")
        .and_then(Value::as_object)
        .and_then(|entries| entries.values().next())
        .and_then(|entry| entry.pointer("/nestedStats/entries"))
        .and_then(Value::as_object)
        .ok_or_else(|| ControlPlaneError::Decode("stats response has no nested entries".into()))
}

fn description<'a>(entries: &'a Map<String, Value>, key: &str) -> ControlPlaneResult<&'a str> {
    entries
        .get(key)
        .and_then(|v| v.get("description"))
        .and_then(Value::as_str)
        .ok_or_else(|| ControlPlaneError::Decode(format!("missing {key}")))
}

fn availability_from(description: &str) -> Availability {
    match description {
        "available" | "up" => Availability::Available,
        _ => Availability::NotAvailable,
    }
}

fn enabled_from(description: &str) -> EnabledState {
    match description {
        "enabled" | "monitor-enabled" | "user-enabled" => EnabledState::Enabled,
        _ => EnabledState::Disabled,
    }
}

/// Port from a member object name: `node:port`, or `addr.port` for IPv6 nodes.
fn port_from_name(name: &str, address: &str) -> ControlPlaneResult<u16> {
    let separator = if address.contains(':') { '.' } else { ':' };
    name.rsplit_once(separator)
        .and_then(|(_, port)| port.parse().ok())
        .ok_or_else(|| ControlPlaneError::Decode(format!("member name {name} has no port")))
}

#[async_trait]
impl ControlPlane for F5RestClient {
    async fn active_partition(&self) -> ControlPlaneResult<String> {
        Ok(self.current_partition())
    }

    async fn set_active_partition(&self, partition: &str) -> ControlPlaneResult<String> {
        if partition != self.current_partition() {
            let path = format!("/mgmt/tm/auth/partition/{partition}");
            match self.get_path(&path).await {
                Ok(_) => {}
                Err(ControlPlaneError::Status { status, .. })
                    if status == StatusCode::NOT_FOUND.as_u16() =>
                {
                    return Err(ControlPlaneError::UnknownPartition(partition.to_string()));
                }
                Err(e) => return Err(e),
            }
            *self
                .partition
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = partition.to_string();
        }
        self.active_partition().await
    }

    async fn pool_status(&self, pool: &str) -> ControlPlaneResult<ObjectStatus> {
        let body = self.get_path(&format!("{}/stats", self.pool_path(pool))).await?;
        let entries = nested_entries(&body)?;

        Ok(ObjectStatus::new(
            availability_from(description(entries, AVAILABILITY_STATE)?),
            enabled_from(description(entries, ENABLED_STATE)?),
        ))
    }

    async fn member_status(&self, pool: &str) -> ControlPlaneResult<Vec<MemberStatus>> {
        let body = self.get_path(&format!("{}/members", self.pool_path(pool))).await?;
        let listing: Collection<MemberItem> =
            serde_json::from_value(body).map_err(|e| ControlPlaneError::Decode(e.to_string()))?;

        let mut statuses = Vec::with_capacity(listing.items.len());
        let mut known = self
            .members
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for item in listing.items {
            let member = PoolMember::new(item.address.clone(), port_from_name(&item.name, &item.address)?);
            known.insert(
                member.clone(),
                MemberRef {
                    partition: item
                        .partition
                        .unwrap_or_else(|| self.node_partition.clone()),
                    name: item.name,
                },
            );
            statuses.push(MemberStatus {
                member,
                status: ObjectStatus::new(availability_from(&item.state), enabled_from(&item.session)),
            });
        }
        Ok(statuses)
    }

    async fn set_member_enabled(
        &self,
        pool: &str,
        member: &PoolMember,
        enabled: bool,
    ) -> ControlPlaneResult<()> {
        let url = self.url(&self.member_path(pool, member))?;
        let path = url.path().to_string();
        let session = if enabled { "user-enabled" } else { "user-disabled" };

        let response = self
            .http
            .patch(url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&serde_json::json!({ "session": session }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ControlPlaneError::Status {
                status: status.as_u16(),
                path,
            });
        }
        tracing::debug!(%member, pool, session, "Member session state updated");
        Ok(())
    }

    async fn member_connection_stats(
        &self,
        pool: &str,
        member: &PoolMember,
    ) -> ControlPlaneResult<ConnectionStats> {
        let body = self
            .get_path(&format!("{}/stats", self.member_path(pool, member)))
            .await?;
        let value = nested_entries(&body)?
            .get(CURRENT_CONNECTIONS)
            .and_then(|v| v.get("value"))
            .cloned()
            .ok_or_else(|| ControlPlaneError::Decode(format!("missing {CURRENT_CONNECTIONS}")))?;

        let wire: CounterWire =
            serde_json::from_value(value).map_err(|e| ControlPlaneError::Decode(e.to_string()))?;
        Ok(wire.into())
    }

    async fn node_display_name(&self, address: &str) -> ControlPlaneResult<String> {
        let mut url = self.url("/mgmt/tm/ltm/node")?;
        url.query_pairs_mut()
            .append_pair("$filter", &format!("partition eq {}", self.node_partition));

        let body = self.get_json(url).await?;
        let nodes: Collection<NodeItem> =
            serde_json::from_value(body).map_err(|e| ControlPlaneError::Decode(e.to_string()))?;

        let node = nodes
            .items
            .into_iter()
            .find(|node| node.address == address)
            .ok_or_else(|| ControlPlaneError::NodeNotFound(address.to_string()))?;

        Ok(node
            .name
            .strip_suffix(self.node_suffix.as_str())
            .unwrap_or(&node.name)
            .to_string())
    }
}

impl std::fmt::Debug for F5RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("F5RestClient")
            .field("base_url", &self.base_url.as_str())
            .field("user", &self.user)
            .field("partition", &self.current_partition())
            .finish()
    }
}
