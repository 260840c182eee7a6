//! Shared doubles and mock servers for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

use pool_cycle::control_plane::{
    Availability, ConnectionStats, ControlPlane, ControlPlaneError, ControlPlaneResult,
    EnabledState, MemberStatus, ObjectStatus, PoolMember,
};
use pool_cycle::cycle::{CycleSettings, Pause};
use pool_cycle::notify::{AlertEvent, Notifier, NotifyError};
use pool_cycle::resilience::RetryPolicy;
use pool_cycle::service::{RestartResponse, ServiceClient, ServiceCredentials, ServiceError};

pub const POOL: &str = "idx_pool";
pub const POLL: Duration = Duration::from_secs(30);

/// Settings with the production poll caps and a three-attempt budget.
pub fn settings() -> CycleSettings {
    CycleSettings {
        pool: POOL.to_string(),
        partition: "Splunk".to_string(),
        poll_interval: POLL,
        drain_max_polls: 12,
        recovery_max_polls: 14,
        restart: RetryPolicy::fixed(3, POLL),
        abort_on_exhaustion: false,
        credentials: ServiceCredentials {
            user: "admin".to_string(),
            password: "changeme".to_string(),
        },
        target_override: None,
        recipients: vec!["ops@example.com".to_string()],
        subject: "pool cycle alert".to_string(),
    }
}

pub fn member(last_octet: u8) -> PoolMember {
    PoolMember::new(format!("10.0.0.{last_octet}"), 8089)
}

pub fn healthy() -> ObjectStatus {
    ObjectStatus::new(Availability::Available, EnabledState::Enabled)
}

// ---------------------------------------------------------------------------
// Control plane double
// ---------------------------------------------------------------------------

/// Control plane calls in the order they were made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetPartition(String),
    PoolStatus,
    MemberStatus,
    SetEnabled(PoolMember, bool),
    ConnectionStats(PoolMember),
    NodeName(String),
}

#[derive(Default)]
struct FakeState {
    pool: Option<ObjectStatus>,
    members: Vec<MemberStatus>,
    connections: HashMap<PoolMember, (Vec<u64>, usize)>,
    recovery: HashMap<PoolMember, (Vec<Availability>, usize)>,
    disabled: HashSet<PoolMember>,
    fail_connection_stats: bool,
    calls: Vec<Call>,
}

/// Scriptable control plane. Clones share state.
#[derive(Clone, Default)]
pub struct FakeControlPlane {
    state: Arc<Mutex<FakeState>>,
}

/// Next value of a script; the last value repeats once the script runs out.
fn next_scripted<T: Copy>(script: &mut (Vec<T>, usize), fallback: T) -> T {
    let (values, index) = script;
    let value = values
        .get(*index)
        .or_else(|| values.last())
        .copied()
        .unwrap_or(fallback);
    *index += 1;
    value
}

impl FakeControlPlane {
    pub fn new(pool: ObjectStatus, members: Vec<MemberStatus>) -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state.lock().unwrap();
            state.pool = Some(pool);
            state.members = members;
        }
        fake
    }

    /// Healthy pool whose members are all healthy.
    pub fn healthy(members: &[PoolMember]) -> Self {
        Self::new(
            healthy(),
            members
                .iter()
                .map(|m| MemberStatus {
                    member: m.clone(),
                    status: healthy(),
                })
                .collect(),
        )
    }

    /// Connection counts returned by successive stats reads.
    pub fn with_connections(self, member: &PoolMember, counts: Vec<u64>) -> Self {
        self.state
            .lock()
            .unwrap()
            .connections
            .insert(member.clone(), (counts, 0));
        self
    }

    /// Availability reported by successive listings once the member is disabled.
    pub fn with_recovery(self, member: &PoolMember, script: Vec<Availability>) -> Self {
        self.state
            .lock()
            .unwrap()
            .recovery
            .insert(member.clone(), (script, 0));
        self
    }

    pub fn failing_connection_stats(self) -> Self {
        self.state.lock().unwrap().fail_connection_stats = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, wanted: &Call) -> usize {
        self.calls().iter().filter(|c| *c == wanted).count()
    }

    pub fn enabled_changes(&self) -> Vec<(PoolMember, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::SetEnabled(m, enabled) => Some((m, enabled)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn active_partition(&self) -> ControlPlaneResult<String> {
        Ok("Common".to_string())
    }

    async fn set_active_partition(&self, partition: &str) -> ControlPlaneResult<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::SetPartition(partition.to_string()));
        Ok(partition.to_string())
    }

    async fn pool_status(&self, _pool: &str) -> ControlPlaneResult<ObjectStatus> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::PoolStatus);
        Ok(state.pool.unwrap_or_else(healthy))
    }

    async fn member_status(&self, _pool: &str) -> ControlPlaneResult<Vec<MemberStatus>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::MemberStatus);

        let members = state.members.clone();
        let mut listing = Vec::with_capacity(members.len());
        for entry in members {
            let status = if state.disabled.contains(&entry.member) {
                let availability = match state.recovery.get_mut(&entry.member) {
                    Some(script) => next_scripted(script, Availability::Available),
                    None => Availability::Available,
                };
                ObjectStatus::new(availability, EnabledState::Disabled)
            } else {
                entry.status
            };
            listing.push(MemberStatus {
                member: entry.member,
                status,
            });
        }
        Ok(listing)
    }

    async fn set_member_enabled(
        &self,
        _pool: &str,
        member: &PoolMember,
        enabled: bool,
    ) -> ControlPlaneResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::SetEnabled(member.clone(), enabled));
        if enabled {
            state.disabled.remove(member);
        } else {
            state.disabled.insert(member.clone());
        }
        Ok(())
    }

    async fn member_connection_stats(
        &self,
        _pool: &str,
        member: &PoolMember,
    ) -> ControlPlaneResult<ConnectionStats> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ConnectionStats(member.clone()));
        if state.fail_connection_stats {
            return Err(ControlPlaneError::Decode("injected stats failure".to_string()));
        }
        let count = match state.connections.get_mut(member) {
            Some(script) => next_scripted(script, 0),
            None => 0,
        };
        let (high, low) = pool_cycle::control_plane::counter::split_u64(count);
        Ok(ConnectionStats { high, low })
    }

    async fn node_display_name(&self, address: &str) -> ControlPlaneResult<String> {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(Call::NodeName(address.to_string()));
        // An IP literal keeps resolution off the network.
        Ok("127.0.0.1".to_string())
    }
}

// ---------------------------------------------------------------------------
// Service double
// ---------------------------------------------------------------------------

/// Scripted restart results: `Ok(status)` or `Err(reason)` for a transport failure.
/// Once the script runs out every restart answers 200.
#[derive(Clone, Default)]
pub struct FakeService {
    script: Arc<Mutex<Vec<Result<u16, String>>>>,
    hosts: Arc<Mutex<Vec<String>>>,
}

impl FakeService {
    pub fn with_statuses(statuses: &[u16]) -> Self {
        Self::with_script(statuses.iter().map(|s| Ok(*s)).collect())
    }

    pub fn with_script(script: Vec<Result<u16, String>>) -> Self {
        let mut reversed = script;
        reversed.reverse();
        Self {
            script: Arc::new(Mutex::new(reversed)),
            hosts: Arc::default(),
        }
    }

    pub fn hosts(&self) -> Vec<String> {
        self.hosts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServiceClient for FakeService {
    async fn restart(
        &self,
        host: &str,
        _credentials: &ServiceCredentials,
    ) -> Result<RestartResponse, ServiceError> {
        self.hosts.lock().unwrap().push(host.to_string());
        match self.script.lock().unwrap().pop() {
            Some(Ok(status)) => Ok(RestartResponse { status }),
            Some(Err(reason)) => Err(ServiceError::Resolve {
                host: host.to_string(),
                reason,
            }),
            None => Ok(RestartResponse { status: 200 }),
        }
    }
}

// ---------------------------------------------------------------------------
// Notifier and pause doubles
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<AlertEvent>>>,
    fail: bool,
}

impl RecordingNotifier {
    /// Records alerts but reports every send as failed.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn alerts(&self) -> Vec<AlertEvent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.alerts().into_iter().map(|a| a.body).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, alert: &AlertEvent) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(alert.clone());
        if self.fail {
            return Err(NotifyError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "relay down",
            )));
        }
        Ok(())
    }
}

/// Records requested pauses without sleeping.
#[derive(Clone, Default)]
pub struct RecordingPause {
    pauses: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingPause {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pause for RecordingPause {
    async fn pause(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }
}

// ---------------------------------------------------------------------------
// Mock HTTP backend
// ---------------------------------------------------------------------------

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Start a programmable HTTP backend on an ephemeral port.
///
/// Every request is recorded; the handler picks the status and body.
pub async fn start_programmable_backend<F, Fut>(
    f: F,
) -> (SocketAddr, Arc<Mutex<Vec<MockRequest>>>)
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);
    let recorded = seen.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let f = f.clone();
            let recorded = recorded.clone();
            tokio::spawn(async move {
                let mut reader = BufReader::new(socket);

                let mut request_line = String::new();
                if reader.read_line(&mut request_line).await.unwrap_or(0) == 0 {
                    return;
                }
                let mut parts = request_line.split_whitespace();
                let method = parts.next().unwrap_or_default().to_string();
                let path = parts.next().unwrap_or_default().to_string();

                let mut headers = HashMap::new();
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                        break;
                    }
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
                    }
                }

                let length = headers
                    .get("content-length")
                    .and_then(|v| v.parse::<usize>().ok())
                    .unwrap_or(0);
                let mut body = vec![0; length];
                if length > 0 && reader.read_exact(&mut body).await.is_err() {
                    return;
                }

                let request = MockRequest {
                    method,
                    path,
                    headers,
                    body: String::from_utf8_lossy(&body).into_owned(),
                };
                recorded.lock().unwrap().push(request.clone());

                let (status, body) = f(request).await;
                let response = format!(
                    "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let mut socket = reader.into_inner();
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, seen)
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

// ---------------------------------------------------------------------------
// Mock SMTP relay
// ---------------------------------------------------------------------------

/// What the mock relay received.
#[derive(Debug, Default, Clone)]
pub struct SmtpCapture {
    pub commands: Vec<String>,
    pub data: String,
}

/// How the mock relay answers RCPT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RcptReply {
    Accept,
    /// 251, user not local
    Forward,
    Reject,
}

/// Start a single-connection SMTP relay.
pub async fn start_mock_smtp(rcpt: RcptReply) -> (SocketAddr, Arc<Mutex<SmtpCapture>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let capture = Arc::new(Mutex::new(SmtpCapture::default()));
    let recorded = capture.clone();

    tokio::spawn(async move {
        let Ok((socket, _)) = listener.accept().await else {
            return;
        };
        let mut reader = BufReader::new(socket);
        let _ = reader.get_mut().write_all(b"220 mock ESMTP ready\r\n").await;

        let mut in_data = false;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                break;
            }

            if in_data {
                if line == ".\r\n" {
                    in_data = false;
                    let _ = reader.get_mut().write_all(b"250 queued\r\n").await;
                } else {
                    recorded.lock().unwrap().data.push_str(&line);
                }
                continue;
            }

            let command = line.trim_end().to_string();
            recorded.lock().unwrap().commands.push(command.clone());
            let verb = command.split([' ', ':']).next().unwrap_or_default().to_ascii_uppercase();
            let reply: &[u8] = match verb.as_str() {
                "EHLO" => b"250-mock greets you\r\n250 SIZE 1000000\r\n",
                "RCPT" if rcpt == RcptReply::Reject => b"550 no such user\r\n",
                "RCPT" if rcpt == RcptReply::Forward => {
                    b"251 User not local; will forward\r\n"
                }
                "MAIL" | "RCPT" | "HELO" => b"250 OK\r\n",
                "DATA" => {
                    in_data = true;
                    b"354 end with .\r\n"
                }
                "QUIT" => {
                    let _ = reader.get_mut().write_all(b"221 bye\r\n").await;
                    break;
                }
                _ => b"502 unknown\r\n",
            };
            let _ = reader.get_mut().write_all(reply).await;
        }
    });

    (addr, capture)
}
