//! The cycle controller.
//!
//! # Responsibilities
//! - Gate the run on pool and member health
//! - Drain, restart, await recovery and re-enable each member in order
//! - Raise an alert for every anomaly the operator has to know about

use std::time::Duration;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::CycleConfig;
use crate::control_plane::{Availability, ControlPlane, ControlPlaneError, PoolMember};
use crate::cycle::outcome::{DrainOutcome, RecoveryOutcome, RestartOutcome, RunOutcome};
use crate::cycle::pause::Pause;
use crate::cycle::run::{CycleRun, Phase};
use crate::health::{verify_members, verify_pool};
use crate::notify::{AlertEvent, Notifier};
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::service::{resolve_host, RestartResponse, ServiceClient, ServiceCredentials, ServiceError};

/// Everything the loop needs from configuration, already validated.
#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub pool: String,
    pub partition: String,
    pub poll_interval: Duration,
    pub drain_max_polls: u32,
    pub recovery_max_polls: u32,
    pub restart: RetryPolicy,
    pub abort_on_exhaustion: bool,
    pub credentials: ServiceCredentials,
    pub target_override: Option<String>,
    pub recipients: Vec<String>,
    pub subject: String,
}

impl CycleSettings {
    pub fn from_config(config: &CycleConfig) -> Self {
        let poll_interval = config.run.poll_interval();
        Self {
            pool: config.control_plane.pool.clone(),
            partition: config.control_plane.partition.clone(),
            poll_interval,
            drain_max_polls: config.run.drain_max_polls,
            recovery_max_polls: config.run.recovery_max_polls,
            restart: RetryPolicy::from_config(&config.restart, poll_interval),
            abort_on_exhaustion: config.restart.abort_on_exhaustion,
            credentials: ServiceCredentials {
                user: config.service.user.clone(),
                password: config.service.password.clone(),
            },
            target_override: config.service.target_override.clone(),
            recipients: config
                .alerts
                .recipients
                .iter()
                .filter(|r| !r.trim().is_empty())
                .cloned()
                .collect(),
            subject: config.alerts.subject.clone(),
        }
    }
}

/// A single failed restart attempt.
#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    ControlPlane(#[from] ControlPlaneError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// A control plane failure tagged with the step it interrupted.
struct StageError {
    stage: &'static str,
    source: ControlPlaneError,
}

fn at(stage: &'static str) -> impl FnOnce(ControlPlaneError) -> StageError {
    move |source| StageError { stage, source }
}

/// Whether the loop moves on to the next member.
enum MemberOutcome {
    Cycled,
    Stop(RunOutcome),
}

/// Runs the drain-restart-verify loop over one pool.
pub struct CycleController<C, S, N, P> {
    control: C,
    service: S,
    notifier: N,
    pause: P,
    settings: CycleSettings,
}

impl<C, S, N, P> CycleController<C, S, N, P>
where
    C: ControlPlane,
    S: ServiceClient,
    N: Notifier,
    P: Pause,
{
    pub fn new(control: C, service: S, notifier: N, pause: P, settings: CycleSettings) -> Self {
        Self {
            control,
            service,
            notifier,
            pause,
            settings,
        }
    }

    pub fn settings(&self) -> &CycleSettings {
        &self.settings
    }

    /// Cycle every member of the pool.
    ///
    /// Never returns an error: every failure is turned into an alert and an
    /// early [`RunOutcome`].
    pub async fn run(&self) -> RunOutcome {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("cycle", %run_id, pool = %self.settings.pool);

        async move {
            match self.cycle(run_id).await {
                Ok(outcome) => outcome,
                Err((err, cycled)) => {
                    tracing::error!(stage = err.stage, error = %err.source, "Control plane failure");
                    self.alert(format!(
                        "{} cycle stopped during {}: {}. Members may be left disabled",
                        self.settings.pool, err.stage, err.source
                    ))
                    .await;
                    RunOutcome::ControlPlane {
                        stage: err.stage,
                        error: err.source.to_string(),
                        cycled,
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn cycle(&self, run_id: Uuid) -> Result<RunOutcome, (StageError, usize)> {
        let pool = self.settings.pool.as_str();

        let partition = self
            .control
            .set_active_partition(&self.settings.partition)
            .await
            .map_err(|e| (at("partition selection")(e), 0))?;
        tracing::info!(%partition, "Active partition set");

        let verdict = verify_pool(&self.control, pool)
            .await
            .map_err(|e| (at("pool verification")(e), 0))?;
        if !verdict.healthy {
            let msg = format!("{} did not pass verification: {}", pool, verdict.status);
            tracing::warn!(status = %verdict.status, "Pool failed verification");
            self.alert(msg).await;
            return Ok(RunOutcome::PoolUnhealthy {
                status: verdict.status,
            });
        }

        let report = verify_members(&self.control, pool)
            .await
            .map_err(|e| (at("member verification")(e), 0))?;
        if !report.all_healthy() {
            let names: Vec<String> = report.down_members.iter().map(ToString::to_string).collect();
            tracing::warn!(down = names.len(), "Pool has down members");
            self.alert(format!("down members: {}", names.join(", "))).await;
            return Ok(RunOutcome::MembersDown {
                members: report.down_members,
            });
        }
        tracing::info!(members = report.members.len(), "Pool verified");

        let mut run = CycleRun::new(
            run_id,
            pool,
            report.members.into_iter().map(|m| m.member).collect(),
        );

        for member in run.members.clone() {
            let span = tracing::info_span!("member", %member);
            match self.cycle_member(&mut run, &member).instrument(span).await {
                Ok(MemberOutcome::Cycled) => run.cycled += 1,
                Ok(MemberOutcome::Stop(outcome)) => return Ok(outcome),
                Err(e) => return Err((e, run.cycled)),
            }
        }

        tracing::info!(cycled = run.cycled, "All members cycled, ending run");
        Ok(RunOutcome::Completed { cycled: run.cycled })
    }

    async fn cycle_member(
        &self,
        run: &mut CycleRun,
        member: &PoolMember,
    ) -> Result<MemberOutcome, StageError> {
        match self.drain(run, member).await.map_err(at("drain"))? {
            DrainOutcome::Drained { polls } => {
                tracing::info!(polls, "Member drained");
            }
            DrainOutcome::TimedOut { polls, remaining } => {
                tracing::warn!(
                    polls,
                    active_connections = remaining,
                    "Drain poll cap reached, restarting with connections still open"
                );
            }
        }

        if let RestartOutcome::Exhausted { attempts } = self.restart(run, member).await {
            tracing::warn!(attempts, "Restart attempts exhausted");
            if self.settings.abort_on_exhaustion {
                self.alert(format!(
                    "{member} did not restart after {attempts} attempts. Run stopped, member left disabled"
                ))
                .await;
                return Ok(MemberOutcome::Stop(RunOutcome::RestartExhausted {
                    member: member.clone(),
                    cycled: run.cycled,
                }));
            }
        }

        match self
            .await_recovery(run, member)
            .await
            .map_err(at("recovery wait"))?
        {
            RecoveryOutcome::Healthy { polls } => {
                tracing::info!(polls, "Member available again");
            }
            RecoveryOutcome::TimedOut { polls } => {
                let waited = self.settings.poll_interval * polls;
                tracing::error!(polls, "Member did not recover");
                self.alert(format!(
                    "{member} down for more than {}. May require intervention",
                    describe_wait(waited)
                ))
                .await;
                return Ok(MemberOutcome::Stop(RunOutcome::RecoveryTimeout {
                    member: member.clone(),
                    cycled: run.cycled,
                }));
            }
        }

        tracing::info!("Enabling member");
        self.control
            .set_member_enabled(&self.settings.pool, member, true)
            .await
            .map_err(at("re-enable"))?;
        metrics::record_member_cycled();
        Ok(MemberOutcome::Cycled)
    }

    /// Disable the member and wait, bounded, for its connections to drain.
    pub async fn drain(
        &self,
        run: &mut CycleRun,
        member: &PoolMember,
    ) -> Result<DrainOutcome, ControlPlaneError> {
        let pool = self.settings.pool.as_str();
        let max_polls = self.settings.drain_max_polls;

        tracing::info!("Disabling member");
        self.control.set_member_enabled(pool, member, false).await?;
        run.enter(Phase::Drain);

        let mut remaining = 0;
        for poll in 1..=max_polls {
            remaining = self.control.member_connection_stats(pool, member).await?.current();
            run.record_poll();
            if remaining == 0 {
                return Ok(DrainOutcome::Drained { polls: poll });
            }
            tracing::info!(active_connections = remaining, poll, "Waiting for connections to drain");
            if poll < max_polls {
                self.pause.pause(self.settings.poll_interval).await;
            }
        }

        metrics::record_drain_residual(&member.to_string(), remaining);
        Ok(DrainOutcome::TimedOut {
            polls: max_polls,
            remaining,
        })
    }

    /// Restart the service behind the member, alerting on every failed attempt.
    pub async fn restart(&self, run: &mut CycleRun, member: &PoolMember) -> RestartOutcome {
        let policy = &self.settings.restart;
        run.enter(Phase::Restart);
        tracing::info!("Restarting service");

        for attempt in 1..=policy.attempts {
            match self.restart_once(member).await {
                Ok(response) if response.is_success() => {
                    metrics::record_restart_attempt("success");
                    tracing::info!(attempt, status = response.status, "Service restarted");
                    return RestartOutcome::Restarted { attempts: attempt };
                }
                Ok(response) => {
                    metrics::record_restart_attempt("rejected");
                    tracing::warn!(attempt, status = response.status, "Restart returned failure status");
                    self.alert(format!(
                        "{member} did not restart. status {} returned",
                        response.status
                    ))
                    .await;
                }
                Err(e) => {
                    metrics::record_restart_attempt("error");
                    tracing::warn!(attempt, error = %e, "Restart attempt failed");
                    self.alert(format!("{member} did not restart: {e}")).await;
                }
            }

            if policy.has_next(attempt) {
                self.pause.pause(policy.delay_after(attempt)).await;
            }
        }

        RestartOutcome::Exhausted {
            attempts: policy.attempts,
        }
    }

    async fn restart_once(&self, member: &PoolMember) -> Result<RestartResponse, AttemptError> {
        let host = match &self.settings.target_override {
            Some(host) => host.clone(),
            None => {
                let node = self.control.node_display_name(&member.address).await?;
                let ip = resolve_host(&node).await?;
                tracing::debug!(%node, %ip, "Resolved restart target");
                ip.to_string()
            }
        };

        Ok(self.service.restart(&host, &self.settings.credentials).await?)
    }

    /// Poll until the member reports available again, bounded by the recovery cap.
    pub async fn await_recovery(
        &self,
        run: &mut CycleRun,
        member: &PoolMember,
    ) -> Result<RecoveryOutcome, ControlPlaneError> {
        let max_polls = self.settings.recovery_max_polls;
        run.enter(Phase::Recovery);

        for poll in 1..=max_polls {
            self.pause.pause(self.settings.poll_interval).await;
            let statuses = self.control.member_status(&self.settings.pool).await?;
            run.record_poll();

            match statuses.iter().find(|s| &s.member == member) {
                Some(current) => {
                    tracing::info!(status = %current.status, poll, "Member status");
                    if current.status.availability == Availability::Available {
                        return Ok(RecoveryOutcome::Healthy { polls: poll });
                    }
                }
                None => tracing::warn!(poll, "Member missing from status listing"),
            }
        }

        Ok(RecoveryOutcome::TimedOut { polls: max_polls })
    }

    async fn alert(&self, body: String) {
        metrics::record_alert();
        tracing::warn!(alert = %body, "Sending alert");

        let event = AlertEvent {
            recipients: self.settings.recipients.clone(),
            subject: self.settings.subject.clone(),
            body,
        };
        if let Err(e) = self.notifier.send(&event).await {
            tracing::error!(error = %e, "Failed to send alert");
        }
    }
}

/// Human-readable wait length for alert text.
fn describe_wait(waited: Duration) -> String {
    let secs = waited.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} minutes", secs / 60)
    } else {
        format!("{secs} seconds")
    }
}
