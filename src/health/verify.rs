//! Health gates run once at the start of a cycle.

use crate::control_plane::{ControlPlane, ControlPlaneResult, MemberStatus, ObjectStatus, PoolMember};

/// Result of checking the pool itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolVerdict {
    pub status: ObjectStatus,
    pub healthy: bool,
}

/// Full member listing plus the members that are not (available, enabled).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberReport {
    pub members: Vec<MemberStatus>,
    pub down_members: Vec<PoolMember>,
}

impl MemberReport {
    pub fn all_healthy(&self) -> bool {
        self.down_members.is_empty()
    }
}

/// Split a member listing into all members and down members.
pub fn partition_members(members: Vec<MemberStatus>) -> MemberReport {
    let down_members = members
        .iter()
        .filter(|m| !m.status.is_healthy())
        .map(|m| m.member.clone())
        .collect();

    MemberReport {
        members,
        down_members,
    }
}

/// Check that the pool is available and enabled.
pub async fn verify_pool<C>(control: &C, pool: &str) -> ControlPlaneResult<PoolVerdict>
where
    C: ControlPlane + ?Sized,
{
    let status = control.pool_status(pool).await?;
    Ok(PoolVerdict {
        status,
        healthy: status.is_healthy(),
    })
}

/// List the pool's members and collect those that are down.
pub async fn verify_members<C>(control: &C, pool: &str) -> ControlPlaneResult<MemberReport>
where
    C: ControlPlane + ?Sized,
{
    Ok(partition_members(control.member_status(pool).await?))
}
