use serde::{Deserialize, Serialize};

use super::domain::{Actor, ActorId, ActorRole, DayType, OutpassRequest, OutpassStatus};
use super::policy::{self, ForbiddenTransition};

/// Criteria for listing requests. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutpassFilter {
    #[serde(default)]
    pub created_by: Option<ActorId>,
    #[serde(default)]
    pub status: Option<OutpassStatus>,
    #[serde(default)]
    pub day_type: Option<DayType>,
}

impl OutpassFilter {
    pub fn created_by(actor_id: ActorId) -> Self {
        Self {
            created_by: Some(actor_id),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &OutpassRequest) -> bool {
        self.created_by
            .as_ref()
            .map_or(true, |id| record.created_by() == id)
            && self.status.map_or(true, |status| record.status() == status)
            && self
                .day_type
                .map_or(true, |day_type| record.day_type() == day_type)
    }

    /// Narrow this filter to what `actor` is allowed to see.
    pub fn scoped_to(mut self, actor: &Actor) -> Self {
        if actor.role == ActorRole::Parent {
            self.created_by = Some(actor.id.clone());
        }
        self
    }
}

/// Dashboard counters over a role-scoped set of requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutpassStatistics {
    pub total: usize,
    pub pending: usize,
    /// Mentor-approved and warden-approved together, including weekday requests still
    /// waiting on the warden.
    pub approved: usize,
    pub rejected: usize,
    pub mentor_approved: usize,
    pub warden_approved: usize,
}

impl OutpassStatistics {
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a OutpassRequest>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.total += 1;
            match record.status() {
                OutpassStatus::Pending => stats.pending += 1,
                OutpassStatus::MentorApproved => stats.mentor_approved += 1,
                OutpassStatus::WardenApproved => stats.warden_approved += 1,
                OutpassStatus::Rejected => stats.rejected += 1,
            }
        }
        stats.approved = stats.mentor_approved + stats.warden_approved;
        stats
    }
}

/// Most recent first; equal timestamps keep their incoming (insertion) order.
pub fn sort_recent_first(records: &mut [OutpassRequest]) {
    records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

pub fn list(records: Vec<OutpassRequest>, filter: &OutpassFilter) -> Vec<OutpassRequest> {
    let mut listed: Vec<_> = records
        .into_iter()
        .filter(|record| filter.matches(record))
        .collect();
    sort_recent_first(&mut listed);
    listed
}

/// Requests waiting on `role`. Only approver roles have a queue.
pub fn pending_queue(
    role: ActorRole,
    records: Vec<OutpassRequest>,
) -> Result<Vec<OutpassRequest>, ForbiddenTransition> {
    if !policy::is_approver(role) {
        return Err(ForbiddenTransition::RoleNotPermitted { role });
    }

    let mut queue: Vec<_> = records
        .into_iter()
        .filter(|record| policy::awaits(role, record.day_type(), record.status()))
        .collect();
    sort_recent_first(&mut queue);
    Ok(queue)
}

pub fn statistics(actor: &Actor, records: &[OutpassRequest]) -> OutpassStatistics {
    let scope = OutpassFilter::default().scoped_to(actor);
    OutpassStatistics::tally(records.iter().filter(|record| scope.matches(record)))
}
