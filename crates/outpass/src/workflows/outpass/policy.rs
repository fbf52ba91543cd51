//! Table-driven routing policy deciding who may act on a request and what each action does.
//!
//! Every approval stage is one row of [`ROUTING_TABLE`]. A row grants its role both approve
//! and reject; approve advances to the row's target status while reject always lands in
//! `Rejected` through the shared rejection slot.

use super::domain::{ActorRole, DayType, DecisionKind, DecisionSlot, OutpassStatus, Transition};

/// One approval stage: `role` may act on records in `status` with the given `day_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageRule {
    pub role: ActorRole,
    pub status: OutpassStatus,
    pub day_type: DayType,
    pub approves_to: OutpassStatus,
    pub approval_slot: DecisionSlot,
}

pub const ROUTING_TABLE: &[StageRule] = &[
    StageRule {
        role: ActorRole::Mentor,
        status: OutpassStatus::Pending,
        day_type: DayType::Weekday,
        approves_to: OutpassStatus::MentorApproved,
        approval_slot: DecisionSlot::Mentor,
    },
    StageRule {
        role: ActorRole::Warden,
        status: OutpassStatus::Pending,
        day_type: DayType::WeekendOrHoliday,
        approves_to: OutpassStatus::WardenApproved,
        approval_slot: DecisionSlot::Warden,
    },
    StageRule {
        role: ActorRole::Warden,
        status: OutpassStatus::MentorApproved,
        day_type: DayType::Weekday,
        approves_to: OutpassStatus::WardenApproved,
        approval_slot: DecisionSlot::Warden,
    },
];

/// Actions a role may take on a request right now; empty when the role may not act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegalActions {
    rule: Option<&'static StageRule>,
}

impl LegalActions {
    pub fn is_empty(&self) -> bool {
        self.rule.is_none()
    }

    pub fn permits(&self, kind: DecisionKind) -> bool {
        self.transition(kind).is_some()
    }

    pub fn actions(&self) -> &'static [DecisionKind] {
        match self.rule {
            Some(_) => &[DecisionKind::Approve, DecisionKind::Reject],
            None => &[],
        }
    }

    pub fn transition(&self, kind: DecisionKind) -> Option<Transition> {
        let rule = self.rule?;
        let transition = match kind {
            DecisionKind::Approve => Transition {
                from: rule.status,
                to: rule.approves_to,
                slot: rule.approval_slot,
            },
            DecisionKind::Reject => Transition {
                from: rule.status,
                to: OutpassStatus::Rejected,
                slot: DecisionSlot::Rejection,
            },
        };
        Some(transition)
    }
}

/// Look up the legal action set for `(day_type, status, role)`.
pub fn legal_actions(day_type: DayType, status: OutpassStatus, role: ActorRole) -> LegalActions {
    let rule = ROUTING_TABLE
        .iter()
        .find(|rule| rule.role == role && rule.status == status && rule.day_type == day_type);
    LegalActions { rule }
}

/// Reason an actor may not act on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ForbiddenTransition {
    #[error("role {role} may not approve or reject outpass requests")]
    RoleNotPermitted { role: ActorRole },
    #[error("this request has already been processed ({status})")]
    AlreadyProcessed { status: OutpassStatus },
    #[error("weekday requests must be approved by a mentor first")]
    AwaitingMentor,
    #[error("this request cannot be acted on by a mentor ({day_type}, {status})")]
    NotMentorStage {
        day_type: DayType,
        status: OutpassStatus,
    },
}

impl ForbiddenTransition {
    /// Whether the refusal is about who is asking rather than the record's state.
    pub fn is_role_mismatch(&self) -> bool {
        matches!(self, ForbiddenTransition::RoleNotPermitted { .. })
    }
}

/// Resolve the transition for an action, or explain why it is not allowed.
pub fn evaluate(
    day_type: DayType,
    status: OutpassStatus,
    role: ActorRole,
    kind: DecisionKind,
) -> Result<Transition, ForbiddenTransition> {
    if let Some(transition) = legal_actions(day_type, status, role).transition(kind) {
        return Ok(transition);
    }

    Err(diagnose(day_type, status, role))
}

fn diagnose(day_type: DayType, status: OutpassStatus, role: ActorRole) -> ForbiddenTransition {
    if !is_approver(role) {
        return ForbiddenTransition::RoleNotPermitted { role };
    }
    if status.is_terminal() {
        return ForbiddenTransition::AlreadyProcessed { status };
    }
    match role {
        ActorRole::Mentor => ForbiddenTransition::NotMentorStage { day_type, status },
        _ => ForbiddenTransition::AwaitingMentor,
    }
}

/// Roles that appear anywhere in the routing table.
pub fn is_approver(role: ActorRole) -> bool {
    ROUTING_TABLE.iter().any(|rule| rule.role == role)
}

/// Role that must act first for a freshly submitted request.
pub fn first_approver(day_type: DayType) -> ActorRole {
    match ROUTING_TABLE
        .iter()
        .find(|rule| rule.status == OutpassStatus::Pending && rule.day_type == day_type)
    {
        Some(rule) => rule.role,
        None => ActorRole::Warden,
    }
}

/// Whether a record sits in `role`'s pending queue.
pub fn awaits(role: ActorRole, day_type: DayType, status: OutpassStatus) -> bool {
    !legal_actions(day_type, status, role).is_empty()
}
