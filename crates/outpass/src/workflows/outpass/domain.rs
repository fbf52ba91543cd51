use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sequential identifier assigned when a request is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier handed over by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Mentor,
    Warden,
    Parent,
    Admin,
}

impl ActorRole {
    pub const fn label(self) -> &'static str {
        match self {
            ActorRole::Mentor => "mentor",
            ActorRole::Warden => "warden",
            ActorRole::Parent => "parent",
            ActorRole::Admin => "admin",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown actor role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for ActorRole {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mentor" => Ok(ActorRole::Mentor),
            "warden" => Ok(ActorRole::Warden),
            "parent" => Ok(ActorRole::Parent),
            "admin" => Ok(ActorRole::Admin),
            _ => Err(UnknownRole(value.to_string())),
        }
    }
}

/// Authenticated caller, trusted verbatim from the identity layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: ActorRole) -> Self {
        Self {
            id: ActorId::new(id),
            role,
        }
    }
}

/// Classification of the leave start date that selects the approval path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Weekday,
    WeekendOrHoliday,
}

impl DayType {
    pub const fn label(self) -> &'static str {
        match self {
            DayType::Weekday => "weekday",
            DayType::WeekendOrHoliday => "weekend_or_holiday",
        }
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DayType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "weekday" => Ok(DayType::Weekday),
            "weekend_or_holiday" | "weekend" | "holiday" => Ok(DayType::WeekendOrHoliday),
            other => Err(format!("unknown day type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutpassStatus {
    Pending,
    MentorApproved,
    WardenApproved,
    Rejected,
}

impl OutpassStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OutpassStatus::Pending => "pending",
            OutpassStatus::MentorApproved => "mentor_approved",
            OutpassStatus::WardenApproved => "warden_approved",
            OutpassStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, OutpassStatus::WardenApproved | OutpassStatus::Rejected)
    }

    /// Position along the approval graph; transitions never decrease it.
    pub const fn rank(self) -> u8 {
        match self {
            OutpassStatus::Pending => 0,
            OutpassStatus::MentorApproved => 1,
            OutpassStatus::WardenApproved | OutpassStatus::Rejected => 2,
        }
    }
}

impl fmt::Display for OutpassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutpassStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OutpassStatus::Pending),
            "mentor_approved" => Ok(OutpassStatus::MentorApproved),
            "warden_approved" => Ok(OutpassStatus::WardenApproved),
            "rejected" => Ok(OutpassStatus::Rejected),
            other => Err(format!("unknown outpass status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Approve,
    Reject,
}

impl DecisionKind {
    pub const fn label(self) -> &'static str {
        match self {
            DecisionKind::Approve => "approve",
            DecisionKind::Reject => "reject",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw request body as received from the requester; validated by the intake guard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutpassSubmission {
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub guardian_name: Option<String>,
    #[serde(default)]
    pub guardian_number: Option<String>,
    #[serde(default)]
    pub out_date: Option<String>,
    #[serde(default)]
    pub in_date: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Submission after field and date validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSubmission {
    pub student_name: String,
    pub student_id: Option<String>,
    pub guardian_name: String,
    pub guardian_number: String,
    pub out_date: NaiveDateTime,
    pub in_date: NaiveDateTime,
    pub reason: String,
}

/// One actor's approve/reject action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub actor_id: ActorId,
    pub role: ActorRole,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSlot {
    Mentor,
    Warden,
    Rejection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{0:?} decision already recorded")]
pub struct SlotOccupied(pub DecisionSlot);

/// Audit trail with one write-once slot per decision kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionTrail {
    #[serde(skip_serializing_if = "Option::is_none")]
    mentor: Option<Decision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warden: Option<Decision>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection: Option<Decision>,
}

impl DecisionTrail {
    pub fn mentor(&self) -> Option<&Decision> {
        self.mentor.as_ref()
    }

    pub fn warden(&self) -> Option<&Decision> {
        self.warden.as_ref()
    }

    pub fn rejection(&self) -> Option<&Decision> {
        self.rejection.as_ref()
    }

    pub fn get(&self, slot: DecisionSlot) -> Option<&Decision> {
        match slot {
            DecisionSlot::Mentor => self.mentor(),
            DecisionSlot::Warden => self.warden(),
            DecisionSlot::Rejection => self.rejection(),
        }
    }

    pub(crate) fn record(
        &mut self,
        slot: DecisionSlot,
        decision: Decision,
    ) -> Result<(), SlotOccupied> {
        let target = match slot {
            DecisionSlot::Mentor => &mut self.mentor,
            DecisionSlot::Warden => &mut self.warden,
            DecisionSlot::Rejection => &mut self.rejection,
        };
        if target.is_some() {
            return Err(SlotOccupied(slot));
        }
        *target = Some(decision);
        Ok(())
    }
}

/// Status change selected by the routing policy for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OutpassStatus,
    pub to: OutpassStatus,
    pub slot: DecisionSlot,
}

/// Stored outpass request together with its accumulated decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutpassRequest {
    id: RequestId,
    student_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    student_id: Option<String>,
    guardian_name: String,
    guardian_number: String,
    out_date: NaiveDateTime,
    in_date: NaiveDateTime,
    reason: String,
    day_type: DayType,
    status: OutpassStatus,
    created_by: ActorId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    decisions: DecisionTrail,
}

impl OutpassRequest {
    pub fn new(
        id: RequestId,
        submission: ValidatedSubmission,
        day_type: DayType,
        created_by: ActorId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            student_name: submission.student_name,
            student_id: submission.student_id,
            guardian_name: submission.guardian_name,
            guardian_number: submission.guardian_number,
            out_date: submission.out_date,
            in_date: submission.in_date,
            reason: submission.reason,
            day_type,
            status: OutpassStatus::Pending,
            created_by,
            created_at,
            updated_at: created_at,
            decisions: DecisionTrail::default(),
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    pub fn student_id(&self) -> Option<&str> {
        self.student_id.as_deref()
    }

    pub fn guardian_name(&self) -> &str {
        &self.guardian_name
    }

    pub fn guardian_number(&self) -> &str {
        &self.guardian_number
    }

    pub fn out_date(&self) -> NaiveDateTime {
        self.out_date
    }

    pub fn in_date(&self) -> NaiveDateTime {
        self.in_date
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn day_type(&self) -> DayType {
        self.day_type
    }

    pub fn status(&self) -> OutpassStatus {
        self.status
    }

    pub fn created_by(&self) -> &ActorId {
        &self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn decisions(&self) -> &DecisionTrail {
        &self.decisions
    }

    /// Record the decision and advance the status. Leaves the record untouched on failure.
    pub(crate) fn apply(
        &mut self,
        transition: Transition,
        decision: Decision,
        at: DateTime<Utc>,
    ) -> Result<(), SlotOccupied> {
        debug_assert_eq!(transition.from, self.status);
        debug_assert!(transition.to.rank() > transition.from.rank());
        self.decisions.record(transition.slot, decision)?;
        self.status = transition.to;
        self.updated_at = at;
        Ok(())
    }
}
