//! Outpass request routing: intake, the mentor/warden approval state machine, and the
//! role-scoped views built on top of it.

pub mod calendar;
pub mod clock;
pub mod domain;
pub mod intake;
pub mod policy;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use calendar::{Calendar, WorkweekCalendar};
pub use clock::{Clock, SystemClock};
pub use domain::{
    Actor, ActorId, ActorRole, DayType, Decision, DecisionKind, DecisionSlot, DecisionTrail,
    OutpassRequest, OutpassStatus, OutpassSubmission, RequestId,
};
pub use intake::ValidationError;
pub use policy::{legal_actions, ForbiddenTransition, LegalActions};
pub use repository::{InMemoryOutpassRepository, OutpassRepository, RepositoryError};
pub use router::outpass_router;
pub use service::{ErrorKind, OutpassError, OutpassService};
pub use views::{OutpassFilter, OutpassStatistics};
