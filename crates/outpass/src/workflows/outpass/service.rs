use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use super::calendar::Calendar;
use super::clock::{Clock, SystemClock};
use super::domain::{Actor, Decision, DecisionKind, OutpassRequest, OutpassSubmission, RequestId};
use super::intake::{self, ValidationError};
use super::policy::{self, ForbiddenTransition};
use super::repository::{OutpassRepository, RepositoryError};
use super::views::{self, OutpassFilter, OutpassStatistics};

const DEFAULT_REJECTION_REMARKS: &str = "No remarks provided";

/// Engine composing intake validation, routing policy, and the request store.
pub struct OutpassService<R, C> {
    repository: Arc<R>,
    calendar: Arc<C>,
    clock: Arc<dyn Clock>,
    sequence: AtomicU64,
    locks: RecordLocks,
}

/// Mutex per in-flight request so read-modify-write of one record is serialized.
///
/// Entries only live while some caller holds them; the last one out removes the entry.
#[derive(Default)]
struct RecordLocks {
    inner: Mutex<HashMap<RequestId, Arc<Mutex<()>>>>,
}

impl RecordLocks {
    fn acquire(&self, id: RequestId) -> Arc<Mutex<()>> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.entry(id).or_default().clone()
    }

    /// Hand back a handle from `acquire`. Must be called after its guard is dropped.
    fn release(&self, id: RequestId, lock: Arc<Mutex<()>>) {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        drop(lock);
        if guard
            .get(&id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            guard.remove(&id);
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl<R, C> OutpassService<R, C>
where
    R: OutpassRepository + 'static,
    C: Calendar + 'static,
{
    pub fn new(repository: Arc<R>, calendar: Arc<C>) -> Self {
        Self {
            repository,
            calendar,
            clock: Arc::new(SystemClock),
            sequence: AtomicU64::new(1),
            locks: RecordLocks::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn next_request_id(&self) -> RequestId {
        RequestId(self.sequence.fetch_add(1, Ordering::Relaxed))
    }

    /// Validate and store a new request in `Pending`.
    pub fn submit(
        &self,
        submission: OutpassSubmission,
        requester: &Actor,
    ) -> Result<OutpassRequest, OutpassError> {
        let validated = intake::validate(submission).map_err(|err| {
            debug!(requester = %requester.id, error = %err, "outpass submission rejected");
            err
        })?;
        let day_type = self.calendar.classify(validated.out_date.date());
        let record = OutpassRequest::new(
            self.next_request_id(),
            validated,
            day_type,
            requester.id.clone(),
            self.clock.now(),
        );

        self.repository.put(record.clone())?;
        info!(
            request_id = %record.id(),
            requester = %requester.id,
            %day_type,
            first_approver = %policy::first_approver(day_type),
            "outpass request submitted"
        );
        Ok(record)
    }

    /// Apply an approve/reject action. A refused action leaves the record untouched.
    pub fn act(
        &self,
        request_id: RequestId,
        actor: &Actor,
        kind: DecisionKind,
        remarks: Option<String>,
    ) -> Result<OutpassRequest, OutpassError> {
        if self.repository.fetch(request_id)?.is_none() {
            return Err(OutpassError::NotFound(request_id));
        }

        let lock = self.locks.acquire(request_id);
        let outcome = {
            let _serialized = lock.lock().unwrap_or_else(PoisonError::into_inner);
            self.transition(request_id, actor, kind, remarks)
        };
        self.locks.release(request_id, lock);
        outcome
    }

    /// Re-read and update one record. Callers hold the record's lock.
    fn transition(
        &self,
        request_id: RequestId,
        actor: &Actor,
        kind: DecisionKind,
        remarks: Option<String>,
    ) -> Result<OutpassRequest, OutpassError> {
        let mut record = self
            .repository
            .fetch(request_id)?
            .ok_or(OutpassError::NotFound(request_id))?;

        let transition = policy::evaluate(record.day_type(), record.status(), actor.role, kind)
            .map_err(|reason| {
                warn!(
                    %request_id,
                    actor = %actor.id,
                    role = %actor.role,
                    status = %record.status(),
                    %reason,
                    "outpass transition refused"
                );
                reason
            })?;

        let now = self.clock.now();
        let decision = Decision {
            actor_id: actor.id.clone(),
            role: actor.role,
            timestamp: now,
            remarks: decision_remarks(kind, remarks),
        };
        record
            .apply(transition, decision, now)
            .map_err(|_| ForbiddenTransition::AlreadyProcessed {
                status: record.status(),
            })?;

        self.repository.put(record.clone())?;
        info!(
            %request_id,
            actor = %actor.id,
            role = %actor.role,
            from = %transition.from,
            to = %transition.to,
            "outpass request transitioned"
        );
        Ok(record)
    }

    pub fn approve(
        &self,
        request_id: RequestId,
        actor: &Actor,
        remarks: Option<String>,
    ) -> Result<OutpassRequest, OutpassError> {
        self.act(request_id, actor, DecisionKind::Approve, remarks)
    }

    pub fn reject(
        &self,
        request_id: RequestId,
        actor: &Actor,
        remarks: Option<String>,
    ) -> Result<OutpassRequest, OutpassError> {
        self.act(request_id, actor, DecisionKind::Reject, remarks)
    }

    /// Fetch one request. Parents only see requests they created.
    pub fn get(
        &self,
        actor: &Actor,
        request_id: RequestId,
    ) -> Result<OutpassRequest, OutpassError> {
        let record = self
            .repository
            .fetch(request_id)?
            .filter(|record| OutpassFilter::default().scoped_to(actor).matches(record))
            .ok_or(OutpassError::NotFound(request_id))?;
        Ok(record)
    }

    /// All requests matching `filter`, most recent first.
    pub fn list(&self, filter: &OutpassFilter) -> Result<Vec<OutpassRequest>, OutpassError> {
        Ok(views::list(self.repository.scan_all()?, filter))
    }

    pub fn pending_for(&self, actor: &Actor) -> Result<Vec<OutpassRequest>, OutpassError> {
        let records = self.repository.scan_all()?;
        Ok(views::pending_queue(actor.role, records)?)
    }

    /// Role-scoped history narrowed by `filter`.
    pub fn history(
        &self,
        actor: &Actor,
        filter: OutpassFilter,
    ) -> Result<Vec<OutpassRequest>, OutpassError> {
        self.list(&filter.scoped_to(actor))
    }

    pub fn statistics(&self, actor: &Actor) -> Result<OutpassStatistics, OutpassError> {
        let records = self.repository.scan_all()?;
        Ok(views::statistics(actor, &records))
    }

    #[cfg(test)]
    pub(crate) fn tracked_locks(&self) -> usize {
        self.locks.tracked()
    }
}

fn decision_remarks(kind: DecisionKind, remarks: Option<String>) -> Option<String> {
    let remarks = remarks
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    match kind {
        DecisionKind::Approve => remarks,
        DecisionKind::Reject => {
            Some(remarks.unwrap_or_else(|| DEFAULT_REJECTION_REMARKS.to_string()))
        }
    }
}

/// Failure category used by transports to pick a response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    ForbiddenTransition,
    Internal,
}

/// Error raised by the outpass engine.
#[derive(Debug, thiserror::Error)]
pub enum OutpassError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("outpass request {0} not found")]
    NotFound(RequestId),
    #[error(transparent)]
    Forbidden(#[from] ForbiddenTransition),
    #[error(transparent)]
    Internal(#[from] RepositoryError),
}

impl OutpassError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OutpassError::Validation(_) => ErrorKind::Validation,
            OutpassError::NotFound(_) => ErrorKind::NotFound,
            OutpassError::Forbidden(_) => ErrorKind::ForbiddenTransition,
            OutpassError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Role mismatches are authorization failures; everything else in the forbidden family
    /// is about the record's current state.
    pub fn is_role_mismatch(&self) -> bool {
        matches!(self, OutpassError::Forbidden(reason) if reason.is_role_mismatch())
    }
}
