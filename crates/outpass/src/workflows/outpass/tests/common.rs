use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::outpass::clock::Clock;
use crate::workflows::outpass::domain::{
    Actor, ActorRole, OutpassRequest, OutpassSubmission, RequestId,
};
use crate::workflows::outpass::repository::{
    InMemoryOutpassRepository, OutpassRepository, RepositoryError,
};
use crate::workflows::outpass::{outpass_router, OutpassService, WorkweekCalendar};

// 2025-10-06 is a Monday, 2025-10-11 a Saturday.
pub(super) const MONDAY: &str = "2025-10-06";
pub(super) const WEDNESDAY: &str = "2025-10-08";
pub(super) const SATURDAY: &str = "2025-10-11";
pub(super) const SUNDAY: &str = "2025-10-12";

pub(super) type MemoryService = OutpassService<InMemoryOutpassRepository, WorkweekCalendar>;

/// Clock that only moves when told to.
pub(super) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(super) fn new() -> Self {
        Self {
            now: Mutex::new(
                Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0)
                    .single()
                    .expect("valid timestamp"),
            ),
        }
    }

    pub(super) fn advance_minutes(&self, minutes: i64) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += Duration::minutes(minutes);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

pub(super) fn parent() -> Actor {
    Actor::new("parent-4", ActorRole::Parent)
}

pub(super) fn other_parent() -> Actor {
    Actor::new("parent-9", ActorRole::Parent)
}

pub(super) fn mentor() -> Actor {
    Actor::new("mentor-2", ActorRole::Mentor)
}

pub(super) fn warden() -> Actor {
    Actor::new("warden-3", ActorRole::Warden)
}

pub(super) fn admin() -> Actor {
    Actor::new("admin-1", ActorRole::Admin)
}

pub(super) fn submission_leaving(out_date: &str, in_date: &str) -> OutpassSubmission {
    OutpassSubmission {
        student_name: Some("Asha Rao".to_string()),
        student_id: Some("STU001".to_string()),
        guardian_name: Some("Kiran Rao".to_string()),
        guardian_number: Some("9876543210".to_string()),
        out_date: Some(out_date.to_string()),
        in_date: Some(in_date.to_string()),
        reason: Some("Family function".to_string()),
    }
}

pub(super) fn weekday_submission() -> OutpassSubmission {
    submission_leaving(MONDAY, WEDNESDAY)
}

pub(super) fn weekend_submission() -> OutpassSubmission {
    submission_leaving(SATURDAY, SUNDAY)
}

pub(super) fn build_service() -> (
    Arc<MemoryService>,
    Arc<InMemoryOutpassRepository>,
    Arc<ManualClock>,
) {
    let repository = Arc::new(InMemoryOutpassRepository::default());
    let clock = Arc::new(ManualClock::new());
    let service = OutpassService::new(repository.clone(), Arc::new(WorkweekCalendar::default()))
        .with_clock(clock.clone());
    (Arc::new(service), repository, clock)
}

/// Submit one request per entry, one minute apart.
pub(super) fn submit_all(
    service: &MemoryService,
    clock: &ManualClock,
    entries: &[(&Actor, OutpassSubmission)],
) -> Vec<RequestId> {
    entries
        .iter()
        .map(|(actor, submission)| {
            clock.advance_minutes(1);
            service
                .submit(submission.clone(), actor)
                .expect("submission succeeds")
                .id()
        })
        .collect()
}

pub(super) struct UnavailableRepository;

impl OutpassRepository for UnavailableRepository {
    fn fetch(&self, _id: RequestId) -> Result<Option<OutpassRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn put(&self, _record: OutpassRequest) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn scan_all(&self) -> Result<Vec<OutpassRequest>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn router_with_service(service: Arc<MemoryService>) -> axum::Router {
    outpass_router(service)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
