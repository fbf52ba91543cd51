//! Integration scenarios for the outpass approval workflow, exercised through the public service
//! facade and the HTTP router.

mod common {
    use std::sync::Arc;

    use outpass::workflows::outpass::{
        Actor, ActorRole, InMemoryOutpassRepository, OutpassService, OutpassSubmission,
        WorkweekCalendar,
    };

    pub(super) type Service = OutpassService<InMemoryOutpassRepository, WorkweekCalendar>;

    pub(super) fn submission(out_date: &str, in_date: &str) -> OutpassSubmission {
        OutpassSubmission {
            student_name: Some("Meera Iyer".to_string()),
            student_id: None,
            guardian_name: Some("Ravi Iyer".to_string()),
            guardian_number: Some("9123456780".to_string()),
            out_date: Some(out_date.to_string()),
            in_date: Some(in_date.to_string()),
            reason: None,
        }
    }

    pub(super) fn parent() -> Actor {
        Actor::new("parent-11", ActorRole::Parent)
    }

    pub(super) fn mentor() -> Actor {
        Actor::new("mentor-5", ActorRole::Mentor)
    }

    pub(super) fn warden() -> Actor {
        Actor::new("warden-7", ActorRole::Warden)
    }

    pub(super) fn build_service() -> (Arc<Service>, Arc<InMemoryOutpassRepository>) {
        let repository = Arc::new(InMemoryOutpassRepository::default());
        let service =
            OutpassService::new(repository.clone(), Arc::new(WorkweekCalendar::default()));
        (Arc::new(service), repository)
    }
}

mod scenarios {
    use super::common::*;
    use outpass::workflows::outpass::{
        DayType, ForbiddenTransition, OutpassError, OutpassFilter, OutpassStatus,
        ValidationError,
    };

    #[test]
    fn weekday_request_needs_mentor_then_warden() {
        let (service, _) = build_service();
        let record = service
            .submit(submission("2025-10-06T08:00", "2025-10-07T18:00"), &parent())
            .expect("submission");
        assert_eq!(record.day_type(), DayType::Weekday);
        assert_eq!(record.status(), OutpassStatus::Pending);
        assert_eq!(record.reason(), "Personal");

        let record = service
            .approve(record.id(), &mentor(), None)
            .expect("mentor approval");
        assert_eq!(record.status(), OutpassStatus::MentorApproved);
        let record = service
            .approve(record.id(), &warden(), Some("Safe travels".to_string()))
            .expect("warden approval");
        assert_eq!(record.status(), OutpassStatus::WardenApproved);

        let history = service
            .history(&parent(), OutpassFilter::default())
            .expect("history");
        assert_eq!(history.len(), 1);
        let trail = history[0].decisions();
        assert_eq!(trail.mentor().map(|d| d.actor_id.clone()), Some(mentor().id));
        assert_eq!(trail.warden().map(|d| d.actor_id.clone()), Some(warden().id));
        assert!(trail.rejection().is_none());
    }

    #[test]
    fn weekend_request_goes_straight_to_warden() {
        let (service, _) = build_service();
        let record = service
            .submit(submission("2025-10-11", "2025-10-12"), &parent())
            .expect("submission");
        assert_eq!(record.day_type(), DayType::WeekendOrHoliday);

        match service.approve(record.id(), &mentor(), None) {
            Err(OutpassError::Forbidden(_)) => {}
            other => panic!("expected forbidden transition, got {other:?}"),
        }

        let record = service
            .approve(record.id(), &warden(), None)
            .expect("warden approval");
        assert_eq!(record.status(), OutpassStatus::WardenApproved);
        assert!(record.decisions().mentor().is_none());
    }

    #[test]
    fn mentor_rejection_closes_the_request() {
        let (service, _) = build_service();
        let record = service
            .submit(submission("2025-10-08", "2025-10-09"), &parent())
            .expect("submission");

        let record = service
            .reject(record.id(), &mentor(), Some("Exams this week".to_string()))
            .expect("mentor rejection");
        assert_eq!(record.status(), OutpassStatus::Rejected);

        match service.approve(record.id(), &warden(), None) {
            Err(OutpassError::Forbidden(ForbiddenTransition::AlreadyProcessed { status })) => {
                assert_eq!(status, OutpassStatus::Rejected);
            }
            other => panic!("expected already processed, got {other:?}"),
        }
    }

    #[test]
    fn return_before_leaving_is_rejected_at_intake() {
        let (service, repository) = build_service();

        match service.submit(submission("2025-10-09", "2025-10-08"), &parent()) {
            Err(OutpassError::Validation(ValidationError::InvertedRange { .. })) => {}
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(repository.is_empty().expect("store readable"));
    }

    #[test]
    fn same_instant_return_is_accepted() {
        let (service, _) = build_service();
        service
            .submit(submission("2025-10-08T10:00", "2025-10-08T10:00"), &parent())
            .expect("equal out and in dates are allowed");
    }
}

mod routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use outpass::workflows::outpass::router::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER};
    use outpass::workflows::outpass::{outpass_router, Actor};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(
        router: &axum::Router,
        method: &str,
        uri: &str,
        actor: &Actor,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(ACTOR_ID_HEADER, actor.id.to_string())
            .header(ACTOR_ROLE_HEADER, actor.role.label())
            .header("content-type", "application/json");
        let body = match body {
            Some(value) => Body::from(serde_json::to_vec(&value).expect("serialize body")),
            None => Body::empty(),
        };
        let response = router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("router dispatch");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json payload");
        (status, payload)
    }

    #[tokio::test]
    async fn statistics_cover_a_mixed_caseload() {
        let (service, _) = build_service();
        let router = outpass_router(service);
        let weekday = json!({
            "student_name": "Meera Iyer",
            "guardian_name": "Ravi Iyer",
            "guardian_number": "9123456780",
            "out_date": "2025-10-06",
            "in_date": "2025-10-07",
        });
        let mut weekend = weekday.clone();
        weekend["out_date"] = json!("2025-10-11");
        weekend["in_date"] = json!("2025-10-12");

        let mut ids = Vec::new();
        for n in 0..10 {
            let body = if n < 6 { weekday.clone() } else { weekend.clone() };
            let (status, payload) =
                send(&router, "POST", "/api/v1/outpass", &parent(), Some(body)).await;
            assert_eq!(status, StatusCode::CREATED);
            ids.push(payload["data"]["id"].as_u64().expect("numeric id"));
        }

        // Weekdays: two stay pending, one mentor approved, one fully approved, two rejected.
        for id in [ids[2], ids[3]] {
            let uri = format!("/api/v1/outpass/{id}/approve");
            let (status, _) = send(&router, "PUT", &uri, &mentor(), None).await;
            assert_eq!(status, StatusCode::OK);
        }
        let uri = format!("/api/v1/outpass/{}/approve", ids[3]);
        assert_eq!(send(&router, "PUT", &uri, &warden(), None).await.0, StatusCode::OK);
        for id in [ids[4], ids[5]] {
            let uri = format!("/api/v1/outpass/{id}/reject");
            let (status, _) = send(&router, "PUT", &uri, &mentor(), None).await;
            assert_eq!(status, StatusCode::OK);
        }
        // Weekends: one pending, two warden approved, one rejected.
        for id in [ids[7], ids[8]] {
            let uri = format!("/api/v1/outpass/{id}/approve");
            assert_eq!(send(&router, "PUT", &uri, &warden(), None).await.0, StatusCode::OK);
        }
        let uri = format!("/api/v1/outpass/{}/reject", ids[9]);
        let (status, payload) = send(
            &router,
            "PUT",
            &uri,
            &warden(),
            Some(json!({ "remarks": "Incomplete guardian details" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            payload["data"]["decisions"]["rejection"]["remarks"],
            json!("Incomplete guardian details")
        );

        let (status, payload) =
            send(&router, "GET", "/api/v1/outpass/statistics", &warden(), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            payload["data"],
            json!({
                "total": 10,
                "pending": 3,
                "approved": 4,
                "rejected": 3,
                "mentor_approved": 1,
                "warden_approved": 3,
            })
        );

        let (_, mentor_queue) =
            send(&router, "GET", "/api/v1/outpass/pending", &mentor(), None).await;
        assert_eq!(mentor_queue["count"], json!(2));
        let (_, warden_queue) =
            send(&router, "GET", "/api/v1/outpass/pending", &warden(), None).await;
        assert_eq!(warden_queue["count"], json!(2));
    }
}
