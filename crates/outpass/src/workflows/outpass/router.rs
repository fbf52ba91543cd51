use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::calendar::Calendar;
use super::domain::{
    Actor, ActorId, ActorRole, DayType, DecisionKind, OutpassStatus, OutpassSubmission, RequestId,
    UnknownRole,
};
use super::policy;
use super::repository::OutpassRepository;
use super::service::{ErrorKind, OutpassError, OutpassService};
use super::views::OutpassFilter;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Router builder exposing the outpass endpoints.
pub fn outpass_router<R, C>(service: Arc<OutpassService<R, C>>) -> Router
where
    R: OutpassRepository + 'static,
    C: Calendar + 'static,
{
    Router::new()
        .route("/api/v1/outpass", post(submit_handler::<R, C>))
        .route("/api/v1/outpass/pending", get(pending_handler::<R, C>))
        .route("/api/v1/outpass/history", get(history_handler::<R, C>))
        .route("/api/v1/outpass/statistics", get(statistics_handler::<R, C>))
        .route("/api/v1/outpass/:request_id", get(get_handler::<R, C>))
        .route(
            "/api/v1/outpass/:request_id/approve",
            put(approve_handler::<R, C>),
        )
        .route(
            "/api/v1/outpass/:request_id/reject",
            put(reject_handler::<R, C>),
        )
        .with_state(service)
}

/// Optional body for approve/reject calls.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DecisionPayload {
    #[serde(default)]
    remarks: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HistoryQuery {
    #[serde(default)]
    status: Option<OutpassStatus>,
    #[serde(default)]
    day_type: Option<DayType>,
}

/// Read the caller identity forwarded by the authenticating proxy.
pub(crate) fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, Response> {
    let (Some(id), Some(role)) = (
        header_value(headers, ACTOR_ID_HEADER),
        header_value(headers, ACTOR_ROLE_HEADER),
    ) else {
        return Err(unauthorized("missing actor identity headers".to_string()));
    };
    let role: ActorRole = role
        .parse()
        .map_err(|err: UnknownRole| unauthorized(err.to_string()))?;

    Ok(Actor {
        id: ActorId::new(id),
        role,
    })
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn unauthorized(message: String) -> Response {
    failure(StatusCode::UNAUTHORIZED, message)
}

/// Undecodable bodies and ids are validation failures, reported in the usual envelope.
fn malformed(message: String) -> Response {
    failure(StatusCode::BAD_REQUEST, message)
}

fn failure(status: StatusCode, message: String) -> Response {
    let payload = json!({ "success": false, "error": message });
    (status, Json(payload)).into_response()
}

fn request_id_from(path: Result<Path<u64>, PathRejection>) -> Result<RequestId, Response> {
    path.map(|Path(id)| RequestId(id))
        .map_err(|rejection| malformed(format!("invalid request id: {}", rejection.body_text())))
}

pub(crate) fn status_for(error: &OutpassError) -> StatusCode {
    match error.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::ForbiddenTransition if error.is_role_mismatch() => StatusCode::FORBIDDEN,
        ErrorKind::ForbiddenTransition => StatusCode::BAD_REQUEST,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for OutpassError {
    fn into_response(self) -> Response {
        failure(status_for(&self), self.to_string())
    }
}

fn listing<T: serde::Serialize>(records: Vec<T>) -> Response {
    let payload = json!({
        "success": true,
        "count": records.len(),
        "data": records,
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn submit_handler<R, C>(
    State(service): State<Arc<OutpassService<R, C>>>,
    headers: HeaderMap,
    submission: Result<Json<OutpassSubmission>, JsonRejection>,
) -> Response
where
    R: OutpassRepository + 'static,
    C: Calendar + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let submission = match submission {
        Ok(Json(submission)) => submission,
        Err(rejection) => return malformed(rejection.body_text()),
    };

    match service.submit(submission, &actor) {
        Ok(record) => {
            let message = match policy::first_approver(record.day_type()) {
                ActorRole::Mentor => "Request sent successfully. Awaiting mentor approval.",
                _ => "Request sent successfully to the warden.",
            };
            let payload = json!({ "success": true, "message": message, "data": record });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn pending_handler<R, C>(
    State(service): State<Arc<OutpassService<R, C>>>,
    headers: HeaderMap,
) -> Response
where
    R: OutpassRepository + 'static,
    C: Calendar + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.pending_for(&actor) {
        Ok(records) => listing(records),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn history_handler<R, C>(
    State(service): State<Arc<OutpassService<R, C>>>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Response
where
    R: OutpassRepository + 'static,
    C: Calendar + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    let filter = OutpassFilter {
        created_by: None,
        status: query.status,
        day_type: query.day_type,
    };
    match service.history(&actor, filter) {
        Ok(records) => listing(records),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn statistics_handler<R, C>(
    State(service): State<Arc<OutpassService<R, C>>>,
    headers: HeaderMap,
) -> Response
where
    R: OutpassRepository + 'static,
    C: Calendar + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };

    match service.statistics(&actor) {
        Ok(stats) => {
            let payload = json!({ "success": true, "data": stats });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn get_handler<R, C>(
    State(service): State<Arc<OutpassService<R, C>>>,
    headers: HeaderMap,
    path: Result<Path<u64>, PathRejection>,
) -> Response
where
    R: OutpassRepository + 'static,
    C: Calendar + 'static,
{
    let actor = match actor_from_headers(&headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let request_id = match request_id_from(path) {
        Ok(request_id) => request_id,
        Err(response) => return response,
    };

    match service.get(&actor, request_id) {
        Ok(record) => {
            let payload = json!({ "success": true, "data": record });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn approve_handler<R, C>(
    State(service): State<Arc<OutpassService<R, C>>>,
    headers: HeaderMap,
    path: Result<Path<u64>, PathRejection>,
    payload: Option<Json<DecisionPayload>>,
) -> Response
where
    R: OutpassRepository + 'static,
    C: Calendar + 'static,
{
    decide(&service, &headers, path, DecisionKind::Approve, payload)
}

pub(crate) async fn reject_handler<R, C>(
    State(service): State<Arc<OutpassService<R, C>>>,
    headers: HeaderMap,
    path: Result<Path<u64>, PathRejection>,
    payload: Option<Json<DecisionPayload>>,
) -> Response
where
    R: OutpassRepository + 'static,
    C: Calendar + 'static,
{
    decide(&service, &headers, path, DecisionKind::Reject, payload)
}

fn decide<R, C>(
    service: &OutpassService<R, C>,
    headers: &HeaderMap,
    path: Result<Path<u64>, PathRejection>,
    kind: DecisionKind,
    payload: Option<Json<DecisionPayload>>,
) -> Response
where
    R: OutpassRepository + 'static,
    C: Calendar + 'static,
{
    let actor = match actor_from_headers(headers) {
        Ok(actor) => actor,
        Err(response) => return response,
    };
    let request_id = match request_id_from(path) {
        Ok(request_id) => request_id,
        Err(response) => return response,
    };
    let remarks = payload.and_then(|Json(body)| body.remarks);

    match service.act(request_id, &actor, kind, remarks) {
        Ok(record) => {
            let message = match kind {
                DecisionKind::Approve => "Outpass approved successfully",
                DecisionKind::Reject => "Outpass rejected",
            };
            let payload = json!({ "success": true, "message": message, "data": record });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error.into_response(),
    }
}
