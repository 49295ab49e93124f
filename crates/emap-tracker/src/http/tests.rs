use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;
use crate::accounts::lifecycle::Transition;
use crate::accounts::MemoryNotifier;
use crate::authorization::Action;
use crate::clock::ManualClock;
use crate::domain::{RecordKind, UserState, ValidationErrors};
use crate::error::ServiceError;
use crate::store::{MemoryStore, StoreError};
use crate::test_support::{epoch, settings, PlainHasher};

fn router() -> Router {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let mut services = TrackerServices::new(store, notifier, settings())
        .with_clock(Arc::new(ManualClock::starting_at(epoch())));
    services.accounts = services.accounts.with_hasher(Arc::new(PlainHasher));
    tracker_router(Arc::new(services))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[test]
fn taxonomy_maps_to_status_codes() {
    let cases = [
        (
            ServiceError::denied(Action::Destroy, "program"),
            StatusCode::FORBIDDEN,
        ),
        (
            ServiceError::from(ValidationErrors::single("name", "can't be blank")),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            ServiceError::InvalidTransition {
                transition: Transition::EnableAccount,
                state: UserState::Active,
            },
            StatusCode::CONFLICT,
        ),
        (ServiceError::InvalidOrConsumedKey, StatusCode::GONE),
        (ServiceError::not_found("review"), StatusCode::NOT_FOUND),
        (
            ServiceError::PopulationFailure {
                kind: RecordKind::Hira,
                source: StoreError::Unavailable("disk".to_string()),
            },
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (error, status) in cases {
        assert_eq!(error.into_response().status(), status);
    }
}

#[tokio::test]
async fn validation_body_lists_fields() {
    let mut errors = ValidationErrors::new();
    errors.add("contact_email", "is not a valid email address");
    let body = body_json(ServiceError::from(errors).into_response()).await;

    assert_eq!(body["error"], "validation failed");
    assert_eq!(
        body["fields"],
        json!([{ "field": "contact_email", "message": "is not a valid email address" }])
    );
}

#[tokio::test]
async fn transition_body_names_transition_and_state() {
    let body = body_json(
        ServiceError::InvalidTransition {
            transition: Transition::AcceptInvitation,
            state: UserState::Active,
        }
        .into_response(),
    )
    .await;

    assert_eq!(body["transition"], "accept_invitation");
    assert_eq!(body["state"], "active");
}

#[tokio::test]
async fn internal_errors_do_not_leak_details() {
    let body = body_json(
        ServiceError::Store(StoreError::Unavailable("lock poisoned at 0x7f".to_string()))
            .into_response(),
    )
    .await;
    assert_eq!(body, json!({ "error": "internal server error" }));
}

#[tokio::test]
async fn malformed_acting_user_header_is_rejected() {
    let response = router()
        .oneshot(
            Request::get("/api/v1/emap_standards")
                .header(ACTING_USER_HEADER, "not-a-uuid")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_acting_user_is_anonymous() {
    let response = router()
        .oneshot(
            Request::get("/api/v1/programs")
                .header(ACTING_USER_HEADER, crate::domain::UserId::generate().to_string())
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}
