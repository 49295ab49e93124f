//! End-to-end coverage for the account lifecycle: bootstrap sign-up, invitations,
//! single-use keys, and administrative enable/disable through the HTTP surface.

mod common {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use emap_tracker::accounts::{CredentialError, CredentialHasher, MemoryNotifier};
    use emap_tracker::http::{tracker_router, TrackerServices, ACTING_USER_HEADER};
    use emap_tracker::{AccountSettings, MemoryStore};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    pub(super) const PASSWORD: &str = "correct horse battery";

    /// Skips Argon2 so the suite stays quick.
    struct FastHasher;

    impl CredentialHasher for FastHasher {
        fn hash(&self, password: &str) -> Result<String, CredentialError> {
            Ok(format!("fast${password}"))
        }

        fn verify(&self, password: &str, hash: &str) -> Result<bool, CredentialError> {
            Ok(hash == format!("fast${password}"))
        }
    }

    pub(super) struct App {
        pub(super) router: Router,
        pub(super) notifier: Arc<MemoryNotifier>,
    }

    pub(super) fn app() -> App {
        let store = Arc::new(MemoryStore::default());
        let notifier = Arc::new(MemoryNotifier::default());
        let mut services = TrackerServices::new(store, notifier.clone(), AccountSettings::default());
        services.accounts = services.accounts.with_hasher(Arc::new(FastHasher));
        App {
            router: tracker_router(Arc::new(services)),
            notifier,
        }
    }

    pub(super) async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        acting: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = acting {
            builder = builder.header(ACTING_USER_HEADER, id);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = router
            .clone()
            .oneshot(request)
            .await
            .expect("router dispatch");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json")
        };
        (status, payload)
    }

    pub(super) fn sign_up_body(name: &str, email: &str) -> Value {
        json!({
            "name": name,
            "email_address": email,
            "password": PASSWORD,
            "password_confirmation": PASSWORD,
        })
    }

    pub(super) fn keyed(key: &str) -> Value {
        json!({
            "key": key,
            "password": PASSWORD,
            "password_confirmation": PASSWORD,
        })
    }

    pub(super) fn id_of(payload: &Value) -> String {
        payload
            .get("id")
            .and_then(Value::as_str)
            .expect("payload carries an id")
            .to_string()
    }

    /// Signs up the first account, which becomes the administrator.
    pub(super) async fn bootstrap(router: &Router) -> String {
        let (status, payload) = send(
            router,
            "POST",
            "/api/v1/users",
            None,
            Some(sign_up_body("Ada Admin", "ada@example.gov")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        id_of(&payload)
    }
}

mod bootstrap {
    use super::common::*;
    use axum::http::StatusCode;
    use serde_json::Value;

    #[tokio::test]
    async fn first_sign_up_becomes_active_administrator() {
        let app = app();
        let (status, payload) = send(
            &app.router,
            "POST",
            "/api/v1/users",
            None,
            Some(sign_up_body("Ada Admin", "ada@example.gov")),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(payload.get("administrator"), Some(&Value::Bool(true)));
        assert_eq!(payload.get("state").and_then(Value::as_str), Some("active"));
        assert!(payload.get("crypted_password").is_none());
    }

    #[tokio::test]
    async fn sign_up_closes_once_an_account_exists() {
        let app = app();
        bootstrap(&app.router).await;

        let (status, payload) = send(
            &app.router,
            "POST",
            "/api/v1/users",
            None,
            Some(sign_up_body("Second Person", "second@example.gov")),
        )
        .await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(payload.get("resource").and_then(Value::as_str), Some("user"));
    }
}

mod invitations {
    use super::common::*;
    use axum::http::StatusCode;
    use emap_tracker::domain::{NotificationKind, UserId};
    use serde_json::{json, Value};

    async fn invite(app: &App, admin: &str) -> (String, String) {
        let (status, payload) = send(
            &app.router,
            "POST",
            "/api/v1/users/invitations",
            Some(admin),
            Some(json!({ "name": "Jo Member", "email_address": "jo@example.gov" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(payload.get("state").and_then(Value::as_str), Some("invited"));

        let member = id_of(&payload);
        let member_id: UserId = member.parse().expect("uuid");
        let key = app
            .notifier
            .last_key(member_id, NotificationKind::Invitation)
            .expect("invitation delivered");
        (member, key)
    }

    #[tokio::test]
    async fn anonymous_callers_cannot_invite() {
        let app = app();
        bootstrap(&app.router).await;

        let (status, _) = send(
            &app.router,
            "POST",
            "/api/v1/users/invitations",
            None,
            Some(json!({ "name": "Jo Member", "email_address": "jo@example.gov" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(app.notifier.deliveries().is_empty());
    }

    #[tokio::test]
    async fn invitation_key_activates_once() {
        let app = app();
        let admin = bootstrap(&app.router).await;
        let (member, key) = invite(&app, &admin).await;
        let accept = format!("/api/v1/users/{member}/accept_invitation");

        let (status, payload) = send(&app.router, "POST", &accept, None, Some(keyed(&key))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.get("state").and_then(Value::as_str), Some("active"));

        let (status, payload) = send(&app.router, "POST", &accept, None, Some(keyed(&key))).await;
        assert_eq!(status, StatusCode::GONE);
        assert!(payload.get("error").is_some());
    }

    #[tokio::test]
    async fn mismatched_confirmation_keeps_the_key_usable() {
        let app = app();
        let admin = bootstrap(&app.router).await;
        let (member, key) = invite(&app, &admin).await;
        let accept = format!("/api/v1/users/{member}/accept_invitation");

        let (status, payload) = send(
            &app.router,
            "POST",
            &accept,
            None,
            Some(json!({
                "key": key,
                "password": PASSWORD,
                "password_confirmation": "something else entirely",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields = payload
            .get("fields")
            .and_then(Value::as_array)
            .expect("field errors");
        assert!(fields
            .iter()
            .any(|field| field.get("field") == Some(&json!("password_confirmation"))));

        let (status, _) = send(&app.router, "POST", &accept, None, Some(keyed(&key))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn members_cannot_grant_themselves_roles() {
        let app = app();
        let admin = bootstrap(&app.router).await;
        let (member, key) = invite(&app, &admin).await;
        send(
            &app.router,
            "POST",
            &format!("/api/v1/users/{member}/accept_invitation"),
            None,
            Some(keyed(&key)),
        )
        .await;

        let profile = format!("/api/v1/users/{member}");
        let (status, _) = send(
            &app.router,
            "PATCH",
            &profile,
            Some(&member),
            Some(json!({ "administrator": true })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, payload) = send(
            &app.router,
            "PATCH",
            &profile,
            Some(&member),
            Some(json!({ "job_title": "Planner" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.get("job_title").and_then(Value::as_str), Some("Planner"));
        assert_eq!(payload.get("administrator"), Some(&Value::Bool(false)));
    }
}

mod administration {
    use super::common::*;
    use axum::http::StatusCode;
    use emap_tracker::domain::{NotificationKind, UserId};
    use serde_json::{json, Value};

    async fn active_member(app: &App, admin: &str) -> String {
        let (_, payload) = send(
            &app.router,
            "POST",
            "/api/v1/users/invitations",
            Some(admin),
            Some(json!({ "name": "Jo Member", "email_address": "jo@example.gov" })),
        )
        .await;
        let member = id_of(&payload);
        let member_id: UserId = member.parse().expect("uuid");
        let key = app
            .notifier
            .last_key(member_id, NotificationKind::Invitation)
            .expect("invitation delivered");
        let (status, _) = send(
            &app.router,
            "POST",
            &format!("/api/v1/users/{member}/accept_invitation"),
            None,
            Some(keyed(&key)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        member
    }

    #[tokio::test]
    async fn disabled_accounts_act_anonymously_until_enabled() {
        let app = app();
        let admin = bootstrap(&app.router).await;
        let member = active_member(&app, &admin).await;

        let (status, payload) = send(
            &app.router,
            "POST",
            &format!("/api/v1/users/{member}/disable"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.get("state").and_then(Value::as_str), Some("disabled"));

        let (status, _) = send(
            &app.router,
            "PATCH",
            &format!("/api/v1/users/{member}"),
            Some(&member),
            Some(json!({ "job_title": "Planner" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, payload) = send(
            &app.router,
            "POST",
            &format!("/api/v1/users/{member}/disable"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            payload.get("transition").and_then(Value::as_str),
            Some("disable_account")
        );

        let (status, payload) = send(
            &app.router,
            "POST",
            &format!("/api/v1/users/{member}/enable"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.get("state").and_then(Value::as_str), Some("active"));
    }

    #[tokio::test]
    async fn password_reset_round_trip() {
        let app = app();
        let admin = bootstrap(&app.router).await;
        let member = active_member(&app, &admin).await;

        let (status, payload) = send(
            &app.router,
            "POST",
            "/api/v1/users/password_resets",
            None,
            Some(json!({ "email_address": "JO@example.gov" })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(payload.get("status").and_then(Value::as_str), Some("requested"));

        let member_id: UserId = member.parse().expect("uuid");
        let key = app
            .notifier
            .last_key(member_id, NotificationKind::PasswordReset)
            .expect("reset delivered");
        let reset = format!("/api/v1/users/{member}/reset_password");

        let (status, _) = send(&app.router, "POST", &reset, None, Some(keyed(&key))).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app.router, "POST", &reset, None, Some(keyed(&key))).await;
        assert_eq!(status, StatusCode::GONE);
    }

    #[tokio::test]
    async fn unknown_reset_addresses_are_accepted_silently() {
        let app = app();
        bootstrap(&app.router).await;

        let (status, _) = send(
            &app.router,
            "POST",
            "/api/v1/users/password_resets",
            None,
            Some(json!({ "email_address": "nobody@example.gov" })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(app.notifier.deliveries().is_empty());
    }

    #[tokio::test]
    async fn only_administrators_remove_accounts() {
        let app = app();
        let admin = bootstrap(&app.router).await;
        let member = active_member(&app, &admin).await;

        let (status, _) = send(
            &app.router,
            "DELETE",
            &format!("/api/v1/users/{admin}"),
            Some(&member),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, payload) = send(
            &app.router,
            "DELETE",
            &format!("/api/v1/users/{member}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(payload, Value::Null);

        let (status, _) = send(
            &app.router,
            "GET",
            &format!("/api/v1/users/{member}"),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, payload) = send(&app.router, "GET", "/api/v1/users", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.as_array().map(Vec::len), Some(1));
    }
}
