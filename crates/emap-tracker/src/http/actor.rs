use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::accounts::Notifier;
use crate::authorization::Actor;
use crate::domain::UserId;
use crate::store::EntityStore;

use super::Shared;

/// Header carrying the authenticated user id, set by the fronting auth layer.
pub const ACTING_USER_HEADER: &str = "x-acting-user";

/// The resolved acting user. A missing header means an anonymous caller; an id that
/// does not belong to an active account also resolves to anonymous.
#[derive(Debug, Clone)]
pub struct Acting(pub Actor);

#[axum::async_trait]
impl<S, N> FromRequestParts<Shared<S, N>> for Acting
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        services: &Shared<S, N>,
    ) -> Result<Self, Self::Rejection> {
        let id = match parts.headers.get(ACTING_USER_HEADER) {
            None => None,
            Some(value) => {
                let parsed = value
                    .to_str()
                    .ok()
                    .and_then(|raw| raw.parse::<UserId>().ok());
                match parsed {
                    Some(id) => Some(id),
                    None => {
                        let payload = json!({
                            "error": format!("{ACTING_USER_HEADER} must be a user id"),
                        });
                        return Err((StatusCode::BAD_REQUEST, Json(payload)).into_response());
                    }
                }
            }
        };

        services
            .accounts
            .resolve_actor(id)
            .map(Acting)
            .map_err(IntoResponse::into_response)
    }
}
