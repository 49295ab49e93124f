use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::accounts::Notifier;
use crate::domain::{Invitation, NewUser, PasswordChange, User, UserId, UserPatch};
use crate::error::ServiceError;
use crate::store::EntityStore;

use super::{Acting, Shared};

#[derive(Debug, Deserialize)]
pub(crate) struct ResetRequest {
    pub(crate) email_address: String,
}

/// Body presented with a single-use key.
#[derive(Debug, Deserialize)]
pub(crate) struct KeyedPassword {
    pub(crate) key: String,
    pub(crate) password: String,
    pub(crate) password_confirmation: String,
}

impl KeyedPassword {
    fn split(self) -> (String, PasswordChange) {
        let change = PasswordChange {
            current_password: None,
            password: self.password,
            password_confirmation: self.password_confirmation,
        };
        (self.key, change)
    }
}

pub(crate) async fn sign_up<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Json(input): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let user = services.accounts.sign_up(&actor, input)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub(crate) async fn list_users<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
) -> Result<Json<Vec<User>>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services.accounts.list_users(&actor).map(Json)
}

pub(crate) async fn invite<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Json(invitation): Json<Invitation>,
) -> Result<(StatusCode, Json<User>), ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let user = services.accounts.invite(&actor, invitation)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub(crate) async fn request_password_reset<S, N>(
    State(services): State<Shared<S, N>>,
    Json(request): Json<ResetRequest>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services
        .accounts
        .request_password_reset(&request.email_address)?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "requested" }))))
}

pub(crate) async fn view_user<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(user_id): Path<UserId>,
) -> Result<Json<User>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services.accounts.view_user(&actor, user_id).map(Json)
}

pub(crate) async fn update_user<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(user_id): Path<UserId>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<User>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services.accounts.update_user(&actor, user_id, patch).map(Json)
}

pub(crate) async fn destroy_user<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(user_id): Path<UserId>,
) -> Result<StatusCode, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services.accounts.destroy_user(&actor, user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn accept_invitation<S, N>(
    State(services): State<Shared<S, N>>,
    Path(user_id): Path<UserId>,
    Json(body): Json<KeyedPassword>,
) -> Result<Json<User>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let (key, change) = body.split();
    services
        .accounts
        .accept_invitation(user_id, &key, change)
        .map(Json)
}

pub(crate) async fn reset_password<S, N>(
    State(services): State<Shared<S, N>>,
    Path(user_id): Path<UserId>,
    Json(body): Json<KeyedPassword>,
) -> Result<Json<User>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let (key, change) = body.split();
    services
        .accounts
        .reset_password(user_id, &key, change)
        .map(Json)
}

pub(crate) async fn disable_account<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(user_id): Path<UserId>,
) -> Result<Json<User>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services.accounts.disable_account(&actor, user_id).map(Json)
}

pub(crate) async fn enable_account<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(user_id): Path<UserId>,
) -> Result<Json<User>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services.accounts.enable_account(&actor, user_id).map(Json)
}
