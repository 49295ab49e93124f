use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::accounts::Notifier;
use crate::domain::{
    EmapStandard, EmapStandardId, EmapStandardInput, EmapStandardPatch, RecordId, Tpriority,
    TpriorityId, TpriorityInput, TpriorityPatch,
};
use crate::error::ServiceError;
use crate::store::EntityStore;

use super::{Acting, Shared};

pub(crate) async fn create_emap_standard<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Json(input): Json<EmapStandardInput>,
) -> Result<(StatusCode, Json<EmapStandard>), ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let standard = services.catalog.create_emap_standard(&actor, input)?;
    Ok((StatusCode::CREATED, Json(standard)))
}

pub(crate) async fn list_emap_standards<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
) -> Result<Json<Vec<EmapStandard>>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services.catalog.list_emap_standards(&actor).map(Json)
}

pub(crate) async fn view_emap_standard<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(standard_id): Path<EmapStandardId>,
) -> Result<Json<EmapStandard>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services
        .catalog
        .view_emap_standard(&actor, standard_id)
        .map(Json)
}

pub(crate) async fn update_emap_standard<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(standard_id): Path<EmapStandardId>,
    Json(patch): Json<EmapStandardPatch>,
) -> Result<Json<EmapStandard>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services
        .catalog
        .update_emap_standard(&actor, standard_id, patch)
        .map(Json)
}

pub(crate) async fn destroy_emap_standard<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(standard_id): Path<EmapStandardId>,
) -> Result<StatusCode, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services.catalog.destroy_emap_standard(&actor, standard_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn create_tpriority<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Json(input): Json<TpriorityInput>,
) -> Result<(StatusCode, Json<Tpriority>), ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let tpriority = services.catalog.create_tpriority(&actor, input)?;
    Ok((StatusCode::CREATED, Json(tpriority)))
}

pub(crate) async fn view_tpriority<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(tpriority_id): Path<TpriorityId>,
) -> Result<Json<Tpriority>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services.catalog.view_tpriority(&actor, tpriority_id).map(Json)
}

pub(crate) async fn update_tpriority<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(tpriority_id): Path<TpriorityId>,
    Json(patch): Json<TpriorityPatch>,
) -> Result<Json<Tpriority>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services
        .catalog
        .update_tpriority(&actor, tpriority_id, patch)
        .map(Json)
}

pub(crate) async fn destroy_tpriority<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(tpriority_id): Path<TpriorityId>,
) -> Result<StatusCode, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services.catalog.destroy_tpriority(&actor, tpriority_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn tpriorities<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(record_id): Path<RecordId>,
) -> Result<Json<Vec<Tpriority>>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services.catalog.tpriorities(&actor, record_id).map(Json)
}
