use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::accounts::Notifier;
use crate::domain::{
    AssignmentInput, Finding, FindingInput, Program, ProgramId, ProgramInput, ProgramPatch,
    ProgramRecord, RecordInput, ReviewAssignment, ReviewId, ReviewInput, User,
};
use crate::error::ServiceError;
use crate::store::EntityStore;

use super::{Acting, Shared};

pub(crate) async fn create_program<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Json(input): Json<ProgramInput>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let program = services.programs.create_program(&actor, input)?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, program.route())],
        Json(program),
    ))
}

pub(crate) async fn list_programs<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
) -> Result<Json<Vec<Program>>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services.programs.list_programs(&actor).map(Json)
}

pub(crate) async fn view_program<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(program_id): Path<ProgramId>,
) -> Result<Json<Program>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services.programs.view_program(&actor, program_id).map(Json)
}

pub(crate) async fn update_program<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(program_id): Path<ProgramId>,
    Json(patch): Json<ProgramPatch>,
) -> Result<Json<Program>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services
        .programs
        .update_program(&actor, program_id, patch)
        .map(Json)
}

pub(crate) async fn destroy_program<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(program_id): Path<ProgramId>,
) -> Result<StatusCode, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services.programs.destroy_program(&actor, program_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn program_records<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(program_id): Path<ProgramId>,
) -> Result<Json<Vec<ProgramRecord>>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services.programs.program_records(&actor, program_id).map(Json)
}

pub(crate) async fn add_record<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(program_id): Path<ProgramId>,
    Json(input): Json<RecordInput>,
) -> Result<(StatusCode, Json<ProgramRecord>), ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let record = services.programs.add_record(&actor, program_id, input)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub(crate) async fn required_documents<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(program_id): Path<ProgramId>,
) -> Result<Json<Vec<ProgramRecord>>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services
        .programs
        .required_documents(&actor, program_id)
        .map(Json)
}

pub(crate) async fn program_reviewers<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(program_id): Path<ProgramId>,
) -> Result<Json<Vec<User>>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services
        .programs
        .program_reviewers(&actor, program_id)
        .map(Json)
}

pub(crate) async fn program_findings<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(program_id): Path<ProgramId>,
) -> Result<Json<Vec<Finding>>, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    services
        .programs
        .program_findings(&actor, program_id)
        .map(Json)
}

pub(crate) async fn open_review<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(program_id): Path<ProgramId>,
    Json(input): Json<ReviewInput>,
) -> Result<impl IntoResponse, ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let review = services.programs.open_review(&actor, program_id, input)?;
    Ok((StatusCode::CREATED, Json(review)))
}

pub(crate) async fn assign_reviewer<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(review_id): Path<ReviewId>,
    Json(input): Json<AssignmentInput>,
) -> Result<(StatusCode, Json<ReviewAssignment>), ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let assignment = services.programs.assign_reviewer(&actor, review_id, input)?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

pub(crate) async fn record_finding<S, N>(
    State(services): State<Shared<S, N>>,
    Acting(actor): Acting,
    Path(review_id): Path<ReviewId>,
    Json(input): Json<FindingInput>,
) -> Result<(StatusCode, Json<Finding>), ServiceError>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    let finding = services.programs.record_finding(&actor, review_id, input)?;
    Ok((StatusCode::CREATED, Json(finding)))
}
