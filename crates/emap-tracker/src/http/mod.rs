//! JSON surface over the services. The fronting authentication layer identifies the
//! caller through the [`ACTING_USER_HEADER`]; everything else is plain REST.

mod accounts;
mod actor;
mod catalog;
mod error;
mod programs;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::accounts::{AccountService, AccountSettings, Notifier};
use crate::catalog::CatalogService;
use crate::clock::Clock;
use crate::programs::ProgramService;
use crate::store::EntityStore;

pub use actor::{Acting, ACTING_USER_HEADER};

/// The services one router instance serves, sharing a store.
pub struct TrackerServices<S, N> {
    pub accounts: AccountService<S, N>,
    pub programs: ProgramService<S>,
    pub catalog: CatalogService<S>,
}

impl<S, N> TrackerServices<S, N>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, settings: AccountSettings) -> Self {
        Self {
            accounts: AccountService::new(store.clone(), notifier, settings),
            programs: ProgramService::new(store.clone()),
            catalog: CatalogService::new(store),
        }
    }

    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self {
            accounts: self.accounts.with_clock(clock.clone()),
            programs: self.programs.with_clock(clock.clone()),
            catalog: self.catalog.with_clock(clock),
        }
    }
}

pub(crate) type Shared<S, N> = Arc<TrackerServices<S, N>>;

/// Router builder exposing every tracker endpoint under `/api/v1`.
pub fn tracker_router<S, N>(services: Arc<TrackerServices<S, N>>) -> Router
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/users",
            post(accounts::sign_up::<S, N>).get(accounts::list_users::<S, N>),
        )
        .route(
            "/api/v1/users/invitations",
            post(accounts::invite::<S, N>),
        )
        .route(
            "/api/v1/users/password_resets",
            post(accounts::request_password_reset::<S, N>),
        )
        .route(
            "/api/v1/users/:user_id",
            get(accounts::view_user::<S, N>)
                .patch(accounts::update_user::<S, N>)
                .delete(accounts::destroy_user::<S, N>),
        )
        .route(
            "/api/v1/users/:user_id/accept_invitation",
            post(accounts::accept_invitation::<S, N>),
        )
        .route(
            "/api/v1/users/:user_id/reset_password",
            post(accounts::reset_password::<S, N>),
        )
        .route(
            "/api/v1/users/:user_id/disable",
            post(accounts::disable_account::<S, N>),
        )
        .route(
            "/api/v1/users/:user_id/enable",
            post(accounts::enable_account::<S, N>),
        )
        .route(
            "/api/v1/programs",
            post(programs::create_program::<S, N>).get(programs::list_programs::<S, N>),
        )
        .route(
            "/api/v1/programs/:program_id",
            get(programs::view_program::<S, N>)
                .patch(programs::update_program::<S, N>)
                .delete(programs::destroy_program::<S, N>),
        )
        .route(
            "/api/v1/programs/:program_id/records",
            get(programs::program_records::<S, N>).post(programs::add_record::<S, N>),
        )
        .route(
            "/api/v1/programs/:program_id/required_documents",
            get(programs::required_documents::<S, N>),
        )
        .route(
            "/api/v1/programs/:program_id/reviewers",
            get(programs::program_reviewers::<S, N>),
        )
        .route(
            "/api/v1/programs/:program_id/findings",
            get(programs::program_findings::<S, N>),
        )
        .route(
            "/api/v1/programs/:program_id/reviews",
            post(programs::open_review::<S, N>),
        )
        .route(
            "/api/v1/reviews/:review_id/assignments",
            post(programs::assign_reviewer::<S, N>),
        )
        .route(
            "/api/v1/reviews/:review_id/findings",
            post(programs::record_finding::<S, N>),
        )
        .route(
            "/api/v1/emap_standards",
            post(catalog::create_emap_standard::<S, N>).get(catalog::list_emap_standards::<S, N>),
        )
        .route(
            "/api/v1/emap_standards/:standard_id",
            get(catalog::view_emap_standard::<S, N>)
                .patch(catalog::update_emap_standard::<S, N>)
                .delete(catalog::destroy_emap_standard::<S, N>),
        )
        .route(
            "/api/v1/tpriorities",
            post(catalog::create_tpriority::<S, N>),
        )
        .route(
            "/api/v1/tpriorities/:tpriority_id",
            get(catalog::view_tpriority::<S, N>)
                .patch(catalog::update_tpriority::<S, N>)
                .delete(catalog::destroy_tpriority::<S, N>),
        )
        .route(
            "/api/v1/training_plans/:record_id/tpriorities",
            get(catalog::tpriorities::<S, N>),
        )
        .with_state(services)
}
