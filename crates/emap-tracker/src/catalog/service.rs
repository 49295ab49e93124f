use std::sync::Arc;

use tracing::info;

use crate::authorization::{ensure, Actor, EmapStandardPolicy, Request, TpriorityPolicy};
use crate::clock::{Clock, SystemClock};
use crate::domain::{
    EmapStandard, EmapStandardId, EmapStandardInput, EmapStandardPatch, RecordId, Tpriority,
    TpriorityField, TpriorityId, TpriorityInput, TpriorityPatch,
};
use crate::error::ServiceError;
use crate::store::{EntityStore, StoreError};

pub struct CatalogService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> CatalogService<S>
where
    S: EntityStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn create_emap_standard(
        &self,
        actor: &Actor,
        input: EmapStandardInput,
    ) -> Result<EmapStandard, ServiceError> {
        ensure(&EmapStandardPolicy, actor, Request::Create)?;
        let now = self.clock.now();
        let standard = EmapStandard {
            id: EmapStandardId::generate(),
            name: input.name.trim().to_string(),
            std_lang: input.std_lang,
            tcap_id: input.tcap_id,
            created_at: now,
            updated_at: now,
        };
        standard.validate()?;

        self.store
            .transaction(|tx| tx.insert_emap_standard(standard.clone()))?;
        info!(standard_id = %standard.id, name = %standard.name, "emap standard created");
        Ok(standard)
    }

    pub fn update_emap_standard(
        &self,
        actor: &Actor,
        id: EmapStandardId,
        patch: EmapStandardPatch,
    ) -> Result<EmapStandard, ServiceError> {
        let now = self.clock.now();
        self.store.transaction(|tx| -> Result<EmapStandard, ServiceError> {
            let mut standard = tx
                .fetch_emap_standard(id)?
                .ok_or(ServiceError::not_found("emap standard"))?;
            let changed = patch.apply(&mut standard);
            ensure(&EmapStandardPolicy, actor, Request::Update(&changed))?;
            standard.validate()?;
            standard.updated_at = now;
            tx.update_emap_standard(standard.clone())?;
            Ok(standard)
        })
    }

    pub fn destroy_emap_standard(&self, actor: &Actor, id: EmapStandardId) -> Result<(), ServiceError> {
        ensure(&EmapStandardPolicy, actor, Request::Destroy)?;
        self.store.transaction(|tx| tx.delete_emap_standard(id))?;
        info!(standard_id = %id, "emap standard destroyed");
        Ok(())
    }

    pub fn view_emap_standard(
        &self,
        actor: &Actor,
        id: EmapStandardId,
    ) -> Result<EmapStandard, ServiceError> {
        ensure(&EmapStandardPolicy, actor, Request::View(None))?;
        self.store
            .transaction(|tx| tx.fetch_emap_standard(id))?
            .ok_or(ServiceError::not_found("emap standard"))
    }

    pub fn list_emap_standards(&self, actor: &Actor) -> Result<Vec<EmapStandard>, ServiceError> {
        ensure(&EmapStandardPolicy, actor, Request::View(None))?;
        Ok(self.store.transaction(|tx| tx.emap_standards())?)
    }

    /// Adds a priority to a training plan record.
    pub fn create_tpriority(
        &self,
        actor: &Actor,
        input: TpriorityInput,
    ) -> Result<Tpriority, ServiceError> {
        ensure(&TpriorityPolicy, actor, Request::Create)?;
        let now = self.clock.now();
        let tpriority = Tpriority {
            id: TpriorityId::generate(),
            training_plan_id: input.training_plan_id,
            name: input.name.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        if tpriority.name.is_empty() {
            return Err(ServiceError::invalid("name", "can't be blank"));
        }

        self.store.transaction(|tx| -> Result<(), ServiceError> {
            match tx.insert_tpriority(tpriority.clone()) {
                Err(StoreError::MissingReference { .. }) => Err(
                    ServiceError::invalid("training_plan_id", "must reference a training plan"),
                ),
                other => Ok(other?),
            }
        })?;
        info!(tpriority_id = %tpriority.id, training_plan_id = %tpriority.training_plan_id, "training priority created");
        Ok(tpriority)
    }

    pub fn update_tpriority(
        &self,
        actor: &Actor,
        id: TpriorityId,
        patch: TpriorityPatch,
    ) -> Result<Tpriority, ServiceError> {
        let now = self.clock.now();
        self.store.transaction(|tx| -> Result<Tpriority, ServiceError> {
            let mut tpriority = tx
                .fetch_tpriority(id)?
                .ok_or(ServiceError::not_found("tpriority"))?;
            let mut changed = Vec::new();
            if let Some(name) = &patch.name {
                let name = name.trim();
                if name != tpriority.name {
                    tpriority.name = name.to_string();
                    changed.push(TpriorityField::Name);
                }
            }
            ensure(&TpriorityPolicy, actor, Request::Update(&changed))?;
            if tpriority.name.is_empty() {
                return Err(ServiceError::invalid("name", "can't be blank"));
            }
            tpriority.updated_at = now;
            tx.update_tpriority(tpriority.clone())?;
            Ok(tpriority)
        })
    }

    pub fn destroy_tpriority(&self, actor: &Actor, id: TpriorityId) -> Result<(), ServiceError> {
        ensure(&TpriorityPolicy, actor, Request::Destroy)?;
        self.store.transaction(|tx| tx.delete_tpriority(id))?;
        Ok(())
    }

    pub fn view_tpriority(&self, actor: &Actor, id: TpriorityId) -> Result<Tpriority, ServiceError> {
        ensure(&TpriorityPolicy, actor, Request::View(None))?;
        self.store
            .transaction(|tx| tx.fetch_tpriority(id))?
            .ok_or(ServiceError::not_found("tpriority"))
    }

    /// Priorities of one training plan, oldest first.
    pub fn tpriorities(
        &self,
        actor: &Actor,
        training_plan: RecordId,
    ) -> Result<Vec<Tpriority>, ServiceError> {
        ensure(&TpriorityPolicy, actor, Request::View(None))?;
        Ok(self.store.transaction(|tx| tx.tpriorities(training_plan))?)
    }
}
