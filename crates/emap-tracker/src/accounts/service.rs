use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::authorization::{ensure, Action, Actor, Request, UserAccess};
use crate::clock::{Clock, SystemClock};
use crate::domain::{
    Invitation, NewUser, Notification, NotificationId, NotificationKind, PasswordChange, User,
    UserField, UserId, UserPatch, UserState, ValidationErrors,
};
use crate::domain::user::non_blank;
use crate::error::ServiceError;
use crate::store::{EntityStore, StoreTransaction};

use super::credentials::{Argon2Hasher, CredentialHasher};
use super::keys;
use super::lifecycle::Transition;
use super::notifier::{Notifier, Recipient};
use super::AccountSettings;

/// Outcome of one pass over the notification outbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Account operations over a store and a mail transport.
pub struct AccountService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    settings: AccountSettings,
    clock: Arc<dyn Clock>,
    hasher: Arc<dyn CredentialHasher>,
}

impl<S, N> AccountService<S, N>
where
    S: EntityStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, settings: AccountSettings) -> Self {
        Self {
            store,
            notifier,
            settings,
            clock: Arc::new(SystemClock),
            hasher: Arc::new(Argon2Hasher),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn CredentialHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn settings(&self) -> &AccountSettings {
        &self.settings
    }

    /// Maps an authenticated user id onto the acting principal. Only active accounts act
    /// as themselves; everyone else is anonymous.
    pub fn resolve_actor(&self, id: Option<UserId>) -> Result<Actor, ServiceError> {
        let Some(id) = id else {
            return Ok(Actor::anonymous());
        };
        let user = self.store.transaction(|tx| tx.fetch_user(id))?;
        Ok(match user {
            Some(user) if user.signed_up() => Actor::user(user),
            _ => Actor::anonymous(),
        })
    }

    /// Direct account creation. Permitted only while no account exists; the first
    /// account is promoted to an active administrator unless bootstrap is disabled.
    pub fn sign_up(&self, actor: &Actor, input: NewUser) -> Result<User, ServiceError> {
        let now = self.clock.now();
        let existing_users = self.store.transaction(|tx| tx.user_count())?;
        ensure(&Self::sign_up_access(existing_users), actor, Request::Create)?;

        let mut user = User {
            id: UserId::generate(),
            name: input.name.trim().to_string(),
            email_address: input.email_address.trim().to_string(),
            agency: input.agency.as_deref().and_then(non_blank),
            job_title: input.job_title.as_deref().and_then(non_blank),
            administrator: input.administrator,
            reviewer: input.reviewer,
            program: input.program,
            state: UserState::default(),
            crypted_password: None,
            created_at: now,
            updated_at: now,
        };
        let mut errors = user.validate().err().unwrap_or_default();
        self.check_password(&mut errors, &input.password, &input.password_confirmation);
        errors.into_result()?;
        user.crypted_password = Some(self.hasher.hash(&input.password)?);

        let user = self.store.transaction(|tx| -> Result<User, ServiceError> {
            // Re-checked under the store lock; a concurrent sign-up may have won.
            let existing_users = tx.user_count()?;
            ensure(&Self::sign_up_access(existing_users), actor, Request::Create)?;
            if self.settings.bootstrap_admin && existing_users == 0 {
                user.administrator = true;
                user.state = UserState::Active;
            }
            tx.insert_user(user.clone())?;
            Ok(user)
        })?;

        info!(
            user_id = %user.id,
            administrator = user.administrator,
            state = %user.state,
            "account created through sign-up"
        );
        Ok(user)
    }

    fn sign_up_access(existing_users: usize) -> UserAccess {
        UserAccess {
            target: None,
            existing_users,
        }
    }

    /// Creates an invited account and mails it an invitation key.
    pub fn invite(&self, actor: &Actor, invitation: Invitation) -> Result<User, ServiceError> {
        let transition = Transition::Invite;
        if !transition.permits(actor) {
            warn!(actor = ?actor.id(), %transition, "transition refused");
            return Err(ServiceError::denied(Action::Create, "user"));
        }

        let now = self.clock.now();
        let user = self.store.transaction(|tx| -> Result<User, ServiceError> {
            let rule = transition.rule();
            let user = User {
                id: UserId::generate(),
                name: invitation.name.trim().to_string(),
                email_address: invitation.email_address.trim().to_string(),
                agency: invitation.agency.as_deref().and_then(non_blank),
                job_title: invitation
                    .job_title
                    .as_deref()
                    .and_then(non_blank),
                administrator: false,
                reviewer: false,
                program: false,
                state: rule.to,
                crypted_password: None,
                created_at: now,
                updated_at: now,
            };
            user.validate()?;
            tx.insert_user(user.clone())?;
            self.issue_for(tx, transition, &user)?;
            Ok(user)
        })?;

        info!(user_id = %user.id, invited_by = ?actor.id(), "account invited");
        self.dispatch_after_commit();
        Ok(user)
    }

    pub fn accept_invitation(
        &self,
        id: UserId,
        key: &str,
        change: PasswordChange,
    ) -> Result<User, ServiceError> {
        self.redeem_with_password(Transition::AcceptInvitation, id, key, change)
    }

    /// Mails a reset key to the active account registered under `email`. Unknown
    /// addresses succeed silently.
    pub fn request_password_reset(&self, email: &str) -> Result<(), ServiceError> {
        let now = self.clock.now();
        let transition = Transition::RequestPasswordReset;
        let requested = self.store.transaction(|tx| -> Result<Option<UserId>, ServiceError> {
            let Some(mut user) = tx.find_user_by_email(email)? else {
                debug!("password reset requested for an unknown address");
                return Ok(None);
            };
            if !user.signed_up() {
                debug!(
                    user_id = %user.id,
                    state = %user.state,
                    "password reset ignored for an inactive account"
                );
                return Ok(None);
            }
            user.state = transition.target_from(user.state)?;
            user.updated_at = now;
            tx.update_user(user.clone())?;
            self.issue_for(tx, transition, &user)?;
            Ok(Some(user.id))
        })?;

        if let Some(user_id) = requested {
            info!(%user_id, "password reset requested");
            self.dispatch_after_commit();
        }
        Ok(())
    }

    pub fn reset_password(
        &self,
        id: UserId,
        key: &str,
        change: PasswordChange,
    ) -> Result<User, ServiceError> {
        self.redeem_with_password(Transition::ResetPassword, id, key, change)
    }

    pub fn disable_account(&self, actor: &Actor, id: UserId) -> Result<User, ServiceError> {
        self.administer(actor, id, Transition::DisableAccount)
    }

    pub fn enable_account(&self, actor: &Actor, id: UserId) -> Result<User, ServiceError> {
        self.administer(actor, id, Transition::EnableAccount)
    }

    pub fn update_user(
        &self,
        actor: &Actor,
        id: UserId,
        patch: UserPatch,
    ) -> Result<User, ServiceError> {
        let now = self.clock.now();
        let (current, existing_users) =
            self.store
                .transaction(|tx| -> Result<(User, usize), ServiceError> {
                    let current = tx.fetch_user(id)?.ok_or(ServiceError::not_found("user"))?;
                    Ok((current, tx.user_count()?))
                })?;
        let access = UserAccess {
            target: Some(id),
            existing_users,
        };

        let mut staged = current.clone();
        let changed = patch.apply(&mut staged);
        ensure(&access, actor, Request::Update(&changed))?;

        let mut errors = staged.validate().err().unwrap_or_default();
        let crypted_password = match &patch.password {
            Some(change) => {
                if actor.is(id) && !self.current_password_matches(&current, change)? {
                    errors.add("current_password", "is incorrect");
                }
                self.check_password(&mut errors, &change.password, &change.password_confirmation);
                errors.into_result()?;
                Some(self.hasher.hash(&change.password)?)
            }
            None => {
                errors.into_result()?;
                None
            }
        };

        let user = self.store.transaction(|tx| -> Result<User, ServiceError> {
            let mut user = tx.fetch_user(id)?.ok_or(ServiceError::not_found("user"))?;
            patch.apply(&mut user);
            if crypted_password.is_some() {
                user.crypted_password = crypted_password;
            }
            user.updated_at = now;
            tx.update_user(user.clone())?;
            Ok(user)
        })?;

        info!(user_id = %user.id, updated_by = ?actor.id(), changed = ?changed, "account updated");
        Ok(user)
    }

    pub fn destroy_user(&self, actor: &Actor, id: UserId) -> Result<(), ServiceError> {
        self.store.transaction(|tx| -> Result<(), ServiceError> {
            let access = UserAccess {
                target: Some(id),
                existing_users: tx.user_count()?,
            };
            ensure(&access, actor, Request::Destroy)?;
            tx.fetch_user(id)?.ok_or(ServiceError::not_found("user"))?;
            tx.delete_user(id)?;
            Ok(())
        })?;

        info!(user_id = %id, destroyed_by = ?actor.id(), "account destroyed");
        Ok(())
    }

    pub fn view_user(&self, actor: &Actor, id: UserId) -> Result<User, ServiceError> {
        self.store.transaction(|tx| -> Result<User, ServiceError> {
            let access = UserAccess {
                target: Some(id),
                existing_users: tx.user_count()?,
            };
            ensure(&access, actor, Request::View(None))?;
            tx.fetch_user(id)?.ok_or(ServiceError::not_found("user"))
        })
    }

    pub fn list_users(&self, actor: &Actor) -> Result<Vec<User>, ServiceError> {
        self.store.transaction(|tx| -> Result<Vec<User>, ServiceError> {
            let access = UserAccess {
                target: None,
                existing_users: tx.user_count()?,
            };
            ensure(&access, actor, Request::View(None))?;
            Ok(tx.users()?)
        })
    }

    pub fn administrators(&self) -> Result<Vec<User>, ServiceError> {
        let users = self.store.transaction(|tx| tx.users())?;
        Ok(users.into_iter().filter(|user| user.administrator).collect())
    }

    /// Returns the active account matching the credentials, if any.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>, ServiceError> {
        let Some(user) = self.store.transaction(|tx| tx.find_user_by_email(email))? else {
            return Ok(None);
        };
        if !user.signed_up() {
            return Ok(None);
        }
        let Some(hash) = user.crypted_password.as_deref() else {
            return Ok(None);
        };
        if self.hasher.verify(password, hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Hands every undelivered notification to the notifier. Failures stay queued.
    pub fn flush_notifications(&self) -> Result<FlushReport, ServiceError> {
        let pending = self.store.transaction(|tx| tx.pending_notifications())?;
        let mut report = FlushReport::default();

        for notification in pending {
            let recipient = Recipient {
                user_id: notification.user_id,
                name: notification.name.clone(),
                email_address: notification.email_address.clone(),
            };
            let outcome = match notification.kind {
                NotificationKind::Invitation => {
                    self.notifier.send_invite(&recipient, &notification.key)
                }
                NotificationKind::PasswordReset => {
                    self.notifier.send_password_reset(&recipient, &notification.key)
                }
            };

            let delivered = match outcome {
                Ok(()) => {
                    report.delivered += 1;
                    debug!(
                        notification_id = %notification.id,
                        user_id = %notification.user_id,
                        "notification delivered"
                    );
                    true
                }
                Err(err) => {
                    report.failed += 1;
                    warn!(
                        notification_id = %notification.id,
                        user_id = %notification.user_id,
                        attempts = notification.attempts + 1,
                        error = %err,
                        "notification delivery failed"
                    );
                    false
                }
            };
            self.store
                .transaction(|tx| tx.record_delivery_attempt(notification.id, delivered))?;
        }

        Ok(report)
    }

    fn dispatch_after_commit(&self) {
        match self.flush_notifications() {
            Ok(report) if report.failed > 0 => {
                warn!(failed = report.failed, "notifications left in the outbox for retry");
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "notification outbox unavailable"),
        }
    }

    fn administer(
        &self,
        actor: &Actor,
        id: UserId,
        transition: Transition,
    ) -> Result<User, ServiceError> {
        if !transition.permits(actor) {
            warn!(actor = ?actor.id(), target = %id, %transition, "transition refused");
            return Err(ServiceError::denied(Action::Update, "user"));
        }

        let now = self.clock.now();
        let user = self.store.transaction(|tx| -> Result<User, ServiceError> {
            let mut user = tx.fetch_user(id)?.ok_or(ServiceError::not_found("user"))?;
            user.state = transition.target_from(user.state)?;
            user.updated_at = now;
            tx.update_user(user.clone())?;
            self.issue_for(tx, transition, &user)?;
            Ok(user)
        })?;

        info!(user_id = %user.id, by = ?actor.id(), %transition, state = %user.state, "account state changed");
        Ok(user)
    }

    fn redeem_with_password(
        &self,
        transition: Transition,
        id: UserId,
        key: &str,
        change: PasswordChange,
    ) -> Result<User, ServiceError> {
        let now = self.clock.now();
        let rule = transition.rule();
        let mut errors = ValidationErrors::new();
        self.check_password(&mut errors, &change.password, &change.password_confirmation);
        errors.into_result()?;
        let crypted_password = self.hasher.hash(&change.password)?;

        let user = self.store.transaction(|tx| -> Result<User, ServiceError> {
            let mut user = tx.fetch_user(id)?.ok_or(ServiceError::not_found("user"))?;
            if let Some(purpose) = rule.consumes {
                keys::redeem(tx, key, id, purpose, now)?;
            }
            user.state = transition.target_from(user.state)?;
            user.crypted_password = Some(crypted_password);
            user.updated_at = now;
            tx.update_user(user.clone())?;
            Ok(user)
        })?;

        info!(user_id = %user.id, %transition, state = %user.state, "access key redeemed");
        Ok(user)
    }

    /// Issues the key a transition calls for and queues its notification.
    fn issue_for(
        &self,
        tx: &mut dyn StoreTransaction,
        transition: Transition,
        user: &User,
    ) -> Result<(), ServiceError> {
        let rule = transition.rule();
        let Some(purpose) = rule.issues else {
            return Ok(());
        };
        let now = self.clock.now();
        let key = keys::issue(tx, user.id, purpose, now, self.settings.key_ttl)?;

        if let Some(kind) = rule.notifies {
            tx.enqueue_notification(Notification {
                id: NotificationId::generate(),
                kind,
                user_id: user.id,
                name: user.name.clone(),
                email_address: user.email_address.clone(),
                key,
                created_at: now,
                attempts: 0,
            })?;
        }
        Ok(())
    }

    fn check_password(&self, errors: &mut ValidationErrors, password: &str, confirmation: &str) {
        let minimum = self.settings.password_min_length;
        if password.chars().count() < minimum {
            errors.add(
                "password",
                format!("is too short (minimum is {minimum} characters)"),
            );
        }
        if password != confirmation {
            errors.add("password_confirmation", "doesn't match password");
        }
    }

    fn current_password_matches(
        &self,
        user: &User,
        change: &PasswordChange,
    ) -> Result<bool, ServiceError> {
        match (change.current_password.as_deref(), user.crypted_password.as_deref()) {
            (Some(supplied), Some(hash)) => Ok(self.hasher.verify(supplied, hash)?),
            _ => Ok(false),
        }
    }
}
