//! Fixtures shared by the in-crate test modules.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::accounts::credentials::{CredentialError, CredentialHasher};
use crate::accounts::notifier::{MemoryNotifier, Notifier, NotifyError, Recipient};
use crate::accounts::{AccountService, AccountSettings};
use crate::authorization::Actor;
use crate::catalog::CatalogService;
use crate::clock::ManualClock;
use crate::domain::{ProgramInput, User, UserId, UserState};
use crate::programs::ProgramService;
use crate::store::MemoryStore;

pub(crate) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn user(name: &str) -> User {
    User {
        id: UserId::generate(),
        name: name.to_string(),
        email_address: format!("{}@county.gov", name.to_ascii_lowercase().replace(' ', ".")),
        agency: None,
        job_title: None,
        administrator: false,
        reviewer: false,
        program: false,
        state: UserState::Active,
        crypted_password: None,
        created_at: epoch(),
        updated_at: epoch(),
    }
}

pub(crate) fn admin() -> User {
    User {
        administrator: true,
        ..user("Avery Admin")
    }
}

pub(crate) fn program_owner() -> User {
    User {
        program: true,
        ..user("Olive Owner")
    }
}

pub(crate) fn reviewer() -> User {
    User {
        reviewer: true,
        ..user("Riley Reviewer")
    }
}

pub(crate) fn actor(user: &User) -> Actor {
    Actor::user(user.clone())
}

pub(crate) fn program_input(name: &str, jurisdiction: &str) -> ProgramInput {
    ProgramInput {
        name: name.to_string(),
        program_jurisdiction: jurisdiction.to_string(),
        program_state: Some("IA".to_string()),
        program_street: "111 Court Ave".to_string(),
        program_city: "Des Moines".to_string(),
        program_zip: "50309".to_string(),
        program_contact: "Dana Ortiz".to_string(),
        contact_phone: "515-555-0100".to_string(),
        contact_email: "dana@county.gov".to_string(),
        ..ProgramInput::default()
    }
}

pub(crate) struct Harness {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) notifier: Arc<MemoryNotifier>,
    pub(crate) clock: Arc<ManualClock>,
    pub(crate) accounts: AccountService<MemoryStore, MemoryNotifier>,
    pub(crate) programs: ProgramService<MemoryStore>,
    pub(crate) catalog: CatalogService<MemoryStore>,
}

pub(crate) fn settings() -> AccountSettings {
    AccountSettings {
        key_ttl: chrono::Duration::hours(72),
        password_min_length: 8,
        bootstrap_admin: true,
    }
}

pub(crate) fn harness() -> Harness {
    harness_with(settings())
}

pub(crate) fn harness_with(settings: AccountSettings) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let clock = Arc::new(ManualClock::starting_at(epoch()));
    let accounts = AccountService::new(store.clone(), notifier.clone(), settings)
        .with_clock(clock.clone())
        .with_hasher(Arc::new(PlainHasher));
    let programs = ProgramService::new(store.clone()).with_clock(clock.clone());
    let catalog = CatalogService::new(store.clone()).with_clock(clock.clone());
    Harness {
        store,
        notifier,
        clock,
        accounts,
        programs,
        catalog,
    }
}

/// Reversible stand-in for Argon2 so lifecycle tests stay fast.
pub(crate) struct PlainHasher;

impl CredentialHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, CredentialError> {
        Ok(format!("plain${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, CredentialError> {
        Ok(hash == format!("plain${password}"))
    }
}

/// `PlainHasher` that notes, per call, whether a store transaction was open.
pub(crate) struct WatchedHasher {
    pub(crate) store: Arc<MemoryStore>,
    pub(crate) under_lock: Mutex<Vec<bool>>,
}

impl WatchedHasher {
    pub(crate) fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            under_lock: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<bool> {
        self.under_lock.lock().expect("hasher mutex poisoned").clone()
    }

    fn note(&self) {
        let locked = self.store.in_transaction();
        self.under_lock
            .lock()
            .expect("hasher mutex poisoned")
            .push(locked);
    }
}

impl CredentialHasher for WatchedHasher {
    fn hash(&self, password: &str) -> Result<String, CredentialError> {
        self.note();
        PlainHasher.hash(password)
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, CredentialError> {
        self.note();
        PlainHasher.verify(password, hash)
    }
}

/// Notifier whose transport is down until `recover` is called.
#[derive(Default)]
pub(crate) struct FlakyNotifier {
    pub(crate) down: Mutex<bool>,
    pub(crate) inner: MemoryNotifier,
}

impl FlakyNotifier {
    pub(crate) fn offline() -> Self {
        Self {
            down: Mutex::new(true),
            inner: MemoryNotifier::default(),
        }
    }

    pub(crate) fn recover(&self) {
        *self.down.lock().expect("notifier mutex poisoned") = false;
    }

    fn check(&self) -> Result<(), NotifyError> {
        if *self.down.lock().expect("notifier mutex poisoned") {
            Err(NotifyError::Transport("smtp relay offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Notifier for FlakyNotifier {
    fn send_invite(&self, recipient: &Recipient, key: &str) -> Result<(), NotifyError> {
        self.check()?;
        self.inner.send_invite(recipient, key)
    }

    fn send_password_reset(&self, recipient: &Recipient, key: &str) -> Result<(), NotifyError> {
        self.check()?;
        self.inner.send_password_reset(recipient, key)
    }
}
