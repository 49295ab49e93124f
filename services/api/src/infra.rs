use emap_tracker::accounts::{AccountSettings, Notifier, NotifyError, Recipient};
use emap_tracker::config::{AppConfig, AppEnvironment};
use emap_tracker::http::TrackerServices;
use emap_tracker::MemoryStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stands in for the mail transport: every notification becomes a structured event.
/// Raw keys are only emitted in development so the flow can be completed by hand.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct LogNotifier {
    reveal_keys: bool,
}

impl LogNotifier {
    pub(crate) fn for_environment(environment: AppEnvironment) -> Self {
        Self {
            reveal_keys: environment == AppEnvironment::Development,
        }
    }

    fn deliver(&self, template: &'static str, recipient: &Recipient, key: &str) {
        info!(
            template,
            user_id = %recipient.user_id,
            email = %recipient.email_address,
            "notification sent"
        );
        if self.reveal_keys {
            debug!(template, user_id = %recipient.user_id, key, "access key for local use");
        }
    }
}

impl Notifier for LogNotifier {
    fn send_invite(&self, recipient: &Recipient, key: &str) -> Result<(), NotifyError> {
        self.deliver("invitation", recipient, key);
        Ok(())
    }

    fn send_password_reset(&self, recipient: &Recipient, key: &str) -> Result<(), NotifyError> {
        self.deliver("password_reset", recipient, key);
        Ok(())
    }
}

pub(crate) type Services = TrackerServices<MemoryStore, LogNotifier>;

pub(crate) fn build_services(config: &AppConfig) -> Arc<Services> {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(LogNotifier::for_environment(config.environment));
    Arc::new(TrackerServices::new(
        store,
        notifier,
        AccountSettings::from(config),
    ))
}
