//! Async orchestration of the view and the backend.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::calendar::CalendarGrids;
use crate::client::ApiClient;
use crate::config::Settings;
use crate::types::FormInputs;
use crate::view::{CalendarView, RequestTicket};

/// Retry schedule for config sync
#[derive(Debug, Clone, Copy)]
pub struct SyncPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl From<&Settings> for SyncPolicy {
    fn from(settings: &Settings) -> Self {
        Self {
            attempts: settings.sync_attempts.max(1),
            backoff: settings.sync_backoff,
        }
    }
}

/// Shared handle to one calendar and its backend.
///
/// The view lock is only held for synchronous mutations, never while a
/// request is in flight.
#[derive(Clone)]
pub struct Session {
    view: Arc<Mutex<CalendarView>>,
    client: ApiClient,
    sync: SyncPolicy,
}

impl Session {
    pub fn new(view: CalendarView, client: ApiClient, sync: SyncPolicy) -> Self {
        Self {
            view: Arc::new(Mutex::new(view)),
            client,
            sync,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn view(&self) -> MutexGuard<'_, CalendarView> {
        self.view.lock().await
    }

    /// Seed the view from the backend's stored configuration.
    ///
    /// Returns false, keeping local defaults, if the backend is unreachable.
    pub async fn load_remote_config(&self) -> bool {
        match self.client.fetch_config().await {
            Ok(state) => {
                info!(
                    num_days = state.num_days,
                    holidays = state.holidays.len(),
                    "Loaded backend configuration"
                );
                self.view.lock().await.apply_remote_state(state);
                true
            }
            Err(e) => {
                warn!(error = %e, "Could not load backend configuration, using defaults");
                false
            }
        }
    }

    /// Re-render both grids and push the configuration
    pub async fn render(&self) -> CalendarGrids {
        let grids = self.view.lock().await.render().clone();
        self.sync_config().await;
        grids
    }

    pub async fn toggle_holiday(&self, index: u32) -> bool {
        let is_holiday = self.view.lock().await.toggle_holiday(index);
        debug!(index, is_holiday, "Toggled holiday");
        self.sync_config().await;
        is_holiday
    }

    pub async fn update_inputs(&self, inputs: FormInputs) {
        self.view.lock().await.set_inputs(inputs);
        self.sync_config().await;
    }

    /// Push the current configuration, retrying with exponential backoff.
    ///
    /// Every attempt sends the state as it is at that moment, and a retry is
    /// abandoned once a newer sync has started. A final failure is logged and
    /// recorded as a warning notice; the caller is never failed. Returns
    /// whether this sync delivered the config.
    pub async fn sync_config(&self) -> bool {
        let ticket = self.view.lock().await.begin_sync();
        let mut delay = self.sync.backoff;

        for attempt in 1..=self.sync.attempts {
            let Some(payload) = self.view.lock().await.sync_payload(ticket) else {
                debug!(attempt, "Config sync superseded by a newer one");
                return false;
            };
            match self.client.post_config(&payload).await {
                Ok(()) => return true,
                Err(e) if attempt < self.sync.attempts => {
                    debug!(attempt, error = %e, "Config sync failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(e) => {
                    warn!(attempts = attempt, error = %e, "Config sync failed");
                    self.view.lock().await.record_sync_failure(&e);
                }
            }
        }
        false
    }

    /// Sync, then ask the backend to create the student form
    pub async fn create_form(&self, title: &str) {
        self.sync_config().await;
        let ticket = self.view.lock().await.begin_create_form();

        info!(title, "Creating form");
        let result = self.client.create_form(title).await;
        if let Ok(form) = &result {
            info!(url = %form.url, "Form created");
        }
        self.view.lock().await.finish_create_form(ticket, result);
    }

    /// Mark a run as started, sync, then run the scheduler and overlay its
    /// result
    pub async fn run_schedule(&self) {
        let ticket = self.view.lock().await.begin_run();
        self.complete_run(ticket).await;
    }

    /// Like [`Session::run_schedule`], but returns as soon as the status is
    /// `Running` and finishes the run in a background task
    pub async fn start_run(&self) -> JoinHandle<()> {
        let ticket = self.view.lock().await.begin_run();
        let session = self.clone();
        tokio::spawn(async move { session.complete_run(ticket).await })
    }

    async fn complete_run(&self, ticket: RequestTicket) {
        self.sync_config().await;

        info!("Running scheduler");
        let result = self.client.run_schedule().await;
        if let Ok(outcome) = &result {
            info!(
                algo = %outcome.algo,
                penalty = outcome.penalty,
                exams = outcome.schedule.len(),
                "Scheduler finished"
            );
        }
        self.view.lock().await.finish_run(ticket, result);
    }
}
