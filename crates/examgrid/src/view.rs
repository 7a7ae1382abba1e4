//! CalendarView: the client-side state of the exam calendar.
//!
//! The view owns the form inputs, the holiday set, the exam overlay and the
//! status of the remote operations. Remote calls are split into a `begin_*`
//! step that hands out a [`RequestTicket`] and a `finish_*` step that applies
//! the result only if the ticket is still the latest of its kind.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::calendar::{build_grids, CalendarGrids, ExamOverlay, HolidaySet, ScheduleWindow};
use crate::client::ApiError;
use crate::types::{ConfigPayload, CreatedForm, FormInputs, RemoteState, ScheduleOutcome};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Done,
    Error(String),
}

impl RunStatus {
    /// Text shown in the status bar
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Idle => "",
            RunStatus::Running => "Running Scheduler...",
            RunStatus::Done => "Done!",
            RunStatus::Error(_) => "Error!",
        }
    }
}

/// Algorithm and penalty of the accepted schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleSummary {
    pub algo: String,
    pub penalty: f64,
}

impl ScheduleSummary {
    pub fn penalty_display(&self) -> String {
        format!("{:.2}", self.penalty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormLink {
    pub url: String,
    pub form_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "text", rename_all = "lowercase")]
pub enum Notice {
    Info(String),
    /// Non-blocking, used for background failures
    Warning(String),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Run,
    CreateForm,
    Sync,
}

/// Identifies one initiated remote request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    kind: RequestKind,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct CalendarView {
    inputs: FormInputs,
    holidays: HolidaySet,
    overlay: ExamOverlay,
    status: RunStatus,
    summary: Option<ScheduleSummary>,
    form_link: Option<FormLink>,
    notices: Vec<Notice>,
    grids: CalendarGrids,
    run_seq: u64,
    form_seq: u64,
    sync_seq: u64,
}

impl CalendarView {
    pub fn new(inputs: FormInputs) -> Self {
        let mut view = Self {
            inputs,
            ..Self::default()
        };
        view.render();
        view
    }

    pub fn inputs(&self) -> &FormInputs {
        &self.inputs
    }

    pub fn holidays(&self) -> &HolidaySet {
        &self.holidays
    }

    #[cfg(test)]
    pub fn overlay(&self) -> &ExamOverlay {
        &self.overlay
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn summary(&self) -> Option<&ScheduleSummary> {
        self.summary.as_ref()
    }

    pub fn form_link(&self) -> Option<&FormLink> {
        self.form_link.as_ref()
    }

    #[cfg(test)]
    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Grids from the last render
    pub fn grids(&self) -> &CalendarGrids {
        &self.grids
    }

    /// Window for the current inputs, falling back to today for a bad date
    pub fn window(&self) -> ScheduleWindow {
        self.window_with_fallback(chrono::Local::now().date_naive())
    }

    fn window_with_fallback(&self, today: NaiveDate) -> ScheduleWindow {
        ScheduleWindow::resolve(&self.inputs.num_days, &self.inputs.start_date, today)
    }

    /// Rebuild both grids from the current state
    pub fn render(&mut self) -> &CalendarGrids {
        let window = self.window();
        self.grids = build_grids(&window, &self.holidays, &self.overlay);
        &self.grids
    }

    /// Flip a day between exam day and holiday.
    ///
    /// Returns true if the day is now a holiday.
    pub fn toggle_holiday(&mut self, index: u32) -> bool {
        let is_holiday = self.holidays.toggle(index);
        if let Some(cell) = self.grids.input.iter_mut().find(|c| c.index == index) {
            cell.is_holiday = is_holiday;
        }
        self.render();
        is_holiday
    }

    /// Replace the form inputs.
    ///
    /// Holidays and exams past the new day count are dropped. A new start
    /// date keeps the remaining indices, which are offsets from it.
    pub fn set_inputs(&mut self, inputs: FormInputs) {
        self.inputs = inputs;
        let num_days = self.window().num_days;
        self.holidays.retain_below(num_days);
        self.overlay.retain_below(num_days);
        self.render();
    }

    /// Seed inputs and holidays from the configuration stored by the backend
    pub fn apply_remote_state(&mut self, state: RemoteState) {
        let inputs = FormInputs {
            num_days: state.num_days.to_string(),
            start_date: state.start_date,
            subjects: state.subjects.join(", "),
            allowed_emails: state.allowed_emails.join("\n"),
            form_id: state.form_id,
            form_title: self.inputs.form_title.clone(),
        };
        self.holidays = state.holidays.into_iter().collect();
        self.set_inputs(inputs);
    }

    pub fn config_payload(&self) -> ConfigPayload {
        ConfigPayload {
            num_days: self.window().num_days,
            holidays: self.holidays.to_vec(),
            subjects: self.inputs.subject_list(),
            allowed_emails: self.inputs.allowed_emails.clone(),
            form_id: self.inputs.form_id.trim().to_string(),
            start_date: self.inputs.start_date.trim().to_string(),
        }
    }

    /// Start a config sync. Any earlier sync still retrying is superseded.
    pub fn begin_sync(&mut self) -> RequestTicket {
        self.sync_seq += 1;
        RequestTicket {
            kind: RequestKind::Sync,
            seq: self.sync_seq,
        }
    }

    /// Payload for one attempt of a sync, or `None` once a newer sync has
    /// been started
    pub fn sync_payload(&self, ticket: RequestTicket) -> Option<ConfigPayload> {
        self.is_current(ticket).then(|| self.config_payload())
    }

    pub fn record_sync_failure(&mut self, error: &ApiError) {
        self.notices
            .push(Notice::Warning(format!("Could not save configuration: {error}")));
    }

    /// Remove and return pending notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn begin_run(&mut self) -> RequestTicket {
        self.run_seq += 1;
        self.status = RunStatus::Running;
        RequestTicket {
            kind: RequestKind::Run,
            seq: self.run_seq,
        }
    }

    /// Apply a scheduler result. Returns false if a newer run superseded it.
    pub fn finish_run(
        &mut self,
        ticket: RequestTicket,
        result: Result<ScheduleOutcome, ApiError>,
    ) -> bool {
        if !self.is_current(ticket) {
            debug!(seq = ticket.seq, latest = self.run_seq, "Discarding stale run result");
            return false;
        }

        match result {
            Ok(outcome) => {
                self.status = RunStatus::Done;
                self.overlay = ExamOverlay::from_schedule(&outcome.schedule);
                self.summary = Some(ScheduleSummary {
                    algo: outcome.algo,
                    penalty: outcome.penalty,
                });
                self.render();
            }
            Err(e) => {
                warn!(error = %e, "Scheduler run failed");
                let message = e.to_string();
                self.status = RunStatus::Error(message.clone());
                self.notices.push(Notice::Error(format!("Error: {message}")));
            }
        }
        true
    }

    pub fn begin_create_form(&mut self) -> RequestTicket {
        self.form_seq += 1;
        RequestTicket {
            kind: RequestKind::CreateForm,
            seq: self.form_seq,
        }
    }

    /// Apply a form creation result. Returns false if a newer request
    /// superseded it.
    pub fn finish_create_form(
        &mut self,
        ticket: RequestTicket,
        result: Result<CreatedForm, ApiError>,
    ) -> bool {
        if !self.is_current(ticket) {
            debug!(seq = ticket.seq, latest = self.form_seq, "Discarding stale form result");
            return false;
        }

        match result {
            Ok(form) => {
                // Keep what the user typed when the backend could not parse an id
                if let Some(id) = form.form_id {
                    self.inputs.form_id = id;
                }
                let form_id = self.inputs.form_id.clone();
                self.form_link = Some(FormLink {
                    url: form.url,
                    form_id,
                });
                self.notices.push(Notice::Info("Form Created!".to_string()));
            }
            Err(e) => {
                warn!(error = %e, "Form creation failed");
                self.notices.push(Notice::Error(format!("Error: {e}")));
            }
        }
        true
    }

    fn is_current(&self, ticket: RequestTicket) -> bool {
        match ticket.kind {
            RequestKind::Run => ticket.seq == self.run_seq,
            RequestKind::CreateForm => ticket.seq == self.form_seq,
            RequestKind::Sync => ticket.seq == self.sync_seq,
        }
    }
}
