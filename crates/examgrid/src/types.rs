use serde::{Deserialize, Serialize};

/// Raw form fields, exactly as the user typed them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormInputs {
    pub num_days: String,
    pub start_date: String,
    /// Comma-separated subject names
    pub subjects: String,
    /// One address per line
    pub allowed_emails: String,
    pub form_id: String,
    pub form_title: String,
}

impl Default for FormInputs {
    fn default() -> Self {
        Self {
            num_days: "20".to_string(),
            start_date: "2025-01-01".to_string(),
            subjects: "Math, Physics, Chemistry, Biology, History".to_string(),
            allowed_emails: String::new(),
            form_id: String::new(),
            form_title: "Exam Schedule Form".to_string(),
        }
    }
}

impl FormInputs {
    /// Split the subject field on commas, dropping blanks
    pub fn subject_list(&self) -> Vec<String> {
        self.subjects
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Body of `POST /api/config`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigPayload {
    pub num_days: u32,
    pub holidays: Vec<u32>,
    pub subjects: Vec<String>,
    pub allowed_emails: String,
    pub form_id: String,
    pub start_date: String,
}

/// Configuration stored by the backend, as returned by `GET /api/config`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteState {
    pub num_days: u32,
    pub holidays: Vec<u32>,
    pub subjects: Vec<String>,
    pub allowed_emails: Vec<String>,
    pub form_id: String,
    pub start_date: String,
}

/// Body of `POST /api/create_form`
#[derive(Debug, Clone, Serialize)]
pub struct CreateFormRequest<'a> {
    pub title: &'a str,
}

/// A form created by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedForm {
    pub url: String,
    /// The backend only knows the id when it could parse it from the URL
    #[serde(default)]
    pub form_id: Option<String>,
}

/// One exam placed on one day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledExam {
    pub day: u32,
    pub subject: String,
}

/// Successful result of `POST /api/run_schedule`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleOutcome {
    pub algo: String,
    pub penalty: f64,
    pub schedule: Vec<ScheduledExam>,
}
