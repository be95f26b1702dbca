use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Flat identity document accepted by the submit and cache-clear endpoints.
/// Every field is optional on the wire; unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
    pub twitter: String,
    pub portfolio: String,
    /// CDN URL of an uploaded resume document.
    pub resume: String,
    pub extra_links: Vec<String>,
    /// Raw skills payload, passed through to the seed record untouched.
    /// Callers send either a string or a list.
    pub skills: Value,
    /// Raw experience payload, same contract as `skills`.
    pub experience: Value,
    pub job_history: Vec<JobHistoryItem>,
    pub education: Vec<EducationItem>,
}

impl ProfileInput {
    /// At least one of first/last name must be present for processing.
    pub fn has_name(&self) -> bool {
        !self.first_name.is_empty() || !self.last_name.is_empty()
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobHistoryItem {
    pub company_name: String,
    pub job_title: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EducationItem {
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
}

/// Lifecycle of a background enrichment job. A job starts as `Processing`
/// and transitions exactly once to either `Complete` or `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Complete,
    Error,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Error)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Complete => write!(f, "complete"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// Persistent record of a single enrichment job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub status: JobStatus,
    /// Identity key the job was submitted under, linking it to the result cache.
    pub cache_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobRecord {
    pub fn processing(cache_key: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Processing,
            cache_key: cache_key.into(),
            result: None,
            error: None,
        }
    }

    pub fn complete(cache_key: impl Into<String>, result: Value) -> Self {
        Self {
            status: JobStatus::Complete,
            cache_key: cache_key.into(),
            result: Some(result),
            error: None,
        }
    }

    pub fn error(cache_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Error,
            cache_key: cache_key.into(),
            result: None,
            error: Some(message.into()),
        }
    }
}
