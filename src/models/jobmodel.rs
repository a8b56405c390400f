use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    Assigned,
    Completed,
    Paid,
    Canceled,
}

impl JobStatus {
    pub fn to_str(&self) -> &str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Assigned => "assigned",
            JobStatus::Completed => "completed",
            JobStatus::Paid => "paid",
            JobStatus::Canceled => "canceled",
        }
    }

    /// States in which the two parties may review each other.
    pub fn is_reviewable(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Paid)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn to_str(&self) -> &str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Parses a status a poster may set. `pending` is only ever the initial state.
    pub fn parse_decision(value: &str) -> Option<ApplicationStatus> {
        match value {
            "accepted" => Some(ApplicationStatus::Accepted),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub payment: f64,
    pub category: String,
    pub urgency_flag: bool,
    pub posted_by: Uuid,
    pub status: JobStatus,
    pub applicants: Vec<Uuid>,
    pub selected_worker_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn is_poster(&self, user_id: Uuid) -> bool {
        self.posted_by == user_id
    }

    pub fn is_selected_worker(&self, user_id: Uuid) -> bool {
        self.selected_worker_id == Some(user_id)
    }

    pub fn has_applicant(&self, user_id: Uuid) -> bool {
        self.applicants.contains(&user_id)
    }

    /// The poster and the selected worker are the only parties of a job.
    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.is_poster(user_id) || self.is_selected_worker(user_id)
    }

    /// The other party of the job for `user_id`, if `user_id` is a party at all.
    pub fn counterparty(&self, user_id: Uuid) -> Option<Uuid> {
        if self.is_poster(user_id) {
            self.selected_worker_id
        } else if self.is_selected_worker(user_id) {
            Some(self.posted_by)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub location: String,
    pub payment: f64,
    pub category: String,
    pub urgency_flag: bool,
}

/// Content fields a poster may edit. Lifecycle fields are never part of it.
#[derive(Debug, Clone, Default)]
pub struct JobDetailsUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub payment: Option<f64>,
    pub category: Option<String>,
    pub urgency_flag: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub category: Option<String>,
    pub location: Option<String>,
    pub urgent_only: bool,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub applicant_id: Uuid,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub job_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewed_user_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub job_id: Uuid,
    pub reviewer_id: Uuid,
    pub reviewed_user_id: Uuid,
    pub rating: i32,
    pub comment: String,
}

/// Arithmetic mean of `ratings` rounded to one decimal place, halves away from zero.
/// Computed on integers so that e.g. a mean of 4.35 rounds to 4.4.
pub fn average_rating(ratings: &[i32]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    let count = ratings.len() as i64;
    let tenths = (20 * sum + count) / (2 * count);
    tenths as f64 / 10.0
}
