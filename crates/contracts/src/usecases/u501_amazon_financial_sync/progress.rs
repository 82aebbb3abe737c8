use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FinancialSummary;

/// Live progress of one sync session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncProgress {
    pub session_id: String,
    pub status: SyncStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,

    pub total_chunks: u32,
    pub processed_chunks: u32,
    pub event_groups: u32,
    pub current_range: Option<String>,

    pub summary: FinancialSummary,
    pub errors: Vec<SyncError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncError {
    pub code: String,
    pub message: String,
    pub range: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl SyncProgress {
    pub fn new(session_id: String) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            status: SyncStatus::Running,
            started_at: now,
            completed_at: None,
            updated_at: now,
            total_chunks: 0,
            processed_chunks: 0,
            event_groups: 0,
            current_range: None,
            summary: FinancialSummary::default(),
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, code: String, message: String, range: Option<String>) {
        self.errors.push(SyncError {
            code,
            message,
            range,
            occurred_at: Utc::now(),
        });
        self.updated_at = Utc::now();
    }

    pub fn is_finished(&self) -> bool {
        self.status != SyncStatus::Running
    }
}
