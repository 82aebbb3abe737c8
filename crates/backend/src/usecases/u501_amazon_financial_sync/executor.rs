use super::progress_tracker::{ProgressTracker, SESSION_MAX_AGE_HOURS};
use crate::shared::amazon_sp_api::{financial_events::chunk_ranges, financial_parser, SpApiClient};
use anyhow::Result;
use chrono::NaiveDate;
use contracts::usecases::common::UseCaseMetadata;
use contracts::usecases::u501_amazon_financial_sync::{
    AmazonFinancialSync, SyncProgress, SyncRequest, SyncResponse, SyncStartStatus, SyncStatus,
};
use std::sync::Arc;
use uuid::Uuid;

const MAX_CHUNK_DAYS: u32 = 180;

/// Checks the requested window before anything is spawned
pub fn validate_request(request: &SyncRequest) -> Result<()> {
    if request.end_date < request.start_date {
        anyhow::bail!("end_date must not be before start_date");
    }
    if request.chunk_days == 0 || request.chunk_days > MAX_CHUNK_DAYS {
        anyhow::bail!("chunk_days must be between 1 and {}", MAX_CHUNK_DAYS);
    }
    Ok(())
}

fn range_label(start: NaiveDate, end: NaiveDate) -> String {
    format!("{}..{}", start, end)
}

/// Runs chunked financial-event fetches in the background
#[derive(Clone)]
pub struct SyncExecutor {
    progress_tracker: Arc<ProgressTracker>,
}

impl SyncExecutor {
    pub fn new(progress_tracker: Arc<ProgressTracker>) -> Self {
        Self { progress_tracker }
    }

    /// Validates the request, spawns the sync and returns its session id
    pub fn start_sync(&self, request: SyncRequest) -> Result<SyncResponse> {
        validate_request(&request)?;
        let client = SpApiClient::from_env()?;

        let removed = self.progress_tracker.cleanup_old_sessions(SESSION_MAX_AGE_HOURS);
        if removed > 0 {
            tracing::debug!("Dropped {} finished sync sessions", removed);
        }

        let chunks = chunk_ranges(request.start_date, request.end_date, request.chunk_days);
        let session_id = Uuid::new_v4().to_string();
        self.progress_tracker
            .create_session(session_id.clone(), chunks.len() as u32);

        let executor = self.clone();
        let session = session_id.clone();
        tokio::spawn(async move {
            executor.run_sync(&session, &client, chunks).await;
        });

        tracing::info!(
            "{} session {} started for {}",
            AmazonFinancialSync::full_name(),
            session_id,
            range_label(request.start_date, request.end_date)
        );
        Ok(SyncResponse {
            session_id,
            status: SyncStartStatus::Started,
            message: "Sync started".to_string(),
        })
    }

    pub fn get_progress(&self, session_id: &str) -> Option<SyncProgress> {
        self.progress_tracker.get_progress(session_id)
    }

    async fn run_sync(
        &self,
        session_id: &str,
        client: &SpApiClient,
        chunks: Vec<(NaiveDate, NaiveDate)>,
    ) {
        let total = chunks.len();
        let mut failures = 0usize;

        for (start, end) in chunks {
            let label = range_label(start, end);
            self.progress_tracker
                .set_current_range(session_id, Some(label.clone()));

            match client.get_financial_transactions(start, end).await {
                Ok(groups) => {
                    let summary = financial_parser::summarize(&groups);
                    self.progress_tracker
                        .complete_chunk(session_id, groups.len() as u32, &summary);
                }
                Err(e) => {
                    failures += 1;
                    tracing::error!("Financial sync {} failed for {}: {}", session_id, label, e);
                    self.progress_tracker
                        .fail_chunk(session_id, e.code, e.message, Some(label));
                }
            }
        }

        let status = final_status(total, failures);
        self.progress_tracker.complete_session(session_id, status);
        tracing::info!(
            "{} session {} finished: {:?} ({} of {} chunks failed)",
            AmazonFinancialSync::full_name(),
            session_id,
            status,
            failures,
            total
        );
    }
}

fn final_status(total: usize, failures: usize) -> SyncStatus {
    match failures {
        0 => SyncStatus::Completed,
        f if f >= total => SyncStatus::Failed,
        _ => SyncStatus::CompletedWithErrors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(start: (i32, u32, u32), end: (i32, u32, u32), chunk_days: u32) -> SyncRequest {
        SyncRequest {
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            chunk_days,
        }
    }

    #[test]
    fn rejects_inverted_range_and_bad_chunks() {
        assert!(validate_request(&request((2025, 3, 1), (2025, 2, 1), 30)).is_err());
        assert!(validate_request(&request((2025, 1, 1), (2025, 2, 1), 0)).is_err());
        assert!(validate_request(&request((2025, 1, 1), (2025, 2, 1), 365)).is_err());
        assert!(validate_request(&request((2025, 1, 1), (2025, 1, 1), 30)).is_ok());
    }

    #[test]
    fn status_reflects_failed_chunks() {
        assert_eq!(final_status(3, 0), SyncStatus::Completed);
        assert_eq!(final_status(3, 1), SyncStatus::CompletedWithErrors);
        assert_eq!(final_status(3, 3), SyncStatus::Failed);
    }

    #[test]
    fn request_defaults_to_thirty_day_chunks() {
        let req: SyncRequest =
            serde_json::from_str(r#"{"start_date":"2025-01-01","end_date":"2025-03-31"}"#).unwrap();
        assert_eq!(req.chunk_days, 30);
    }
}
