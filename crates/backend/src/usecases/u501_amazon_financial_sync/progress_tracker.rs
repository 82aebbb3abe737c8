use chrono::Utc;
use contracts::usecases::u501_amazon_financial_sync::{FinancialSummary, SyncProgress, SyncStatus};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Sessions finished longer ago than this are dropped by `cleanup_old_sessions`
pub const SESSION_MAX_AGE_HOURS: i64 = 24;

/// In-memory progress of running and recent sync sessions
#[derive(Clone, Default)]
pub struct ProgressTracker {
    sessions: Arc<RwLock<HashMap<String, SyncProgress>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking writer leaves plain data behind; keep serving it.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, SyncProgress>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, SyncProgress>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }

    fn with_session(&self, session_id: &str, f: impl FnOnce(&mut SyncProgress)) {
        if let Some(progress) = self.write().get_mut(session_id) {
            f(progress);
            progress.updated_at = Utc::now();
        }
    }

    pub fn create_session(&self, session_id: String, total_chunks: u32) {
        let mut progress = SyncProgress::new(session_id.clone());
        progress.total_chunks = total_chunks;
        self.write().insert(session_id, progress);
    }

    pub fn get_progress(&self, session_id: &str) -> Option<SyncProgress> {
        self.read().get(session_id).cloned()
    }

    pub fn set_current_range(&self, session_id: &str, range: Option<String>) {
        self.with_session(session_id, |p| p.current_range = range);
    }

    /// Folds one finished chunk into the running totals
    pub fn complete_chunk(&self, session_id: &str, event_groups: u32, summary: &FinancialSummary) {
        self.with_session(session_id, |p| {
            p.processed_chunks += 1;
            p.event_groups += event_groups;
            p.summary.merge(summary);
        });
    }

    pub fn fail_chunk(&self, session_id: &str, code: String, message: String, range: Option<String>) {
        self.with_session(session_id, |p| {
            p.processed_chunks += 1;
            p.add_error(code, message, range);
        });
    }

    pub fn complete_session(&self, session_id: &str, status: SyncStatus) {
        self.with_session(session_id, |p| {
            p.status = status;
            p.current_range = None;
            p.completed_at = Some(Utc::now());
        });
    }

    /// Drops finished sessions older than `max_age_hours`; running ones are kept
    pub fn cleanup_old_sessions(&self, max_age_hours: i64) -> usize {
        let now = Utc::now();
        let mut sessions = self.write();
        let before = sessions.len();
        sessions.retain(|_, progress| match progress.completed_at {
            Some(completed_at) => (now - completed_at).num_hours() < max_age_hours,
            None => true,
        });
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn chunks_accumulate_into_summary() {
        let tracker = ProgressTracker::new();
        tracker.create_session("s1".into(), 2);

        let chunk = FinancialSummary {
            order_ids: vec!["111-1".into()],
            revenue: 40.0,
            ..Default::default()
        };
        tracker.complete_chunk("s1", 3, &chunk);
        tracker.fail_chunk(
            "s1",
            "FINANCIAL_EVENTS_FAILED".into(),
            "boom".into(),
            Some("2025-02-01..2025-02-28".into()),
        );
        tracker.complete_session("s1", SyncStatus::CompletedWithErrors);

        let progress = tracker.get_progress("s1").unwrap();
        assert_eq!(progress.processed_chunks, 2);
        assert_eq!(progress.event_groups, 3);
        assert_eq!(progress.summary.revenue, 40.0);
        assert_eq!(progress.errors.len(), 1);
        assert_eq!(progress.status, SyncStatus::CompletedWithErrors);
        assert!(progress.is_finished());
    }

    #[test]
    fn cleanup_keeps_running_and_recent_sessions() {
        let tracker = ProgressTracker::new();
        tracker.create_session("running".into(), 1);
        tracker.create_session("recent".into(), 1);
        tracker.create_session("old".into(), 1);
        tracker.complete_session("recent", SyncStatus::Completed);
        tracker.complete_session("old", SyncStatus::Completed);
        tracker.with_session("old", |p| {
            p.completed_at = Some(Utc::now() - Duration::hours(25))
        });

        assert_eq!(tracker.cleanup_old_sessions(SESSION_MAX_AGE_HOURS), 1);
        assert!(tracker.get_progress("running").is_some());
        assert!(tracker.get_progress("recent").is_some());
        assert!(tracker.get_progress("old").is_none());
    }

    #[test]
    fn unknown_session_is_ignored() {
        let tracker = ProgressTracker::new();
        tracker.complete_chunk("missing", 1, &FinancialSummary::default());
        assert!(tracker.get_progress("missing").is_none());
    }
}
