pub mod progress;
pub mod request;
pub mod response;
pub mod summary;

pub use progress::{SyncProgress, SyncStatus};
pub use request::SyncRequest;
pub use response::{SyncResponse, SyncStartStatus};
pub use summary::{AdjustmentTotals, FinancialSummary, SkuRefund, SkuSummary};

use crate::usecases::common::UseCaseMetadata;

pub struct AmazonFinancialSync;

impl UseCaseMetadata for AmazonFinancialSync {
    fn usecase_index() -> &'static str {
        "u501"
    }

    fn usecase_name() -> &'static str {
        "amazon_financial_sync"
    }

    fn display_name() -> &'static str {
        "Amazon financial events sync"
    }

    fn description() -> &'static str {
        "Fetches SP-API financial events in date chunks and aggregates revenue, fees and refunds"
    }
}
