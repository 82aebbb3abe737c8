use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Days per SP-API request window
    #[serde(default = "default_chunk_days")]
    pub chunk_days: u32,
}

fn default_chunk_days() -> u32 {
    30
}
