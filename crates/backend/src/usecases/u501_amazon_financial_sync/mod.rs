pub mod executor;
pub mod progress_tracker;

pub use executor::SyncExecutor;
pub use progress_tracker::ProgressTracker;
