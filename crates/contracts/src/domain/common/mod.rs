//! Common types and traits shared by all aggregates

pub mod aggregate_id;
pub mod aggregate_root;
pub mod base_aggregate;
pub mod entity_metadata;
pub mod milestone;
pub mod origin;

pub use aggregate_id::AggregateId;
pub use aggregate_root::AggregateRoot;
pub use base_aggregate::BaseAggregate;
pub use entity_metadata::EntityMetadata;
pub use milestone::{append_milestone_note, Milestone, SignalStatus};
pub use origin::Origin;
