use super::{EntityMetadata, Origin};

/// Aggregate root: instance accessors plus static naming metadata.
pub trait AggregateRoot {
    type Id;

    fn id(&self) -> Self::Id;

    /// Business code of the record (e.g. "PO-2025-001")
    fn code(&self) -> &str;

    fn description(&self) -> &str;

    fn metadata(&self) -> &EntityMetadata;

    fn metadata_mut(&mut self) -> &mut EntityMetadata;

    /// Aggregate index (e.g. "a001")
    fn aggregate_index() -> &'static str;

    /// Collection name used for table naming (e.g. "organization")
    fn collection_name() -> &'static str;

    /// Singular display name
    fn element_name() -> &'static str;

    /// Plural display name
    fn list_name() -> &'static str;

    fn origin() -> Origin;

    /// Full name such as "a001_organization"
    fn full_name() -> String {
        format!("{}_{}", Self::aggregate_index(), Self::collection_name())
    }
}
