mod aggregate_store;
mod clock;

pub use aggregate_store::{IAggregateStore, VersionedAggregate};
pub use clock::{Clock, ManualClock, SystemClock};
