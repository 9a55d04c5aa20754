//! Multi-step workflows over sources, engines and stores.

pub mod distribution;
pub mod snapshot;

pub use distribution::{DistributionPipeline, DistributionPlan, DistributionRequest};
pub use snapshot::SnapshotService;
