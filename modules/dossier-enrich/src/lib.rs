pub mod accumulate;
pub mod cache;
pub mod deps;
pub mod fetch;
pub mod github;
pub mod jobs;
pub mod pipeline;
pub mod providers;
pub mod search;
pub mod synth;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;


pub use cache::{CacheStore, Namespace};
pub use deps::EnrichDeps;
pub use jobs::{JobManager, SubmitOutcome};
