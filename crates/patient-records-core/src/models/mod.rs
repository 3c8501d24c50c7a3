//! Domain models for patient records.

mod collection;
mod metrics;
mod patient;
mod update;

pub use collection::*;
pub use metrics::*;
pub use patient::*;
pub use update::*;
