pub mod bundle;
pub mod charts;
pub mod cleaner;
pub mod dataset;
pub mod profiler;
pub mod stats;
pub mod what_if;

pub use crate::domain::model::Dataset;
pub use crate::domain::ports::Storage;
pub use crate::utils::error::Result;
