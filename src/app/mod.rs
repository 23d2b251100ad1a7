#[cfg(feature = "cli")]
pub mod commands;
pub mod dataset;
pub mod output;

pub use dataset::{read_dataset, write_dataset};
pub use output::{Format, Report};
