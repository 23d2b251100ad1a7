pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{Cli, CliSettings, Command, OutputFormat};

pub use adapters::MemoryStore;
pub use config::TomlConfig;
pub use core::service::StudentsService;
pub use core::stats::StatisticsEngine;
pub use domain::model::{
    Dataset, IntervalBucket, Mark, MarkBounds, Student, StudentAverage, StudentDoc,
    StudentSubjectMark, Subject,
};
pub use utils::error::{ErrorSeverity, Result, StatsError};
