pub mod mapper;
pub mod pipeline;
pub mod removal;
pub mod service;
pub mod stats;

pub use crate::domain::model::{
    Dataset, IntervalBucket, Mark, MarkBounds, Student, StudentAverage, StudentDoc,
    StudentSubjectMark, Subject,
};
pub use crate::domain::ports::{ConfigProvider, FactStore, StoreTransaction};
pub use crate::utils::error::Result;
