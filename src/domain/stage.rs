//! Aggregation stages understood by every [`FactStore`](crate::domain::ports::FactStore).

use crate::domain::filter::Filter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// What a group stage puts in `_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKey {
    /// One group over all input rows, `_id: null`.
    All,
    /// `_id` is the value of the field.
    Field(String),
    /// `_id` is an object holding each listed field.
    Compound(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accumulator {
    Avg(String),
    Count,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    pub key: GroupKey,
    pub accumulators: Vec<(String, Accumulator)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Unwind(String),
    Match(Filter),
    Group(GroupSpec),
    Sort {
        field: String,
        direction: SortDirection,
    },
    Limit(usize),
    /// Split values of `group_by` into `buckets` groups of roughly equal population.
    BucketAuto {
        group_by: String,
        buckets: usize,
    },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Unwind(_) => "unwind",
            Stage::Match(_) => "match",
            Stage::Group(_) => "group",
            Stage::Sort { .. } => "sort",
            Stage::Limit(_) => "limit",
            Stage::BucketAuto { .. } => "bucketAuto",
        }
    }
}
