//! Builds the aggregation stage sequences the statistics run on.
//!
//! Nothing here touches the store: every function returns stages for a
//! [`FactStore`](crate::domain::ports::FactStore) to execute.

use crate::domain::filter::Filter;
use crate::domain::stage::{Accumulator, GroupKey, GroupSpec, SortDirection, Stage};

pub const MARKS: &str = "marks";
pub const MARK_VALUE: &str = "marks.mark";
pub const MARK_SUBJECT: &str = "marks.subject";
pub const AVG_MARK: &str = "avgMark";
pub const COUNT: &str = "count";
pub const STID: &str = "stid";
pub const NAME: &str = "name";

fn unwind_marks() -> Stage {
    Stage::Unwind(MARKS.to_string())
}

fn average_by(key: GroupKey) -> GroupSpec {
    GroupSpec {
        key,
        accumulators: vec![(AVG_MARK.to_string(), Accumulator::Avg(MARK_VALUE.to_string()))],
    }
}

fn sort_by_average(direction: SortDirection) -> Stage {
    Stage::Sort {
        field: AVG_MARK.to_string(),
        direction,
    }
}

/// Key identifying a student by `(stid, name)`.
fn student_key() -> GroupKey {
    GroupKey::Compound(vec![STID.to_string(), NAME.to_string()])
}

/// Cap a stage sequence at `n` rows; zero or negative `n` yields no rows.
pub fn limit(n: i64) -> Stage {
    Stage::Limit(usize::try_from(n).unwrap_or(0))
}

/// Mean of every recorded mark as a single `{_id: null, avgMark}` row.
pub fn class_average() -> Vec<Stage> {
    vec![unwind_marks(), Stage::Group(average_by(GroupKey::All))]
}

/// Average mark per student, sorted by average.
///
/// Groups by `name`, not `stid`: students sharing a name are averaged
/// together as one row.
pub fn average_per_student(direction: SortDirection) -> Vec<Stage> {
    vec![
        unwind_marks(),
        Stage::Group(average_by(GroupKey::Field(NAME.to_string()))),
        sort_by_average(direction),
    ]
}

/// Keep only rows from [`average_per_student`] strictly above `average`.
pub fn above_average(average: f64) -> Stage {
    Stage::Match(Filter::new().gt(AVG_MARK, average))
}

/// Per-student average over the marks of one subject, best first, at most `limit` rows.
pub fn average_per_student_subject(subject: &str, limit_rows: i64) -> Vec<Stage> {
    vec![
        unwind_marks(),
        Stage::Match(Filter::new().eq(MARK_SUBJECT, subject)),
        Stage::Group(average_by(student_key())),
        sort_by_average(SortDirection::Descending),
        limit(limit_rows),
    ]
}

/// All mark values split into `buckets` buckets of roughly equal population.
pub fn distribution(buckets: usize) -> Vec<Stage> {
    vec![
        unwind_marks(),
        Stage::BucketAuto {
            group_by: MARK_VALUE.to_string(),
            buckets,
        },
    ]
}

/// Students whose average is below `avg_mark_ceiling` and who have fewer
/// than `mark_count_ceiling` marks. Both bounds are strict.
pub fn threshold_candidates(avg_mark_ceiling: i64, mark_count_ceiling: i64) -> Vec<Stage> {
    let mut group = average_by(student_key());
    group.accumulators.push((COUNT.to_string(), Accumulator::Count));
    vec![
        unwind_marks(),
        Stage::Group(group),
        Stage::Match(
            Filter::new()
                .lt(AVG_MARK, avg_mark_ceiling)
                .lt(COUNT, mark_count_ceiling),
        ),
    ]
}
