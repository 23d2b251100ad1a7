//! Turns raw aggregation rows into typed records.
//!
//! Averages are truncated toward zero. A missing group key is a mapping
//! error; a `null` average (a group whose marks were all non-numeric) maps to 0.

use crate::core::pipeline::{AVG_MARK, COUNT, NAME, STID};
use crate::domain::document::get_path;
use crate::domain::model::{
    IntervalBucket, Student, StudentAverage, StudentDoc, StudentSubjectMark,
};
use crate::utils::error::{Result, StatsError};
use serde_json::Value;

fn integer(doc: &Value, path: &str) -> Result<i64> {
    match get_path(doc, path) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| StatsError::mapping(path)),
        _ => Err(StatsError::mapping(path)),
    }
}

fn string(doc: &Value, path: &str) -> Result<String> {
    get_path(doc, path)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StatsError::mapping(path))
}

fn average(doc: &Value) -> Result<f64> {
    match get_path(doc, AVG_MARK) {
        Some(Value::Null) => Ok(0.0),
        Some(v) => v.as_f64().ok_or_else(|| StatsError::mapping(AVG_MARK)),
        None => Err(StatsError::mapping(AVG_MARK)),
    }
}

/// `{_id: null, avgMark}` row of the class-wide average.
pub fn class_average(doc: &Value) -> Result<f64> {
    average(doc)
}

/// `{_id: name, avgMark}` row of a per-name average.
pub fn student_average(doc: &Value) -> Result<StudentAverage> {
    Ok(StudentAverage {
        name: string(doc, "_id")?,
        avg_mark: average(doc)?.trunc() as i64,
    })
}

/// Name from a `{_id: name, ...}` row.
pub fn student_name(doc: &Value) -> Result<String> {
    string(doc, "_id")
}

/// `(stid, name)` from a row grouped by the compound student key.
pub fn student_key(doc: &Value) -> Result<Student> {
    Ok(Student {
        stid: integer(doc, &format!("_id.{}", STID))?,
        name: string(doc, &format!("_id.{}", NAME))?,
    })
}

/// `{_id: {min, max}, count}` bucket row.
pub fn interval_bucket(doc: &Value) -> Result<IntervalBucket> {
    Ok(IntervalBucket {
        min: integer(doc, "_id.min")?,
        max: integer(doc, "_id.max")?,
        occurrences: integer(doc, COUNT)?,
    })
}

pub fn student_doc(doc: Value) -> Result<StudentDoc> {
    Ok(serde_json::from_value(doc)?)
}

/// One row per recorded mark, optionally only those of `subject`.
pub fn subject_marks(student: &StudentDoc, subject: Option<&str>) -> Vec<StudentSubjectMark> {
    student
        .marks
        .iter()
        .filter(|m| subject.map_or(true, |s| m.subject == s))
        .map(|m| StudentSubjectMark {
            subject: m.subject.clone(),
            name: student.name.clone(),
            mark: m.mark,
        })
        .collect()
}

pub fn map_all<T>(docs: &[Value], map: fn(&Value) -> Result<T>) -> Result<Vec<T>> {
    docs.iter().map(map).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SubjectMark;
    use serde_json::json;

    #[test]
    fn test_student_average_truncates() {
        let avg = student_average(&json!({"_id": "Ann", "avgMark": 87.9})).unwrap();
        assert_eq!(avg.avg_mark, 87);
        let low = student_average(&json!({"_id": "Bob", "avgMark": 52.5})).unwrap();
        assert_eq!(low.to_string(), "Bob,52");
    }

    #[test]
    fn test_null_average_maps_to_zero_but_missing_key_fails() {
        let avg = student_average(&json!({"_id": "Ann", "avgMark": null})).unwrap();
        assert_eq!(avg.avg_mark, 0);
        let err = student_average(&json!({"avgMark": 70.0})).unwrap_err();
        assert!(matches!(err, StatsError::Mapping { ref field } if field == "_id"));
    }

    #[test]
    fn test_student_key_reads_compound_id() {
        let student = student_key(&json!({"_id": {"stid": 4, "name": "Dee"}, "avgMark": 1.0}))
            .unwrap();
        assert_eq!(student, Student::new(4, "Dee"));
    }

    #[test]
    fn test_interval_bucket() {
        let bucket = interval_bucket(&json!({"_id": {"min": 60, "max": 70.0}, "count": 3})).unwrap();
        assert_eq!(
            bucket,
            IntervalBucket {
                min: 60,
                max: 70,
                occurrences: 3
            }
        );
        assert!(interval_bucket(&json!({"_id": {"min": 60}, "count": 3})).is_err());
    }

    #[test]
    fn test_subject_marks_filters_by_exact_subject() {
        let mut doc = StudentDoc::new(1, "Ann");
        for (subject, mark) in [("Math", 90), ("math", 40), ("Math", 70)] {
            doc.marks.push(SubjectMark {
                subject: subject.to_string(),
                mark,
            });
        }
        let math = subject_marks(&doc, Some("Math"));
        assert_eq!(math.len(), 2);
        assert_eq!(math[1].mark, 70);
        assert_eq!(subject_marks(&doc, None).len(), 3);
    }
}
