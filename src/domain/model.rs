use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest mark counted by the distribution buckets.
pub const MIN_MARK: i64 = 60;
/// Highest mark counted by the distribution buckets.
pub const MAX_MARK: i64 = 100;

/// Persisted student document. `marks` keeps recording order and is only ever appended to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDoc {
    pub stid: i64,
    pub name: String,
    #[serde(default)]
    pub marks: Vec<SubjectMark>,
}

impl StudentDoc {
    pub fn new(stid: i64, name: impl Into<String>) -> Self {
        Self {
            stid,
            name: name.into(),
            marks: Vec::new(),
        }
    }
}

impl fmt::Display for StudentDoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stid={} name={} marks=[", self.stid, self.name)?;
        for (i, mark) in self.marks.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", mark.subject, mark.mark)?;
        }
        write!(f, "]")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectDoc {
    pub suid: i64,
    pub subject: String,
}

/// A mark embedded in its student. `subject` is the subject name copied at recording time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectMark {
    pub subject: String,
    pub mark: i64,
}

/// Student identity without marks. Also the shape of ranked and removed students.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Student {
    pub stid: i64,
    pub name: String,
}

impl Student {
    pub fn new(stid: i64, name: impl Into<String>) -> Self {
        Self {
            stid,
            name: name.into(),
        }
    }
}

impl fmt::Display for Student {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.stid, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub suid: i64,
    pub subject: String,
}

impl Subject {
    pub fn new(suid: i64, subject: impl Into<String>) -> Self {
        Self {
            suid,
            subject: subject.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    pub stid: i64,
    pub suid: i64,
    pub mark: i64,
}

impl Mark {
    pub fn new(stid: i64, suid: i64, mark: i64) -> Self {
        Self { stid, suid, mark }
    }
}

/// A student's average mark, truncated toward zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentAverage {
    pub name: String,
    pub avg_mark: i64,
}

impl fmt::Display for StudentAverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.name, self.avg_mark)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSubjectMark {
    pub subject: String,
    pub name: String,
    pub mark: i64,
}

impl fmt::Display for StudentSubjectMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.name, self.subject, self.mark)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalBucket {
    pub min: i64,
    pub max: i64,
    pub occurrences: i64,
}

impl fmt::Display for IntervalBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}: {}", self.min, self.max, self.occurrences)
    }
}

/// Snapshot of the subjects and students collections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub students: Vec<StudentDoc>,
    /// Marks to record through `add_mark` when the dataset is loaded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

/// Mark range the distribution interval is divided over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkBounds {
    pub min: i64,
    pub max: i64,
}

impl Default for MarkBounds {
    fn default() -> Self {
        Self {
            min: MIN_MARK,
            max: MAX_MARK,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_doc_display() {
        let mut doc = StudentDoc::new(1, "Ann");
        doc.marks.push(SubjectMark {
            subject: "Math".to_string(),
            mark: 90,
        });
        doc.marks.push(SubjectMark {
            subject: "Art".to_string(),
            mark: 70,
        });
        assert_eq!(doc.to_string(), "stid=1 name=Ann marks=[Math:90, Art:70]");
    }

    #[test]
    fn test_student_doc_without_marks_deserializes() {
        let doc: StudentDoc = serde_json::from_value(serde_json::json!({
            "stid": 3,
            "name": "Bob"
        }))
        .unwrap();
        assert!(doc.marks.is_empty());
    }

    #[test]
    fn test_student_average_display() {
        let avg = StudentAverage {
            name: "Ann".to_string(),
            avg_mark: 87,
        };
        assert_eq!(avg.to_string(), "Ann,87");
    }
}
