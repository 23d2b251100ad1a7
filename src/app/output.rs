use crate::domain::model::{IntervalBucket, Student, StudentAverage, StudentSubjectMark};
use crate::utils::error::{Result, StatsError};
use serde::Serialize;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
    Csv,
}

/// Result of one command, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Averages(Vec<StudentAverage>),
    Students(Vec<Student>),
    Marks(Vec<StudentSubjectMark>),
    Buckets(Vec<IntervalBucket>),
    Lines(Vec<String>),
}

#[derive(Serialize)]
struct Line<'a> {
    line: &'a str,
}

impl Report {
    pub fn message(text: impl Into<String>) -> Self {
        Report::Lines(vec![text.into()])
    }

    pub fn len(&self) -> usize {
        match self {
            Report::Averages(rows) => rows.len(),
            Report::Students(rows) => rows.len(),
            Report::Marks(rows) => rows.len(),
            Report::Buckets(rows) => rows.len(),
            Report::Lines(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn render(&self, format: Format) -> Result<String> {
        match self {
            Report::Averages(rows) => render_rows(rows, format),
            Report::Students(rows) => render_rows(rows, format),
            Report::Marks(rows) => render_rows(rows, format),
            Report::Buckets(rows) => render_rows(rows, format),
            Report::Lines(lines) => match format {
                Format::Text => Ok(text(lines)),
                Format::Json => Ok(serde_json::to_string_pretty(lines)?),
                Format::Csv => csv_rows(lines.iter().map(|line| Line { line })),
            },
        }
    }
}

fn render_rows<T: Serialize + Display>(rows: &[T], format: Format) -> Result<String> {
    match format {
        Format::Text => Ok(text(rows)),
        Format::Json => Ok(serde_json::to_string_pretty(rows)?),
        Format::Csv => csv_rows(rows),
    }
}

fn text<T: Display>(rows: &[T]) -> String {
    rows.iter()
        .map(|row| format!("{}\n", row))
        .collect()
}

fn csv_rows<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| StatsError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| StatsError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn averages() -> Report {
        Report::Averages(vec![
            StudentAverage {
                name: "Ann".to_string(),
                avg_mark: 90,
            },
            StudentAverage {
                name: "Bob".to_string(),
                avg_mark: 72,
            },
        ])
    }

    #[test]
    fn test_text_uses_display_lines() {
        assert_eq!(averages().render(Format::Text).unwrap(), "Ann,90\nBob,72\n");
    }

    #[test]
    fn test_csv_has_header_row() {
        let csv = averages().render(Format::Csv).unwrap();
        assert_eq!(csv, "name,avg_mark\nAnn,90\nBob,72\n");
    }

    #[test]
    fn test_json_is_an_array() {
        let json = averages().render(Format::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[1]["avg_mark"], 72);
    }

    #[test]
    fn test_buckets_csv() {
        let report = Report::Buckets(vec![IntervalBucket {
            min: 60,
            max: 69,
            occurrences: 2,
        }]);
        assert_eq!(
            report.render(Format::Csv).unwrap(),
            "min,max,occurrences\n60,69,2\n"
        );
    }

    #[test]
    fn test_message_renders_in_every_format() {
        let report = Report::message("Structured query language is not supported");
        assert_eq!(
            report.render(Format::Text).unwrap(),
            "Structured query language is not supported\n"
        );
        assert_eq!(
            report.render(Format::Csv).unwrap(),
            "line\nStructured query language is not supported\n"
        );
        assert_eq!(report.len(), 1);
    }

    #[test]
    fn test_empty_report_renders_empty_text() {
        let report = Report::Students(Vec::new());
        assert!(report.is_empty());
        assert_eq!(report.render(Format::Text).unwrap(), "");
        assert_eq!(report.render(Format::Json).unwrap(), "[]");
    }
}
