#![cfg(feature = "cli")]

use std::sync::Arc;
use students_stats::app::{commands, read_dataset, write_dataset, Format};
use students_stats::domain::ports::ConfigProvider;
use students_stats::utils::validation::Validate;
use students_stats::{
    CliSettings, Command, MarkBounds, MemoryStore, StudentsService, TomlConfig,
};
use tempfile::TempDir;

const DATASET: &str = r#"{
  "subjects": [{"suid": 1, "subject": "Math"}, {"suid": 2, "subject": "Art"}],
  "students": [
    {"stid": 1, "name": "Ann", "marks": [{"subject": "Math", "mark": 90}]},
    {"stid": 2, "name": "Bob"},
    {"stid": 3, "name": "Cid"}
  ],
  "marks": [
    {"stid": 2, "suid": 1, "mark": 50},
    {"stid": 2, "suid": 2, "mark": 55},
    {"stid": 1, "suid": 2, "mark": 80},
    {"stid": 9, "suid": 1, "mark": 70}
  ]
}"#;

#[tokio::test]
async fn test_load_query_remove_and_save() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path().join("students.json");
    std::fs::write(&data_path, DATASET).unwrap();

    let service = StudentsService::new(Arc::new(MemoryStore::new()), MarkBounds::default());
    let recorded = service
        .load(read_dataset(&data_path).unwrap())
        .await
        .unwrap();
    assert_eq!(recorded, 3);

    let report = commands::run(&service, &Command::Top { n: 2 }).await.unwrap();
    assert_eq!(report.render(Format::Text).unwrap(), "Ann,85\nBob,52\n");

    let report = commands::run(
        &service,
        &Command::Remove {
            avg_mark: 60,
            mark_count: 3,
        },
    )
    .await
    .unwrap();
    assert_eq!(report.render(Format::Csv).unwrap(), "stid,name\n2,Bob\n");

    write_dataset(&data_path, &service.export().await.unwrap()).unwrap();
    let saved = read_dataset(&data_path).unwrap();
    let names: Vec<&str> = saved.students.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Ann", "Cid"]);
    assert_eq!(saved.students[0].marks.len(), 2);
    assert_eq!(saved.subjects.len(), 2);
    assert!(saved.marks.is_empty());
}

#[tokio::test]
async fn test_configured_bounds_drive_bucket_count() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("stats.toml");
    std::fs::write(&config_path, "[marks]\nmin = 0\nmax = 100\n").unwrap();

    let config = TomlConfig::from_file(&config_path).unwrap();
    assert!(config.validate().is_ok());
    let settings = CliSettings {
        data: None,
        file: config,
    };

    let service = StudentsService::new(Arc::new(MemoryStore::new()), settings.mark_bounds());
    assert_eq!(service.stats().bucket_count(10).unwrap(), 10);
    assert_eq!(service.stats().bucket_count(30).unwrap(), 3);
}

#[tokio::test]
async fn test_structured_query_command_renders_message() {
    let service = StudentsService::new(Arc::new(MemoryStore::new()), MarkBounds::default());
    let report = commands::run(
        &service,
        &Command::Sql {
            query: "SELECT s FROM Student s".to_string(),
        },
    )
    .await
    .unwrap();
    let json = report.render(Format::Json).unwrap();
    let lines: Vec<String> = serde_json::from_str(&json).unwrap();
    assert_eq!(lines, vec!["Structured query language is not supported"]);
}
