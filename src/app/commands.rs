use crate::app::output::{Format, Report};
use crate::config::cli::{Command, OutputFormat};
use crate::core::service::StudentsService;
use crate::domain::model::{Mark, Student, Subject};
use crate::domain::ports::FactStore;
use crate::utils::error::Result;

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Format::Text,
            OutputFormat::Json => Format::Json,
            OutputFormat::Csv => Format::Csv,
        }
    }
}

pub async fn run<S: FactStore>(service: &StudentsService<S>, command: &Command) -> Result<Report> {
    tracing::debug!(?command, "running command");
    let report = match command {
        Command::Best => Report::Averages(service.best_students().await?),
        Command::Top { n } => Report::Averages(service.top_best_students(*n).await?),
        Command::TopSubject { n, subject } => {
            Report::Students(service.top_best_students_by_subject(*n, subject).await?)
        }
        Command::Worst { n } => Report::Marks(service.worst_students(*n).await?),
        Command::Distribution { interval } => {
            Report::Buckets(service.mark_distribution(*interval).await?)
        }
        Command::Marks { name, subject } => {
            Report::Marks(service.marks_by_student_subject(name, subject).await?)
        }
        Command::Query { filter } => Report::Lines(service.raw_query(filter).await),
        Command::Sql { query } => Report::Lines(service.structured_query(query)),
        Command::Remove {
            avg_mark,
            mark_count,
        } => Report::Students(service.remove_underperformers(*avg_mark, *mark_count).await?),
        Command::AddStudent { stid, name } => {
            service.add_student(Student::new(*stid, name.clone())).await?;
            Report::Students(vec![Student::new(*stid, name.clone())])
        }
        Command::AddSubject { suid, subject } => {
            service.add_subject(Subject::new(*suid, subject.clone())).await?;
            Report::message(format!("{},{}", suid, subject))
        }
        Command::AddMark { stid, suid, mark } => {
            match service.add_mark(Mark::new(*stid, *suid, *mark)).await? {
                Some(_) => Report::message(format!("{},{},{}", stid, suid, mark)),
                None => Report::message(format!(
                    "mark not recorded: student {} or subject {} does not exist",
                    stid, suid
                )),
            }
        }
    };
    tracing::debug!(rows = report.len(), "command finished");
    Ok(report)
}
