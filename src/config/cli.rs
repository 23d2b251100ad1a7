use crate::domain::model::MarkBounds;
use crate::domain::ports::ConfigProvider;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Clone, Parser)]
#[command(name = "students-stats")]
#[command(about = "Academic performance statistics over a students dataset")]
pub struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// JSON dataset to load (overrides store.data_path from the config)
    #[arg(short, long)]
    pub data: Option<String>,

    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write the dataset back after the command runs
    #[arg(long)]
    pub save: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Students averaging above the class average
    Best,
    /// Top N students by average mark
    Top {
        #[arg(allow_negative_numbers = true)]
        n: i64,
    },
    /// Top N students by average mark in one subject
    TopSubject {
        #[arg(allow_negative_numbers = true)]
        n: i64,
        subject: String,
    },
    /// Every mark of the N lowest-averaging students
    Worst {
        #[arg(allow_negative_numbers = true)]
        n: i64,
    },
    /// Mark distribution for the given interval width
    Distribution {
        #[arg(allow_negative_numbers = true)]
        interval: i64,
    },
    /// Marks of a student in a subject
    Marks { name: String, subject: String },
    /// Students matching a raw JSON filter document
    Query { filter: String },
    /// Structured query language passthrough (not supported)
    Sql { query: String },
    /// Remove students averaging below AVG with fewer than COUNT marks
    Remove {
        avg_mark: i64,
        mark_count: i64,
    },
    AddStudent { stid: i64, name: String },
    AddSubject { suid: i64, subject: String },
    AddMark { stid: i64, suid: i64, mark: i64 },
}

impl Command {
    pub fn mutates(&self) -> bool {
        matches!(
            self,
            Command::Remove { .. }
                | Command::AddStudent { .. }
                | Command::AddSubject { .. }
                | Command::AddMark { .. }
        )
    }
}

/// Command line values layered over the file configuration.
#[derive(Debug, Clone)]
pub struct CliSettings<C: ConfigProvider> {
    pub data: Option<String>,
    pub file: C,
}

impl<C: ConfigProvider> ConfigProvider for CliSettings<C> {
    fn mark_bounds(&self) -> MarkBounds {
        self.file.mark_bounds()
    }

    fn data_path(&self) -> Option<&str> {
        self.data.as_deref().or_else(|| self.file.data_path())
    }
}
