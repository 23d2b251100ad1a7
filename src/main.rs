use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use students_stats::app::{commands, read_dataset, write_dataset};
use students_stats::domain::ports::ConfigProvider;
use students_stats::utils::{logger, validation::Validate};
use students_stats::{
    Cli, CliSettings, ErrorSeverity, MemoryStore, StatsError, StudentsService, TomlConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TomlConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path))?,
        None => TomlConfig::default(),
    };

    if config.json_logs() || cli.json_logs {
        logger::init_json_logger(cli.verbose, config.log_level());
    } else {
        logger::init_cli_logger(cli.verbose, config.log_level());
    }

    tracing::info!("Starting students-stats");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        tracing::error!("Suggestion: {}", e.recovery_suggestion());
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let settings = CliSettings {
        data: cli.data.clone(),
        file: config,
    };

    if let Err(e) = run(&cli, &settings).await {
        tracing::error!(
            "Command failed: {} (Severity: {:?})",
            e,
            e.severity()
        );
        tracing::error!("Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("{}", e);
        eprintln!("Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

async fn run(cli: &Cli, settings: &CliSettings<TomlConfig>) -> Result<(), StatsError> {
    let store = Arc::new(MemoryStore::new());
    let service = StudentsService::new(store, settings.mark_bounds());

    if let Some(path) = settings.data_path() {
        let dataset = read_dataset(path)?;
        let students = dataset.students.len();
        let marks = service.load(dataset).await?;
        tracing::info!(students, marks, "Loaded dataset from {}", path);
    }

    let report = commands::run(&service, &cli.command).await?;
    print!("{}", report.render(cli.format.into())?);

    if cli.save {
        match settings.data_path() {
            Some(path) => {
                write_dataset(path, &service.export().await?)?;
                tracing::info!("Dataset saved to {}", path);
            }
            None => tracing::warn!("--save given without a dataset path; nothing written"),
        }
    } else if cli.command.mutates() {
        tracing::info!("Changes are kept in memory only; pass --save to persist them");
    }

    Ok(())
}
