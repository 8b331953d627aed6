use std::path::Path;

use clap::Parser;

use serial_registry::adapters::csv::{read_invalid_rows, read_range_rows};
use serial_registry::config::{Cli, Command, Settings};
use serial_registry::domain::ports::{RegistryStore, StatusLog};
use serial_registry::utils::{logger, validation::Validate};
use serial_registry::{
    check_collisions, run_db_check, CheckService, HttpSmsGateway, ImportPipeline, MemoryAuditLog,
    MemoryRegistry, MemoryStatusLog, NoopSmsGateway, ValidationEngine,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logger::init_cli_logger(cli.verbose);

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    if let Err(e) = settings.validate() {
        tracing::error!("configuration validation failed: {e}");
        eprintln!("{e}");
        std::process::exit(1);
    }

    match cli.command {
        Command::Import { ranges, invalids } => {
            let store = MemoryRegistry::new();
            let status = MemoryStatusLog::new();
            let report = import_files(&settings, &store, &status, &ranges, Some(&invalids)).await?;

            println!(
                "Inserted {} serials and {} invalids",
                report.ranges_inserted, report.invalids_inserted
            );
            if report.total_errors > 0 {
                println!("{} rows failed:", report.total_errors);
                for error in &report.errors {
                    println!("  {error}");
                }
            }

            let collisions = run_db_check(&store, &status).await?;
            if collisions.is_clean() {
                println!("No consistency problems found");
            } else {
                println!("{}", collisions.render());
            }
        }

        Command::Check {
            serial,
            ranges,
            invalids,
        } => {
            let store = MemoryRegistry::new();
            let status = MemoryStatusLog::new();
            if let Some(ranges) = &ranges {
                import_files(&settings, &store, &status, ranges, invalids.as_deref()).await?;
            }

            let engine = ValidationEngine::new(store, settings.registry.width());
            let outcome = engine.validate(&serial).await?;
            println!("{} - {}", outcome.status, outcome.answer);
        }

        Command::Message {
            sender,
            text,
            ranges,
            invalids,
        } => {
            let store = MemoryRegistry::new();
            let status = MemoryStatusLog::new();
            if let Some(ranges) = &ranges {
                import_files(&settings, &store, &status, ranges, invalids.as_deref()).await?;
            }

            let engine = ValidationEngine::new(store, settings.registry.width());
            let audit = MemoryAuditLog::new();
            let outcome = match &settings.sms {
                Some(sms) => {
                    let gateway = HttpSmsGateway::new(sms.endpoint.as_str(), sms.api_key.as_str());
                    CheckService::new(engine, audit.clone(), gateway)
                        .handle_message(&sender, &text)
                        .await?
                }
                None => {
                    CheckService::new(engine, audit.clone(), NoopSmsGateway)
                        .handle_message(&sender, &text)
                        .await?
                }
            };
            println!("{} - {}", outcome.status, outcome.answer);
        }

        Command::Dbcheck { ranges } => {
            let rows = read_range_rows(&ranges)?;
            let store = MemoryRegistry::new();
            let status = MemoryStatusLog::new();
            let mut pipeline = ImportPipeline::new(store.clone(), status, settings.registry.width())
                .with_limits(settings.import.batch_size(), settings.import.max_errors());
            pipeline.run(rows, Vec::new()).await?;

            let report = check_collisions(&store.all_ranges().await?);
            if report.is_clean() {
                println!("No consistency problems found");
            } else {
                println!("{}", report.render());
            }
        }
    }

    Ok(())
}

async fn import_files(
    settings: &Settings,
    store: &MemoryRegistry,
    status: &MemoryStatusLog,
    ranges: &Path,
    invalids: Option<&Path>,
) -> anyhow::Result<serial_registry::ImportReport> {
    let range_rows = read_range_rows(ranges)?;
    let invalid_rows = match invalids {
        Some(path) => read_invalid_rows(path)?,
        None => Vec::new(),
    };

    let mut pipeline =
        ImportPipeline::new(store.clone(), status.clone(), settings.registry.width())
            .with_limits(settings.import.batch_size(), settings.import.max_errors());
    let report = pipeline.run(range_rows, invalid_rows).await?;
    status
        .set("db_filename", &ranges.display().to_string())
        .await?;
    Ok(report)
}
