//! `person-sync` command line entry point.
//!
//! Loads configuration, opens the store and drives `PersonService`.
//! Every subcommand prints JSON on stdout.

mod cli;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use log::{error, info};
use person_core::db::open_db;
use person_core::{
    init_logging_from_config, HttpRemoteSource, PersonInput, PersonService, ServiceConfig,
    SqliteMetadataRepository, SqlitePersonRepository, SyncOutcome,
};
use rusqlite::Connection;
use std::thread;
use std::time::Duration;

type Service<'conn> = PersonService<
    SqlitePersonRepository<'conn>,
    SqliteMetadataRepository<'conn>,
    HttpRemoteSource,
>;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ServiceConfig::from_json_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    init_logging_from_config(&config.log).map_err(anyhow::Error::msg)?;

    let conn = open_db(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path.display()))?;

    if let Command::Init = cli.cmd {
        let metadata = SqliteMetadataRepository::new(&conn)
            .ensure_metadata(&config.metadata_model_id)
            .context("provisioning sync metadata")?;
        return print_json(&metadata);
    }

    let service = build_service(&conn, &config)?;
    match cli.cmd {
        Command::Init => Ok(()),
        Command::Sync => {
            let outcome = service.update_repository()?;
            print_outcome(outcome, service.last_global_update_time())
        }
        Command::Watch {
            interval_secs,
            max_runs,
        } => watch(&service, Duration::from_secs(interval_secs), max_runs),
        Command::List => print_json(&service.get_all()?),
        Command::Get { id } => match service.get_by_id(&id)? {
            Some(person) => print_json(&person),
            None => bail!("person `{id}` not found"),
        },
        Command::Create { json } => {
            let created = service.create(Some(parse_input(&json)?))?;
            print_json(&created)
        }
        Command::Update { id, json } => {
            let updated = service.update_by_id(&id, Some(parse_input(&json)?))?;
            print_json(&serde_json::json!({ "updated": updated }))
        }
        Command::Delete { id } => {
            let deleted = service.delete_by_id(&id)?;
            print_json(&serde_json::json!({ "deleted": deleted }))
        }
        Command::LastSync { reload } => {
            let last_modified = if reload {
                service.reload_metadata()?
            } else {
                service.last_global_update_time()
            };
            print_json(&serde_json::json!({ "lastModified": last_modified }))
        }
    }
}

fn build_service<'conn>(conn: &'conn Connection, config: &ServiceConfig) -> Result<Service<'conn>> {
    let remote = HttpRemoteSource::new(&config.remote)?;
    let service = PersonService::new(
        SqlitePersonRepository::new(conn),
        SqliteMetadataRepository::new(conn),
        remote,
        &config.metadata_model_id,
    )
    .context("run `person-sync init` to provision the metadata record")?;
    Ok(service)
}

fn watch(service: &Service<'_>, interval: Duration, max_runs: Option<u64>) -> Result<()> {
    let mut runs = 0_u64;
    loop {
        runs += 1;
        match service.update_repository() {
            Ok(outcome) => print_outcome(outcome, service.last_global_update_time())?,
            Err(err) if err.is_concurrency_failure() => {
                error!("event=watch module=cli status=abort run={runs} error={err}");
                return Err(err.into());
            }
            Err(err) => {
                error!("event=watch module=cli status=error run={runs} error={err}");
                eprintln!("sync run {runs} failed: {err}");
            }
        }

        if max_runs.is_some_and(|max| runs >= max) {
            info!("event=watch module=cli status=done runs={runs}");
            return Ok(());
        }
        thread::sleep(interval);
    }
}

fn parse_input(raw: &str) -> Result<PersonInput> {
    serde_json::from_str(raw).context("person payload must be a JSON object")
}

fn print_outcome(outcome: SyncOutcome, last_modified: i64) -> Result<()> {
    let value = match outcome {
        SyncOutcome::Skipped => serde_json::json!({
            "status": "skipped",
            "lastModified": last_modified,
        }),
        SyncOutcome::Applied(report) => serde_json::json!({
            "status": "applied",
            "report": report,
            "lastModified": last_modified,
        }),
    };
    print_json(&value)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
