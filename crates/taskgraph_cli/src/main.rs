//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `taskgraph_core` linkage, database bootstrap and progress reads.
//! - Keep output deterministic for quick local sanity checks.

use log::info;
use std::process::ExitCode;
use taskgraph_core::db::migrations::current_user_version;
use taskgraph_core::{
    core_version, init_logging, open_db, CoreConfig, ProjectListQuery, ProjectService,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("taskgraph error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = CoreConfig::from_env();
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir)?;
    }

    println!("taskgraph_core version={}", core_version());

    let conn = open_db(&config.db_path)?;
    println!("db path={}", config.db_path.display());
    println!("db schema_version={}", current_user_version(&conn)?);

    let projects = ProjectService::try_new(&conn)?.list_projects(&ProjectListQuery::default())?;
    for project in &projects {
        println!(
            "project id={} status={} progress={:.2}",
            project.uuid, project.status, project.completion_progress
        );
    }
    info!(
        "event=cli_probe module=cli status=ok projects={}",
        projects.len()
    );
    Ok(())
}
