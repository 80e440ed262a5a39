//! CLI smoke entry point.
//!
//! # Responsibility
//! - Run the reference CRUD workflow against the memory or SQLite backend.
//! - Keep stdout deterministic `key=value` lines for quick sanity checks.

mod user;

use clap::Parser;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use user::{User, UserRepository};
use zerocrud_core::{
    core_version, default_log_level, ensure_table, init_logging, open_db, open_db_in_memory,
    CrudBase, CrudResult, Entity, StorageKind,
};

#[derive(Parser, Debug)]
#[command(name = "zerocrud", version, about = "Run the zerocrud reference workflow")]
struct Args {
    /// Backend to use: memory or database
    #[arg(long)]
    storage: Option<StorageKind>,

    /// SQLite file used as the database session (in-memory when omitted)
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Log level for file logging
    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for log files; logging stays off when omitted
    #[arg(long)]
    log_dir: Option<String>,
}

impl Args {
    /// Rejects flag combinations that would be silently ignored.
    fn validate(&self) -> Result<(), String> {
        match (self.storage, &self.db_path) {
            (Some(StorageKind::Memory), Some(path)) => Err(format!(
                "--db-path `{}` cannot be used with --storage memory",
                path.display()
            )),
            _ => Ok(()),
        }
    }

    fn wants_session(&self) -> bool {
        match self.storage {
            Some(StorageKind::Memory) => false,
            Some(StorageKind::Database) => true,
            None => self.db_path.is_some(),
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = args.validate() {
        eprintln!("argument error={err}");
        return ExitCode::FAILURE;
    }

    if let Some(log_dir) = &args.log_dir {
        let level = args.log_level.as_deref().unwrap_or(default_log_level());
        if let Err(err) = init_logging(level, log_dir) {
            eprintln!("logging error={err}");
            return ExitCode::FAILURE;
        }
    }

    println!("zerocrud_core version={}", core_version());
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(
                "event=cli_run module=cli status=error error_code={} error={}",
                err.code(),
                err
            );
            eprintln!("error code={} message={err}", err.code());
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> CrudResult<()> {
    if !args.wants_session() {
        return run_workflow(UserRepository::new(CrudBase::new(None, args.storage)?));
    }

    let mut conn = match &args.db_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    ensure_table(&conn, User::descriptor())?;

    // The dispatcher only flushes; this transaction is the unit of work.
    let tx = conn.transaction()?;
    run_workflow(UserRepository::new(CrudBase::new(Some(&*tx), args.storage)?))?;
    tx.commit()?;
    println!("committed=true");
    Ok(())
}

fn run_workflow(mut users: UserRepository<'_>) -> CrudResult<()> {
    println!("storage={}", users.crud().storage_type());

    let ana = users.register("Ana", "ana@x.com")?;
    println!("created id={} name={}", ana.id, ana.name);
    let bo = users.register("Bo", "bo@x.com")?;
    println!("created id={} name={}", bo.id, bo.name);

    let listed = users.crud().list(0, 10)?;
    let names: Vec<&str> = listed.iter().map(|user| user.name.as_str()).collect();
    println!("listed count={} names={}", listed.len(), names.join(","));

    let found = users.find_by_email("bo@x.com")?;
    println!(
        "find_by email=bo@x.com id={}",
        found.map_or_else(|| "none".to_string(), |user| user.id.to_string())
    );

    let removed = users.crud_mut().delete(ana.id)?;
    println!("deleted id={} removed={removed}", ana.id);
    let after = users.crud().get(ana.id)?;
    println!("get id={} found={}", ana.id, after.is_some());
    println!("count={}", users.crud().count()?);
    Ok(())
}
