//! Database snapshot before cutover

use crate::error::DockhandError;
use crate::exec::{CommandSpec, OutputMode, ProcessRunner};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Snapshot file name, always in the working directory
pub const DUMP_FILE: &str = "db_dump.sql";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    Postgres,
    Mysql,
    #[default]
    None,
}

impl DbType {
    pub fn dump_tool(&self) -> Option<&'static str> {
        match self {
            DbType::Postgres => Some("pg_dump"),
            DbType::Mysql => Some("mysqldump"),
            DbType::None => None,
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DbType::Postgres => "postgres",
            DbType::Mysql => "mysql",
            DbType::None => "none",
        })
    }
}

/// `pg_dump <db> > db_dump.sql` or the mysqldump equivalent; `None` when no
/// database is selected
pub fn dump_command(db_type: DbType, db_name: &str, work_dir: &Path) -> Option<CommandSpec> {
    let tool = db_type.dump_tool()?;
    Some(
        CommandSpec::new(tool)
            .arg(db_name)
            .current_dir(work_dir)
            .output(OutputMode::StdoutToFile(work_dir.join(DUMP_FILE))),
    )
}

/// Dumps `db_name` into `work_dir/db_dump.sql`.
///
/// # Errors
///
/// `DumpFailure` when the tool is missing or exits nonzero. Callers treat it
/// as a warning.
pub fn dump_database(
    runner: &dyn ProcessRunner,
    db_type: DbType,
    db_name: &str,
    work_dir: &Path,
) -> Result<PathBuf, DockhandError> {
    let tool = db_type.dump_tool().unwrap_or("none").to_string();
    let command = dump_command(db_type, db_name, work_dir).ok_or_else(|| {
        DockhandError::DumpFailure {
            tool: tool.clone(),
            reason: "no database type selected".to_string(),
        }
    })?;

    info!(database = %db_name, tool = %tool, "Dumping database");
    debug!(command = %command, "Running dump");

    let output = runner.run(&command).map_err(|e| DockhandError::DumpFailure {
        tool: tool.clone(),
        reason: e.to_string(),
    })?;

    if !output.success() {
        return Err(DockhandError::DumpFailure {
            tool,
            reason: output.failure_text(),
        });
    }

    let path = work_dir.join(DUMP_FILE);
    info!(path = %path.display(), "Database snapshot written");
    Ok(path)
}
