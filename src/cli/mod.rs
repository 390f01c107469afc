pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{CliArgs, Commands, GenerateArgs, MigrateArgs, NotifyArgs, TroubleshootArgs};
pub use output::{OutputFormat, OutputFormatter};
