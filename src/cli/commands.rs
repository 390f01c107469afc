use crate::migrate::DbType;
use crate::stack::StackKind;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Containerize a bare-metal application and stage it before cutover
#[derive(Parser, Debug)]
#[command(
    name = "dockhand",
    about = "Containerize a bare-metal application and stage it before cutover",
    version,
    long_about = "dockhand detects an application's stack, generates a Dockerfile and \
                  docker-compose.yml, builds and pushes a multi-architecture image, \
                  optionally snapshots its database and brings it up on a staging target. \
                  Traffic cutover stays manual."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,

    #[arg(
        long,
        global = true,
        help = "Never prompt; use defaults or fail when an answer is required"
    )]
    pub non_interactive: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Generate a Dockerfile and docker-compose.yml",
        long_about = "Detects the project's stack (or asks for it) and writes a two-stage \
                      Dockerfile plus a docker-compose.yml. Existing files are only \
                      overwritten after confirmation or with --force.\n\n\
                      Examples:\n  \
                      dockhand generate\n  \
                      dockhand generate --stack python --port 8000 --entrypoint app.py\n  \
                      dockhand generate --output deploy --force"
    )]
    Generate(GenerateArgs),

    #[command(
        about = "Build, push and stage the application",
        long_about = "Builds and pushes a multi-architecture image, optionally dumps the \
                      database to db_dump.sql, then brings the stack up locally or prints \
                      the commands for a remote host.\n\n\
                      Examples:\n  \
                      dockhand migrate --image registry.example.com/shop:1.4.0\n  \
                      dockhand migrate --image shop:1.4.0 --dbType postgres --db-name shop\n  \
                      dockhand migrate --image shop:1.4.0 --vps deploy@203.0.113.10"
    )]
    Migrate(MigrateArgs),

    #[command(
        about = "Inspect a container for common misconfigurations",
        long_about = "Lists containers (stopped ones included), inspects the chosen one, \
                      optionally reads its last 20 log lines and reports known problems \
                      with suggested fixes.\n\n\
                      Examples:\n  \
                      dockhand troubleshoot\n  \
                      dockhand troubleshoot --container shop-app-1 --logs"
    )]
    Troubleshoot(TroubleshootArgs),

    #[command(
        about = "Send a notification through the configured webhook",
        long_about = "Posts {recipient, subject, body} as JSON to DOCKHAND_NOTIFY_WEBHOOK.\n\n\
                      Example:\n  \
                      dockhand notify --to ops@example.com --subject 'Staging ready' --body 'shop:1.4.0 is up'"
    )]
    Notify(NotifyArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct GenerateArgs {
    #[arg(short = 's', long, value_enum, help = "Stack (auto-detected when omitted)")]
    pub stack: Option<StackKind>,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        default_value = ".",
        help = "Directory to write the artifacts to"
    )]
    pub output: PathBuf,

    #[arg(
        long,
        value_name = "DIR",
        default_value = ".",
        help = "Project directory inspected for stack markers"
    )]
    pub project_dir: PathBuf,

    #[arg(short = 'p', long, value_name = "PORT", help = "Port the application listens on")]
    pub port: Option<String>,

    #[arg(
        short = 'e',
        long,
        value_name = "ENTRYPOINT",
        help = "Entrypoint script, start command, or (react) build directory"
    )]
    pub entrypoint: Option<String>,

    #[arg(long, help = "Overwrite existing artifacts without asking")]
    pub force: bool,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct MigrateArgs {
    #[arg(short = 'i', long, value_name = "REF", help = "Image reference to build and push")]
    pub image: String,

    #[arg(long, value_name = "USER@HOST", help = "Remote staging host (instructions only)")]
    pub vps: Option<String>,

    #[arg(
        long = "dbType",
        visible_alias = "db-type",
        value_enum,
        default_value = "none",
        help = "Database to snapshot before deploying"
    )]
    pub db_type: DbType,

    #[arg(long, value_name = "NAME", help = "Database name (else DOCKHAND_DB_NAME or a prompt)")]
    pub db_name: Option<String>,

    #[arg(
        short = 'd',
        long,
        value_name = "DIR",
        default_value = ".",
        help = "Directory with the generated artifacts"
    )]
    pub dir: PathBuf,

    #[arg(long, help = "Skip the pre-flight confirmation")]
    pub force: bool,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct TroubleshootArgs {
    #[arg(
        short = 'c',
        long,
        value_name = "NAME_OR_ID",
        help = "Container to inspect (interactive selection when omitted)"
    )]
    pub container: Option<String>,

    #[arg(long, conflicts_with = "no_logs", help = "Fetch the log tail without asking")]
    pub logs: bool,

    #[arg(long, help = "Never fetch logs")]
    pub no_logs: bool,

    #[arg(short = 'f', long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
#[command(group(ArgGroup::new("content").required(true).args(["body", "body_file"])))]
pub struct NotifyArgs {
    #[arg(long, value_name = "RECIPIENT")]
    pub to: String,

    #[arg(long)]
    pub subject: String,

    #[arg(long)]
    pub body: Option<String>,

    #[arg(long, value_name = "FILE", help = "Read the body from a file")]
    pub body_file: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
