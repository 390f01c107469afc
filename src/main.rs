use dockhand::cli::commands::{CliArgs, Commands};
use dockhand::cli::handlers::{
    handle_generate, handle_migrate, handle_notify, handle_troubleshoot, resolve_config,
};
use dockhand::error::USAGE_EXIT_CODE;
use dockhand::util::{init_logging, resolve_level, LoggingConfig};
use dockhand::{NAME, VERSION};

use clap::Parser;
use std::env;
use tracing::debug;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version print to stdout and succeed
            let code = if e.use_stderr() { USAGE_EXIT_CODE } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    init_logging_from_args(&args);

    debug!("{} v{} starting", NAME, VERSION);
    debug!("Arguments: {:?}", args);

    let config = resolve_config(&args);
    debug!("{}", config);

    let exit_code = match &args.command {
        Commands::Generate(generate_args) => handle_generate(generate_args, &config),
        Commands::Migrate(migrate_args) => handle_migrate(migrate_args, &config),
        Commands::Troubleshoot(troubleshoot_args) => {
            handle_troubleshoot(troubleshoot_args, &config).await
        }
        Commands::Notify(notify_args) => handle_notify(notify_args, &config).await,
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let env_level = env::var("DOCKHAND_LOG_LEVEL").ok();
    let level = resolve_level(
        args.log_level.as_deref(),
        args.verbose,
        args.quiet,
        env_level.as_deref(),
    );
    init_logging(LoggingConfig::from_env(level));
}
