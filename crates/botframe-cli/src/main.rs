//! botframe operator CLI entry point.
//!
//! Binary name: `botframe`
//!
//! Parses CLI arguments, sets up tracing, loads configuration and the plugin
//! registry, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use botframe_observe::tracing_setup::{init_tracing, verbosity_filter};
use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Err(err) = init_tracing(cli.log_format, verbosity_filter(cli.verbose, cli.quiet)) {
        eprintln!("Warning: failed to initialize tracing: {err}");
    }

    // Shell completions and version output don't need app state
    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(shell, &mut cmd, "botframe", &mut std::io::stdout());
        }
        Commands::Version { action } => {
            cli::version::handle_version_command(action, cli.json)?;
        }
        Commands::Serve { backend, storage } => {
            let state = AppState::init(cli.data_dir.as_deref()).await?;
            cli::serve::serve(&state, backend, storage, cli.json).await?;
        }
        Commands::Kv { action } => {
            let state = AppState::init(cli.data_dir.as_deref()).await?;
            cli::kv::handle_kv_command(action, &state, cli.json)?;
        }
    }

    Ok(())
}
