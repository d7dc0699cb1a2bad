//! scriptreel - Edit AI dialogue scripts and turn them into videos
//!
//! Entry point for the scriptreel CLI application.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scriptreel::cli::{commands, Cli, Commands};
use scriptreel::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        scriptreel::cli::completions::print(shell);
        return Ok(());
    }

    // Load configuration only for runtime commands.
    let settings = Settings::load()?;

    // Initialize logging
    let default_level = if cli.verbose {
        "debug"
    } else {
        settings.general.log_level.as_str()
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match cli.command {
        Commands::List => {
            commands::list_scripts(&settings).await?;
        }
        Commands::Show { id } => {
            commands::show_script(&settings, &id).await?;
        }
        Commands::Edit { id, line, change } => {
            commands::edit_line(&settings, &id, line, change).await?;
        }
        Commands::AddLine { id, text, speaker } => {
            commands::add_line(&settings, &id, text, speaker).await?;
        }
        Commands::RemoveLine { id, line } => {
            commands::remove_line(&settings, &id, line).await?;
        }
        Commands::Generate { id, watch } => {
            commands::generate_video(&settings, &id, watch).await?;
        }
        Commands::Watch => {
            commands::watch_jobs(&settings).await?;
        }
        Commands::Delete { id, yes } => {
            commands::delete_script(&settings, &id, yes).await?;
        }
        Commands::Config(config_cmd) => {
            commands::config_command(&settings, config_cmd)?;
        }
        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}
