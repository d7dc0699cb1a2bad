//! CLI argument definitions using clap

use clap::{Args, Parser, Subcommand};

/// scriptreel - Edit AI character dialogues and render them as videos
#[derive(Parser, Debug)]
#[command(name = "scriptreel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List your scripts and their video status
    List,

    /// Show a script's dialogue and video status
    Show {
        /// Script ID
        id: String,
    },

    /// Change one dialogue line and save the script
    Edit {
        /// Script ID
        id: String,

        /// Line number (starting at 1)
        #[arg(short, long)]
        line: usize,

        #[command(flatten)]
        change: LineChange,
    },

    /// Append a dialogue line and save the script
    AddLine {
        /// Script ID
        id: String,

        /// Text of the new line
        #[arg(short, long)]
        text: String,

        /// Speaking character (defaults to the next one in the cast)
        #[arg(short, long)]
        speaker: Option<String>,
    },

    /// Remove a dialogue line and save the script
    RemoveLine {
        /// Script ID
        id: String,

        /// Line number (starting at 1)
        #[arg(short, long)]
        line: usize,
    },

    /// Request a video for a script
    Generate {
        /// Script ID
        id: String,

        /// Keep polling until the job finishes
        #[arg(short, long)]
        watch: bool,
    },

    /// Follow all active video jobs until they finish
    Watch,

    /// Delete a script
    Delete {
        /// Script ID
        id: String,

        /// Confirm the deletion
        #[arg(short, long)]
        yes: bool,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// New content for a dialogue line
#[derive(Args, Debug)]
#[group(required = true, multiple = true)]
pub struct LineChange {
    /// New text
    #[arg(short, long)]
    pub text: Option<String>,

    /// New speaking character
    #[arg(short, long)]
    pub speaker: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., video.poll_interval_secs)
        key: String,

        /// Value to set
        value: String,
    },
}
