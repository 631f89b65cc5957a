use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stellar")]
#[command(author, version, about = "Stellar media generation worker")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the generation worker
    Worker,

    /// Request generation of a single resource and wait for the outcome
    Request {
        /// Resource kind: avatar_image, planet_image, or planet_video
        kind: String,

        /// Generation prompt
        prompt: String,

        /// Owning user id
        #[arg(long)]
        user: Option<String>,

        /// Owning planet id
        #[arg(long)]
        planet: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
