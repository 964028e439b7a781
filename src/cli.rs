use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "relaybot")]
#[command(author, version, about = "Telegram bot that relays documents to cloud storage", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot with long polling (default)
    Run,

    /// Upload a local file to the configured storage and print its link
    Upload {
        /// File to upload
        file: PathBuf,

        /// Remote file name (defaults to the local one)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Create the destination folder/prefix if it is missing
    EnsureDestination,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
