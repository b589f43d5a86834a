use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Send an email via Amazon SES.
#[derive(Debug, Parser)]
#[command(name = "postman", version)]
pub struct Cli {
    /// Print progress messages for commands that are quiet by default.
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Path to a TOML configuration file.
    #[arg(long, global = true, env = "POSTMAN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Send a raw message read from standard input.
    #[command(name = "send")]
    Send(SendArgs),

    /// Request verification of sender addresses.
    #[command(name = "verify")]
    Verify {
        /// An email address to verify for sending from.
        #[arg(required = true)]
        email: Vec<String>,
    },

    /// List the verified sender addresses.
    #[command(name = "list_verified")]
    ListVerified,

    /// Show the sending quota of the account.
    #[command(name = "show_quota")]
    ShowQuota,

    /// Show the sending statistics of the last two weeks.
    #[command(name = "show_stats")]
    ShowStats,

    /// Remove addresses from the verified list.
    #[command(name = "delete_verified")]
    DeleteVerified {
        /// Verified email addresses that will be deleted from the verification list.
        #[arg(required = true)]
        email: Vec<String>,
    },
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// The address to send the message from, must be verified.
    #[arg(short = 'f')]
    pub from: Option<String>,

    /// Sanitize headers, converting illegal headers to X-Headers.
    #[arg(long)]
    pub sanitize: bool,

    /// A list of email addresses to deliver the message to.
    #[arg(value_name = "TO", required = true)]
    pub destinations: Vec<String>,
}
