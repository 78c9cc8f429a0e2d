//! Command-line interface for staff working the ticket queue
//!
//! The CLI runs outside the world server, so it never sees a connected
//! player: closes and deletes issued here update storage only.

pub mod handlers;
mod output;

pub use output::OutputFormatter;

use crate::core::SubmitterId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "gm-ticket",
    version,
    about = "Inspect and manage GM support tickets",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./gm-ticket.toml when present)
    #[arg(long, global = true, env = "GM_TICKET_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database holding the ticket table
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List open tickets, oldest first
    List {
        /// Show at most this many tickets
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one ticket
    Show {
        /// Submitter GUID
        submitter: SubmitterId,
    },

    /// Replace a ticket's request text
    Edit {
        submitter: SubmitterId,
        text: String,
    },

    /// Set the staff response on a ticket
    Respond {
        submitter: SubmitterId,
        text: String,
    },

    /// Close a ticket
    Close {
        submitter: SubmitterId,

        /// Ask the player to fill in the survey
        #[arg(long)]
        survey: bool,
    },

    /// Delete a ticket without closing it
    Delete { submitter: SubmitterId },

    /// Delete every ticket
    DeleteAll {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },

    /// Decode a hex-encoded survey payload
    Survey {
        /// Payload bytes as hex
        payload: String,
    },
}
