//! gm-ticket - staff CLI for GM support tickets
//!
//! Parses command-line arguments, loads configuration and dispatches to the
//! command handlers.

use clap::Parser;
use std::process;
use gm_ticket::cli::handlers::{
    HandlerContext, handle_close_command, handle_delete_all_command, handle_delete_command,
    handle_edit_command, handle_list_command, handle_respond_command, handle_show_command,
    handle_survey_command,
};
use gm_ticket::cli::{Cli, Commands, OutputFormatter};
use gm_ticket::config::AppConfig;
use gm_ticket::error::{GmTicketError, Result};
use tracing_subscriber::EnvFilter;

/// Entry point; exits with status 1 after printing any error
fn main() {
    let cli = Cli::parse();

    let formatter = OutputFormatter::new(cli.json, cli.no_color);

    if let Err(e) = run(cli, &formatter) {
        handle_error(&e, &formatter);
        process::exit(1);
    }
}

/// Loads configuration, sets up logging and runs the requested command
///
/// # Arguments
///
/// * `cli` - Parsed command-line arguments
/// * `formatter` - Output formatter for displaying results
///
/// # Errors
///
/// Returns an error if the configuration file cannot be read or the command
/// fails
fn run(cli: Cli, formatter: &OutputFormatter) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.database.path = database;
    }

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    dispatch_command(cli.command, &config, formatter)
}

/// Routes a parsed command to its handler
///
/// Ticket commands open the configured database and load the registry first.
/// Decoding a survey needs no database.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or loaded, or if the
/// handler itself fails
fn dispatch_command(command: Commands, config: &AppConfig, formatter: &OutputFormatter) -> Result<()> {
    let open = || HandlerContext::open(config);
    match command {
        Commands::Survey { payload } => handle_survey_command(&payload, formatter),
        Commands::List { limit } => handle_list_command(&open()?, limit, formatter),
        Commands::Show { submitter } => handle_show_command(&open()?, submitter, formatter),
        Commands::Edit { submitter, text } => {
            handle_edit_command(&mut open()?, submitter, &text, formatter)
        },
        Commands::Respond { submitter, text } => {
            handle_respond_command(&mut open()?, submitter, &text, formatter)
        },
        Commands::Close { submitter, survey } => {
            handle_close_command(&mut open()?, submitter, survey, formatter)
        },
        Commands::Delete { submitter } => handle_delete_command(&mut open()?, submitter, formatter),
        Commands::DeleteAll { yes } => handle_delete_all_command(&mut open()?, yes, formatter),
    }
}

/// Prints an error and, where one exists, a hint for fixing it
fn handle_error(error: &GmTicketError, formatter: &OutputFormatter) {
    formatter.error(&error.to_string());
    if let Some(suggestion) = error.suggestion() {
        formatter.info(&format!("Hint: {suggestion}"));
    }
}
