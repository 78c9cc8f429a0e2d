//! Ticket queue commands

use super::HandlerContext;
use crate::cli::OutputFormatter;
use crate::core::{CloseKind, SubmitterId};
use crate::error::{GmTicketError, Result};
use serde_json::json;

/// Handle the list command
///
/// Prints open tickets in creation order, oldest first, and warns when the
/// load had to purge duplicate rows.
///
/// # Arguments
///
/// * `ctx` - Loaded registry
/// * `limit` - Maximum number of tickets to print
/// * `formatter` - Output formatter for displaying results
///
/// # Errors
///
/// Returns an error if JSON serialization fails
pub fn handle_list_command(
    ctx: &HandlerContext,
    limit: Option<usize>,
    formatter: &OutputFormatter,
) -> Result<()> {
    let tickets: Vec<_> = ctx
        .registry
        .tickets()
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    if formatter.is_json() {
        return formatter.print_json(&json!({
            "total": ctx.registry.ticket_count(),
            "tickets": tickets,
        }));
    }

    if ctx.load_report.purged() > 0 {
        formatter.warning(&format!(
            "Removed {} duplicate ticket row(s) while loading",
            ctx.load_report.purged()
        ));
    }
    if tickets.is_empty() {
        formatter.info("No open tickets");
        return Ok(());
    }
    formatter.print_ticket_list(tickets);
    Ok(())
}

/// Handle the show command
///
/// # Errors
///
/// Returns `TicketNotFound` if the submitter has no open ticket
pub fn handle_show_command(
    ctx: &HandlerContext,
    submitter: SubmitterId,
    formatter: &OutputFormatter,
) -> Result<()> {
    let ticket = ctx.require(submitter)?;
    if formatter.is_json() {
        return formatter.print_json(ticket);
    }
    formatter.print_ticket(ticket);
    Ok(())
}

/// Handle the edit command, replacing the player's request text
///
/// # Arguments
///
/// * `ctx` - Loaded registry
/// * `submitter` - Player whose ticket is edited
/// * `text` - New request text
/// * `formatter` - Output formatter for displaying results
///
/// # Errors
///
/// Returns an error if:
/// - The submitter has no open ticket
/// - The database rejects the update
pub fn handle_edit_command(
    ctx: &mut HandlerContext,
    submitter: SubmitterId,
    text: &str,
    formatter: &OutputFormatter,
) -> Result<()> {
    if !ctx.registry.set_request_text(submitter, Some(text))? {
        return Err(GmTicketError::TicketNotFound { submitter });
    }
    report_updated(ctx, submitter, "Request text updated", formatter)
}

/// Handle the respond command, saving a staff response on the ticket
///
/// # Errors
///
/// Returns an error if:
/// - The submitter has no open ticket
/// - The database rejects the update
pub fn handle_respond_command(
    ctx: &mut HandlerContext,
    submitter: SubmitterId,
    text: &str,
    formatter: &OutputFormatter,
) -> Result<()> {
    if !ctx.registry.set_response_text(submitter, Some(text))? {
        return Err(GmTicketError::TicketNotFound { submitter });
    }
    report_updated(ctx, submitter, "Response saved", formatter)
}

/// Confirms a text update, or prints the updated ticket as JSON
fn report_updated(
    ctx: &HandlerContext,
    submitter: SubmitterId,
    message: &str,
    formatter: &OutputFormatter,
) -> Result<()> {
    if formatter.is_json() {
        return formatter.print_json(ctx.require(submitter)?);
    }
    formatter.success(&format!("{message} for ticket {submitter}"));
    Ok(())
}

/// Handle the close command
///
/// The stored row is deleted whether or not the player is online. The CLI
/// has no live sessions, so nobody is notified from here.
///
/// # Arguments
///
/// * `ctx` - Loaded registry
/// * `submitter` - Player whose ticket is closed
/// * `survey` - Close with the survey status instead of a plain close
/// * `formatter` - Output formatter for displaying results
///
/// # Errors
///
/// Returns an error if:
/// - The submitter has no open ticket
/// - The database delete fails
pub fn handle_close_command(
    ctx: &mut HandlerContext,
    submitter: SubmitterId,
    survey: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let kind = if survey {
        CloseKind::ClosedWithSurvey
    } else {
        CloseKind::Closed
    };
    let outcome = ctx
        .registry
        .close(submitter, kind)?
        .ok_or(GmTicketError::TicketNotFound { submitter })?;

    if formatter.is_json() {
        return formatter.print_json(&outcome);
    }
    formatter.success(&format!("Closed ticket {submitter}"));
    if !outcome.notified {
        formatter.info("Player is offline; no notification sent");
    }
    Ok(())
}

/// Handle the delete command, removing one ticket without notification
///
/// # Errors
///
/// Returns an error if:
/// - The submitter has no open ticket
/// - The database delete fails
pub fn handle_delete_command(
    ctx: &mut HandlerContext,
    submitter: SubmitterId,
    formatter: &OutputFormatter,
) -> Result<()> {
    if !ctx.registry.delete(submitter)? {
        return Err(GmTicketError::TicketNotFound { submitter });
    }
    if formatter.is_json() {
        return formatter.print_json(&json!({ "deleted": submitter }));
    }
    formatter.success(&format!("Deleted ticket {submitter}"));
    Ok(())
}

/// Handle the delete-all command
///
/// # Arguments
///
/// * `ctx` - Loaded registry
/// * `yes` - Confirmation; nothing is deleted without it
/// * `formatter` - Output formatter for displaying results
///
/// # Errors
///
/// Returns an error if:
/// - `yes` was not given
/// - The bulk delete fails
pub fn handle_delete_all_command(
    ctx: &mut HandlerContext,
    yes: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    if !yes {
        return Err(GmTicketError::InvalidInput(format!(
            "Refusing to delete {} ticket(s) without --yes",
            ctx.registry.ticket_count()
        )));
    }

    let report = ctx.registry.delete_all()?;
    if formatter.is_json() {
        return formatter.print_json(&report);
    }
    formatter.success(&format!("Deleted {} ticket row(s)", report.rows_deleted));
    Ok(())
}
