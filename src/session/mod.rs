//! Seams to the live game world
//!
//! The registry never talks to sockets itself. It asks a [`PlayerDirectory`]
//! whether a submitter is online and, if so, pushes notifications through
//! the returned [`PlayerSession`].

use crate::core::{SubmitterId, TicketStatusCode};
use crate::error::Result;
use std::sync::Arc;

/// Code sent with the ticket-removed message when staff wipe every ticket
pub const TICKET_FORCE_REMOVED_CODE: u32 = 0x0A;

/// Outbound notifications a connected player can receive
#[cfg_attr(test, mockall::automock)]
pub trait PlayerSession: Send + Sync {
    /// Tells the client its ticket was closed, optionally asking for a survey
    fn send_ticket_status_update(&self, status: TicketStatusCode) -> Result<()>;

    /// Tells the client its ticket no longer exists
    fn send_ticket_removed(&self, code: u32) -> Result<()>;
}

/// Resolves a submitter to their active session
#[cfg_attr(test, mockall::automock)]
pub trait PlayerDirectory: Send + Sync {
    /// Returns `None` when the player is not connected
    fn find_session(&self, submitter: SubmitterId) -> Option<Arc<dyn PlayerSession>>;
}

/// Directory for processes with no connected players, such as the staff CLI
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPlayersOnline;

impl PlayerDirectory for NoPlayersOnline {
    fn find_session(&self, _submitter: SubmitterId) -> Option<Arc<dyn PlayerSession>> {
        None
    }
}
