//! gm-ticket - GM support tickets for multiplayer game servers
//!
//! This crate keeps player-submitted support tickets in memory, indexed by
//! submitter and by creation order, while writing every change straight
//! through to durable storage:
//! - [`core::Ticket`] persists its own text edits as they happen
//! - [`registry::TicketRegistry`] loads, creates, closes and bulk-deletes
//!   tickets and notifies online players through [`session`] traits
//! - [`core::SurveyResponse`] decodes the survey a client sends after a close
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use gm_ticket::core::{CloseKind, SubmitterId};
//! use gm_ticket::registry::TicketRegistry;
//! use gm_ticket::session::NoPlayersOnline;
//! use gm_ticket::storage::MemoryStore;
//!
//! # fn main() -> gm_ticket::Result<()> {
//! let mut registry = TicketRegistry::new(Arc::new(MemoryStore::new()), Arc::new(NoPlayersOnline));
//! registry.load_all()?;
//!
//! let player = SubmitterId::new(42);
//! registry.create(player, "My mount vanished")?;
//! registry.set_response_text(player, Some("Restored, sorry about that"))?;
//! registry.close(player, CloseKind::ClosedWithSurvey)?;
//! assert_eq!(registry.ticket_count(), 0);
//! # Ok(())
//! # }
//! ```

// Allow missing error documentation for internal implementations
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

#[cfg(feature = "database")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod registry;
pub mod session;
pub mod storage;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use error::{GmTicketError, Result};
