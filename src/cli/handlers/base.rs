//! Base handler utilities for common operations
//!
//! Every ticket command opens the configured database and loads the registry
//! the same way a world server does at startup.

use crate::config::AppConfig;
use crate::core::{SubmitterId, Ticket};
use crate::error::{GmTicketError, Result};
use crate::registry::{LoadReport, TicketRegistry};
use crate::session::NoPlayersOnline;
use crate::storage::SqliteStore;
use std::sync::Arc;

/// Context for handler operations
pub struct HandlerContext {
    pub registry: TicketRegistry,
    pub load_report: LoadReport,
}

impl HandlerContext {
    /// Opens the database named in `config` and loads every ticket
    pub fn open(config: &AppConfig) -> Result<Self> {
        let store = SqliteStore::open(&config.database.path)?;
        let mut registry = TicketRegistry::new(Arc::new(store), Arc::new(NoPlayersOnline));
        let load_report = registry.load_all()?;

        Ok(Self {
            registry,
            load_report,
        })
    }

    /// Looks up a ticket, turning absence into an error for the user
    pub fn require(&self, submitter: SubmitterId) -> Result<&Ticket> {
        self.registry
            .lookup(submitter)
            .ok_or(GmTicketError::TicketNotFound { submitter })
    }
}
