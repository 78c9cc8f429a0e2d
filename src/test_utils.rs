//! Test utilities for gm-ticket
//!
//! Shared fixtures for unit tests across the crate.

#![cfg(test)]

use crate::core::{SubmitterId, TicketBuilder};
use crate::registry::TicketRegistry;
use crate::session::NoPlayersOnline;
use crate::storage::{MemoryStore, TicketRow, TicketStore};
use std::sync::Arc;

/// Row image of a ticket with an empty response; the store assigns the row id
pub fn row(submitter: u32, request_text: &str) -> TicketRow {
    TicketBuilder::new()
        .submitter(SubmitterId::new(submitter))
        .request_text(request_text)
        .build()
        .to_row()
}

/// Memory store seeded with `rows` in order, plus a registry over it with
/// nobody online. The registry is not loaded yet.
pub fn registry_with_rows(rows: &[TicketRow]) -> (TicketRegistry, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    for row in rows {
        store.insert(row).expect("Failed to seed row");
    }
    let registry = TicketRegistry::new(store.clone(), Arc::new(NoPlayersOnline));
    (registry, store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_store_keeps_order() {
        let (_, store) = registry_with_rows(&[row(2, "b"), row(1, "a")]);
        let rows = store.rows();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].submitter, SubmitterId::new(2));
        assert_eq!(rows[1].request_text, "a");
    }
}
