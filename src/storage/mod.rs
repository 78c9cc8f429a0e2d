//! Durable storage for tickets
//!
//! Everything goes through the [`TicketStore`] trait. Two backends ship with
//! the crate: [`MemoryStore`] for tests and embedding, and [`SqliteStore`]
//! (behind the `database` feature) for the `character_ticket` table.

mod memory;
mod repository;
#[cfg(feature = "database")]
mod sqlite;

pub use memory::MemoryStore;
pub use repository::{TextField, TicketRow, TicketStore, in_transaction};
#[cfg(feature = "database")]
pub use sqlite::SqliteStore;
