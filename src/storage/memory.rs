use super::{TextField, TicketRow, TicketStore};
use crate::core::SubmitterId;
use crate::error::{GmTicketError, Result};
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<TicketRow>,
    last_row_id: u64,
    snapshot: Option<(Vec<TicketRow>, u64)>,
    fail_next_insert: bool,
    fail_next_update: bool,
    fail_next_commit: bool,
}

/// In-process ticket table
///
/// Transactions are snapshot based: begin copies the table, rollback puts
/// the copy back. Inserts, text updates and commits can be made to fail on
/// demand to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `insert` fail with a storage error
    pub fn fail_next_insert(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_next_insert = true;
        }
    }

    /// Makes the next `update_text` fail without touching any row
    pub fn fail_next_update(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_next_update = true;
        }
    }

    /// Makes the next commit fail and leaves the transaction open
    pub fn fail_next_commit(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_next_commit = true;
        }
    }

    /// Copy of the current table contents in row id order
    pub fn rows(&self) -> Vec<TicketRow> {
        self.state
            .lock()
            .map(|state| state.rows.clone())
            .unwrap_or_default()
    }

    pub fn in_transaction(&self) -> bool {
        self.state
            .lock()
            .map(|state| state.snapshot.is_some())
            .unwrap_or(false)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| GmTicketError::Storage("memory store lock poisoned".to_string()))
    }
}

impl TicketStore for MemoryStore {
    fn load_rows(&self) -> Result<Vec<TicketRow>> {
        Ok(self.lock()?.rows.clone())
    }

    fn insert(&self, row: &TicketRow) -> Result<u64> {
        let mut state = self.lock()?;
        if std::mem::take(&mut state.fail_next_insert) {
            return Err(GmTicketError::Storage("injected insert failure".to_string()));
        }
        state.last_row_id += 1;
        let row_id = state.last_row_id;
        state.rows.push(TicketRow {
            row_id,
            ..row.clone()
        });
        Ok(row_id)
    }

    fn update_text(
        &self,
        submitter: SubmitterId,
        field: TextField,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut state = self.lock()?;
        if std::mem::take(&mut state.fail_next_update) {
            return Err(GmTicketError::Storage("injected update failure".to_string()));
        }
        for row in state.rows.iter_mut().filter(|r| r.submitter == submitter) {
            match field {
                TextField::Request => row.request_text = text.to_string(),
                TextField::Response => row.response_text = text.to_string(),
            }
            row.last_change = at;
        }
        Ok(())
    }

    fn delete_by_submitter(&self, submitter: SubmitterId) -> Result<usize> {
        let mut state = self.lock()?;
        match state.rows.iter().position(|r| r.submitter == submitter) {
            Some(index) => {
                state.rows.remove(index);
                Ok(1)
            },
            None => Ok(0),
        }
    }

    fn delete_by_row_id(&self, row_id: u64) -> Result<usize> {
        let mut state = self.lock()?;
        let before = state.rows.len();
        state.rows.retain(|r| r.row_id != row_id);
        Ok(before - state.rows.len())
    }

    fn delete_all(&self) -> Result<usize> {
        let mut state = self.lock()?;
        let removed = state.rows.len();
        state.rows.clear();
        Ok(removed)
    }

    fn begin_transaction(&self) -> Result<()> {
        let mut state = self.lock()?;
        if state.snapshot.is_some() {
            return Err(GmTicketError::Storage(
                "transaction already in progress".to_string(),
            ));
        }
        state.snapshot = Some((state.rows.clone(), state.last_row_id));
        Ok(())
    }

    fn commit_transaction(&self) -> Result<()> {
        let mut state = self.lock()?;
        if state.snapshot.is_some() && std::mem::take(&mut state.fail_next_commit) {
            return Err(GmTicketError::Storage("injected commit failure".to_string()));
        }
        state
            .snapshot
            .take()
            .map(|_| ())
            .ok_or_else(|| GmTicketError::Storage("no transaction to commit".to_string()))
    }

    fn rollback_transaction(&self) -> Result<()> {
        let mut state = self.lock()?;
        let (rows, last_row_id) = state
            .snapshot
            .take()
            .ok_or_else(|| GmTicketError::Storage("no transaction to roll back".to_string()))?;
        state.rows = rows;
        state.last_row_id = last_row_id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::row;

    #[test]
    fn test_row_ids_increase() {
        let store = MemoryStore::new();
        let first = store.insert(&row(1, "a")).unwrap();
        let second = store.insert(&row(2, "b")).unwrap();

        assert!(second > first);
        let loaded = store.load_rows().unwrap();
        assert_eq!(loaded[0].row_id, first);
        assert_eq!(loaded[1].row_id, second);
    }

    #[test]
    fn test_delete_by_submitter_removes_one_row() {
        let store = MemoryStore::new();
        store.insert(&row(4, "dup one")).unwrap();
        store.insert(&row(4, "dup two")).unwrap();

        assert_eq!(store.delete_by_submitter(SubmitterId::new(4)).unwrap(), 1);
        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].request_text, "dup two");
    }

    #[test]
    fn test_injected_failure_fires_once() {
        let store = MemoryStore::new();
        store.fail_next_insert();

        assert!(store.insert(&row(1, "a")).is_err());
        assert!(store.insert(&row(1, "a")).is_ok());
    }

    #[test]
    fn test_failed_commit_keeps_transaction_open() {
        let store = MemoryStore::new();
        store.begin_transaction().unwrap();
        store.insert(&row(1, "pending")).unwrap();

        store.fail_next_commit();
        assert!(store.commit_transaction().is_err());
        assert!(store.in_transaction());

        store.rollback_transaction().unwrap();
        assert!(store.rows().is_empty());
    }

    #[test]
    fn test_nested_begin_is_rejected() {
        let store = MemoryStore::new();
        store.begin_transaction().unwrap();

        assert!(store.begin_transaction().is_err());
        store.rollback_transaction().unwrap();
        assert!(store.commit_transaction().is_err());
    }
}
