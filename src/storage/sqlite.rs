use super::{TextField, TicketRow, TicketStore};
use crate::core::SubmitterId;
use crate::error::{GmTicketError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS character_ticket (
    ticket_id         INTEGER PRIMARY KEY AUTOINCREMENT,
    guid              INTEGER NOT NULL DEFAULT 0,
    ticket_text       TEXT    NOT NULL DEFAULT '',
    response_text     TEXT    NOT NULL DEFAULT '',
    ticket_lastchange INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);
CREATE INDEX IF NOT EXISTS idx_character_ticket_guid ON character_ticket (guid);
";

struct Shared {
    conn: Connection,
    /// Thread that opened the current transaction, if any
    writer: Option<ThreadId>,
}

/// SQLite-backed `character_ticket` table
///
/// rusqlite is synchronous; the connection sits behind a mutex so the store
/// can be shared. While one thread holds a transaction open, statements from
/// every other thread wait until it commits or rolls back.
pub struct SqliteStore {
    shared: Mutex<Shared>,
    writer_done: Condvar,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("conn", &"Mutex<Connection>")
            .finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Opens (or creates) the database file and ensures the schema exists
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::debug!("Opened ticket database at {}", path.display());
        Self::bootstrap(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::bootstrap(Connection::open_in_memory()?)
    }

    fn bootstrap(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            shared: Mutex::new(Shared { conn, writer: None }),
            writer_done: Condvar::new(),
        })
    }

    /// Locks the connection once no other thread has a transaction open
    fn conn(&self) -> Result<MutexGuard<'_, Shared>> {
        let me = thread::current().id();
        let guard = self.shared.lock().map_err(|_| poisoned())?;
        self.writer_done
            .wait_while(guard, |shared| shared.writer.is_some_and(|id| id != me))
            .map_err(|_| poisoned())
    }

    /// Runs COMMIT or ROLLBACK and hands the connection back to other threads
    /// once SQLite reports the transaction is over
    fn finish(&self, statement: &str) -> Result<()> {
        let mut shared = self.conn()?;
        let result = shared.conn.execute_batch(statement);
        if shared.conn.is_autocommit() {
            shared.writer = None;
            self.writer_done.notify_all();
        }
        Ok(result?)
    }
}

fn poisoned() -> GmTicketError {
    GmTicketError::Storage("ticket database lock poisoned".to_string())
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

impl TicketStore for SqliteStore {
    fn load_rows(&self) -> Result<Vec<TicketRow>> {
        let shared = self.conn()?;
        let mut stmt = shared.conn.prepare(
            "SELECT ticket_id, guid, ticket_text, response_text, ticket_lastchange
             FROM character_ticket
             ORDER BY ticket_id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(TicketRow {
                row_id: u64::try_from(row.get::<_, i64>(0)?).unwrap_or_default(),
                submitter: SubmitterId::new(row.get(1)?),
                request_text: row.get(2)?,
                response_text: row.get(3)?,
                last_change: timestamp(row.get(4)?),
            })
        })?;
        let rows = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn insert(&self, row: &TicketRow) -> Result<u64> {
        let shared = self.conn()?;
        shared.conn.execute(
            "INSERT INTO character_ticket (guid, ticket_text, response_text, ticket_lastchange)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                row.submitter.get(),
                row.request_text,
                row.response_text,
                row.last_change.timestamp()
            ],
        )?;
        u64::try_from(shared.conn.last_insert_rowid())
            .map_err(|_| GmTicketError::Storage("negative ticket_id assigned".to_string()))
    }

    fn update_text(
        &self,
        submitter: SubmitterId,
        field: TextField,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let sql = format!(
            "UPDATE character_ticket SET {} = ?1, ticket_lastchange = ?2 WHERE guid = ?3",
            field.column()
        );
        self.conn()?
            .conn
            .execute(&sql, params![text, at.timestamp(), submitter.get()])?;
        Ok(())
    }

    fn delete_by_submitter(&self, submitter: SubmitterId) -> Result<usize> {
        // SQLite is not built with DELETE ... LIMIT, so bound it through the key
        Ok(self.conn()?.conn.execute(
            "DELETE FROM character_ticket WHERE ticket_id =
                (SELECT ticket_id FROM character_ticket WHERE guid = ?1 ORDER BY ticket_id LIMIT 1)",
            params![submitter.get()],
        )?)
    }

    fn delete_by_row_id(&self, row_id: u64) -> Result<usize> {
        let row_id = i64::try_from(row_id)
            .map_err(|_| GmTicketError::InvalidInput(format!("ticket_id out of range: {row_id}")))?;
        Ok(self.conn()?.conn.execute(
            "DELETE FROM character_ticket WHERE ticket_id = ?1",
            params![row_id],
        )?)
    }

    fn delete_all(&self) -> Result<usize> {
        Ok(self.conn()?.conn.execute("DELETE FROM character_ticket", [])?)
    }

    fn begin_transaction(&self) -> Result<()> {
        let mut shared = self.conn()?;
        shared.conn.execute_batch("BEGIN IMMEDIATE")?;
        shared.writer = Some(thread::current().id());
        Ok(())
    }

    fn commit_transaction(&self) -> Result<()> {
        self.finish("COMMIT")
    }

    fn rollback_transaction(&self) -> Result<()> {
        self.finish("ROLLBACK")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Ticket;
    use crate::storage::in_transaction;
    use crate::test_utils::row;
    use std::sync::{Arc, mpsc};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_insert_and_load_in_row_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&row(9, "second submitter first")).unwrap();
        store.insert(&row(3, "then this one")).unwrap();

        let rows = store.load_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].submitter, SubmitterId::new(9));
        assert_eq!(rows[1].submitter, SubmitterId::new(3));
        assert!(rows[0].row_id < rows[1].row_id);
    }

    #[test]
    fn test_text_is_bound_not_spliced() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&row(1, "x")).unwrap();

        let hostile = "'); DELETE FROM character_ticket; --";
        store
            .update_text(SubmitterId::new(1), TextField::Response, hostile, Utc::now())
            .unwrap();

        let rows = store.load_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].response_text, hostile);
    }

    #[test]
    fn test_delete_by_submitter_is_bounded() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&row(2, "a")).unwrap();
        store.insert(&row(2, "b")).unwrap();

        assert_eq!(store.delete_by_submitter(SubmitterId::new(2)).unwrap(), 1);
        assert_eq!(store.load_rows().unwrap().len(), 1);
    }

    #[test]
    fn test_timestamps_round_trip_as_epoch_seconds() {
        let store = SqliteStore::open_in_memory().unwrap();
        let at = timestamp(1_700_000_000);
        let ticket = Ticket::init(SubmitterId::new(8), "q", "", at);
        ticket.persist(&store).unwrap();

        assert_eq!(store.load_rows().unwrap()[0].last_change, at);
    }

    #[test]
    fn test_rollback_restores_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(&row(5, "keep me")).unwrap();

        let result: Result<()> = in_transaction(&store, |s| {
            s.delete_by_submitter(SubmitterId::new(5))?;
            Err(GmTicketError::Storage("simulated crash".to_string()))
        });

        assert!(result.is_err());
        let rows = store.load_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].request_text, "keep me");
    }

    #[test]
    fn test_file_database_persists_across_opens() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data").join("tickets.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert(&row(6, "persisted")).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let rows = store.load_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].request_text, "persisted");
    }

    #[test]
    fn test_other_threads_wait_for_open_transaction() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store.begin_transaction().unwrap();
        store.insert(&row(1, "discarded")).unwrap();

        let (done_tx, done_rx) = mpsc::channel();
        let other = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                store.insert(&row(2, "outside")).unwrap();
                done_tx.send(()).unwrap();
            })
        };

        // The second insert must not run inside this thread's transaction
        assert!(done_rx.recv_timeout(Duration::from_millis(200)).is_err());
        store.rollback_transaction().unwrap();
        done_rx.recv().unwrap();
        other.join().unwrap();

        let rows = store.load_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].request_text, "outside");
    }
}
