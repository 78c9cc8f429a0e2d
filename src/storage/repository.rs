use crate::core::SubmitterId;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One persisted ticket row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketRow {
    /// Store-assigned, monotonically increasing; only used to order rows and
    /// to purge duplicates
    pub row_id: u64,
    pub submitter: SubmitterId,
    pub request_text: String,
    pub response_text: String,
    pub last_change: DateTime<Utc>,
}

/// Text column targeted by a single-field update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Request,
    Response,
}

impl TextField {
    pub(crate) const fn column(self) -> &'static str {
        match self {
            Self::Request => "ticket_text",
            Self::Response => "response_text",
        }
    }
}

/// Repository trait for ticket storage operations
///
/// Text values are always passed to the backend as data, never spliced into
/// statement text.
pub trait TicketStore: Send + Sync {
    /// Loads every row ordered by ascending row id
    fn load_rows(&self) -> Result<Vec<TicketRow>>;

    /// Inserts a row and returns its new row id; `row.row_id` is ignored
    fn insert(&self, row: &TicketRow) -> Result<u64>;

    /// Overwrites one text column on every row of the submitter
    fn update_text(
        &self,
        submitter: SubmitterId,
        field: TextField,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<()>;

    /// Deletes at most one row of the submitter, returning how many went
    fn delete_by_submitter(&self, submitter: SubmitterId) -> Result<usize>;

    /// Deletes the row with this row id
    fn delete_by_row_id(&self, row_id: u64) -> Result<usize>;

    /// Deletes every row in the table
    fn delete_all(&self) -> Result<usize>;

    fn begin_transaction(&self) -> Result<()>;

    fn commit_transaction(&self) -> Result<()>;

    fn rollback_transaction(&self) -> Result<()>;
}

/// Runs `body` between begin and commit, rolling back if it fails
///
/// A failed commit is rolled back too, so the store never stays inside an
/// open transaction after this returns.
pub fn in_transaction<S, T, F>(store: &S, body: F) -> Result<T>
where
    S: TicketStore + ?Sized,
    F: FnOnce(&S) -> Result<T>,
{
    store.begin_transaction()?;
    let result = body(store).and_then(|value| store.commit_transaction().map(|()| value));
    if result.is_err() {
        if let Err(rollback_err) = store.rollback_transaction() {
            tracing::warn!(error = %rollback_err, "Rollback failed");
        }
    }
    result
}
