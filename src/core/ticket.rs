use crate::error::{GmTicketError, Result};
use crate::session::PlayerDirectory;
use crate::storage::{TextField, TicketRow, TicketStore, in_transaction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of the player who opened a ticket
///
/// Wraps the low counter of the player GUID. Zero never names a player and
/// is treated as a malformed key wherever it shows up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmitterId(u32);

impl SubmitterId {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns `false` for the zero id
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for SubmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SubmitterId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl FromStr for SubmitterId {
    type Err = GmTicketError;

    fn from_str(s: &str) -> Result<Self> {
        let raw: u32 = s
            .trim()
            .parse()
            .map_err(|_| GmTicketError::InvalidInput(format!("Invalid submitter id: {s}")))?;
        let id = Self(raw);
        if id.is_valid() {
            Ok(id)
        } else {
            Err(GmTicketError::InvalidSubmitter)
        }
    }
}

/// Status code carried by the ticket-status-update message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum TicketStatusCode {
    Closed = 2,
    Survey = 3,
}

impl TicketStatusCode {
    #[must_use]
    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// How a ticket leaves the open state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseKind {
    Closed,
    ClosedWithSurvey,
}

impl CloseKind {
    #[must_use]
    pub const fn status_code(self) -> TicketStatusCode {
        match self {
            Self::Closed => TicketStatusCode::Closed,
            Self::ClosedWithSurvey => TicketStatusCode::Survey,
        }
    }
}

/// Result of closing a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CloseOutcome {
    pub submitter: SubmitterId,
    pub kind: CloseKind,
    /// Whether the submitter was online and received the status update
    pub notified: bool,
}

/// One player's open support request
///
/// Text setters write through to the store immediately; there is no dirty
/// tracking and no deferred flush.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    submitter: SubmitterId,
    request_text: String,
    response_text: String,
    last_update: DateTime<Utc>,
}

impl Ticket {
    /// Creates a fresh submission stamped with the current time
    pub fn new(submitter: SubmitterId, request_text: impl Into<String>) -> Self {
        Self::init(submitter, request_text, String::new(), Utc::now())
    }

    /// Builds a ticket from already-known values without touching storage
    pub fn init(
        submitter: SubmitterId,
        request_text: impl Into<String>,
        response_text: impl Into<String>,
        last_update: DateTime<Utc>,
    ) -> Self {
        Self {
            submitter,
            request_text: request_text.into(),
            response_text: response_text.into(),
            last_update,
        }
    }

    pub fn from_row(row: &TicketRow) -> Self {
        Self::init(
            row.submitter,
            row.request_text.clone(),
            row.response_text.clone(),
            row.last_change,
        )
    }

    #[must_use]
    pub const fn submitter(&self) -> SubmitterId {
        self.submitter
    }

    #[must_use]
    pub fn request_text(&self) -> &str {
        &self.request_text
    }

    #[must_use]
    pub fn response_text(&self) -> &str {
        &self.response_text
    }

    #[must_use]
    pub const fn last_update(&self) -> DateTime<Utc> {
        self.last_update
    }

    /// Replaces the request text and persists it as a single-field update
    ///
    /// `None` clears the text. The ticket is left unchanged if the store
    /// rejects the update.
    pub fn set_request_text(&mut self, store: &dyn TicketStore, text: Option<&str>) -> Result<()> {
        tracing::debug!(submitter = %self.submitter, "Updating ticket request text");
        self.request_text = self.write_text(store, TextField::Request, text)?;
        Ok(())
    }

    /// Replaces the staff response and persists it as a single-field update
    pub fn set_response_text(&mut self, store: &dyn TicketStore, text: Option<&str>) -> Result<()> {
        tracing::debug!(submitter = %self.submitter, "Updating ticket response text");
        self.response_text = self.write_text(store, TextField::Response, text)?;
        Ok(())
    }

    /// Stores `text` first and only then moves the timestamp
    fn write_text(
        &mut self,
        store: &dyn TicketStore,
        field: TextField,
        text: Option<&str>,
    ) -> Result<String> {
        let text = text.unwrap_or_default().to_string();
        let at = Utc::now();
        store.update_text(self.submitter, field, &text, at)?;
        self.last_update = at;
        Ok(text)
    }

    /// Writes the full ticket, replacing any row already stored for this submitter
    ///
    /// The delete and the insert run in one transaction, so readers never see
    /// zero or two rows for the submitter.
    pub fn persist(&self, store: &dyn TicketStore) -> Result<()> {
        in_transaction(store, |store| {
            store.delete_by_submitter(self.submitter)?;
            store.insert(&self.to_row())?;
            Ok(())
        })
    }

    /// Removes at most one stored row for this submitter
    pub fn delete_from_store(&self, store: &dyn TicketStore) -> Result<()> {
        store.delete_by_submitter(self.submitter)?;
        Ok(())
    }

    /// Ordinary close: status code 2
    pub fn close(
        &self,
        store: &dyn TicketStore,
        players: &dyn PlayerDirectory,
    ) -> Result<CloseOutcome> {
        self.close_as(store, players, CloseKind::Closed)
    }

    /// Close and ask the client to show the survey: status code 3
    pub fn close_with_survey(
        &self,
        store: &dyn TicketStore,
        players: &dyn PlayerDirectory,
    ) -> Result<CloseOutcome> {
        self.close_as(store, players, CloseKind::ClosedWithSurvey)
    }

    /// Deletes the stored row, then notifies the submitter if they are online
    pub fn close_as(
        &self,
        store: &dyn TicketStore,
        players: &dyn PlayerDirectory,
        kind: CloseKind,
    ) -> Result<CloseOutcome> {
        self.delete_from_store(store)?;

        let notified = match players.find_session(self.submitter) {
            Some(session) => match session.send_ticket_status_update(kind.status_code()) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(submitter = %self.submitter, error = %e, "Failed to send ticket status update");
                    false
                },
            },
            None => false,
        };

        Ok(CloseOutcome {
            submitter: self.submitter,
            kind,
            notified,
        })
    }

    /// Row image used for full saves; the row id is assigned by the store
    pub(crate) fn to_row(&self) -> TicketRow {
        TicketRow {
            row_id: 0,
            submitter: self.submitter,
            request_text: self.request_text.clone(),
            response_text: self.response_text.clone(),
            last_change: self.last_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{MockPlayerDirectory, MockPlayerSession, PlayerSession};
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn online(expected: TicketStatusCode) -> MockPlayerDirectory {
        let mut session = MockPlayerSession::new();
        session
            .expect_send_ticket_status_update()
            .withf(move |code| *code == expected)
            .times(1)
            .returning(|_| Ok(()));
        let session: Arc<dyn PlayerSession> = Arc::new(session);

        let mut directory = MockPlayerDirectory::new();
        directory
            .expect_find_session()
            .returning(move |_| Some(Arc::clone(&session)));
        directory
    }

    fn offline() -> MockPlayerDirectory {
        let mut directory = MockPlayerDirectory::new();
        directory.expect_find_session().returning(|_| None);
        directory
    }

    #[test]
    fn test_submitter_id_parsing() {
        assert_eq!("42".parse::<SubmitterId>().unwrap(), SubmitterId::new(42));
        assert!(matches!(
            "0".parse::<SubmitterId>(),
            Err(GmTicketError::InvalidSubmitter)
        ));
        assert!(matches!(
            "abc".parse::<SubmitterId>(),
            Err(GmTicketError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_set_request_text_writes_through() {
        let store = MemoryStore::new();
        let mut ticket = Ticket::new(SubmitterId::new(7), "stuck in wall");
        ticket.persist(&store).unwrap();
        let before = ticket.last_update();

        ticket.set_request_text(&store, Some("stuck in a tree")).unwrap();

        assert_eq!(ticket.request_text(), "stuck in a tree");
        assert!(ticket.last_update() >= before);
        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].request_text, "stuck in a tree");
    }

    #[test]
    fn test_none_text_clears_field() {
        let store = MemoryStore::new();
        let mut ticket = Ticket::new(SubmitterId::new(7), "help");
        ticket.persist(&store).unwrap();

        ticket.set_response_text(&store, Some("on my way")).unwrap();
        ticket.set_response_text(&store, None).unwrap();

        assert_eq!(ticket.response_text(), "");
        assert_eq!(store.rows()[0].response_text, "");
    }

    #[test]
    fn test_rejected_update_leaves_ticket_unchanged() {
        let store = MemoryStore::new();
        let mut ticket = Ticket::new(SubmitterId::new(7), "old");
        ticket.persist(&store).unwrap();
        let before = ticket.clone();

        store.fail_next_update();
        assert!(ticket.set_request_text(&store, Some("new")).is_err());
        store.fail_next_update();
        assert!(ticket.set_response_text(&store, Some("reply")).is_err());

        assert_eq!(ticket, before);
        let rows = store.rows();
        assert_eq!(rows[0].request_text, "old");
        assert_eq!(rows[0].response_text, "");
    }

    #[test]
    fn test_persist_replaces_existing_row() {
        let store = MemoryStore::new();
        let ticket = Ticket::new(SubmitterId::new(3), "first");
        ticket.persist(&store).unwrap();
        ticket.persist(&store).unwrap();

        assert_eq!(store.rows().len(), 1);
    }

    #[test]
    fn test_persist_rolls_back_on_insert_failure() {
        let store = MemoryStore::new();
        let original = Ticket::new(SubmitterId::new(3), "original");
        original.persist(&store).unwrap();

        store.fail_next_insert();
        let edited = Ticket::new(SubmitterId::new(3), "edited");
        assert!(edited.persist(&store).is_err());

        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].request_text, "original");
    }

    #[test]
    fn test_close_notifies_online_player() {
        let store = MemoryStore::new();
        let ticket = Ticket::new(SubmitterId::new(11), "lag");
        ticket.persist(&store).unwrap();

        let outcome = ticket.close(&store, &online(TicketStatusCode::Closed)).unwrap();

        assert!(outcome.notified);
        assert_eq!(outcome.kind, CloseKind::Closed);
        assert!(store.rows().is_empty());
    }

    #[test]
    fn test_close_with_survey_sends_survey_code() {
        let store = MemoryStore::new();
        let ticket = Ticket::new(SubmitterId::new(11), "lag");
        ticket.persist(&store).unwrap();

        let outcome = ticket
            .close_with_survey(&store, &online(TicketStatusCode::Survey))
            .unwrap();

        assert!(outcome.notified);
        assert_eq!(outcome.kind, CloseKind::ClosedWithSurvey);
    }

    #[test]
    fn test_close_offline_player_still_deletes_row() {
        let store = MemoryStore::new();
        let ticket = Ticket::new(SubmitterId::new(12), "lost item");
        ticket.persist(&store).unwrap();

        let outcome = ticket.close(&store, &offline()).unwrap();

        assert!(!outcome.notified);
        assert!(store.rows().is_empty());
    }

    #[test]
    fn test_failed_send_is_not_an_error() {
        let store = MemoryStore::new();
        let ticket = Ticket::new(SubmitterId::new(13), "bug");
        ticket.persist(&store).unwrap();

        let mut session = MockPlayerSession::new();
        session
            .expect_send_ticket_status_update()
            .returning(|_| Err(GmTicketError::Session("socket closed".to_string())));
        let session: Arc<dyn PlayerSession> = Arc::new(session);
        let mut directory = MockPlayerDirectory::new();
        directory
            .expect_find_session()
            .returning(move |_| Some(Arc::clone(&session)));

        let outcome = ticket.close(&store, &directory).unwrap();
        assert!(!outcome.notified);
        assert!(store.rows().is_empty());
    }
}
