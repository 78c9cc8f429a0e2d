//! In-memory index of every open ticket
//!
//! The registry owns tickets in a map keyed by submitter and keeps a second
//! list of the same keys in creation order for staff views. Every operation
//! that adds or removes a ticket touches both structures before returning.

use crate::core::{
    CloseKind, CloseOutcome, DiscardSurveys, SubmitterId, SurveyResponse, SurveySink, Ticket,
};
use crate::error::{GmTicketError, Result};
use crate::session::{PlayerDirectory, TICKET_FORCE_REMOVED_CODE};
use crate::storage::{TicketRow, TicketStore};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// What `load_all` did with one stored row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadOutcome {
    Inserted,
    /// Row carried the zero submitter id
    SkippedInvalidKey,
    /// Submitter already had a ticket from an earlier row; this row was deleted
    PurgedDuplicate,
}

/// Per-row account of a load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows: Vec<(u64, LoadOutcome)>,
}

impl LoadReport {
    fn count(&self, outcome: LoadOutcome) -> usize {
        self.rows.iter().filter(|(_, o)| *o == outcome).count()
    }

    #[must_use]
    pub fn inserted(&self) -> usize {
        self.count(LoadOutcome::Inserted)
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(LoadOutcome::SkippedInvalidKey)
    }

    #[must_use]
    pub fn purged(&self) -> usize {
        self.count(LoadOutcome::PurgedDuplicate)
    }
}

/// Summary of a bulk delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteAllReport {
    /// Players who were online and got the removal message
    pub notified: usize,
    /// Tickets whose submitter was offline or whose session refused the message
    pub unreachable: usize,
    pub rows_deleted: usize,
}

/// Registry of open GM tickets
///
/// Construct one per process and hand it to whatever needs it.
pub struct TicketRegistry {
    store: Arc<dyn TicketStore>,
    players: Arc<dyn PlayerDirectory>,
    surveys: Arc<dyn SurveySink>,
    by_id: HashMap<SubmitterId, Ticket>,
    by_creation_order: Vec<SubmitterId>,
}

impl std::fmt::Debug for TicketRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketRegistry")
            .field("tickets", &self.by_id.len())
            .field("by_creation_order", &self.by_creation_order)
            .finish_non_exhaustive()
    }
}

impl TicketRegistry {
    /// Creates an empty registry; call [`load_all`](Self::load_all) to fill it
    pub fn new(store: Arc<dyn TicketStore>, players: Arc<dyn PlayerDirectory>) -> Self {
        Self {
            store,
            players,
            surveys: Arc::new(DiscardSurveys),
            by_id: HashMap::new(),
            by_creation_order: Vec::new(),
        }
    }

    /// Replaces the default survey sink, which drops every survey
    #[must_use]
    pub fn with_survey_sink(mut self, sink: Arc<dyn SurveySink>) -> Self {
        self.surveys = sink;
        self
    }

    /// Rebuilds both indexes from storage
    ///
    /// Safe to call again at any time; prior in-memory state is dropped first.
    /// When several rows share a submitter the earliest row wins and the rest
    /// are deleted from storage.
    pub fn load_all(&mut self) -> Result<LoadReport> {
        self.by_id.clear();
        self.by_creation_order.clear();

        let rows = self.store.load_rows()?;
        if rows.is_empty() {
            tracing::info!("Loaded `character_ticket`, table is empty");
            return Ok(LoadReport::default());
        }

        let mut report = LoadReport {
            rows: Vec::with_capacity(rows.len()),
        };
        for row in &rows {
            let outcome = self.load_row(row)?;
            report.rows.push((row.row_id, outcome));
        }

        if report.purged() > 0 {
            tracing::warn!(
                purged = report.purged(),
                "Removed duplicate GM ticket rows"
            );
        }
        tracing::info!("Loaded {} GM tickets", self.ticket_count());
        Ok(report)
    }

    fn load_row(&mut self, row: &TicketRow) -> Result<LoadOutcome> {
        if !row.submitter.is_valid() {
            return Ok(LoadOutcome::SkippedInvalidKey);
        }
        if self.by_id.contains_key(&row.submitter) {
            tracing::warn!(
                submitter = %row.submitter,
                row_id = row.row_id,
                "Duplicate GM ticket row, deleting"
            );
            self.store.delete_by_row_id(row.row_id)?;
            return Ok(LoadOutcome::PurgedDuplicate);
        }
        self.by_id.insert(row.submitter, Ticket::from_row(row));
        self.by_creation_order.push(row.submitter);
        Ok(LoadOutcome::Inserted)
    }

    #[must_use]
    pub fn ticket_count(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn lookup(&self, submitter: SubmitterId) -> Option<&Ticket> {
        self.by_id.get(&submitter)
    }

    /// Tickets in creation order
    pub fn tickets(&self) -> impl Iterator<Item = &Ticket> + '_ {
        self.by_creation_order
            .iter()
            .filter_map(|id| self.by_id.get(id))
    }

    /// Ticket at a position of the creation-order list
    #[must_use]
    pub fn ticket_at(&self, position: usize) -> Option<&Ticket> {
        self.by_creation_order
            .get(position)
            .and_then(|id| self.by_id.get(id))
    }

    /// Opens a ticket for a fresh player submission
    ///
    /// A submitter that already has a ticket gets it replaced, and the new
    /// ticket moves to the end of the creation order.
    pub fn create(&mut self, submitter: SubmitterId, request_text: &str) -> Result<&Ticket> {
        self.insert(Ticket::new(submitter, request_text))
    }

    /// Persists `ticket` with a full save and indexes it
    pub fn insert(&mut self, ticket: Ticket) -> Result<&Ticket> {
        let submitter = ticket.submitter();
        if !submitter.is_valid() {
            return Err(GmTicketError::InvalidSubmitter);
        }

        ticket.persist(self.store.as_ref())?;

        if self.by_id.insert(submitter, ticket).is_some() {
            self.by_creation_order.retain(|id| *id != submitter);
        }
        self.by_creation_order.push(submitter);
        tracing::debug!(submitter = %submitter, "GM ticket created");

        self.by_id
            .get(&submitter)
            .ok_or(GmTicketError::TicketNotFound { submitter })
    }

    /// Replaces a ticket's request text; returns `false` if there is no ticket
    ///
    /// Tickets are only edited through these setters, so an indexed ticket
    /// always keeps the submitter it is filed under.
    pub fn set_request_text(&mut self, submitter: SubmitterId, text: Option<&str>) -> Result<bool> {
        let store = Arc::clone(&self.store);
        match self.by_id.get_mut(&submitter) {
            Some(ticket) => ticket.set_request_text(store.as_ref(), text).map(|()| true),
            None => Ok(false),
        }
    }

    /// Replaces a ticket's staff response; returns `false` if there is no ticket
    pub fn set_response_text(
        &mut self,
        submitter: SubmitterId,
        text: Option<&str>,
    ) -> Result<bool> {
        let store = Arc::clone(&self.store);
        match self.by_id.get_mut(&submitter) {
            Some(ticket) => ticket.set_response_text(store.as_ref(), text).map(|()| true),
            None => Ok(false),
        }
    }

    /// Deletes one ticket from storage and both indexes, without notifying anyone
    pub fn delete(&mut self, submitter: SubmitterId) -> Result<bool> {
        let Some(ticket) = self.by_id.get(&submitter) else {
            return Ok(false);
        };
        ticket.delete_from_store(self.store.as_ref())?;
        self.forget(submitter);
        Ok(true)
    }

    /// Closes a ticket and notifies the submitter if they are online
    ///
    /// The ticket stays indexed if the storage delete fails.
    pub fn close(&mut self, submitter: SubmitterId, kind: CloseKind) -> Result<Option<CloseOutcome>> {
        let Some(ticket) = self.by_id.get(&submitter) else {
            return Ok(None);
        };
        let outcome = ticket.close_as(self.store.as_ref(), self.players.as_ref(), kind)?;
        self.forget(submitter);
        tracing::info!(
            submitter = %submitter,
            kind = ?kind,
            notified = outcome.notified,
            "GM ticket closed"
        );
        Ok(Some(outcome))
    }

    /// Removes every ticket, telling each online submitter it was removed
    ///
    /// Notification is best effort per player; the table is wiped and the
    /// indexes cleared regardless.
    pub fn delete_all(&mut self) -> Result<DeleteAllReport> {
        let mut report = DeleteAllReport::default();

        for submitter in self.by_id.keys() {
            let delivered = self.players.find_session(*submitter).is_some_and(|session| {
                session
                    .send_ticket_removed(TICKET_FORCE_REMOVED_CODE)
                    .map_err(|e| {
                        tracing::warn!(submitter = %submitter, error = %e, "Failed to send ticket removal");
                    })
                    .is_ok()
            });
            if delivered {
                report.notified += 1;
            } else {
                report.unreachable += 1;
            }
        }

        report.rows_deleted = self.store.delete_all()?;
        self.by_creation_order.clear();
        self.by_id.clear();

        tracing::info!(
            notified = report.notified,
            rows = report.rows_deleted,
            "Deleted all GM tickets"
        );
        Ok(report)
    }

    /// Decodes a survey sent after a close-with-survey and hands it to the sink
    pub fn record_survey(&self, submitter: SubmitterId, payload: &[u8]) -> Result<SurveyResponse> {
        let survey = SurveyResponse::parse(payload)?;
        self.surveys.record(submitter, &survey)?;
        Ok(survey)
    }

    /// Checks that both indexes hold exactly the same keys, once each
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.by_creation_order.len() == self.by_id.len()
            && self
                .by_creation_order
                .iter()
                .all(|id| self.by_id.get(id).is_some_and(|t| t.submitter() == *id))
            && self
                .by_id
                .keys()
                .all(|id| self.by_creation_order.iter().filter(|o| *o == id).count() == 1)
    }

    fn forget(&mut self, submitter: SubmitterId) {
        self.by_creation_order.retain(|id| *id != submitter);
        self.by_id.remove(&submitter);
    }
}
