use super::{SubmitterId, Ticket};
use chrono::{DateTime, Utc};

/// Builder for creating Ticket instances
#[derive(Default)]
pub struct TicketBuilder {
    submitter: Option<SubmitterId>,
    request_text: Option<String>,
    response_text: Option<String>,
    last_update: Option<DateTime<Utc>>,
}

impl TicketBuilder {
    /// Create a new ticket builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the submitter
    #[must_use]
    pub const fn submitter(mut self, submitter: SubmitterId) -> Self {
        self.submitter = Some(submitter);
        self
    }

    /// Set the request text
    #[must_use]
    pub fn request_text(mut self, text: impl Into<String>) -> Self {
        self.request_text = Some(text.into());
        self
    }

    /// Set the staff response
    #[must_use]
    pub fn response_text(mut self, text: impl Into<String>) -> Self {
        self.response_text = Some(text.into());
        self
    }

    /// Set `last_update` timestamp
    #[must_use]
    pub const fn last_update(mut self, last_update: DateTime<Utc>) -> Self {
        self.last_update = Some(last_update);
        self
    }

    /// Build the ticket
    ///
    /// A missing submitter yields the zero id, which the registry refuses.
    pub fn build(self) -> Ticket {
        Ticket::init(
            self.submitter.unwrap_or(SubmitterId::new(0)),
            self.request_text.unwrap_or_default(),
            self.response_text.unwrap_or_default(),
            self.last_update.unwrap_or_else(Utc::now),
        )
    }
}
