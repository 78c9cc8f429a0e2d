//! Core domain types: tickets, submitter identities and survey payloads

mod builders;
mod survey;
mod ticket;

pub use builders::TicketBuilder;
pub use survey::{
    DiscardSurveys, MAX_SURVEY_ANSWERS, SurveyAnswer, SurveyResponse, SurveySink,
};
pub use ticket::{CloseKind, CloseOutcome, SubmitterId, Ticket, TicketStatusCode};
