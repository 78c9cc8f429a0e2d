use crate::core::{SurveyResponse, Ticket};
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;

/// Renders command results as colored text or JSON
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    json: bool,
}

impl OutputFormatter {
    pub fn new(json: bool, no_color: bool) -> Self {
        if no_color || json {
            colored::control::set_override(false);
        }
        Self { json }
    }

    #[must_use]
    pub const fn is_json(&self) -> bool {
        self.json
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{message}");
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", "Warning:".yellow().bold(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }

    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// One line per ticket: submitter, last update and the first line of the request
    pub fn print_ticket_list<'a>(&self, tickets: impl IntoIterator<Item = &'a Ticket>) {
        for ticket in tickets {
            let summary = ticket.request_text().lines().next().unwrap_or_default();
            let answered = if ticket.response_text().is_empty() {
                "open".yellow()
            } else {
                "answered".green()
            };
            println!(
                "{:>10}  {}  {:<8}  {}",
                ticket.submitter().to_string().cyan(),
                ticket.last_update().format("%Y-%m-%d %H:%M"),
                answered,
                summary
            );
        }
    }

    pub fn print_ticket(&self, ticket: &Ticket) {
        println!("{} {}", "Submitter:".bold(), ticket.submitter());
        println!(
            "{} {}",
            "Updated:".bold(),
            ticket.last_update().format("%Y-%m-%d %H:%M:%S UTC")
        );
        println!("{}", "Request:".bold());
        println!("{}", ticket.request_text());
        println!("{}", "Response:".bold());
        if ticket.response_text().is_empty() {
            println!("{}", "(none)".dimmed());
        } else {
            println!("{}", ticket.response_text());
        }
    }

    pub fn print_survey(&self, survey: &SurveyResponse) {
        println!("{} {}", "Survey code:".bold(), survey.survey_code);
        for answer in &survey.answers {
            println!(
                "  question {:>4}: {}{}",
                answer.question_id,
                answer.value,
                if answer.text.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", answer.text)
                }
            );
        }
        println!("{} {}", "Comment:".bold(), survey.comment);
    }
}
