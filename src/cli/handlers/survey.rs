use crate::cli::OutputFormatter;
use crate::core::SurveyResponse;
use crate::error::{GmTicketError, Result};

/// Decodes a survey payload captured from the wire, for debugging clients
///
/// # Arguments
///
/// * `payload` - Hex bytes; whitespace between groups is ignored
/// * `formatter` - Output formatter for displaying results
///
/// # Errors
///
/// Returns an error if:
/// - The payload is not valid hex
/// - The payload ends before the survey does
pub fn handle_survey_command(payload: &str, formatter: &OutputFormatter) -> Result<()> {
    let compact: String = payload.split_whitespace().collect();
    let bytes = hex::decode(&compact)
        .map_err(|e| GmTicketError::InvalidInput(format!("Payload is not valid hex: {e}")))?;

    let survey = SurveyResponse::parse(&bytes)?;
    if formatter.is_json() {
        return formatter.print_json(&survey);
    }
    formatter.print_survey(&survey);
    Ok(())
}
