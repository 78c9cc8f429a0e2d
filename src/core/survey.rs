//! Post-closure survey payload
//!
//! Layout, little-endian throughout:
//!
//! ```text
//! u32 survey code
//! repeat up to 10 times:
//!     u32 question id   (0 ends the list, nothing else of the record follows)
//!     u8  answer
//!     str answer text
//! str comment
//! ```
//!
//! Strings are NUL-terminated. A string running to the end of the buffer
//! without a terminator is accepted as-is.

use super::SubmitterId;
use crate::error::{GmTicketError, Result};
use bytes::Buf;
use serde::Serialize;

/// The client never sends more answers than this
pub const MAX_SURVEY_ANSWERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyAnswer {
    pub question_id: u32,
    pub value: u8,
    pub text: String,
}

/// Decoded survey payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SurveyResponse {
    /// Leading code of the payload. Its meaning lives in a client-side table,
    /// so it is passed through untouched.
    pub survey_code: u32,
    pub answers: Vec<SurveyAnswer>,
    pub comment: String,
}

impl SurveyResponse {
    /// Decodes a survey payload
    ///
    /// Stops reading records at the first zero question id or after
    /// [`MAX_SURVEY_ANSWERS`] records, whichever comes first.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let mut reader = PayloadReader::new(payload);

        let survey_code = reader.read_u32()?;
        tracing::debug!(survey_code, "SURVEY: code");

        let mut answers = Vec::with_capacity(MAX_SURVEY_ANSWERS);
        for _ in 0..MAX_SURVEY_ANSWERS {
            let question_id = reader.read_u32()?;
            if question_id == 0 {
                break;
            }
            let value = reader.read_u8()?;
            let text = reader.read_string();
            tracing::debug!(question_id, value, text = %text, "SURVEY: answer");
            answers.push(SurveyAnswer {
                question_id,
                value,
                text,
            });
        }

        let comment = reader.read_string();
        tracing::debug!(comment = %comment, "SURVEY: comment");

        Ok(Self {
            survey_code,
            answers,
            comment,
        })
    }
}

/// Destination for parsed surveys
///
/// Nothing stores survey answers yet. Implement this to chart them.
pub trait SurveySink: Send + Sync {
    fn record(&self, submitter: SubmitterId, survey: &SurveyResponse) -> Result<()>;
}

/// Sink that drops every survey after it has been logged
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardSurveys;

impl SurveySink for DiscardSurveys {
    fn record(&self, submitter: SubmitterId, survey: &SurveyResponse) -> Result<()> {
        tracing::debug!(
            submitter = %submitter,
            answers = survey.answers.len(),
            "Discarding survey response"
        );
        Ok(())
    }
}

struct PayloadReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> PayloadReader<'a> {
    const fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(GmTicketError::SurveyTruncated {
                offset: self.offset,
                needed,
            });
        }
        Ok(())
    }

    fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        self.offset += 4;
        Ok(self.buf.get_u32_le())
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        self.offset += 1;
        Ok(self.buf.get_u8())
    }

    fn read_string(&mut self) -> String {
        let (len, consumed) = match self.buf.iter().position(|&b| b == 0) {
            Some(nul) => (nul, nul + 1),
            None => (self.buf.len(), self.buf.len()),
        };
        let text = String::from_utf8_lossy(&self.buf[..len]).into_owned();
        self.buf.advance(consumed);
        self.offset += consumed;
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(buf: &mut Vec<u8>, question_id: u32, value: u8, text: &str) {
        buf.extend_from_slice(&question_id.to_le_bytes());
        buf.push(value);
        buf.extend_from_slice(text.as_bytes());
        buf.push(0);
    }

    #[test]
    fn test_parse_stops_at_sentinel() {
        let mut buf = 6u32.to_le_bytes().to_vec();
        record(&mut buf, 31, 5, "");
        record(&mut buf, 32, 4, "");
        record(&mut buf, 33, 0, "slow");
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(b"ok!\0");

        let survey = SurveyResponse::parse(&buf).unwrap();

        assert_eq!(survey.survey_code, 6);
        assert_eq!(survey.answers.len(), 3);
        assert_eq!(survey.answers[2].question_id, 33);
        assert_eq!(survey.answers[2].text, "slow");
        assert_eq!(survey.comment, "ok!");
    }

    #[test]
    fn test_parse_reads_at_most_ten_records() {
        let mut buf = 6u32.to_le_bytes().to_vec();
        for i in 1..=10u32 {
            record(&mut buf, i, 1, "");
        }
        // Looks like an 11th question id if the parser kept going
        buf.extend_from_slice(b"thanks\0");

        let survey = SurveyResponse::parse(&buf).unwrap();

        assert_eq!(survey.answers.len(), MAX_SURVEY_ANSWERS);
        assert_eq!(survey.answers[9].question_id, 10);
        assert_eq!(survey.comment, "thanks");
    }

    #[test]
    fn test_parse_no_answers() {
        let mut buf = 0u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.push(0);

        let survey = SurveyResponse::parse(&buf).unwrap();
        assert!(survey.answers.is_empty());
        assert_eq!(survey.comment, "");
    }

    #[test]
    fn test_unterminated_comment_takes_rest() {
        let mut buf = 1u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(b"no nul");

        let survey = SurveyResponse::parse(&buf).unwrap();
        assert_eq!(survey.comment, "no nul");
    }

    #[test]
    fn test_truncated_payload_is_an_error() {
        let mut buf = 1u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&[7, 0]);

        let err = SurveyResponse::parse(&buf).unwrap_err();
        assert!(matches!(
            err,
            GmTicketError::SurveyTruncated {
                offset: 4,
                needed: 4
            }
        ));
    }
}
