//! Parser for the unread-message listing
//!
//! `AT+CMGL="REC UNREAD"` answers with one record per stored message:
//! ```text
//! +CMGL: <index>,<status>,<sender>,<alpha>,<timestamp>
//! <body>
//! ```
//! Records are delimited by the `+CMGL:` marker; everything before the
//! first marker (command echo, blank lines) is discarded.

use thiserror::Error;

/// Delimiter the modem prepends to each record of a listing
pub const LISTING_MARKER: &str = "+CMGL:";

/// Storage status reported in the record header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageStatus {
    Unread,
    Read,
    Other(String),
}

impl MessageStatus {
    pub fn parse(field: &str) -> Self {
        match field.trim().trim_matches('"') {
            "REC UNREAD" => MessageStatus::Unread,
            "REC READ" => MessageStatus::Read,
            other => MessageStatus::Other(other.to_string()),
        }
    }
}

/// One message as reported by the modem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModemMessage {
    /// Storage slot, used to delete the message afterwards
    pub index: u32,
    pub status: MessageStatus,
    /// Sender as printed by the modem, quotes removed
    pub sender: String,
    /// First body line, untouched apart from trimming
    pub raw_body: String,
    pub timestamp: Option<String>,
}

/// A listing record that could not be turned into a message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    #[error("record header has no message index")]
    MissingIndex,

    #[error("record {index} has no sender")]
    MissingSender { index: u32 },

    #[error("record {index} has no body line")]
    MissingBody { index: u32 },
}

impl ListingError {
    /// Storage slot of the malformed record, when it could be read
    pub fn index(&self) -> Option<u32> {
        match self {
            ListingError::MissingIndex => None,
            ListingError::MissingSender { index } | ListingError::MissingBody { index } => {
                Some(*index)
            }
        }
    }
}

/// True when the response contains at least one listing record
pub fn has_records(response: &str) -> bool {
    response.contains(LISTING_MARKER)
}

/// Split a listing response into records, in the order the modem reported them
pub fn parse_listing(response: &str) -> Vec<Result<ModemMessage, ListingError>> {
    response
        .split(LISTING_MARKER)
        .skip(1)
        .map(parse_record)
        .collect()
}

fn parse_record(record: &str) -> Result<ModemMessage, ListingError> {
    let mut lines = record.split('\n');
    let header = lines.next().unwrap_or_default().trim();
    let fields: Vec<&str> = header.split(',').collect();

    let index = fields
        .first()
        .and_then(|f| f.trim().parse::<u32>().ok())
        .ok_or(ListingError::MissingIndex)?;

    let sender = fields
        .get(2)
        .map(|f| f.trim().trim_matches('"').to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ListingError::MissingSender { index })?;

    let raw_body = lines
        .next()
        .map(|line| line.trim().to_string())
        .ok_or(ListingError::MissingBody { index })?;

    let status = fields
        .get(1)
        .map(|f| MessageStatus::parse(f))
        .unwrap_or(MessageStatus::Unread);

    // The timestamp itself contains a comma: "24/10/19,12:00:00+00"
    let timestamp = if fields.len() > 4 {
        let joined = fields[4..].join(",");
        let joined = joined.trim().trim_matches('"');
        (!joined.is_empty()).then(|| joined.to_string())
    } else {
        None
    };

    Ok(ModemMessage {
        index,
        status,
        sender,
        raw_body,
        timestamp,
    })
}
