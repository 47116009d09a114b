//! AT command set used to drive the modem in text mode
//!
//! Every command is sent terminated by CR LF. An outgoing SMS is a two-step
//! exchange:
//! ```text
//! AT+CMGS="+221777350027"   ->  >
//! <body><Ctrl-Z>            ->  +CMGS: 12 ... OK
//! ```

/// Line terminator appended to every command
pub const TERMINATOR: &str = "\r\n";

/// Control byte ending the body of an outgoing message
pub const CTRL_Z: char = '\u{1a}';

/// Control byte abandoning a message body the modem is waiting for
pub const ESC: char = '\u{1b}';

/// Liveness probe
pub const PROBE: &str = "AT";

/// Switch message format to text mode
pub const TEXT_MODE: &str = "AT+CMGF=1";

/// Use the GSM default alphabet for outgoing text
pub const GSM_CHARSET: &str = "AT+CSCS=\"GSM\"";

/// Store incoming messages and emit an indication only
pub const NOTIFICATION_CONFIG: &str = "AT+CNMI=2,1,0,0,0";

/// Network registration query
pub const REGISTRATION_QUERY: &str = "AT+CREG?";

/// List stored messages that have not been read yet
pub const LIST_UNREAD: &str = "AT+CMGL=\"REC UNREAD\"";

/// Select the recipient of an outgoing message
pub fn send_to(number: &str) -> String {
    format!("AT+CMGS=\"{}\"", number)
}

/// Message body followed by the end-of-message control byte
pub fn message_body(text: &str) -> String {
    format!("{}{}", text, CTRL_Z)
}

/// Delete the message stored in slot `index`
pub fn delete(index: u32) -> String {
    format!("AT+CMGD={}", index)
}

/// Normalize a recipient number for `AT+CMGS`: no quotes, leading `+`
pub fn normalize_recipient(number: &str) -> String {
    let cleaned: String = number.chars().filter(|c| *c != '"').collect();
    let cleaned = cleaned.trim();
    if cleaned.starts_with('+') {
        cleaned.to_string()
    } else {
        format!("+{}", cleaned)
    }
}

/// True when the response carries the `OK` final result code
pub fn is_ok(response: &str) -> bool {
    response.lines().any(|line| line.trim() == "OK")
}

/// True when the response carries an `ERROR` or `+CMS ERROR` result
pub fn is_error(response: &str) -> bool {
    response.lines().any(|line| {
        let line = line.trim();
        line == "ERROR" || line.starts_with("+CMS ERROR") || line.starts_with("+CME ERROR")
    })
}

/// True when the modem is waiting for a message body
pub fn has_prompt(response: &str) -> bool {
    response.contains('>')
}

/// Network registration state reported by `+CREG`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    NotRegistered,
    Home,
    Searching,
    Denied,
    Roaming,
    Unknown,
}

impl Registration {
    /// Parse the `+CREG: <n>,<stat>` line of a registration query response
    pub fn parse(response: &str) -> Option<Self> {
        let line = response.lines().find(|l| l.trim_start().starts_with("+CREG:"))?;
        let fields = line.trim_start().trim_start_matches("+CREG:");
        let stat = fields.split(',').nth(1)?.trim();
        let state = match stat.parse::<u8>().ok()? {
            0 => Registration::NotRegistered,
            1 => Registration::Home,
            2 => Registration::Searching,
            3 => Registration::Denied,
            5 => Registration::Roaming,
            _ => Registration::Unknown,
        };
        Some(state)
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Registration::Home | Registration::Roaming)
    }
}
