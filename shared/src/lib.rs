//! SMS Admin Shared Protocol Types
//!
//! This crate provides the pure, transport-free pieces of the GSM modem
//! protocol: AT command builders, the unread-listing parser, the message
//! body decoder and the monitor loop state machine.

pub mod at;
pub mod codec;
pub mod listing;
pub mod state_machine;

pub use codec::{decode_body, sanitize, DecodeAnomaly, Decoded};
pub use listing::{parse_listing, ListingError, MessageStatus, ModemMessage, LISTING_MARKER};

/// Timing and size parameters of the modem protocol
pub mod timing {
    /// Wait after an ordinary AT command before draining the response
    pub const COMMAND_WAIT_MS: u64 = 1000;

    /// Wait after the unread-listing query (listing generation is slower)
    pub const LISTING_WAIT_MS: u64 = 3000;

    /// Pause between two polling cycles
    pub const POLL_INTERVAL_MS: u64 = 1000;

    /// Pause after a failed polling cycle
    pub const ERROR_BACKOFF_MS: u64 = 10000;

    /// Pause between the reboot/shutdown acknowledgement and the command
    pub const LIFECYCLE_ACK_DELAY_MS: u64 = 1000;

    /// Maximum number of characters of command output put into a reply
    pub const MAX_OUTPUT_CHARS: usize = 150;
}
