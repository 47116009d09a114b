//! Modem Command Channel
//!
//! Synchronous AT command exchange with the GSM modem: one command in
//! flight at a time, response collected after a fixed wait.

mod channel;

pub use channel::{ChannelTimings, CommandChannel, Notifier};
