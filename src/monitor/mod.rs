//! Monitor Module
//!
//! Polls the modem for unread messages and runs the admin commands they
//! carry, one cycle at a time.

mod poller;
mod service;

pub use poller::{MessagePoller, PollReport};
pub use service::MonitorLoop;
