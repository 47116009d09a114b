//! Authorization Module
//!
//! Decides which senders may trigger admin actions. Default is deny.

mod gate;

pub use gate::AuthorizationGate;
