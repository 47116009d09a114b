pub mod serial;
pub mod traits;

#[cfg(test)]
pub mod scripted;

pub use serial::{SerialConfig, SerialTransport};
pub use traits::ModemTransport;
