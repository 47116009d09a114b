//! Sender allow-list

use std::collections::HashSet;

/// Fixed allow-list of sender identifiers.
///
/// Membership is an exact string match: `221777350027` and
/// `+221777350027` are different senders.
#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    senders: HashSet<String>,
}

impl AuthorizationGate {
    pub fn new<I, S>(senders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            senders: senders.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_authorized(&self, sender: &str) -> bool {
        self.senders.contains(sender)
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }
}
