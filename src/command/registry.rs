//! Keyword to admin action table

use crate::config::CommandsConfig;

/// Keyword answering with the list of known commands
pub const HELP_KEYWORD: &str = "help";

/// Reply to any keyword that is not in the table
pub const UNKNOWN_COMMAND_REPLY: &str =
    "Commande inconnue. Envoyez 'help' pour la liste des commandes.";

const HELP_PREFIX: &str = "Liste des commandes: ";

/// Host lifecycle operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Reboot,
    Shutdown,
}

impl Lifecycle {
    pub fn keyword(&self) -> &'static str {
        match self {
            Lifecycle::Reboot => "reboot",
            Lifecycle::Shutdown => "shutdown",
        }
    }

    /// Acknowledgement sent before the host goes down
    pub fn acknowledgement(&self) -> &'static str {
        match self {
            Lifecycle::Reboot => "Redémarrage du système en cours...",
            Lifecycle::Shutdown => "Arrêt du système en cours...",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    /// Status query: run the command, reply with its output
    Query { command: String },
    /// Acknowledge, then run a command that may take the host down
    Lifecycle { op: Lifecycle, command: String },
    /// Static list of keywords
    Help,
}

/// An entry of the command table. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAction {
    pub keyword: String,
    pub kind: ActionKind,
    /// Prefix of a status reply; `None` for help and lifecycle actions
    pub reply_template: Option<String>,
}

/// Outcome of a keyword lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Known(&'a AdminAction),
    Unknown { keyword: String },
}

pub struct CommandRegistry {
    actions: Vec<AdminAction>,
    help_text: String,
}

impl CommandRegistry {
    pub fn new(config: &CommandsConfig) -> Self {
        let mut actions: Vec<AdminAction> = config
            .queries
            .iter()
            .map(|q| {
                let keyword = normalize_keyword(&q.keyword);
                AdminAction {
                    reply_template: Some(format!("Résultat de {}:\n", keyword)),
                    kind: ActionKind::Query {
                        command: q.command.clone(),
                    },
                    keyword,
                }
            })
            .collect();

        for (op, command) in [
            (Lifecycle::Reboot, &config.reboot),
            (Lifecycle::Shutdown, &config.shutdown),
        ] {
            actions.push(AdminAction {
                keyword: op.keyword().to_string(),
                kind: ActionKind::Lifecycle {
                    op,
                    command: command.clone(),
                },
                reply_template: None,
            });
        }

        let keywords: Vec<&str> = actions.iter().map(|a| a.keyword.as_str()).collect();
        let help_text = format!("{}{}", HELP_PREFIX, keywords.join(", "));

        actions.push(AdminAction {
            keyword: HELP_KEYWORD.to_string(),
            kind: ActionKind::Help,
            reply_template: None,
        });

        Self { actions, help_text }
    }

    /// Look up a decoded message body
    pub fn resolve(&self, text: &str) -> Resolution<'_> {
        let keyword = normalize_keyword(text);
        match self.actions.iter().find(|a| a.keyword == keyword) {
            Some(action) => Resolution::Known(action),
            None => Resolution::Unknown { keyword },
        }
    }

    pub fn help_text(&self) -> &str {
        &self.help_text
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|a| a.keyword.as_str())
    }
}

pub fn normalize_keyword(text: &str) -> String {
    text.trim().to_lowercase()
}
