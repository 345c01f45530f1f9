use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No response came back from the server.
    #[error("{message}")]
    Connection {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("failed to decode response body: {0}")]
    InvalidResponse(#[source] reqwest::Error),
}

impl ClientError {
    /// Status code of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Validation(_) => Some(422),
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Connection { .. } | ClientError::InvalidResponse(_) => None,
        }
    }
}

/// A field's messages as sent by the server: one string or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FieldMessages {
    One(String),
    Many(Vec<String>),
}

impl FieldMessages {
    fn iter(&self) -> impl Iterator<Item = &str> {
        let slice: &[String] = match self {
            FieldMessages::One(msg) => std::slice::from_ref(msg),
            FieldMessages::Many(msgs) => msgs,
        };
        slice.iter().map(String::as_str)
    }
}

/// A 422 rejection with its per-field messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    pub errors: IndexMap<String, FieldMessages>,
    pub help: Option<String>,
}

impl ValidationError {
    /// Every field message, flattened in the order the server sent them.
    pub fn messages(&self) -> Vec<&str> {
        self.errors.values().flat_map(FieldMessages::iter).collect()
    }

    pub fn messages_joined(&self) -> String {
        self.messages().join("\n")
    }

    /// Summary, field messages and help text separated by blank lines.
    pub fn full_message(&self) -> String {
        let mut out = format!("{}\n\n{}", self.message, self.messages_joined());
        if let Some(help) = self.help.as_deref().filter(|h| !h.is_empty()) {
            out.push_str("\n\n");
            out.push_str(help);
        }
        out
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}
