use std::fmt;

use reqwest::StatusCode;
use thiserror::Error;

/// Which outbound lookup a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Location,
    Weather,
}

impl Stage {
    fn noun(self) -> &'static str {
        match self {
            Stage::Location => "location",
            Stage::Weather => "weather",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

/// Everything that can end a greeting request early.
///
/// The `Display` output carries the underlying cause and is meant for logs;
/// [`GreetError::public_message`] is the short text returned to callers.
#[derive(Debug, Error)]
pub enum GreetError {
    #[error("failed to build {stage} request: {reason}")]
    Request { stage: Stage, reason: String },

    #[error("failed to send {stage} request: {source}")]
    Fetch {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    #[error("{stage} provider responded with status {status}: {body}")]
    Status {
        stage: Stage,
        status: StatusCode,
        body: String,
    },

    #[error("failed to read {stage} response body: {source}")]
    Read {
        stage: Stage,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to parse {stage} JSON: {source}")]
    Parse {
        stage: Stage,
        #[source]
        source: serde_json::Error,
    },

    #[error("location data is empty")]
    EmptyLocation,
}

impl GreetError {
    pub fn stage(&self) -> Stage {
        match self {
            GreetError::Request { stage, .. }
            | GreetError::Fetch { stage, .. }
            | GreetError::Status { stage, .. }
            | GreetError::Read { stage, .. }
            | GreetError::Parse { stage, .. } => *stage,
            GreetError::EmptyLocation => Stage::Location,
        }
    }

    pub fn public_message(&self) -> String {
        let noun = self.stage().noun();
        match self {
            GreetError::Request { .. } => "Failed to create request".to_string(),
            GreetError::Fetch { .. } | GreetError::Status { .. } => {
                format!("Failed to fetch {noun} data")
            }
            GreetError::Read { .. } => format!("Failed to read {noun} data"),
            GreetError::Parse { .. } => format!("Failed to parse {noun} data"),
            GreetError::EmptyLocation => "Location data is empty".to_string(),
        }
    }
}
