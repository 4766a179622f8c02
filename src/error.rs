//! Error taxonomy for a sync run. Every variant is fatal for the run.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The portal rejected the credentials or failed to issue a token.
    #[error(
        "authentication failed: {message}. \
         Note that your username and password are case sensitive"
    )]
    Authentication { message: String },

    /// The request never produced a response.
    #[error("{operation}: transport error: {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation}: HTTP {status}: {body}")]
    Http {
        operation: String,
        status: u16,
        body: String,
    },

    /// The portal answered with an error payload or an unusable envelope.
    #[error("{operation}: {message}")]
    Api { operation: String, message: String },

    #[error("{operation}: invalid response JSON: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },

    /// `addUsers` reported an error payload.
    #[error("failed to add users to the group: {message}")]
    Mutation { message: String },

    /// A chunk failed; chunks before it were applied and are not rolled back.
    #[error("batch {index} of {total} failed")]
    Batch {
        index: usize,
        total: usize,
        #[source]
        source: Box<SyncError>,
    },

    #[error("failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode report: {0}")]
    ReportEncode(#[from] serde_yaml::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SyncError {
    pub(crate) fn transport(operation: impl Into<String>, source: reqwest::Error) -> Self {
        SyncError::Transport {
            operation: operation.into(),
            source,
        }
    }

    pub(crate) fn decode(operation: impl Into<String>, source: serde_json::Error) -> Self {
        SyncError::Decode {
            operation: operation.into(),
            source,
        }
    }
}
