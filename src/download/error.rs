use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Why a single track could not be fetched. Never fatal for the batch.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("not streamable")]
    NotStreamable,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    BadResponse(String),

    #[error("filesystem error: {0}")]
    Fs(#[from] std::io::Error),

    #[error("cannot run {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("{command} exited with {}: {output}", describe_code(.code))]
    ExitStatus {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("gave up after {0:?}")]
    Timeout(Duration),

    #[error("no file was written at {0}")]
    NoOutput(PathBuf),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}
