//! Error type shared by every stage of the bundle pipeline.

use crate::naming::NamingViolations;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions raised while turning a status report into bundle files.
///
/// Environment mismatches abort on first sight; naming violations are
/// collected across all bundles before being raised once.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("Fourth parent folder of {file} must be {expected}, but is {actual}")]
    EnvironmentMismatch {
        file: String,
        expected: String,
        actual: String,
    },
    #[error("{0}")]
    NamingConvention(NamingViolations),
    #[error("malformed status line {line_number}: {reason}: {line:?} (expected <status>\\t<path>)")]
    MalformedStatusLine {
        line_number: usize,
        reason: &'static str,
        line: String,
    },
    #[error("I/O failure on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid bundle JSON in {}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl BundleError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BundleError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        BundleError::Json {
            path: path.into(),
            source,
        }
    }
}
