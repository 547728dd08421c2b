//! Error types.

use thiserror::Error;

/// Errors returned by this crate.
///
/// Selection, sampling and updates are total; errors only come from
/// construction with bad parameters (or, with the `chart` feature, from
/// writing the chart artifact).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A parameter makes the policy or environment ill-defined
    /// (e.g. zero backends, non-positive temperature).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Rendering or writing the latency chart failed.
    #[cfg(feature = "chart")]
    #[error("chart rendering failed: {0}")]
    Chart(String),
}

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidConfiguration(msg.into())
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
