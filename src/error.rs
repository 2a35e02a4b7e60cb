//! Errors reported while setting up the engine.
//!
//! Searching itself never fails: running out of time is the expected way of
//! bounding latency, and broken game implementations (e.g. a non-terminal
//! position without legal moves) are contract violations that panic.

use std::collections::TryReserveError;

use crate::search::Depth;

/// Configuration and resource errors. All of them are detected before any
/// search starts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The memory budget can not hold a single cluster plus the alignment
    /// padding.
    #[error("transposition table budget of {requested} bytes is below the minimum of {minimum} bytes")]
    TableTooSmall {
        /// Requested budget in bytes.
        requested: usize,
        /// Smallest accepted budget in bytes.
        minimum: usize,
    },
    /// Searching with no time at all is meaningless.
    #[error("time budget must be positive")]
    ZeroTimeBudget,
    /// Requested depth exceeds what the search stack is sized for.
    #[error("search depth {requested} exceeds the maximum of {maximum}")]
    DepthTooLarge {
        /// Requested depth.
        requested: Depth,
        /// Deepest supported search.
        maximum: Depth,
    },
    /// Backing storage for the transposition table could not be allocated.
    #[error("failed to allocate {clusters} clusters for the transposition table")]
    Allocation {
        /// Number of [`crate::search::transposition::Cluster`]s that were
        /// requested.
        clusters: usize,
        /// Allocator error.
        #[source]
        source: TryReserveError,
    },
}

/// Shorthand for results of fallible setup operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        let error = Error::TableTooSmall {
            requested: 16,
            minimum: 96,
        };
        assert_eq!(
            error.to_string(),
            "transposition table budget of 16 bytes is below the minimum of 96 bytes"
        );
        assert_eq!(Error::ZeroTimeBudget.to_string(), "time budget must be positive");
    }
}
