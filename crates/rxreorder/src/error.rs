// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for the receive reorder and monitor paths.
//!
//! Only two places can fail recoverably: reorder-window (re)allocation in
//! `open_session`, and monitor reassembly. Everything else in the engine is
//! total once its inputs are in range; out-of-range traffic ids are contract
//! violations and panic.

use thiserror::Error;

/// Errors reported by `rxreorder`.
#[derive(Debug, Error)]
pub enum Error {
    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// A fallible allocation (`try_reserve`) was refused.
    #[error("Out of memory allocating {what}")]
    OutOfMemory {
        /// What was being allocated.
        what: &'static str,
    },

    /// The configured reorder-slot budget would be exceeded.
    #[error("Resource limit exceeded: {0}")]
    ResourceLimitExceeded(String),

    // ========================================================================
    // Monitor Capture Errors
    // ========================================================================
    /// No fragments were queued.
    #[error("Empty capture unit")]
    EmptyCapture,

    /// The queue ended before a fragment flagged as the last sub-frame.
    #[error("Truncated capture unit: {fragments} fragments without a last sub-frame")]
    TruncatedCapture {
        /// Number of fragments inspected.
        fragments: usize,
    },

    /// Descriptors of the capture unit are inconsistent or incomplete.
    #[error("Malformed capture unit: {0}")]
    MalformedCapture(String),
}

/// Convenient alias for results using the crate `Error` type.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::OutOfMemory {
            what: "reorder slots",
        };
        assert_eq!(err.to_string(), "Out of memory allocating reorder slots");

        let err = Error::TruncatedCapture { fragments: 3 };
        assert!(err.to_string().contains("3 fragments"));
    }
}
