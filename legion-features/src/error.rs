//! Feature-layer error types

use legion_energy::ChannelError;
use thiserror::Error;

/// Errors from feature operations.
#[derive(Error, Debug)]
pub enum FeatureError {
    /// The underlying control exchange failed before any state change.
    #[error(transparent)]
    Channel(#[from] ChannelError),

    /// A multi-code transition failed partway. The hardware may have
    /// applied part of the sequence, so the state is unknown until the
    /// next successful query.
    #[error("transition aborted after {sent}/{total} codes")]
    SequenceAborted {
        sent: usize,
        total: usize,
        #[source]
        source: ChannelError,
    },

    /// A write completed but the delayed read-back did not match.
    #[error("state read-back mismatch after write")]
    VerificationFailed,
}

impl FeatureError {
    /// True when the device itself is absent (feature unavailable).
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Channel(e) if e.is_unsupported())
    }
}
