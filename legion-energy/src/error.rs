//! Channel error types

use thiserror::Error;

/// Errors from the EnergyDrv control channel.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The control device is absent or inaccessible. This is the
    /// normal case on any machine without the vendor driver; callers
    /// degrade the feature to "unavailable" instead of aborting.
    #[error("EnergyDrv not available: {0}")]
    Unsupported(String),

    /// A control exchange failed after the device was opened. The
    /// operation is aborted and never retried automatically.
    #[error("control exchange failed (ioctl {}, os error {code})", crate::ioctl::name(*ioctl))]
    Io { ioctl: u32, code: i32 },
}

impl ChannelError {
    /// True for the expected no-vendor-driver case.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}
