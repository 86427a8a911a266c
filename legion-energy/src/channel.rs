//! Control-channel trait and platform entry point.

use std::sync::Arc;

use crate::error::ChannelError;

/// One fixed-size control exchange with the EnergyDrv device: a 32-bit
/// payload in, a 32-bit reply out.
///
/// Implementations never retry. Repeating an unknown-effect command
/// against real hardware is unsafe, so a failed exchange is surfaced
/// as-is and the caller decides whether to re-query.
pub trait ControlChannel: Send + Sync {
    fn exchange(&self, ioctl: u32, payload: u32) -> Result<u32, ChannelError>;
}

/// Open the platform control device as a shared channel.
#[cfg(windows)]
pub fn open_default() -> Result<Arc<dyn ControlChannel>, ChannelError> {
    Ok(Arc::new(crate::device::EnergyDevice::open()?))
}

/// EnergyDrv is a Windows kernel object; other platforms report the
/// device as unsupported.
#[cfg(not(windows))]
pub fn open_default() -> Result<Arc<dyn ControlChannel>, ChannelError> {
    Err(ChannelError::Unsupported(
        "EnergyDrv requires Windows".into(),
    ))
}

/// Can the control device be opened at all?
pub fn probe() -> bool {
    open_default().is_ok()
}
