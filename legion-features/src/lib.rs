//! Firmware feature state machines for Lenovo Legion laptops
//!
//! Each module drives one feature family of the EnergyDrv control
//! protocol: it knows the family's status-query payload, the bit rule
//! that turns a raw reply into a semantic state, and the transition
//! table that turns a target state into an ordered code sequence.
//!
//! Transitions are not idempotent single writes. Some target states can
//! only be entered through a priming code that depends on the current
//! state, so every feature tracks a `last known` state that is trusted
//! only right after a successful query or a fully completed sequence.

pub mod always_on_usb;
pub mod backlight;
pub mod battery;
pub mod error;
pub mod fnlock;
pub mod night_charge;
pub mod smart_fnlock;
pub mod touchpad;

mod state;

pub use always_on_usb::{AlwaysOnUsb, AlwaysOnUsbMode};
pub use backlight::{BacklightLevel, WhiteBacklight};
pub use battery::{BatteryCharge, ChargeMode};
pub use error::FeatureError;
pub use fnlock::{FnLock, FnLockState};
pub use night_charge::{NightCharge, NightChargeState};
pub use smart_fnlock::{SmartFnLock, SmartFnLockState};
pub use touchpad::{TouchpadLock, TouchpadLockState};

use legion_energy::ControlChannel;
use tracing::debug;

/// Send an ordered transition sequence, aborting at the first failure.
///
/// Each code is waited on synchronously before the next is issued; no
/// pipelining. After a failure the remaining codes are never sent: the
/// device may have partially applied the sequence and must be
/// re-queried before anything else is attempted.
pub(crate) fn send_sequence(
    channel: &dyn ControlChannel,
    ioctl: u32,
    codes: &[u32],
) -> Result<(), FeatureError> {
    for (sent, &code) in codes.iter().enumerate() {
        if let Err(source) = channel.exchange(ioctl, code) {
            debug!(
                "transition aborted at code 0x{code:X} ({sent}/{} sent)",
                codes.len()
            );
            return Err(if sent == 0 {
                // Nothing went out; the cached state is still valid.
                FeatureError::Channel(source)
            } else {
                FeatureError::SequenceAborted {
                    sent,
                    total: codes.len(),
                    source,
                }
            });
        }
    }
    Ok(())
}
