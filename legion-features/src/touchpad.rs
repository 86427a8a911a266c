//! Touchpad lock (disables the pad, used with an external mouse).
//!
//! Besides the explicit setter this module carries `toggle`, which the
//! hotkey dispatcher calls when the Fn+F10 key event arrives.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use legion_energy::codec::{bit, pack, swap_wire};
use legion_energy::{ioctl, ControlChannel};

use crate::error::FeatureError;
use crate::send_sequence;
use crate::state::StateCell;

/// Status-query payload for the touchpad lock.
const QUERY_STATUS: u32 = 0x13;
/// Locked bit, after wire-order reversal.
const BIT_LOCKED: u32 = 31;
/// Operation id the lock nibble is packed over.
const OP_SET_LOCK: u32 = 0x14;
const SUB_LOCK: u32 = 0xA;
const SUB_UNLOCK: u32 = 0xB;

/// Whether the touchpad is locked (inputs ignored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TouchpadLockState {
    Off,
    On,
}

impl TouchpadLockState {
    /// Decode a wire-order status reply.
    pub fn from_status(raw: u32) -> Self {
        if bit(swap_wire(raw), BIT_LOCKED) {
            TouchpadLockState::On
        } else {
            TouchpadLockState::Off
        }
    }

    fn code(self) -> u32 {
        let sub = match self {
            TouchpadLockState::On => SUB_LOCK,
            TouchpadLockState::Off => SUB_UNLOCK,
        };
        pack(8, sub, OP_SET_LOCK)
    }

    fn flipped(self) -> Self {
        match self {
            TouchpadLockState::On => TouchpadLockState::Off,
            TouchpadLockState::Off => TouchpadLockState::On,
        }
    }
}

impl fmt::Display for TouchpadLockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TouchpadLockState::Off => "off",
            TouchpadLockState::On => "on",
        })
    }
}

impl FromStr for TouchpadLockState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" | "locked" | "true" | "1" => Ok(TouchpadLockState::On),
            "off" | "unlocked" | "false" | "0" => Ok(TouchpadLockState::Off),
            other => Err(format!(
                "unknown touchpad lock state '{other}' (expected on or off)"
            )),
        }
    }
}

/// Touchpad lock controller.
pub struct TouchpadLock {
    channel: Arc<dyn ControlChannel>,
    last: StateCell<TouchpadLockState>,
}

impl TouchpadLock {
    pub fn new(channel: Arc<dyn ControlChannel>) -> Self {
        let seed = match Self::query(channel.as_ref()) {
            Ok(state) => Some(state),
            Err(e) => {
                debug!("touchpad lock query failed, assuming unlocked: {e}");
                None
            }
        };
        Self {
            last: StateCell::seed(TouchpadLockState::Off, seed),
            channel,
        }
    }

    fn query(channel: &dyn ControlChannel) -> Result<TouchpadLockState, FeatureError> {
        let reply = channel.exchange(ioctl::ENERGY_SETTINGS, QUERY_STATUS)?;
        Ok(TouchpadLockState::from_status(reply))
    }

    /// Query the live state and refresh the cache.
    pub fn state(&self) -> Result<TouchpadLockState, FeatureError> {
        let state = Self::query(self.channel.as_ref())?;
        self.last.set(state);
        Ok(state)
    }

    /// Last known state without touching the device.
    pub fn last_known(&self) -> TouchpadLockState {
        self.last.or_default()
    }

    pub fn set_state(&self, state: TouchpadLockState) -> Result<(), FeatureError> {
        send_sequence(self.channel.as_ref(), ioctl::ENERGY_SETTINGS, &[state.code()])?;
        self.last.set(state);
        Ok(())
    }

    /// Flip the lock based on the live state. Queries first rather than
    /// trusting the cache; the Fn+F10 firmware handler may already have
    /// flipped it behind our back.
    pub fn toggle(&self) -> Result<TouchpadLockState, FeatureError> {
        let next = self.state()?.flipped();
        self.set_state(next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legion_energy::mock::MockChannel;

    #[test]
    fn bit_31_after_reversal_selects_the_state() {
        assert_eq!(TouchpadLockState::from_status(swap_wire(1 << 31)), TouchpadLockState::On);
        assert_eq!(TouchpadLockState::from_status(1), TouchpadLockState::Off);
        assert_eq!(TouchpadLockState::from_status(0), TouchpadLockState::Off);
    }

    #[test]
    fn lock_codes_pack_the_sub_command() {
        assert_eq!(TouchpadLockState::On.code(), 0xA14);
        assert_eq!(TouchpadLockState::Off.code(), 0xB14);
    }

    #[test]
    fn toggle_queries_then_flips() {
        let mock = Arc::new(MockChannel::new());
        let pad = TouchpadLock::new(mock.clone());

        // Reads as unlocked, so the toggle locks.
        assert_eq!(pad.toggle().unwrap(), TouchpadLockState::On);
        assert_eq!(mock.sent_to(ioctl::ENERGY_SETTINGS), vec![QUERY_STATUS, QUERY_STATUS, 0xA14]);

        // Now reads as locked, so the toggle unlocks.
        mock.reply(ioctl::ENERGY_SETTINGS, QUERY_STATUS, swap_wire(1 << 31));
        assert_eq!(pad.toggle().unwrap(), TouchpadLockState::Off);
        assert_eq!(pad.last_known(), TouchpadLockState::Off);
    }
}
