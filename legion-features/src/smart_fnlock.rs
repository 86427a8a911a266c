//! Smart Fn lock (firmware flips Fn lock automatically in games).
//!
//! Shares the settings family with the plain Fn lock and reuses its
//! enable/disable codes; the firmware distinguishes them by the state
//! of the session, not by the command word. The status bit however is
//! its own, and reads in wire order.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use legion_energy::codec::{bit, swap_wire};
use legion_energy::{ioctl, ControlChannel};

use crate::error::FeatureError;
use crate::send_sequence;
use crate::state::StateCell;

/// Status-query payload shared by the settings family.
const QUERY_STATUS: u32 = 0x2;
/// Smart Fn lock bit, after wire-order reversal.
const BIT_SMART: u32 = 21;
const ENABLE: u32 = 0xE;
const DISABLE: u32 = 0xF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmartFnLockState {
    Off,
    On,
}

impl SmartFnLockState {
    /// Decode a wire-order settings reply.
    pub fn from_status(raw: u32) -> Self {
        if bit(swap_wire(raw), BIT_SMART) {
            SmartFnLockState::On
        } else {
            SmartFnLockState::Off
        }
    }

    fn code(self) -> u32 {
        match self {
            SmartFnLockState::On => ENABLE,
            SmartFnLockState::Off => DISABLE,
        }
    }
}

impl fmt::Display for SmartFnLockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SmartFnLockState::Off => "off",
            SmartFnLockState::On => "on",
        })
    }
}

impl FromStr for SmartFnLockState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" | "enabled" | "true" | "1" => Ok(SmartFnLockState::On),
            "off" | "disabled" | "false" | "0" => Ok(SmartFnLockState::Off),
            other => Err(format!(
                "unknown smart Fn lock state '{other}' (expected on or off)"
            )),
        }
    }
}

/// Smart Fn lock controller.
pub struct SmartFnLock {
    channel: Arc<dyn ControlChannel>,
    last: StateCell<SmartFnLockState>,
}

impl SmartFnLock {
    pub fn new(channel: Arc<dyn ControlChannel>) -> Self {
        let seed = match Self::query(channel.as_ref()) {
            Ok(state) => Some(state),
            Err(e) => {
                debug!("smart Fn lock query failed, assuming off: {e}");
                None
            }
        };
        Self {
            last: StateCell::seed(SmartFnLockState::Off, seed),
            channel,
        }
    }

    fn query(channel: &dyn ControlChannel) -> Result<SmartFnLockState, FeatureError> {
        let reply = channel.exchange(ioctl::ENERGY_SETTINGS, QUERY_STATUS)?;
        Ok(SmartFnLockState::from_status(reply))
    }

    /// Query the live state and refresh the cache.
    pub fn state(&self) -> Result<SmartFnLockState, FeatureError> {
        let state = Self::query(self.channel.as_ref())?;
        self.last.set(state);
        Ok(state)
    }

    /// Last known state without touching the device.
    pub fn last_known(&self) -> SmartFnLockState {
        self.last.or_default()
    }

    pub fn set_state(&self, state: SmartFnLockState) -> Result<(), FeatureError> {
        send_sequence(self.channel.as_ref(), ioctl::ENERGY_SETTINGS, &[state.code()])?;
        self.last.set(state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legion_energy::mock::MockChannel;

    #[test]
    fn bit_21_after_reversal_selects_the_state() {
        assert_eq!(SmartFnLockState::from_status(swap_wire(1 << 21)), SmartFnLockState::On);
        assert_eq!(SmartFnLockState::from_status(1 << 21), SmartFnLockState::Off);
        assert_eq!(SmartFnLockState::from_status(0), SmartFnLockState::Off);
    }

    #[test]
    fn set_sends_the_shared_codes() {
        let mock = Arc::new(MockChannel::new());
        let smart = SmartFnLock::new(mock.clone());

        smart.set_state(SmartFnLockState::On).unwrap();
        smart.set_state(SmartFnLockState::Off).unwrap();
        assert_eq!(
            mock.sent_to(ioctl::ENERGY_SETTINGS),
            vec![QUERY_STATUS, ENABLE, DISABLE]
        );
    }
}
