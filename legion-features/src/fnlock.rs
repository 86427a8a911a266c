//! Fn lock (media keys without holding Fn).
//!
//! The only feature whose write is verified: the firmware is known to
//! silently drop this command on some models, so after the write we
//! wait briefly and read the state back.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use legion_energy::codec::bit;
use legion_energy::{ioctl, ControlChannel};

use crate::error::FeatureError;
use crate::send_sequence;
use crate::state::StateCell;

/// Status-query payload shared by the settings family.
const QUERY_STATUS: u32 = 0x2;
/// Fn lock bit of the raw (host-order) settings reply.
const BIT_FN_LOCK: u32 = 10;
const ENABLE: u32 = 0xE;
const DISABLE: u32 = 0xF;
/// The firmware needs a moment before the read-back reflects the write.
const VERIFY_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FnLockState {
    Off,
    On,
}

impl FnLockState {
    /// Decode a raw settings reply. This family reads host-order, no
    /// wire-order reversal.
    pub fn from_status(status: u32) -> Self {
        if bit(status, BIT_FN_LOCK) {
            FnLockState::On
        } else {
            FnLockState::Off
        }
    }

    fn code(self) -> u32 {
        match self {
            FnLockState::On => ENABLE,
            FnLockState::Off => DISABLE,
        }
    }
}

impl fmt::Display for FnLockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FnLockState::Off => "off",
            FnLockState::On => "on",
        })
    }
}

impl FromStr for FnLockState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" | "enabled" | "true" | "1" => Ok(FnLockState::On),
            "off" | "disabled" | "false" | "0" => Ok(FnLockState::Off),
            other => Err(format!("unknown Fn lock state '{other}' (expected on or off)")),
        }
    }
}

/// Fn lock controller.
pub struct FnLock {
    channel: Arc<dyn ControlChannel>,
    last: StateCell<FnLockState>,
}

impl FnLock {
    pub fn new(channel: Arc<dyn ControlChannel>) -> Self {
        let seed = match Self::query(channel.as_ref()) {
            Ok(state) => Some(state),
            Err(e) => {
                debug!("Fn lock query failed, assuming off: {e}");
                None
            }
        };
        Self {
            last: StateCell::seed(FnLockState::Off, seed),
            channel,
        }
    }

    fn query(channel: &dyn ControlChannel) -> Result<FnLockState, FeatureError> {
        let reply = channel.exchange(ioctl::ENERGY_SETTINGS, QUERY_STATUS)?;
        Ok(FnLockState::from_status(reply))
    }

    /// Query the live state and refresh the cache.
    pub fn state(&self) -> Result<FnLockState, FeatureError> {
        let state = Self::query(self.channel.as_ref())?;
        self.last.set(state);
        Ok(state)
    }

    /// Last known state without touching the device.
    pub fn last_known(&self) -> FnLockState {
        self.last.or_default()
    }

    /// Write the state, then verify it stuck with a delayed read-back.
    pub fn set_state(&self, state: FnLockState) -> Result<(), FeatureError> {
        send_sequence(self.channel.as_ref(), ioctl::ENERGY_SETTINGS, &[state.code()])?;

        std::thread::sleep(VERIFY_DELAY);
        // The write already went out; an unconfirmed transition leaves
        // the state unknown, so a failed read-back drops the cache.
        let observed = match Self::query(self.channel.as_ref()) {
            Ok(observed) => observed,
            Err(e) => {
                self.last.clear();
                return Err(e);
            }
        };
        if observed != state {
            warn!("Fn lock read-back disagrees: wrote {state}, read {observed}");
            self.last.set(observed);
            return Err(FeatureError::VerificationFailed);
        }
        self.last.set(state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legion_energy::mock::MockChannel;

    #[test]
    fn bit_10_selects_the_state() {
        assert_eq!(FnLockState::from_status(1 << 10), FnLockState::On);
        assert_eq!(FnLockState::from_status(!(1u32 << 10)), FnLockState::Off);
        assert_eq!(FnLockState::from_status(0), FnLockState::Off);
    }

    #[test]
    fn verified_write_updates_the_cache() {
        let mock = Arc::new(MockChannel::new());
        let fnlock = FnLock::new(mock.clone());
        assert_eq!(fnlock.last_known(), FnLockState::Off);

        mock.reply(ioctl::ENERGY_SETTINGS, QUERY_STATUS, 1 << 10);
        fnlock.set_state(FnLockState::On).unwrap();
        assert_eq!(fnlock.last_known(), FnLockState::On);
        assert_eq!(mock.sent_to(ioctl::ENERGY_SETTINGS), vec![QUERY_STATUS, ENABLE, QUERY_STATUS]);
    }

    #[test]
    fn failed_read_back_drops_the_cache() {
        let mock = Arc::new(MockChannel::new());
        mock.reply(ioctl::ENERGY_SETTINGS, QUERY_STATUS, 1 << 10);
        let fnlock = FnLock::new(mock.clone());
        assert_eq!(fnlock.last_known(), FnLockState::On);

        // The write lands but the verification query errors out; the
        // pre-write state must not be served as known anymore.
        mock.fail_on(ioctl::ENERGY_SETTINGS, QUERY_STATUS);
        let err = fnlock.set_state(FnLockState::Off).unwrap_err();
        assert!(matches!(err, FeatureError::Channel(_)));
        assert_eq!(fnlock.last_known(), FnLockState::Off);
    }

    #[test]
    fn read_back_mismatch_is_reported() {
        let mock = Arc::new(MockChannel::new());
        let fnlock = FnLock::new(mock.clone());

        // The write goes through but the firmware never flips the bit.
        let err = fnlock.set_state(FnLockState::On).unwrap_err();
        assert!(matches!(err, FeatureError::VerificationFailed));
        // The cache follows what was actually observed.
        assert_eq!(fnlock.last_known(), FnLockState::Off);
    }
}
