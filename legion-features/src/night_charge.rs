//! Night charge (overnight trickle charge scheduling).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use legion_energy::codec::bit;
use legion_energy::{ioctl, ControlChannel};

use crate::error::FeatureError;
use crate::send_sequence;
use crate::state::StateCell;

/// Status-query payload.
const QUERY_STATUS: u32 = 0x11;
const ENABLE: u32 = 0x8000_0012;
const DISABLE: u32 = 0x12;

/// Whether overnight trickle charging is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NightChargeState {
    Off,
    On,
}

impl NightChargeState {
    /// Decode a status reply. This family answers in host order, no
    /// wire-order reversal; enabled requires both the feature bit and
    /// the schedule-armed bit.
    pub fn from_status(status: u32) -> Self {
        if bit(status, 0) && bit(status, 4) {
            NightChargeState::On
        } else {
            NightChargeState::Off
        }
    }

    fn code(self) -> u32 {
        match self {
            NightChargeState::On => ENABLE,
            NightChargeState::Off => DISABLE,
        }
    }
}

impl fmt::Display for NightChargeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NightChargeState::Off => "off",
            NightChargeState::On => "on",
        })
    }
}

impl FromStr for NightChargeState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" | "enabled" | "true" | "1" => Ok(NightChargeState::On),
            "off" | "disabled" | "false" | "0" => Ok(NightChargeState::Off),
            other => Err(format!("unknown night charge state '{other}' (expected on or off)")),
        }
    }
}

/// Night charge controller.
pub struct NightCharge {
    channel: Arc<dyn ControlChannel>,
    last: StateCell<NightChargeState>,
}

impl NightCharge {
    pub fn new(channel: Arc<dyn ControlChannel>) -> Self {
        let seed = match Self::query(channel.as_ref()) {
            Ok(state) => Some(state),
            Err(e) => {
                debug!("night charge query failed, assuming off: {e}");
                None
            }
        };
        Self {
            last: StateCell::seed(NightChargeState::Off, seed),
            channel,
        }
    }

    fn query(channel: &dyn ControlChannel) -> Result<NightChargeState, FeatureError> {
        let reply = channel.exchange(ioctl::ENERGY_BATTERY_NIGHT_CHARGE, QUERY_STATUS)?;
        Ok(NightChargeState::from_status(reply))
    }

    /// Query the live state and refresh the cache.
    pub fn state(&self) -> Result<NightChargeState, FeatureError> {
        let state = Self::query(self.channel.as_ref())?;
        self.last.set(state);
        Ok(state)
    }

    /// Last known state without touching the device.
    pub fn last_known(&self) -> NightChargeState {
        self.last.or_default()
    }

    pub fn set_state(&self, state: NightChargeState) -> Result<(), FeatureError> {
        send_sequence(
            self.channel.as_ref(),
            ioctl::ENERGY_BATTERY_NIGHT_CHARGE,
            &[state.code()],
        )?;
        self.last.set(state);
        Ok(())
    }
}
