//! Battery charge mode (Conservation / Normal / Rapid Charge).
//!
//! The charge-mode family is stateful on the device side: some target
//! modes cannot be entered directly and need a priming code first, so
//! the transition table depends on the last known mode.

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

/// Status-query payload for the charge-mode family.
const QUERY_STATUS: u32 = 0xFF;

// Status reply bits, valid after wire-order reversal.
const BIT_CHARGING: u32 = 17;
const BIT_RAPID: u32 = 26;
const BIT_CONSERVATION: u32 = 29;

// Transition codes. 0x5 leaves conservation (landing on normal) and
// 0x8 leaves rapid charge (also landing on normal).
const CONSERVATION_ON: u32 = 0x3;
const CONSERVATION_OFF: u32 = 0x5;
const RAPID_ON: u32 = 0x7;
const RAPID_OFF: u32 = 0x8;

/// Battery charge mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChargeMode {
    Conservation,
    Normal,
    RapidCharge,
}

impl ChargeMode {
    /// Decode a charge-mode status reply (after wire-order reversal).
    ///
    /// Priority: charging with the rapid flag, then the conservation
    /// flag, then normal.
    pub fn from_status(word: u32) -> Self {
        if bit(word, BIT_CHARGING) {
            if bit(word, BIT_RAPID) {
                ChargeMode::RapidCharge
            } else {
                ChargeMode::Normal
            }
        } else if bit(word, BIT_CONSERVATION) {
            ChargeMode::Conservation
        } else {
            ChargeMode::Normal
        }
    }

    /// Mirror value Vantage reads for cross-tool consistency.
    pub fn mirror_value(self) -> &'static str {
        match self {
            ChargeMode::Conservation => "Storage",
            ChargeMode::RapidCharge => "Quick",
            ChargeMode::Normal => "Normal",
        }
    }
}

impl fmt::Display for ChargeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChargeMode::Conservation => "Conservation (60-80%)",
            ChargeMode::Normal => "Normal",
            ChargeMode::RapidCharge => "Rapid Charge",
        };
        f.write_str(name)
    }
}

impl FromStr for ChargeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "conservation" | "cons" | "storage" => Ok(ChargeMode::Conservation),
            "normal" => Ok(ChargeMode::Normal),
            "rapid" | "rapid-charge" | "rapidcharge" | "quick" => Ok(ChargeMode::RapidCharge),
            other => Err(format!(
                "unknown charge mode '{other}' (expected conservation, normal or rapid)"
            )),
        }
    }
}

/// Battery charge-mode state machine.
pub struct BatteryCharge {
    channel: Arc<dyn ControlChannel>,
    last: StateCell<ChargeMode>,
}

impl BatteryCharge {
    /// Create the state machine and seed the last-known mode with one
    /// status query; an unreachable device seeds the safe baseline
    /// (Normal).
    pub fn new(channel: Arc<dyn ControlChannel>) -> Self {
        let seed = match Self::query(channel.as_ref()) {
            Ok(mode) => {
                debug!("battery charge mode at startup: {mode}");
                Some(mode)
            }
            Err(e) => {
                debug!("battery status query failed, assuming Normal: {e}");
                None
            }
        };
        Self {
            last: StateCell::seed(ChargeMode::Normal, seed),
            channel,
        }
    }

    fn query(channel: &dyn ControlChannel) -> Result<ChargeMode, FeatureError> {
        let reply = channel.exchange(ioctl::ENERGY_BATTERY_CHARGE_MODE, QUERY_STATUS)?;
        Ok(ChargeMode::from_status(swap_wire(reply)))
    }

    /// Query the live charge mode and refresh the cache.
    pub fn mode(&self) -> Result<ChargeMode, FeatureError> {
        let mode = Self::query(self.channel.as_ref())?;
        self.last.set(mode);
        Ok(mode)
    }

    /// Last known mode without touching the device.
    pub fn last_known(&self) -> ChargeMode {
        self.last.or_default()
    }

    /// Ordered code sequence for a transition.
    ///
    /// Direct codes exist for every target, but the device refuses two
    /// jumps without priming: entering conservation from rapid charge
    /// needs the exit-rapid code first, and entering rapid charge from
    /// conservation needs the exit-conservation code first. Leaving
    /// conservation for normal is the exit-conservation code alone.
    fn transition(target: ChargeMode, last: ChargeMode) -> &'static [u32] {
        match (target, last) {
            (ChargeMode::Conservation, ChargeMode::RapidCharge) => {
                &[RAPID_OFF, CONSERVATION_ON]
            }
            (ChargeMode::Conservation, _) => &[CONSERVATION_ON],
            (ChargeMode::Normal, ChargeMode::Conservation) => &[CONSERVATION_OFF],
            (ChargeMode::Normal, _) => &[RAPID_OFF],
            (ChargeMode::RapidCharge, ChargeMode::Conservation) => {
                &[CONSERVATION_OFF, RAPID_ON]
            }
            (ChargeMode::RapidCharge, _) => &[RAPID_ON],
        }
    }

    /// Drive the device to `target`.
    ///
    /// Codes are sent strictly in order; the first failure aborts the
    /// rest and, if anything already went out, invalidates the cached
    /// mode until the next successful query.
    pub fn set_mode(&self, target: ChargeMode) -> Result<(), FeatureError> {
        // An unknown cache (earlier aborted sequence) is resolved by a
        // fresh query before a sequence is chosen.
        let last = match self.last.get() {
            Some(mode) => mode,
            None => self.mode().unwrap_or(ChargeMode::Normal),
        };
        let codes = Self::transition(target, last);
        debug!("battery {last} -> {target}: {codes:X?}");
        match send_sequence(
            self.channel.as_ref(),
            ioctl::ENERGY_BATTERY_CHARGE_MODE,
            codes,
        ) {
            Ok(()) => {
                self.last.set(target);
                Ok(())
            }
            Err(e) => {
                if matches!(e, FeatureError::SequenceAborted { .. }) {
                    self.last.clear();
                }
                Err(e)
            }
        }
    }
}
