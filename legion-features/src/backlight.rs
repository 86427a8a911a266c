//! White keyboard backlight (Off / Low / High).
//!
//! Only present on white-backlight models; `supported` probes the
//! keyboard family before the CLI offers the feature.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use legion_energy::codec::pack;
use legion_energy::{ioctl, ControlChannel};

use crate::error::FeatureError;
use crate::send_sequence;
use crate::state::StateCell;

/// Probe payload; a supported device answers with 0x2 in bits 1..
const QUERY_SUPPORT: u32 = 0x1;
/// Status-query payload for the current level.
const QUERY_LEVEL: u32 = 0x22;
/// Operation id the level is packed over.
const OP_SET_LEVEL: u32 = 0x23;
/// The level occupies the third byte of the set command.
const LEVEL_SHIFT: u32 = 16;

/// White keyboard backlight level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BacklightLevel {
    Off = 0,
    Low = 1,
    High = 2,
}

impl BacklightLevel {
    /// Decode a level-query reply. Raw reply, no wire-order reversal
    /// for this family; unknown values read as Off.
    pub fn from_reply(word: u32) -> Self {
        match word {
            0x3 => BacklightLevel::Low,
            0x5 => BacklightLevel::High,
            _ => BacklightLevel::Off,
        }
    }

    fn code(self) -> u32 {
        pack(LEVEL_SHIFT, self as u32, OP_SET_LEVEL)
    }
}

impl fmt::Display for BacklightLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BacklightLevel::Off => "off",
            BacklightLevel::Low => "low",
            BacklightLevel::High => "high",
        };
        f.write_str(name)
    }
}

impl FromStr for BacklightLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "0" => Ok(BacklightLevel::Off),
            "low" | "1" => Ok(BacklightLevel::Low),
            "high" | "2" => Ok(BacklightLevel::High),
            other => Err(format!(
                "unknown backlight level '{other}' (expected off, low or high)"
            )),
        }
    }
}

/// White keyboard backlight controller.
pub struct WhiteBacklight {
    channel: Arc<dyn ControlChannel>,
    last: StateCell<BacklightLevel>,
}

impl WhiteBacklight {
    pub fn new(channel: Arc<dyn ControlChannel>) -> Self {
        let seed = match Self::query(channel.as_ref()) {
            Ok(level) => Some(level),
            Err(e) => {
                debug!("backlight level query failed, assuming off: {e}");
                None
            }
        };
        Self {
            last: StateCell::seed(BacklightLevel::Off, seed),
            channel,
        }
    }

    fn query(channel: &dyn ControlChannel) -> Result<BacklightLevel, FeatureError> {
        let reply = channel.exchange(ioctl::ENERGY_KEYBOARD, QUERY_LEVEL)?;
        Ok(BacklightLevel::from_reply(reply))
    }

    /// Whether this machine has the white backlight at all.
    pub fn supported(&self) -> bool {
        match self.channel.exchange(ioctl::ENERGY_KEYBOARD, QUERY_SUPPORT) {
            Ok(reply) => (reply >> 1) == 0x2,
            Err(e) => {
                debug!("backlight support probe failed: {e}");
                false
            }
        }
    }

    /// Query the live level and refresh the cache.
    pub fn level(&self) -> Result<BacklightLevel, FeatureError> {
        let level = Self::query(self.channel.as_ref())?;
        self.last.set(level);
        Ok(level)
    }

    /// Last known level without touching the device.
    pub fn last_known(&self) -> BacklightLevel {
        self.last.or_default()
    }

    /// Set the backlight level. Single-code transition for every
    /// target, independent of the prior level.
    pub fn set_level(&self, level: BacklightLevel) -> Result<(), FeatureError> {
        send_sequence(self.channel.as_ref(), ioctl::ENERGY_KEYBOARD, &[level.code()])?;
        self.last.set(level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use legion_energy::mock::MockChannel;

    #[test]
    fn level_replies_decode() {
        assert_eq!(BacklightLevel::from_reply(0x1), BacklightLevel::Off);
        assert_eq!(BacklightLevel::from_reply(0x3), BacklightLevel::Low);
        assert_eq!(BacklightLevel::from_reply(0x5), BacklightLevel::High);
        assert_eq!(BacklightLevel::from_reply(0x9), BacklightLevel::Off);
    }

    #[test]
    fn set_codes_pack_the_level() {
        assert_eq!(BacklightLevel::Off.code(), 0x00023);
        assert_eq!(BacklightLevel::Low.code(), 0x10023);
        assert_eq!(BacklightLevel::High.code(), 0x20023);
    }

    #[test]
    fn support_probe_checks_the_reply_shape() {
        let mock = Arc::new(MockChannel::new());
        mock.reply(ioctl::ENERGY_KEYBOARD, QUERY_SUPPORT, 0x4);
        let backlight = WhiteBacklight::new(mock);
        assert!(backlight.supported());

        let mock = Arc::new(MockChannel::new());
        mock.reply(ioctl::ENERGY_KEYBOARD, QUERY_SUPPORT, 0x1);
        let backlight = WhiteBacklight::new(mock);
        assert!(!backlight.supported());
    }

    #[test]
    fn set_level_sends_the_packed_code() {
        let mock = Arc::new(MockChannel::new());
        let backlight = WhiteBacklight::new(mock.clone());
        backlight.set_level(BacklightLevel::High).unwrap();
        assert_eq!(
            mock.sent_to(ioctl::ENERGY_KEYBOARD),
            vec![QUERY_LEVEL, 0x20023]
        );
        assert_eq!(backlight.last_known(), BacklightLevel::High);
    }
}
