//! Always-on USB charging (powered USB ports while the lid is shut).
//!
//! Three-way mode: off, powered while sleeping, or powered even when
//! the machine is fully shut down. Every target is entered through a
//! fixed two-code sequence.

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
/// Feature-enabled bit, after wire-order reversal.
const BIT_ENABLED: u32 = 31;
/// Powered-while-shut-down bit, after wire-order reversal.
const BIT_ALWAYS: u32 = 23;

/// USB power-while-closed behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlwaysOnUsbMode {
    /// Ports lose power as soon as the lid closes.
    Off,
    /// Ports stay powered in sleep, not in shutdown.
    Sleep,
    /// Ports stay powered even when shut down.
    Always,
}

impl AlwaysOnUsbMode {
    /// Decode a wire-order settings reply.
    pub fn from_status(raw: u32) -> Self {
        let status = swap_wire(raw);
        if !bit(status, BIT_ENABLED) {
            AlwaysOnUsbMode::Off
        } else if bit(status, BIT_ALWAYS) {
            AlwaysOnUsbMode::Always
        } else {
            AlwaysOnUsbMode::Sleep
        }
    }

    /// Ordered transition codes. The first code arms or disarms the
    /// feature, the second selects the shutdown behaviour; both must
    /// land for the mode to take effect.
    fn sequence(self) -> &'static [u32] {
        match self {
            AlwaysOnUsbMode::Off => &[0xB, 0x12],
            AlwaysOnUsbMode::Sleep => &[0xA, 0x12],
            AlwaysOnUsbMode::Always => &[0xA, 0x13],
        }
    }
}

impl fmt::Display for AlwaysOnUsbMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AlwaysOnUsbMode::Off => "off",
            AlwaysOnUsbMode::Sleep => "on (sleep only)",
            AlwaysOnUsbMode::Always => "on (even shut down)",
        })
    }
}

impl FromStr for AlwaysOnUsbMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "0" => Ok(AlwaysOnUsbMode::Off),
            "sleep" | "on" | "1" => Ok(AlwaysOnUsbMode::Sleep),
            "always" | "2" => Ok(AlwaysOnUsbMode::Always),
            other => Err(format!(
                "unknown always-on USB mode '{other}' (expected off, sleep or always)"
            )),
        }
    }
}

/// Always-on USB controller.
pub struct AlwaysOnUsb {
    channel: Arc<dyn ControlChannel>,
    last: StateCell<AlwaysOnUsbMode>,
}

impl AlwaysOnUsb {
    pub fn new(channel: Arc<dyn ControlChannel>) -> Self {
        let seed = match Self::query(channel.as_ref()) {
            Ok(mode) => Some(mode),
            Err(e) => {
                debug!("always-on USB query failed, assuming off: {e}");
                None
            }
        };
        Self {
            last: StateCell::seed(AlwaysOnUsbMode::Off, seed),
            channel,
        }
    }

    fn query(channel: &dyn ControlChannel) -> Result<AlwaysOnUsbMode, FeatureError> {
        let reply = channel.exchange(ioctl::ENERGY_SETTINGS, QUERY_STATUS)?;
        Ok(AlwaysOnUsbMode::from_status(reply))
    }

    /// Query the live mode and refresh the cache.
    pub fn mode(&self) -> Result<AlwaysOnUsbMode, FeatureError> {
        let mode = Self::query(self.channel.as_ref())?;
        self.last.set(mode);
        Ok(mode)
    }

    /// Last known mode without touching the device.
    pub fn last_known(&self) -> AlwaysOnUsbMode {
        self.last.or_default()
    }

    /// Drive the device to `mode`. An abort partway through the pair
    /// leaves the feature half-configured, so the cache is dropped and
    /// the next read re-queries.
    pub fn set_mode(&self, mode: AlwaysOnUsbMode) -> Result<(), FeatureError> {
        match send_sequence(self.channel.as_ref(), ioctl::ENERGY_SETTINGS, mode.sequence()) {
            Ok(()) => {
                self.last.set(mode);
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

#[cfg(test)]
mod tests {
    use super::*;
    use legion_energy::mock::MockChannel;

    #[test]
    fn status_decodes_after_wire_reversal() {
        // Wire order: enabled bit 31 lands in the low byte.
        assert_eq!(AlwaysOnUsbMode::from_status(swap_wire(1 << 31)), AlwaysOnUsbMode::Sleep);
        assert_eq!(
            AlwaysOnUsbMode::from_status(swap_wire((1 << 31) | (1 << 23))),
            AlwaysOnUsbMode::Always
        );
        assert_eq!(AlwaysOnUsbMode::from_status(swap_wire(1 << 23)), AlwaysOnUsbMode::Off);
        assert_eq!(AlwaysOnUsbMode::from_status(0), AlwaysOnUsbMode::Off);
    }

    #[test]
    fn both_codes_go_out_in_order() {
        let mock = Arc::new(MockChannel::new());
        let usb = AlwaysOnUsb::new(mock.clone());

        usb.set_mode(AlwaysOnUsbMode::Always).unwrap();
        assert_eq!(mock.sent_to(ioctl::ENERGY_SETTINGS), vec![QUERY_STATUS, 0xA, 0x13]);
        assert_eq!(usb.last_known(), AlwaysOnUsbMode::Always);
    }

    #[test]
    fn abort_after_first_code_drops_the_cache() {
        let mock = Arc::new(MockChannel::new());
        let usb = AlwaysOnUsb::new(mock.clone());
        usb.set_mode(AlwaysOnUsbMode::Sleep).unwrap();

        mock.fail_on(ioctl::ENERGY_SETTINGS, 0x13);
        let err = usb.set_mode(AlwaysOnUsbMode::Always).unwrap_err();
        assert!(matches!(err, FeatureError::SequenceAborted { sent: 1, total: 2, .. }));

        // The cache is no longer trusted; reads fall back to off.
        assert_eq!(usb.last_known(), AlwaysOnUsbMode::Off);
    }

    #[test]
    fn first_code_failure_sends_nothing_more() {
        let mock = Arc::new(MockChannel::new());
        let usb = AlwaysOnUsb::new(mock.clone());
        usb.set_mode(AlwaysOnUsbMode::Sleep).unwrap();

        mock.fail_on(ioctl::ENERGY_SETTINGS, 0xB);
        let err = usb.set_mode(AlwaysOnUsbMode::Off).unwrap_err();
        assert!(matches!(err, FeatureError::Channel(_)));

        // Nothing was applied, the cache is still valid.
        assert_eq!(usb.last_known(), AlwaysOnUsbMode::Sleep);
        assert_eq!(
            mock.sent_to(ioctl::ENERGY_SETTINGS),
            vec![QUERY_STATUS, 0xA, 0x12, 0xB]
        );
    }
}
