//! IOCTL selectors for the EnergyDrv control device.
//!
//! These values come from the vendor driver and were recovered from
//! third-party tooling; they are asserted constants, not derivable
//! from the device itself.

/// Kernel object path of the vendor control device.
pub const DEVICE_PATH: &str = r"\\.\EnergyDrv";

/// Battery charge mode family (query 0xFF, transition codes 0x3-0x8).
pub const ENERGY_BATTERY_CHARGE_MODE: u32 = 0x831020F8;

/// Battery night charge family.
pub const ENERGY_BATTERY_NIGHT_CHARGE: u32 = 0x83102150;

/// White keyboard backlight family.
pub const ENERGY_KEYBOARD: u32 = 0x83102144;

/// Settings/lock family (Fn lock, smart Fn lock, always-on USB,
/// touchpad lock).
pub const ENERGY_SETTINGS: u32 = 0x831020E8;

/// Registers the listener's wait primitive with the driver.
pub const ENERGY_KEY_WAIT_HANDLE: u32 = 0x831020D8;

/// Reads the last driver key value after a wait-primitive signal.
pub const ENERGY_KEY_VALUE: u32 = 0x831020CC;

/// Human-readable name for an ioctl selector.
pub fn name(ioctl: u32) -> &'static str {
    match ioctl {
        ENERGY_BATTERY_CHARGE_MODE => "BATTERY_CHARGE_MODE",
        ENERGY_BATTERY_NIGHT_CHARGE => "BATTERY_NIGHT_CHARGE",
        ENERGY_KEYBOARD => "KEYBOARD",
        ENERGY_SETTINGS => "SETTINGS",
        ENERGY_KEY_WAIT_HANDLE => "KEY_WAIT_HANDLE",
        ENERGY_KEY_VALUE => "KEY_VALUE",
        _ => "UNKNOWN",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_selectors_have_names() {
        assert_eq!(name(ENERGY_BATTERY_CHARGE_MODE), "BATTERY_CHARGE_MODE");
        assert_eq!(name(ENERGY_SETTINGS), "SETTINGS");
        assert_eq!(name(0xDEADBEEF), "UNKNOWN");
    }
}
