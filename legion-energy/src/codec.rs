//! Bit-level helpers for EnergyDrv control words.
//!
//! Several ioctl families return their reply with the byte order
//! reversed relative to the host; others do not. The swap is applied
//! per family by the feature layer — there is no global convention.

/// Reverse the four bytes of a control word (wire ↔ host order).
pub const fn swap_wire(value: u32) -> u32 {
    value.swap_bytes()
}

/// Test a single bit of a control word.
///
/// # Panics
/// Panics if `index` is not in `0..32`.
pub const fn bit(value: u32, index: u32) -> bool {
    assert!(index < 32);
    value & (1 << index) != 0
}

/// Pack a sub-command over a fixed operation id in one control word.
///
/// Used by composite one-word commands: touchpad lock packs the on/off
/// nibble into the second byte over op `0x14`, the backlight level goes
/// into the third byte over op `0x23`.
pub const fn pack(shift: u32, value: u32, op: u32) -> u32 {
    (value << shift) | op
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_wire_reverses_bytes() {
        assert_eq!(swap_wire(0x12345678), 0x78563412);
        assert_eq!(swap_wire(0x000000FF), 0xFF000000);
        assert_eq!(swap_wire(0), 0);
    }

    #[test]
    fn swap_wire_is_its_own_inverse() {
        for value in [0u32, 1, 0x12345678, 0xDEADBEEF, u32::MAX, 1 << 17, 1 << 29] {
            assert_eq!(swap_wire(swap_wire(value)), value);
        }
    }

    #[test]
    fn bit_tests_individual_positions() {
        assert!(bit(1 << 17, 17));
        assert!(!bit(1 << 17, 16));
        assert!(bit(u32::MAX, 0));
        assert!(bit(u32::MAX, 31));
        assert!(!bit(0, 31));
    }

    #[test]
    #[should_panic]
    fn bit_index_out_of_range_panics() {
        bit(1, 32);
    }

    #[test]
    fn pack_composes_one_word_commands() {
        // Touchpad lock on: sub-command 0xA over op 0x14.
        assert_eq!(pack(8, 0xA, 0x14), 0xA14);
        // Backlight high: level 2 over op 0x23.
        assert_eq!(pack(16, 2, 0x23), 0x20023);
        assert_eq!(pack(16, 0, 0x23), 0x23);
    }
}
