//! End-to-end transition behaviour against the scripted channel:
//! sequence ordering, abort handling, and cache recovery.

use std::sync::Arc;

use legion_energy::codec::swap_wire;
use legion_energy::ioctl;
use legion_energy::mock::MockChannel;
use legion_features::{
    AlwaysOnUsb, AlwaysOnUsbMode, BatteryCharge, ChargeMode, FeatureError, FnLock, FnLockState,
    NightCharge, NightChargeState, TouchpadLock, TouchpadLockState,
};

const BATTERY_QUERY: u32 = 0xFF;

fn rapid_status() -> u32 {
    // Charging with the rapid flag, pre-reversed to wire order.
    swap_wire((1 << 17) | (1 << 26))
}

fn conservation_status() -> u32 {
    swap_wire(1 << 29)
}

#[test]
fn battery_primes_when_leaving_rapid_charge() {
    let mock = Arc::new(MockChannel::new());
    mock.reply(ioctl::ENERGY_BATTERY_CHARGE_MODE, BATTERY_QUERY, rapid_status());

    let battery = BatteryCharge::new(mock.clone());
    assert_eq!(battery.last_known(), ChargeMode::RapidCharge);

    battery.set_mode(ChargeMode::Conservation).unwrap();
    // Startup query, then exit-rapid before enter-conservation.
    assert_eq!(
        mock.sent_to(ioctl::ENERGY_BATTERY_CHARGE_MODE),
        vec![BATTERY_QUERY, 0x8, 0x3]
    );
    assert_eq!(battery.last_known(), ChargeMode::Conservation);
}

#[test]
fn battery_abort_partway_invalidates_the_cache() {
    let mock = Arc::new(MockChannel::new());
    mock.reply(ioctl::ENERGY_BATTERY_CHARGE_MODE, BATTERY_QUERY, rapid_status());
    let battery = BatteryCharge::new(mock.clone());

    // Exit-rapid lands, enter-conservation fails.
    mock.fail_on(ioctl::ENERGY_BATTERY_CHARGE_MODE, 0x3);
    let err = battery.set_mode(ChargeMode::Conservation).unwrap_err();
    assert!(matches!(
        err,
        FeatureError::SequenceAborted { sent: 1, total: 2, .. }
    ));

    // The device is half-transitioned; the next set re-queries before
    // choosing a sequence.
    mock.clear_failures();
    mock.reply(
        ioctl::ENERGY_BATTERY_CHARGE_MODE,
        BATTERY_QUERY,
        conservation_status(),
    );
    battery.set_mode(ChargeMode::RapidCharge).unwrap();

    let sent = mock.sent_to(ioctl::ENERGY_BATTERY_CHARGE_MODE);
    // startup query, 0x8, failed 0x3, recovery query, then the primed
    // conservation -> rapid pair.
    assert_eq!(sent, vec![BATTERY_QUERY, 0x8, 0x3, BATTERY_QUERY, 0x5, 0x7]);
}

#[test]
fn battery_first_code_failure_keeps_the_cache() {
    let mock = Arc::new(MockChannel::new());
    mock.reply(ioctl::ENERGY_BATTERY_CHARGE_MODE, BATTERY_QUERY, rapid_status());
    let battery = BatteryCharge::new(mock.clone());

    mock.fail_on(ioctl::ENERGY_BATTERY_CHARGE_MODE, 0x8);
    let err = battery.set_mode(ChargeMode::Normal).unwrap_err();
    assert!(matches!(err, FeatureError::Channel(_)));

    // Nothing was applied, so the cached mode still drives the next
    // sequence without a recovery query.
    mock.clear_failures();
    battery.set_mode(ChargeMode::Conservation).unwrap();
    assert_eq!(
        mock.sent_to(ioctl::ENERGY_BATTERY_CHARGE_MODE),
        vec![BATTERY_QUERY, 0x8, 0x8, 0x3]
    );
}

#[test]
fn always_on_usb_sends_its_pair_in_order() {
    let mock = Arc::new(MockChannel::new());
    let usb = AlwaysOnUsb::new(mock.clone());

    usb.set_mode(AlwaysOnUsbMode::Always).unwrap();
    usb.set_mode(AlwaysOnUsbMode::Off).unwrap();
    assert_eq!(
        mock.sent_to(ioctl::ENERGY_SETTINGS),
        vec![0x2, 0xA, 0x13, 0xB, 0x12]
    );
}

#[test]
fn fnlock_write_is_verified_by_read_back() {
    let mock = Arc::new(MockChannel::new());
    let fnlock = FnLock::new(mock.clone());

    // Firmware honours the write: the read-back shows bit 10.
    mock.reply(ioctl::ENERGY_SETTINGS, 0x2, 1 << 10);
    fnlock.set_state(FnLockState::On).unwrap();
    assert_eq!(fnlock.last_known(), FnLockState::On);

    // Firmware drops the write: the read-back still shows bit 10 set
    // although we asked for off.
    let err = fnlock.set_state(FnLockState::Off).unwrap_err();
    assert!(matches!(err, FeatureError::VerificationFailed));
    assert_eq!(fnlock.last_known(), FnLockState::On);
}

#[test]
fn unreachable_device_seeds_safe_baselines() {
    let mock = Arc::new(MockChannel::new());
    mock.fail_on(ioctl::ENERGY_BATTERY_CHARGE_MODE, BATTERY_QUERY);
    mock.fail_on(ioctl::ENERGY_BATTERY_NIGHT_CHARGE, 0x11);
    mock.fail_on(ioctl::ENERGY_SETTINGS, 0x2);
    mock.fail_on(ioctl::ENERGY_SETTINGS, 0x13);

    assert_eq!(
        BatteryCharge::new(mock.clone()).last_known(),
        ChargeMode::Normal
    );
    assert_eq!(
        NightCharge::new(mock.clone()).last_known(),
        NightChargeState::Off
    );
    assert_eq!(FnLock::new(mock.clone()).last_known(), FnLockState::Off);
    assert_eq!(
        TouchpadLock::new(mock.clone()).last_known(),
        TouchpadLockState::Off
    );
    assert_eq!(
        AlwaysOnUsb::new(mock.clone()).last_known(),
        AlwaysOnUsbMode::Off
    );
}
