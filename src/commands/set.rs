//! State-changing command handlers.

use legion_features::{
    AlwaysOnUsb, AlwaysOnUsbMode, BacklightLevel, BatteryCharge, ChargeMode, FnLock, FnLockState,
    NightCharge, NightChargeState, SmartFnLock, SmartFnLockState, TouchpadLock, TouchpadLockState,
    WhiteBacklight,
};

use super::{print_state, with_channel, CommandResult};
use crate::mirror;

pub fn battery(mode: ChargeMode, json: bool) -> CommandResult {
    with_channel(|channel| {
        BatteryCharge::new(channel).set_mode(mode)?;
        mirror::charge_mode(mode);
        print_state(json, "battery", mode);
        Ok(())
    })
}

pub fn backlight(level: BacklightLevel, json: bool) -> CommandResult {
    with_channel(|channel| {
        let backlight = WhiteBacklight::new(channel);
        if !backlight.supported() {
            eprintln!("This model has no white keyboard backlight");
            return Ok(());
        }
        backlight.set_level(level)?;
        print_state(json, "backlight", level);
        Ok(())
    })
}

pub fn night_charge(state: NightChargeState, json: bool) -> CommandResult {
    with_channel(|channel| {
        NightCharge::new(channel).set_state(state)?;
        print_state(json, "night-charge", state);
        Ok(())
    })
}

pub fn usb(mode: AlwaysOnUsbMode, json: bool) -> CommandResult {
    with_channel(|channel| {
        AlwaysOnUsb::new(channel).set_mode(mode)?;
        print_state(json, "always-on-usb", mode);
        Ok(())
    })
}

pub fn fn_lock(state: FnLockState, json: bool) -> CommandResult {
    with_channel(|channel| {
        FnLock::new(channel).set_state(state)?;
        print_state(json, "fn-lock", state);
        Ok(())
    })
}

pub fn smart_fn_lock(state: SmartFnLockState, json: bool) -> CommandResult {
    with_channel(|channel| {
        SmartFnLock::new(channel).set_state(state)?;
        print_state(json, "smart-fn-lock", state);
        Ok(())
    })
}

pub fn touchpad(state: TouchpadLockState, json: bool) -> CommandResult {
    with_channel(|channel| {
        TouchpadLock::new(channel).set_state(state)?;
        print_state(json, "touchpad-lock", state);
        Ok(())
    })
}
