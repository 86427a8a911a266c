//! Read-only command handlers.

use std::sync::Arc;

use legion_features::{
    AlwaysOnUsb, BatteryCharge, FnLock, NightCharge, SmartFnLock, TouchpadLock, WhiteBacklight,
};
use serde::Serialize;

use super::{print_state, with_channel, CommandResult};

#[derive(Serialize)]
struct StatusReport {
    battery: legion_features::ChargeMode,
    night_charge: legion_features::NightChargeState,
    #[serde(skip_serializing_if = "Option::is_none")]
    backlight: Option<legion_features::BacklightLevel>,
    fn_lock: legion_features::FnLockState,
    smart_fn_lock: legion_features::SmartFnLockState,
    touchpad_lock: legion_features::TouchpadLockState,
    always_on_usb: legion_features::AlwaysOnUsbMode,
}

/// Show every feature's current state.
pub fn status(json: bool) -> CommandResult {
    with_channel(|channel| {
        let battery = BatteryCharge::new(Arc::clone(&channel));
        let night = NightCharge::new(Arc::clone(&channel));
        let backlight = WhiteBacklight::new(Arc::clone(&channel));
        let fnlock = FnLock::new(Arc::clone(&channel));
        let smart = SmartFnLock::new(Arc::clone(&channel));
        let touchpad = TouchpadLock::new(Arc::clone(&channel));
        let usb = AlwaysOnUsb::new(channel);

        // Constructors already queried once; read the cached states.
        let report = StatusReport {
            battery: battery.last_known(),
            night_charge: night.last_known(),
            backlight: backlight.supported().then(|| backlight.last_known()),
            fn_lock: fnlock.last_known(),
            smart_fn_lock: smart.last_known(),
            touchpad_lock: touchpad.last_known(),
            always_on_usb: usb.last_known(),
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("Battery charge mode: {}", report.battery);
            println!("Night charge:        {}", report.night_charge);
            match report.backlight {
                Some(level) => println!("Keyboard backlight:  {level}"),
                None => println!("Keyboard backlight:  not present"),
            }
            println!("Fn lock:             {}", report.fn_lock);
            println!("Smart Fn lock:       {}", report.smart_fn_lock);
            println!("Touchpad lock:       {}", report.touchpad_lock);
            println!("Always-on USB:       {}", report.always_on_usb);
        }
        Ok(())
    })
}

pub fn battery(json: bool) -> CommandResult {
    with_channel(|channel| {
        let mode = BatteryCharge::new(channel).mode()?;
        print_state(json, "battery", mode);
        Ok(())
    })
}

pub fn backlight(json: bool) -> CommandResult {
    with_channel(|channel| {
        let backlight = WhiteBacklight::new(channel);
        if !backlight.supported() {
            eprintln!("This model has no white keyboard backlight");
            return Ok(());
        }
        print_state(json, "backlight", backlight.level()?);
        Ok(())
    })
}

pub fn night_charge(json: bool) -> CommandResult {
    with_channel(|channel| {
        print_state(json, "night-charge", NightCharge::new(channel).state()?);
        Ok(())
    })
}

pub fn usb(json: bool) -> CommandResult {
    with_channel(|channel| {
        print_state(json, "always-on-usb", AlwaysOnUsb::new(channel).mode()?);
        Ok(())
    })
}

pub fn fn_lock(json: bool) -> CommandResult {
    with_channel(|channel| {
        print_state(json, "fn-lock", FnLock::new(channel).state()?);
        Ok(())
    })
}

pub fn smart_fn_lock(json: bool) -> CommandResult {
    with_channel(|channel| {
        print_state(json, "smart-fn-lock", SmartFnLock::new(channel).state()?);
        Ok(())
    })
}

pub fn touchpad(json: bool) -> CommandResult {
    with_channel(|channel| {
        print_state(json, "touchpad-lock", TouchpadLock::new(channel).state()?);
        Ok(())
    })
}
