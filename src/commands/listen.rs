//! Foreground hotkey listener.
//!
//! Runs the driver key listener until Ctrl-C and reacts to the keys
//! that need host-side work. Fn+Space is fully handled by the
//! firmware, so the listener only reports the resulting level.

use std::sync::{mpsc, Arc};

use legion_energy::{ControlChannel, Hotkey, HotkeyHandler, KeyListener};
use legion_features::{TouchpadLock, WhiteBacklight};
use tracing::{info, warn};

use super::CommandResult;

struct ActionDispatcher {
    channel: Arc<dyn ControlChannel>,
}

impl HotkeyHandler for ActionDispatcher {
    fn on_hotkey(&self, key: Hotkey) {
        match key {
            Hotkey::TouchpadToggle => {
                let touchpad = TouchpadLock::new(Arc::clone(&self.channel));
                match touchpad.toggle() {
                    Ok(state) => info!("touchpad lock toggled: {state}"),
                    Err(e) => warn!("touchpad toggle failed: {e}"),
                }
            }
            Hotkey::BacklightCycle => {
                // Firmware already cycled the level; report where it landed.
                let backlight = WhiteBacklight::new(Arc::clone(&self.channel));
                info!("backlight cycled to {}", backlight.last_known());
            }
            Hotkey::MicrophoneToggle => {
                // Mute itself is the OS's job; this key is informational.
                info!("microphone toggle pressed");
            }
            Hotkey::AirplaneMode => {
                info!("airplane mode panel requested");
                open_airplane_settings();
            }
        }
    }
}

#[cfg(windows)]
fn open_airplane_settings() {
    if let Err(e) = std::process::Command::new("cmd")
        .args(["/c", "start", "ms-settings:network-airplanemode"])
        .spawn()
    {
        warn!("failed to open airplane mode settings: {e}");
    }
}

#[cfg(not(windows))]
fn open_airplane_settings() {}

/// Listen for driver key events until Ctrl-C.
pub fn run() -> CommandResult {
    let channel = match legion_energy::open_default() {
        Ok(channel) => channel,
        Err(e) => {
            eprintln!("No EnergyDrv device: {e}");
            return Ok(());
        }
    };

    let mut listener = KeyListener::new();
    let handler = Arc::new(ActionDispatcher { channel });

    #[cfg(windows)]
    listener.start(handler);
    #[cfg(not(windows))]
    let _ = handler;

    if !listener.is_running() {
        eprintln!("Hotkey notifications are not available on this machine");
        return Ok(());
    }

    println!("Listening for Fn+F4/F8/F10/Space, Ctrl-C to stop");
    let (stop_tx, stop_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = stop_tx.send(());
    })?;
    let _ = stop_rx.recv();

    listener.stop();
    Ok(())
}
