//! Asynchronous hardware key notifications from the EnergyDrv driver.
//!
//! The driver signals a wait primitive when one of the special keys
//! (Fn+F4, Fn+F8, Fn+F10, Fn+Space) is pressed; the last key value is
//! then fetched with a separate control request. One dedicated thread
//! blocks on the wait primitive, so no polling is involved.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::ChannelError;

/// Driver key flags as reported by the KEY_VALUE request.
mod flag {
    /// Fn+F10 — touchpad toggle.
    pub const FN_F10: u32 = 32;
    /// Fn+F4 — microphone toggle.
    pub const FN_F4: u32 = 256;
    /// Fn+Space — white backlight cycle (handled in firmware).
    pub const FN_SPACE: u32 = 4096;
    /// Fn+F8 — airplane mode panel.
    pub const FN_F8: u32 = 8192;
}

/// A decoded hardware key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    MicrophoneToggle,
    TouchpadToggle,
    BacklightCycle,
    AirplaneMode,
}

impl Hotkey {
    /// Decode a raw key value into every recognized flag it carries.
    /// Unknown bits are ignored.
    pub fn decode(raw: u32) -> Vec<Hotkey> {
        let mut keys = Vec::new();
        if raw & flag::FN_F4 != 0 {
            keys.push(Hotkey::MicrophoneToggle);
        }
        if raw & flag::FN_F10 != 0 {
            keys.push(Hotkey::TouchpadToggle);
        }
        if raw & flag::FN_SPACE != 0 {
            keys.push(Hotkey::BacklightCycle);
        }
        if raw & flag::FN_F8 != 0 {
            keys.push(Hotkey::AirplaneMode);
        }
        keys
    }
}

/// Source of driver key notifications.
///
/// `wait` blocks until the driver signals a key event or `wake` is
/// called. The signal is auto-reset: each `wait` consumes one.
pub trait EventSource: Send + Sync {
    fn wait(&self) -> Result<(), ChannelError>;
    fn wake(&self);
    fn read_key_value(&self) -> Result<u32, ChannelError>;
}

/// Receives decoded key presses from the listener thread.
///
/// Dispatch is fire-and-forget; a panicking handler is caught and
/// logged without stopping the listener.
pub trait HotkeyHandler: Send + Sync {
    fn on_hotkey(&self, key: Hotkey);
}

const JOIN_TIMEOUT: Duration = Duration::from_secs(1);

struct Worker {
    source: Arc<dyn EventSource>,
    running: Arc<AtomicBool>,
    thread: JoinHandle<()>,
    done_rx: mpsc::Receiver<()>,
}

/// Dedicated listener for EnergyDrv key notifications.
///
/// Owns exactly one background thread between `start_with` and `stop`.
/// `stop` is safe to call at any point, including before `start_with`
/// and more than once.
#[derive(Default)]
pub struct KeyListener {
    worker: Option<Worker>,
}

impl KeyListener {
    pub fn new() -> Self {
        Self { worker: None }
    }

    /// Whether the listener thread is currently running.
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|w| w.running.load(Ordering::SeqCst))
    }

    /// Start the listener on an already-bound event source.
    pub fn start_with(&mut self, source: Arc<dyn EventSource>, handler: Arc<dyn HotkeyHandler>) {
        if self.worker.is_some() {
            debug!("key listener already running");
            return;
        }
        let running = Arc::new(AtomicBool::new(true));
        let (done_tx, done_rx) = mpsc::channel();
        let loop_source = Arc::clone(&source);
        let loop_running = Arc::clone(&running);
        let thread = std::thread::Builder::new()
            .name("energy-hotkeys".into())
            .spawn(move || {
                listener_loop(loop_source, loop_running, handler);
                let _ = done_tx.send(());
            })
            .expect("failed to spawn hotkey listener thread");
        self.worker = Some(Worker {
            source,
            running,
            thread,
            done_rx,
        });
        info!("hotkey listener started");
    }

    /// Open the driver notification source and start listening.
    ///
    /// A machine without the vendor driver simply has no hotkey
    /// delivery: the failure is logged and the listener stays idle.
    #[cfg(windows)]
    pub fn start(&mut self, handler: Arc<dyn HotkeyHandler>) {
        match crate::device::DriverEventSource::open() {
            Ok(source) => self.start_with(Arc::new(source), handler),
            Err(e) => warn!("hotkey listener unavailable: {e}"),
        }
    }

    /// Stop the listener: clear the running flag, wake the worker once
    /// so it can observe the flag, and join with a bounded timeout.
    /// No-op when not running.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.running.store(false, Ordering::SeqCst);
        worker.source.wake();
        match worker.done_rx.recv_timeout(JOIN_TIMEOUT) {
            Ok(()) => {
                let _ = worker.thread.join();
                info!("hotkey listener stopped");
            }
            Err(_) => {
                warn!("hotkey listener did not stop within {JOIN_TIMEOUT:?}, detaching");
            }
        }
    }
}

impl Drop for KeyListener {
    fn drop(&mut self) {
        self.stop();
    }
}

fn listener_loop(
    source: Arc<dyn EventSource>,
    running: Arc<AtomicBool>,
    handler: Arc<dyn HotkeyHandler>,
) {
    while running.load(Ordering::SeqCst) {
        if let Err(e) = source.wait() {
            warn!("hotkey wait failed: {e}");
            break;
        }
        if !running.load(Ordering::SeqCst) {
            break;
        }
        match source.read_key_value() {
            Ok(raw) => {
                for key in Hotkey::decode(raw) {
                    debug!("driver key event: {key:?} (0x{raw:X})");
                    if catch_unwind(AssertUnwindSafe(|| handler.on_hotkey(key))).is_err() {
                        warn!("hotkey handler panicked on {key:?}");
                    }
                }
            }
            Err(e) => warn!("failed to read key value: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_single_flags() {
        assert_eq!(Hotkey::decode(256), vec![Hotkey::MicrophoneToggle]);
        assert_eq!(Hotkey::decode(32), vec![Hotkey::TouchpadToggle]);
        assert_eq!(Hotkey::decode(4096), vec![Hotkey::BacklightCycle]);
        assert_eq!(Hotkey::decode(8192), vec![Hotkey::AirplaneMode]);
    }

    #[test]
    fn decode_combined_and_unknown_flags() {
        assert_eq!(
            Hotkey::decode(256 | 32),
            vec![Hotkey::MicrophoneToggle, Hotkey::TouchpadToggle]
        );
        assert_eq!(Hotkey::decode(0), Vec::<Hotkey>::new());
        // Unrecognized bits are ignored, recognized ones still decode.
        assert_eq!(Hotkey::decode(0x1 | 8192), vec![Hotkey::AirplaneMode]);
    }
}
