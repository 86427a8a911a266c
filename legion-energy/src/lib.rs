//! Control-channel layer for the Lenovo Legion EnergyDrv device
//!
//! Legion firmware features (battery charge mode, Fn lock, white
//! keyboard backlight, always-on USB, ...) are not reachable through
//! any documented API — only through an undocumented DeviceIoControl
//! protocol on `\\.\EnergyDrv`. This crate owns that channel:
//!
//! - opening and holding the control device handle
//! - exchanging fixed-size 32-bit control words, one at a time
//! - decoding helpers for the per-family bit layouts
//! - listening for the driver's asynchronous key notifications on a
//!   second, independent handle
//!
//! Feature semantics (which bit means what, which code sequence moves
//! the hardware between modes) live in `legion-features`; this crate
//! stays policy-free.

pub mod codec;
pub mod error;
pub mod events;
pub mod ioctl;
pub mod mock;

mod channel;
#[cfg(windows)]
mod device;

pub use channel::{open_default, probe, ControlChannel};
#[cfg(windows)]
pub use device::{DriverEventSource, EnergyDevice};
pub use error::ChannelError;
pub use events::{EventSource, Hotkey, HotkeyHandler, KeyListener};
