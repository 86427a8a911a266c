// CLI definitions using clap

use clap::{Parser, Subcommand};
use legion_features::{
    AlwaysOnUsbMode, BacklightLevel, ChargeMode, FnLockState, NightChargeState, SmartFnLockState,
    TouchpadLockState,
};

#[derive(Parser)]
#[command(name = "legionctl")]
#[command(author, version, about = "Lenovo Legion firmware feature control")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Print results as JSON (for scripts)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show every feature's current state
    #[command(visible_aliases = ["stat", "all"])]
    Status,

    /// Get or set the battery charge mode
    #[command(visible_aliases = ["bat", "b"])]
    Battery {
        /// Target mode (conservation, normal, rapid); omit to query
        mode: Option<ChargeMode>,
    },

    /// Get or set the white keyboard backlight level
    #[command(visible_aliases = ["light", "kbd"])]
    Backlight {
        /// Target level (off, low, high); omit to query
        level: Option<BacklightLevel>,
    },

    /// Get or set overnight trickle charging
    #[command(visible_alias = "nc")]
    NightCharge {
        /// Target state (on, off); omit to query
        state: Option<NightChargeState>,
    },

    /// Get or set USB charging with the lid closed
    #[command(visible_alias = "aou")]
    Usb {
        /// Target mode (off, sleep, always); omit to query
        mode: Option<AlwaysOnUsbMode>,
    },

    /// Get or set Fn lock (media keys without holding Fn)
    #[command(name = "fnlock", visible_alias = "fn")]
    FnLock {
        /// Target state (on, off); omit to query
        state: Option<FnLockState>,
    },

    /// Get or set smart Fn lock (auto-disable in games)
    #[command(name = "smart-fnlock", visible_alias = "sfn")]
    SmartFnLock {
        /// Target state (on, off); omit to query
        state: Option<SmartFnLockState>,
    },

    /// Get or set the touchpad lock
    #[command(visible_aliases = ["pad", "tp"])]
    Touchpad {
        /// Target state (on, off); omit to query
        state: Option<TouchpadLockState>,
    },

    /// Listen for hardware hotkeys (Fn+F4/F8/F10/Space) until Ctrl-C
    #[command(visible_alias = "keys")]
    Listen,
}
