//! Legion Feature Control CLI
//!
//! A command-line interface for Lenovo Legion firmware features:
//! battery charge mode, keyboard backlight, Fn lock, touchpad lock,
//! always-on USB, night charge, and the hardware hotkey listener.

use clap::Parser;
use tracing_subscriber::EnvFilter;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers (split from main.rs)
mod commands;

// Vantage registry mirror
mod mirror;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("legionctl=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    match cli.command {
        // Default: show all feature states
        None | Some(Commands::Status) => {
            commands::query::status(json)?;
        }

        Some(Commands::Battery { mode }) => match mode {
            Some(mode) => commands::set::battery(mode, json)?,
            None => commands::query::battery(json)?,
        },
        Some(Commands::Backlight { level }) => match level {
            Some(level) => commands::set::backlight(level, json)?,
            None => commands::query::backlight(json)?,
        },
        Some(Commands::NightCharge { state }) => match state {
            Some(state) => commands::set::night_charge(state, json)?,
            None => commands::query::night_charge(json)?,
        },
        Some(Commands::Usb { mode }) => match mode {
            Some(mode) => commands::set::usb(mode, json)?,
            None => commands::query::usb(json)?,
        },
        Some(Commands::FnLock { state }) => match state {
            Some(state) => commands::set::fn_lock(state, json)?,
            None => commands::query::fn_lock(json)?,
        },
        Some(Commands::SmartFnLock { state }) => match state {
            Some(state) => commands::set::smart_fn_lock(state, json)?,
            None => commands::query::smart_fn_lock(json)?,
        },
        Some(Commands::Touchpad { state }) => match state {
            Some(state) => commands::set::touchpad(state, json)?,
            None => commands::query::touchpad(json)?,
        },

        Some(Commands::Listen) => {
            commands::listen::run()?;
        }
    }

    Ok(())
}
