//! Command handlers for the CLI application.
//!
//! This module organizes command handlers by category:
//! - `query`: Read-only commands (status and per-feature reads)
//! - `set`: State-changing commands (per-feature writes)
//! - `listen`: The foreground hotkey listener

pub mod listen;
pub mod query;
pub mod set;

use std::sync::Arc;

use legion_energy::ControlChannel;

/// Result type for command handlers
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Open the control device and run a closure with it.
/// Prints an error and returns Ok(()) if the device is unavailable.
pub fn with_channel<F>(f: F) -> CommandResult
where
    F: FnOnce(Arc<dyn ControlChannel>) -> CommandResult,
{
    match legion_energy::open_default() {
        Ok(channel) => f(channel),
        Err(e) => {
            eprintln!("No EnergyDrv device: {e}");
            Ok(())
        }
    }
}

/// Print one feature's state, as JSON or as plain text.
pub fn print_state(json: bool, feature: &str, state: impl std::fmt::Display + serde::Serialize) {
    if json {
        println!(
            "{}",
            serde_json::json!({ "feature": feature, "state": state })
        );
    } else {
        println!("{feature}: {state}");
    }
}
