//! Vantage registry mirror.
//!
//! Lenovo Vantage reads the charge mode from its own registry value
//! instead of the device, so a write through us would leave it showing
//! stale state. Mirroring is best-effort: a failure is logged and never
//! fails the command.

use legion_features::ChargeMode;

#[cfg(windows)]
pub fn charge_mode(mode: ChargeMode) {
    use tracing::debug;
    use windows_sys::Win32::Foundation::ERROR_SUCCESS;
    use windows_sys::Win32::System::Registry::{
        RegCloseKey, RegCreateKeyExW, RegSetValueExW, HKEY, HKEY_CURRENT_USER, KEY_SET_VALUE,
        REG_OPTION_NON_VOLATILE, REG_SZ,
    };

    const SUBKEY: &str = r"Software\Lenovo\VantageService\AddinData\IdeaNotebookAddin";
    const VALUE_NAME: &str = "BatteryChargeMode";

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    let subkey = wide(SUBKEY);
    let value_name = wide(VALUE_NAME);
    let data = wide(mode.mirror_value());

    unsafe {
        let mut key: HKEY = std::ptr::null_mut();
        let rc = RegCreateKeyExW(
            HKEY_CURRENT_USER,
            subkey.as_ptr(),
            0,
            std::ptr::null(),
            REG_OPTION_NON_VOLATILE,
            KEY_SET_VALUE,
            std::ptr::null(),
            &mut key,
            std::ptr::null_mut(),
        );
        if rc != ERROR_SUCCESS {
            debug!("Vantage mirror key open failed: {rc}");
            return;
        }
        let rc = RegSetValueExW(
            key,
            value_name.as_ptr(),
            0,
            REG_SZ,
            data.as_ptr() as *const u8,
            (data.len() * 2) as u32,
        );
        if rc != ERROR_SUCCESS {
            debug!("Vantage mirror write failed: {rc}");
        }
        RegCloseKey(key);
    }
}

/// No Vantage on other platforms, nothing to mirror.
#[cfg(not(windows))]
pub fn charge_mode(_mode: ChargeMode) {}
