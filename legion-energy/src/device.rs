//! Windows backend: handles to `\\.\EnergyDrv`.

use std::ffi::c_void;
use std::mem;
use std::ptr;

use parking_lot::Mutex;
use tracing::debug;
use windows_sys::Win32::Foundation::{
    CloseHandle, GetLastError, GENERIC_READ, GENERIC_WRITE, HANDLE, INVALID_HANDLE_VALUE,
    WAIT_OBJECT_0,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
};
use windows_sys::Win32::System::Threading::{CreateEventW, SetEvent, WaitForSingleObject, INFINITE};
use windows_sys::Win32::System::IO::DeviceIoControl;

use crate::channel::ControlChannel;
use crate::error::ChannelError;
use crate::events::EventSource;
use crate::ioctl;

fn wide_path(path: &str) -> Vec<u16> {
    path.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Open the control device with shared read/write mode so a second
/// independent handle (the key listener's) can coexist.
fn open_energy_handle() -> Result<HANDLE, ChannelError> {
    let path = wide_path(ioctl::DEVICE_PATH);
    let handle = unsafe {
        CreateFileW(
            path.as_ptr(),
            GENERIC_READ | GENERIC_WRITE,
            FILE_SHARE_READ | FILE_SHARE_WRITE,
            ptr::null(),
            OPEN_EXISTING,
            FILE_ATTRIBUTE_NORMAL,
            ptr::null_mut(),
        )
    };
    if handle == INVALID_HANDLE_VALUE || handle.is_null() {
        let code = unsafe { GetLastError() };
        return Err(ChannelError::Unsupported(format!(
            "cannot open {} (os error {code})",
            ioctl::DEVICE_PATH
        )));
    }
    Ok(handle)
}

/// One 4-byte-in / 4-byte-out DeviceIoControl exchange on a raw handle.
fn raw_exchange(handle: HANDLE, ioctl_code: u32, payload: u32) -> Result<u32, ChannelError> {
    let mut reply: u32 = 0;
    let mut returned: u32 = 0;
    let ok = unsafe {
        DeviceIoControl(
            handle,
            ioctl_code,
            &payload as *const u32 as *const c_void,
            mem::size_of::<u32>() as u32,
            &mut reply as *mut u32 as *mut c_void,
            mem::size_of::<u32>() as u32,
            &mut returned,
            ptr::null_mut(),
        )
    };
    if ok == 0 {
        let code = unsafe { GetLastError() } as i32;
        debug!(
            "{} exchange 0x{payload:X} failed (os error {code})",
            ioctl::name(ioctl_code)
        );
        return Err(ChannelError::Io {
            ioctl: ioctl_code,
            code,
        });
    }
    debug!(
        "{} 0x{payload:X} -> 0x{reply:X}",
        ioctl::name(ioctl_code)
    );
    Ok(reply)
}

/// Owns the feature-control handle to the EnergyDrv device.
///
/// The internal mutex keeps at most one control exchange in flight on
/// this handle, so concurrent feature toggles from different threads
/// serialize instead of interleaving a transition sequence.
pub struct EnergyDevice {
    handle: Mutex<HANDLE>,
}

// HANDLE is a raw pointer; it is only dereferenced by the kernel and
// only touched here under the mutex.
unsafe impl Send for EnergyDevice {}
unsafe impl Sync for EnergyDevice {}

impl EnergyDevice {
    /// Open the control device. Fails with `Unsupported` when the
    /// vendor driver is not installed.
    pub fn open() -> Result<Self, ChannelError> {
        let handle = open_energy_handle()?;
        debug!("EnergyDrv control handle opened");
        Ok(Self {
            handle: Mutex::new(handle),
        })
    }

    /// Release the handle. Safe to call more than once.
    pub fn close(&self) {
        let mut handle = self.handle.lock();
        if *handle != INVALID_HANDLE_VALUE {
            unsafe { CloseHandle(*handle) };
            *handle = INVALID_HANDLE_VALUE;
        }
    }
}

impl ControlChannel for EnergyDevice {
    fn exchange(&self, ioctl_code: u32, payload: u32) -> Result<u32, ChannelError> {
        let handle = self.handle.lock();
        if *handle == INVALID_HANDLE_VALUE {
            return Err(ChannelError::Unsupported("control handle closed".into()));
        }
        raw_exchange(*handle, ioctl_code, payload)
    }
}

impl Drop for EnergyDevice {
    fn drop(&mut self) {
        self.close();
    }
}

/// Second, independent EnergyDrv handle bound to an auto-reset event
/// the driver signals on each special key press.
pub struct DriverEventSource {
    handle: HANDLE,
    event: HANDLE,
}

unsafe impl Send for DriverEventSource {}
unsafe impl Sync for DriverEventSource {}

impl DriverEventSource {
    /// Open the notification handle, create the wait primitive,
    /// register it with the driver, and clear any stale key value.
    pub fn open() -> Result<Self, ChannelError> {
        let handle = open_energy_handle()?;
        // Auto-reset: each driver signal wakes exactly one wait.
        let event = unsafe { CreateEventW(ptr::null(), 0, 0, ptr::null()) };
        if event.is_null() {
            let code = unsafe { GetLastError() };
            unsafe { CloseHandle(handle) };
            return Err(ChannelError::Unsupported(format!(
                "cannot create wait event (os error {code})"
            )));
        }

        let source = Self { handle, event };
        source.bind_wait_handle()?;
        // Throwaway read to clear a pending value from before we bound.
        let _ = source.read_key_value();
        debug!("EnergyDrv key notification source bound");
        Ok(source)
    }

    /// The driver expects a 16-byte buffer whose first word carries the
    /// event handle value.
    fn bind_wait_handle(&self) -> Result<(), ChannelError> {
        let mut buf = [0u8; 16];
        buf[..8].copy_from_slice(&(self.event as usize as u64).to_le_bytes());
        let mut returned: u32 = 0;
        let ok = unsafe {
            DeviceIoControl(
                self.handle,
                ioctl::ENERGY_KEY_WAIT_HANDLE,
                buf.as_ptr() as *const c_void,
                buf.len() as u32,
                ptr::null_mut(),
                0,
                &mut returned,
                ptr::null_mut(),
            )
        };
        if ok == 0 {
            let code = unsafe { GetLastError() } as i32;
            return Err(ChannelError::Io {
                ioctl: ioctl::ENERGY_KEY_WAIT_HANDLE,
                code,
            });
        }
        Ok(())
    }
}

impl EventSource for DriverEventSource {
    fn wait(&self) -> Result<(), ChannelError> {
        let rc = unsafe { WaitForSingleObject(self.event, INFINITE) };
        if rc == WAIT_OBJECT_0 {
            Ok(())
        } else {
            Err(ChannelError::Io {
                ioctl: ioctl::ENERGY_KEY_WAIT_HANDLE,
                code: rc as i32,
            })
        }
    }

    fn wake(&self) {
        unsafe { SetEvent(self.event) };
    }

    fn read_key_value(&self) -> Result<u32, ChannelError> {
        raw_exchange(self.handle, ioctl::ENERGY_KEY_VALUE, 0)
    }
}

impl Drop for DriverEventSource {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.event);
            CloseHandle(self.handle);
        }
    }
}
