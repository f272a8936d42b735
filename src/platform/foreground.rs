//! Foreground process lookup
//!
//! Only Windows exposes a process for the focused window in a way we can query
//! cheaply. Everywhere else the probe reports "unknown", which never matches a
//! suppression target.

use tracing::info;

/// Capability for naming the process that owns the focused window
pub trait ForegroundProbe {
    /// Executable file name of the foreground process, or `""` if it cannot be determined
    fn foreground_process_name(&mut self) -> String;
}

/// Probe for platforms without foreground window support
#[derive(Debug, Default)]
pub struct UnsupportedForegroundProbe;

impl ForegroundProbe for UnsupportedForegroundProbe {
    fn foreground_process_name(&mut self) -> String {
        String::new()
    }
}

/// Best probe available on this platform
pub fn default_probe() -> Box<dyn ForegroundProbe> {
    #[cfg(windows)]
    {
        info!("Using Win32 foreground window probe");
        Box::new(Win32ForegroundProbe)
    }
    #[cfg(not(windows))]
    {
        info!("Foreground probe unsupported on this platform, suppression will never trigger");
        Box::new(UnsupportedForegroundProbe)
    }
}

#[cfg(windows)]
pub use win32::Win32ForegroundProbe;

#[cfg(windows)]
mod win32 {
    use super::ForegroundProbe;
    use std::path::Path;
    use tracing::trace;
    use windows_sys::Win32::Foundation::CloseHandle;
    use windows_sys::Win32::System::Threading::{
        OpenProcess, QueryFullProcessImageNameW, PROCESS_QUERY_LIMITED_INFORMATION,
    };
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        GetForegroundWindow, GetWindowThreadProcessId,
    };

    const IMAGE_PATH_CAPACITY: usize = 4096;

    /// Foreground window → owning pid → process image path → file name
    #[derive(Debug, Default)]
    pub struct Win32ForegroundProbe;

    impl ForegroundProbe for Win32ForegroundProbe {
        fn foreground_process_name(&mut self) -> String {
            // SAFETY: plain Win32 queries; the process handle is closed before returning
            // and the buffer outlives the call that fills it.
            unsafe {
                let hwnd = GetForegroundWindow();
                if hwnd.is_null() {
                    return String::new();
                }

                let mut pid: u32 = 0;
                GetWindowThreadProcessId(hwnd, &mut pid);
                if pid == 0 {
                    return String::new();
                }

                let process = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, 0, pid);
                if process.is_null() {
                    trace!("OpenProcess failed for pid {}", pid);
                    return String::new();
                }

                let mut buf = vec![0u16; IMAGE_PATH_CAPACITY];
                let mut len = buf.len() as u32;
                let ok = QueryFullProcessImageNameW(process, 0, buf.as_mut_ptr(), &mut len);
                CloseHandle(process);
                if ok == 0 {
                    return String::new();
                }

                let path = String::from_utf16_lossy(&buf[..len as usize]);
                Path::new(&path)
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default()
            }
        }
    }
}
