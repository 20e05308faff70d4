use crate::error::Result;
use crate::launcher_error;
use crate::models::WindowHandle;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use tracing::{debug, info};
use windows::core::{BOOL, PCWSTR};
use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetClassNameW, PostMessageW, SetWindowPos, SetWindowTextW, SWP_NOACTIVATE,
    SWP_NOSIZE, SWP_NOZORDER, WM_CHAR,
};

// Имена классов окон в Win32 не длиннее 256 символов
const CLASS_NAME_CAPACITY: usize = 256;

/// Состояние, которое EnumWindows передаёт в callback через LPARAM
struct EnumState<'a> {
    window_class: &'a str,
    handles: BTreeSet<WindowHandle>,
}

pub struct Win32WindowManager {
    window_class: String,
    // Грубая блокировка на время каждого отдельного вызова WinAPI
    os_lock: Mutex<()>,
}

impl Win32WindowManager {
    pub fn new(window_class: String) -> Self {
        info!("Инициализация Win32WindowManager для класса окон '{}'", window_class);
        Self {
            window_class,
            os_lock: Mutex::new(()),
        }
    }
}

fn to_hwnd(handle: WindowHandle) -> HWND {
    HWND(handle.raw() as *mut _)
}

fn to_wide(text: &str) -> Vec<u16> {
    text.encode_utf16().chain(std::iter::once(0)).collect()
}

unsafe extern "system" fn collect_client_windows(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let state = &mut *(lparam.0 as *mut EnumState<'_>);

    let mut buf = [0u16; CLASS_NAME_CAPACITY];
    let len = GetClassNameW(hwnd, &mut buf);
    if len > 0 && String::from_utf16_lossy(&buf[..len as usize]) == state.window_class {
        state.handles.insert(WindowHandle::from_raw(hwnd.0 as isize));
    }

    // Продолжаем перечисление
    BOOL::from(true)
}

impl super::WindowRegistry for Win32WindowManager {
    fn snapshot(&self) -> Result<BTreeSet<WindowHandle>> {
        let mut state = EnumState {
            window_class: &self.window_class,
            handles: BTreeSet::new(),
        };

        {
            let _guard = self.os_lock.lock();
            unsafe {
                EnumWindows(
                    Some(collect_client_windows),
                    LPARAM(&mut state as *mut EnumState<'_> as isize),
                )
            }
            .map_err(|e| launcher_error!(window_api, "EnumWindows завершился ошибкой: {}", e))?;
        }

        debug!("Найдено {} окон класса '{}'", state.handles.len(), self.window_class);
        Ok(state.handles)
    }
}

impl super::WindowActuator for Win32WindowManager {
    fn send_keys(&self, handle: WindowHandle, text: &str) -> Result<()> {
        let hwnd = to_hwnd(handle);

        for (i, unit) in text.encode_utf16().enumerate() {
            let _guard = self.os_lock.lock();
            unsafe { PostMessageW(Some(hwnd), WM_CHAR, WPARAM(unit as usize), LPARAM(0)) }
                .map_err(|e| {
                    launcher_error!(
                        window_api,
                        "PostMessageW({}) на символе #{}: {}",
                        handle,
                        i + 1,
                        e
                    )
                })?;
        }

        Ok(())
    }

    fn set_title(&self, handle: WindowHandle, title: &str) -> Result<()> {
        let wide = to_wide(title);

        let _guard = self.os_lock.lock();
        unsafe { SetWindowTextW(to_hwnd(handle), PCWSTR(wide.as_ptr())) }
            .map_err(|e| launcher_error!(window_api, "SetWindowTextW({}): {}", handle, e))
    }

    fn move_to(&self, handle: WindowHandle, x: i32, y: i32) -> Result<()> {
        let _guard = self.os_lock.lock();
        unsafe {
            SetWindowPos(
                to_hwnd(handle),
                None,
                x,
                y,
                0,
                0,
                SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
            )
        }
        .map_err(|e| launcher_error!(window_api, "SetWindowPos({}, {}, {}): {}", handle, x, y, e))
    }
}
