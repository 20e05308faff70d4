use crate::error::Result;
use crate::models::WindowHandle;
use crate::services::process_launcher::{ProcessHandle, ProcessLauncher};
use crate::services::window_manager::{WindowActuator, WindowRegistry};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

const FAKE_PID_BASE: u32 = 40_000;
const FAKE_HWND_BASE: isize = 0x0001_0000;

/// Эмуляция рабочего стола для режима сухого запуска.
///
/// Перед запуском существует одно "чужое" окно клиента; каждый запуск
/// добавляет ровно одно новое окно, которое становится видно на одном из
/// следующих снимков (по одному окну за снимок).
pub struct DryRunDesktop {
    state: Mutex<DesktopState>,
}

struct DesktopState {
    launched: usize,
    windows: BTreeSet<WindowHandle>,
    revealed: usize,
}

impl Default for DryRunDesktop {
    fn default() -> Self {
        Self::new()
    }
}

impl DryRunDesktop {
    pub fn new() -> Self {
        info!("Dry-run режим - окна и процессы клиента эмулируются");
        let preexisting = WindowHandle::from_raw(FAKE_HWND_BASE);
        Self {
            state: Mutex::new(DesktopState {
                launched: 0,
                windows: BTreeSet::from([preexisting]),
                revealed: 0,
            }),
        }
    }
}

impl ProcessLauncher for DryRunDesktop {
    fn launch(&self, install_dir: &Path) -> Result<ProcessHandle> {
        let mut state = self.state.lock();
        state.launched += 1;
        let pid = FAKE_PID_BASE + state.launched as u32;
        info!("[DRY RUN] Запуск клиента из {} (pid {})", install_dir.display(), pid);
        Ok(ProcessHandle::detached(pid))
    }
}

impl WindowRegistry for DryRunDesktop {
    fn snapshot(&self) -> Result<BTreeSet<WindowHandle>> {
        let mut state = self.state.lock();
        if state.revealed < state.launched {
            state.revealed += 1;
            let handle = WindowHandle::from_raw(FAKE_HWND_BASE + state.revealed as isize);
            info!("[DRY RUN] Появилось окно клиента {}", handle);
            state.windows.insert(handle);
        }
        Ok(state.windows.clone())
    }
}

impl WindowActuator for DryRunDesktop {
    fn send_keys(&self, handle: WindowHandle, text: &str) -> Result<()> {
        info!("[DRY RUN] Ввод {} символов в окно {}", text.chars().count(), handle);
        Ok(())
    }

    fn set_title(&self, handle: WindowHandle, title: &str) -> Result<()> {
        info!("[DRY RUN] Заголовок окна {}: {}", handle, title);
        Ok(())
    }

    fn move_to(&self, handle: WindowHandle, x: i32, y: i32) -> Result<()> {
        info!("[DRY RUN] Перемещение окна {} в ({}, {})", handle, x, y);
        Ok(())
    }
}
