use crate::error::Result;
use std::path::Path;
use std::process::Child;
use tracing::debug;

/// Trait for process launchers that start one client instance per call
pub trait ProcessLauncher: Send + Sync {
    /// Start the client from `install_dir`
    fn launch(&self, install_dir: &Path) -> Result<ProcessHandle>;
}

/// Дескриптор запущенного клиента.
///
/// Клиенты должны переживать лаунчер, поэтому `release` только закрывает
/// дескриптор и никогда не завершает процесс.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: u32,
    child: Option<Child>,
}

impl ProcessHandle {
    pub fn spawned(child: Child) -> Self {
        Self {
            pid: child.id(),
            child: Some(child),
        }
    }

    /// Дескриптор без реального процесса (dry-run)
    pub fn detached(pid: u32) -> Self {
        Self { pid, child: None }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn release(self) {
        debug!("Освобождение дескриптора процесса {}", self.pid);
        // Drop у std::process::Child не убивает процесс
        drop(self.child);
    }
}
