use crate::config::Config;
use crate::error::Result;
use crate::models::WindowHandle;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Source of client window handles
pub trait WindowRegistry: Send + Sync {
    /// All top-level windows whose class name equals the configured client class
    fn snapshot(&self) -> Result<BTreeSet<WindowHandle>>;
}

/// Synthetic input and placement for a single window
pub trait WindowActuator: Send + Sync {
    /// Post every character of `text` to the window as a separate input event
    fn send_keys(&self, handle: WindowHandle, text: &str) -> Result<()>;

    fn set_title(&self, handle: WindowHandle, title: &str) -> Result<()>;

    /// Move without resizing, changing z-order or activating
    fn move_to(&self, handle: WindowHandle, x: i32, y: i32) -> Result<()>;
}

/// Registry and actuator backed by the same OS layer
pub trait WindowManager: WindowRegistry + WindowActuator {}

impl<T: WindowRegistry + WindowActuator> WindowManager for T {}

/// Factory function to create the OS window manager for the current platform
#[cfg(windows)]
pub fn create_window_manager(config: Arc<Config>) -> Result<Arc<dyn WindowManager>> {
    Ok(Arc::new(super::win32::Win32WindowManager::new(
        config.client.window_class.clone(),
    )))
}

/// Factory function to create the OS window manager for the current platform
#[cfg(not(windows))]
pub fn create_window_manager(config: Arc<Config>) -> Result<Arc<dyn WindowManager>> {
    Err(crate::launcher_error!(
        unsupported,
        "окна клиента '{}' доступны только в Windows, используйте --dry-run",
        config.client.window_class
    ))
}
