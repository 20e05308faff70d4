//! WindowManager service: responsibility and boundaries
//!
//! This module is responsible ONLY for talking to the OS window layer: enumerating
//! client windows by their window class and actuating a given window (typing
//! characters, setting its title, moving it). It MUST NOT decide which window
//! belongs to which account; that correlation lives in WindowTracker and
//! LaunchOrchestrator.

#[cfg(windows)]
mod win32;
mod r#trait;

pub use self::r#trait::{create_window_manager, WindowActuator, WindowManager, WindowRegistry};
