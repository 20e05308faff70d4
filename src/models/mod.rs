pub mod account;
pub mod window;

pub use account::{AccountStatus, LaunchOutcome, RunState, SkipReason};
pub use window::WindowHandle;
