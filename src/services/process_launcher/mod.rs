mod client_launcher;
mod r#trait;

pub use self::client_launcher::ClientLauncher;
pub use self::r#trait::{ProcessHandle, ProcessLauncher};
