use crate::config::ClientConfig;
use crate::error::{LauncherError, Result};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

use super::r#trait::{ProcessHandle, ProcessLauncher};

/// Запускает `<install_dir>/<executable> -L <login_host> <login_port>`
pub struct ClientLauncher {
    client: ClientConfig,
}

impl ClientLauncher {
    pub fn new(client: ClientConfig) -> Self {
        info!(
            "Инициализация ClientLauncher: {} -L {} {}",
            client.executable, client.login_host, client.login_port
        );
        Self { client }
    }

    fn command(&self, install_dir: &Path) -> Command {
        let mut cmd = Command::new(install_dir.join(&self.client.executable));
        cmd.current_dir(install_dir)
            .arg("-L")
            .arg(&self.client.login_host)
            .arg(self.client.login_port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // Клиент не должен зависеть от консоли лаунчера и его Ctrl+C
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            use windows::Win32::System::Threading::{CREATE_NEW_PROCESS_GROUP, DETACHED_PROCESS};
            cmd.creation_flags(DETACHED_PROCESS.0 | CREATE_NEW_PROCESS_GROUP.0);
        }

        cmd
    }
}

impl ProcessLauncher for ClientLauncher {
    fn launch(&self, install_dir: &Path) -> Result<ProcessHandle> {
        let mut cmd = self.command(install_dir);
        debug!("Команда запуска клиента: {:?}", cmd);

        let child = cmd.spawn().map_err(|source| LauncherError::Spawn {
            path: install_dir.join(&self.client.executable),
            source,
        })?;

        let handle = ProcessHandle::spawned(child);
        debug!("Клиент запущен, pid {}", handle.pid());
        Ok(handle)
    }
}
