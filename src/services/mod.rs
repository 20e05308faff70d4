pub mod dry_run;
pub mod orchestrator;
pub mod process_launcher;
pub mod window_manager;
pub mod window_tracker;

pub use dry_run::DryRunDesktop;
pub use orchestrator::LaunchOrchestrator;
pub use process_launcher::{ClientLauncher, ProcessLauncher};
pub use window_manager::{create_window_manager, WindowManager};

use crate::config::Config;
use crate::error::Result;
use std::sync::Arc;
use tracing::info;

/// Платформенные зависимости оркестратора
pub struct Backends {
    pub launcher: Arc<dyn ProcessLauncher>,
    pub windows: Arc<dyn WindowManager>,
}

/// Фабрика backend'ов: в dry-run режиме процессы и окна эмулирует один `DryRunDesktop`
pub fn create_backends(config: Arc<Config>, dry_run: bool) -> Result<Backends> {
    if dry_run {
        let desktop = Arc::new(DryRunDesktop::new());
        return Ok(Backends {
            launcher: desktop.clone(),
            windows: desktop,
        });
    }

    info!("Используется ClientLauncher для {}", config.client.executable);
    let launcher: Arc<dyn ProcessLauncher> = Arc::new(ClientLauncher::new(config.client.clone()));
    let windows = create_window_manager(config)?;

    Ok(Backends { launcher, windows })
}
