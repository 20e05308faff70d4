use std::future::Future;
use std::io;
use tokio::signal;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Переводит Ctrl+C в отмену `cancel`.
///
/// Задача завершается сама, если токен отменён кем-то другим.
pub fn spawn_interrupt_watcher(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(watch_interrupt(cancel, signal::ctrl_c()))
}

async fn watch_interrupt<F>(cancel: CancellationToken, interrupt: F)
where
    F: Future<Output = io::Result<()>>,
{
    tokio::select! {
        _ = cancel.cancelled() => {}
        result = interrupt => match result {
            Ok(()) => {
                info!("Получен сигнал завершения (Ctrl+C)");
                cancel.cancel();
            }
            Err(err) => {
                // Без обработчика запуск завершается только внешней отменой
                error!("Не удалось установить обработчик Ctrl+C: {}", err);
                cancel.cancelled().await;
            }
        },
    }
}
