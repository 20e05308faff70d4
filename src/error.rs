use std::path::PathBuf;
use thiserror::Error;

use crate::vault::VaultError;

#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("Файл конфигурации не найден: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Ошибка конфигурации: {0}")]
    Config(String),

    #[error("Не удалось разобрать конфигурацию: {0}")]
    Figment(#[from] figment::Error),

    #[error("Конфигурация требует пароль шифрования: задайте переменную {0}")]
    MissingPassphrase(&'static str),

    #[error("Ошибка хранилища паролей: {0}")]
    Vault(#[from] VaultError),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Не удалось запустить клиент {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ошибка WinAPI: {0}")]
    WindowApi(String),

    #[error("Платформа не поддерживается: {0}")]
    Unsupported(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl LauncherError {
    pub fn config<T>(msg: impl Into<String>) -> Result<T> {
        Err(LauncherError::Config(msg.into()))
    }
}

pub type Result<T> = std::result::Result<T, LauncherError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! launcher_error {
    (config, $($arg:tt)*) => {
        $crate::error::LauncherError::Config(format!($($arg)*))
    };
    (window_api, $($arg:tt)*) => {
        $crate::error::LauncherError::WindowApi(format!($($arg)*))
    };
    (unsupported, $($arg:tt)*) => {
        $crate::error::LauncherError::Unsupported(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::LauncherError::Internal(format!($($arg)*))
    };
}
