use std::fmt;

use super::window::WindowHandle;

/// Состояние аккаунта в рамках одного запуска
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountStatus {
    #[default]
    Pending,
    Spawned,
    WindowFound(WindowHandle),
    WindowTimeout,
    LoggedIn(WindowHandle),
    Skipped(SkipReason),
}

/// Почему аккаунт был пропущен
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    SpawnFailed,
    WindowTimeout,
}

impl AccountStatus {
    pub fn is_skipped(&self) -> bool {
        matches!(self, AccountStatus::Skipped(_))
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Pending => write!(f, "ожидает запуска"),
            AccountStatus::Spawned => write!(f, "клиент запущен"),
            AccountStatus::WindowFound(handle) => write!(f, "найдено окно {}", handle),
            AccountStatus::WindowTimeout => write!(f, "окно не появилось"),
            AccountStatus::LoggedIn(handle) => write!(f, "вход выполнен в окне {}", handle),
            AccountStatus::Skipped(SkipReason::SpawnFailed) => {
                write!(f, "пропущен (ошибка запуска)")
            }
            AccountStatus::Skipped(SkipReason::WindowTimeout) => {
                write!(f, "пропущен (таймаут окна)")
            }
        }
    }
}

/// Глобальное состояние запуска
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Cancelled,
    Completed,
}

/// Итог фазы запуска аккаунтов (до перехода в ожидание Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Все аккаунты обработаны (успешно или с пропуском)
    Processed,
    /// Оператор прервал запуск
    Cancelled,
}
