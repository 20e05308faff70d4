use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
mod config;
mod error;
mod models;
mod services;
mod setup;
mod utils;
mod vault;

use config::Config;
use services::{create_backends, LaunchOrchestrator};
use setup::{SetupOutcome, SetupWizard};

#[derive(Parser, Debug)]
#[command(name = "wizql")]
#[command(about = "Запуск нескольких клиентов Wizard101 с автоматическим входом в аккаунты")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Режим сухого запуска (без реальных процессов и окон)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (переопределяет logging.level)
    #[arg(long)]
    log_level: Option<String>,

    /// Запустить мастер настройки даже если конфигурация существует
    #[arg(long)]
    setup: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut created_passphrase = None;

    // Мастер настройки работает до логирования: весь диалог идёт через терминал
    if args.setup || !args.config.exists() {
        match SetupWizard::interactive().run(&args.config)? {
            SetupOutcome::Saved { passphrase } => created_passphrase = Some(passphrase),
            SetupOutcome::Aborted => anyhow::bail!("Конфигурация не создана, запуск невозможен"),
        }
    }

    // Загрузка конфигурации: после мастера пароль уже известен, иначе он берётся из окружения
    let config = match created_passphrase.as_deref() {
        Some(passphrase) => Config::load_with_passphrase(&args.config, Some(passphrase)),
        None => Config::load(&args.config),
    }
    .with_context(|| format!("Не удалось загрузить конфигурацию {}", args.config.display()))?;

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск wizql v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config.display());

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    }

    if config.accounts.is_empty() {
        warn!("В конфигурации нет аккаунтов, запускать нечего");
    }

    let config = Arc::new(config);
    let cancel = CancellationToken::new();

    let backends = create_backends(config.clone(), args.dry_run)?;
    let mut orchestrator =
        LaunchOrchestrator::new(config, backends.launcher, backends.windows, cancel.clone());

    info!("Все компоненты инициализированы");

    let watcher = utils::spawn_interrupt_watcher(cancel.clone());
    let result = orchestrator.run().await;

    info!("Завершение работы...");

    // Клиенты остаются работать, освобождаются только дескрипторы
    orchestrator.release_processes();

    cancel.cancel();
    watcher.abort();
    let _ = watcher.await;

    result?;
    info!("wizql завершил работу ({:?})", orchestrator.state());
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if format == "pretty" {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    }

    Ok(())
}
