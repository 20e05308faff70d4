use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{LauncherError, Result};
use crate::vault::{Vault, PASSPHRASE_ENV_VAR};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// Конфигурация лаунчера.
///
/// Имена ключей верхнего уровня совместимы со старым `config.json`
/// (`filePath`, `accountsData`, `usesEncryption`, `encryptionSalt`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(rename = "filePath")]
    pub install_dir: PathBuf,
    #[serde(rename = "accountsData", default)]
    pub accounts: Vec<Account>,
    #[serde(rename = "usesEncryption", default)]
    pub uses_encryption: bool,
    #[serde(rename = "encryptionSalt", default, skip_serializing_if = "Option::is_none")]
    pub encryption_salt: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub launch: LaunchConfig,
}

/// Аккаунт клиента. После `Config::load` поле `password` всегда содержит
/// открытый пароль, даже если в файле он хранится зашифрованным.
#[derive(Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

impl Account {
    pub fn new(username: impl Into<String>, password: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            x,
            y,
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("password", &"***")
            .field("x", &self.x)
            .field("y", &self.y)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    pub executable: String,
    pub login_host: String,
    pub login_port: u16,
    pub window_class: String,
    pub title_template: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LaunchConfig {
    pub grace_period_ms: u64,
    pub poll_interval_ms: u64,
    pub poll_attempts: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            executable: "WizardGraphicalClient.exe".to_string(),
            login_host: "login.us.wizard101.com".to_string(),
            login_port: 12000,
            window_class: "Wizard Graphical Client".to_string(),
            title_template: "[{username}] Wizard101".to_string(),
        }
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: 2000,
            poll_interval_ms: 500,
            poll_attempts: 60,
        }
    }
}

impl ClientConfig {
    /// Заголовок окна для аккаунта: `{username}` в шаблоне заменяется на имя
    pub fn window_title(&self, username: &str) -> String {
        self.title_template.replace("{username}", username)
    }
}

impl Config {
    pub fn new(install_dir: impl Into<PathBuf>, accounts: Vec<Account>) -> Self {
        Self {
            install_dir: install_dir.into(),
            accounts,
            uses_encryption: false,
            encryption_salt: None,
            logging: LoggingConfig::default(),
            client: ClientConfig::default(),
            launch: LaunchConfig::default(),
        }
    }

    /// Загружает конфигурацию, проверяет её и расшифровывает пароли.
    ///
    /// Пароль шифрования берётся из переменной окружения `WIZQL_PASSPHRASE`.
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let passphrase = std::env::var(PASSPHRASE_ENV_VAR).ok();
        Self::load_with_passphrase(config_path, passphrase.as_deref())
    }

    pub fn load_with_passphrase<P: AsRef<Path>>(
        config_path: P,
        passphrase: Option<&str>,
    ) -> Result<Self> {
        let config_path = config_path.as_ref();

        if !config_path.exists() {
            return Err(LauncherError::ConfigNotFound(config_path.to_path_buf()));
        }

        let mut config = Self::from_figment(Self::figment(config_path))?;
        config.validate()?;
        config.resolve_credentials(passphrase)?;

        Ok(config)
    }

    /// Файл (формат по расширению) + переменные окружения `WIZQL_*`
    pub fn figment(config_path: &Path) -> Figment {
        let figment = if is_toml(config_path) {
            Figment::new().merge(Toml::file(config_path))
        } else {
            Figment::new().merge(Json::file(config_path))
        };

        figment.merge(
            Env::prefixed("WIZQL_")
                .ignore(&["passphrase"])
                .split("__")
                .map(|key| env_key(key.as_str()).into())
                .lowercase(false),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.install_dir.as_os_str().is_empty() {
            return LauncherError::config("не указан путь установки клиента (filePath)");
        }

        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return LauncherError::config(format!(
                    "неверный уровень логирования: {}",
                    self.logging.level
                ))
            }
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => {
                return LauncherError::config(format!(
                    "неверный формат логирования: {}",
                    self.logging.format
                ))
            }
        }

        // Валидация настроек клиента
        if self.client.executable.trim().is_empty() {
            return LauncherError::config("client.executable не может быть пустым");
        }

        if self.client.window_class.is_empty() {
            return LauncherError::config("client.window_class не может быть пустым");
        }

        // Валидация бюджета опроса
        if self.launch.poll_attempts == 0 {
            return LauncherError::config("launch.poll_attempts должно быть больше 0");
        }

        if self.launch.poll_interval_ms < 10 {
            return LauncherError::config("launch.poll_interval_ms должно быть минимум 10");
        }

        for (i, account) in self.accounts.iter().enumerate() {
            if account.username.trim().is_empty() {
                return LauncherError::config(format!(
                    "пустое имя пользователя в аккаунте #{}",
                    i + 1
                ));
            }
        }

        if self.uses_encryption && self.encryption_salt.as_deref().map_or(true, str::is_empty) {
            return LauncherError::config("usesEncryption включено, но encryptionSalt не задан");
        }

        Ok(())
    }

    /// Заменяет сохранённые секреты открытыми паролями.
    ///
    /// Без шифрования пароли используются как есть; с шифрованием ключ
    /// выводится один раз и расшифровываются все аккаунты.
    pub fn resolve_credentials(&mut self, passphrase: Option<&str>) -> Result<()> {
        if !self.uses_encryption {
            return Ok(());
        }

        let passphrase = passphrase
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or(LauncherError::MissingPassphrase(PASSPHRASE_ENV_VAR))?;

        let salt = BASE64
            .decode(self.encryption_salt.as_deref().unwrap_or_default())
            .map_err(|e| {
                LauncherError::Config(format!("не удалось декодировать encryptionSalt: {}", e))
            })?;

        let vault = Vault::new(passphrase, &salt)?;

        for account in &mut self.accounts {
            account.password = vault.decrypt(&account.password).map_err(|e| {
                LauncherError::Config(format!(
                    "не удалось расшифровать пароль аккаунта {}: {}",
                    account.username, e
                ))
            })?;
            debug!("Пароль аккаунта {} расшифрован", account.username);
        }

        Ok(())
    }

    /// Сохраняет конфигурацию (JSON или TOML по расширению файла)
    pub fn save<P: AsRef<Path>>(&self, config_path: P) -> Result<()> {
        let config_path = config_path.as_ref();

        let contents = if is_toml(config_path) {
            toml::to_string_pretty(self).map_err(|e| e.to_string())
        } else {
            serde_json::to_string_pretty(self).map_err(|e| e.to_string())
        }
        .map_err(|e| {
            LauncherError::Internal(format!("не удалось сериализовать конфигурацию: {}", e))
        })?;

        write_private(config_path, contents.as_bytes())?;
        Ok(())
    }
}

// Ключи верхнего уровня в файле записаны в camelCase, переменные окружения
// приходят в верхнем регистре
fn env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    match key.as_str() {
        "filepath" => "filePath".to_string(),
        "accountsdata" => "accountsData".to_string(),
        "usesencryption" => "usesEncryption".to_string(),
        "encryptionsalt" => "encryptionSalt".to_string(),
        _ => key,
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, contents)
}
