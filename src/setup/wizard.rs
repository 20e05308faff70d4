use crate::config::{Account, Config};
use crate::error::Result;
use crate::vault::{generate_salt, Vault, MIN_PASSPHRASE_LEN, PASSPHRASE_ENV_VAR};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};
use std::path::{Path, PathBuf};

const PASSPHRASE_ATTEMPTS: usize = 3;

/// Итог мастера настройки
#[derive(Debug, PartialEq, Eq)]
pub enum SetupOutcome {
    /// Конфигурация записана; пароль шифрования нужен для её загрузки
    Saved { passphrase: String },
    /// Оператор вышел без сохранения
    Aborted,
}

/// Чтение секрета без эха
pub type SecretPrompt = fn(&str) -> io::Result<String>;

fn prompt_hidden(prompt: &str) -> io::Result<String> {
    rpassword::prompt_password(prompt)
}

/// Интерактивное создание файла конфигурации в терминале.
///
/// Ввод, вывод и чтение секретов передаются снаружи, поэтому мастер
/// проверяется без реального терминала.
pub struct SetupWizard<R, W, S> {
    input: R,
    output: W,
    read_secret: S,
    env_passphrase: Option<String>,
}

impl SetupWizard<StdinLock<'static>, Stdout, SecretPrompt> {
    pub fn interactive() -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(
            stdin.lock(),
            io::stdout(),
            prompt_hidden as SecretPrompt,
            std::env::var(PASSPHRASE_ENV_VAR).ok(),
        )
    }
}

impl<R, W, S> SetupWizard<R, W, S>
where
    R: BufRead,
    W: Write,
    S: FnMut(&str) -> io::Result<String>,
{
    pub fn new(input: R, output: W, read_secret: S, env_passphrase: Option<String>) -> Self {
        Self {
            input,
            output,
            read_secret,
            env_passphrase,
        }
    }

    pub fn run(mut self, config_path: &Path) -> Result<SetupOutcome> {
        writeln!(self.output, "=== Настройка wizql ===")?;
        writeln!(self.output, "Файл конфигурации: {}", config_path.display())?;

        let install_dir = loop {
            let prompt = "Путь к папке Wizard101 (где лежит WizardGraphicalClient.exe): ";
            let Some(line) = self.prompt_line(prompt)? else {
                return Ok(SetupOutcome::Aborted);
            };
            if !line.is_empty() {
                break PathBuf::from(line);
            }
            writeln!(self.output, "Путь не может быть пустым")?;
        };

        let from_env = match self.env_passphrase.take().map(|p| p.trim().to_string()) {
            Some(passphrase) if passphrase.chars().count() >= MIN_PASSPHRASE_LEN => {
                writeln!(
                    self.output,
                    "Используется пароль шифрования из {}",
                    PASSPHRASE_ENV_VAR
                )?;
                Some(passphrase)
            }
            Some(passphrase) if !passphrase.is_empty() => {
                writeln!(
                    self.output,
                    "Пароль из {} короче {} символов, задайте новый",
                    PASSPHRASE_ENV_VAR, MIN_PASSPHRASE_LEN
                )?;
                None
            }
            _ => None,
        };

        let passphrase = match from_env {
            Some(passphrase) => passphrase,
            None => match self.create_passphrase()? {
                Some(passphrase) => passphrase,
                None => {
                    writeln!(self.output, "Пароль шифрования не задан, настройка прервана")?;
                    return Ok(SetupOutcome::Aborted);
                }
            },
        };

        let salt = generate_salt()?;
        let vault = Vault::new(&passphrase, &salt)?;
        let mut accounts: Vec<Account> = Vec::new();

        loop {
            writeln!(self.output)?;
            writeln!(self.output, "1) Добавить аккаунт")?;
            writeln!(self.output, "2) Список аккаунтов")?;
            writeln!(self.output, "3) Сохранить конфигурацию")?;
            writeln!(self.output, "4) Выход")?;

            match self.prompt_line("Выбор: ")?.as_deref() {
                Some("1") => {
                    if let Some(account) = self.read_account()? {
                        writeln!(self.output, "Аккаунт {} добавлен", account.username)?;
                        accounts.push(account);
                    }
                }
                Some("2") => self.list_accounts(&accounts)?,
                Some("3") => {
                    if accounts.is_empty() {
                        writeln!(self.output, "Сначала добавьте хотя бы один аккаунт")?;
                        continue;
                    }

                    let mut encrypted = Vec::with_capacity(accounts.len());
                    for account in &accounts {
                        let secret = vault.encrypt(&account.password)?;
                        let username = account.username.clone();
                        encrypted.push(Account::new(username, secret, account.x, account.y));
                    }

                    let mut config = Config::new(install_dir.clone(), encrypted);
                    config.uses_encryption = true;
                    config.encryption_salt = Some(BASE64.encode(&salt));
                    config.save(config_path)?;

                    writeln!(self.output, "Конфигурация сохранена в {}", config_path.display())?;
                    writeln!(
                        self.output,
                        "Для следующих запусков задайте пароль шифрования в {}",
                        PASSPHRASE_ENV_VAR
                    )?;
                    return Ok(SetupOutcome::Saved { passphrase });
                }
                Some("4") | None => return Ok(SetupOutcome::Aborted),
                Some(other) => writeln!(self.output, "Неизвестный пункт меню: {}", other)?,
            }
        }
    }

    fn create_passphrase(&mut self) -> Result<Option<String>> {
        for attempt in 1..=PASSPHRASE_ATTEMPTS {
            let passphrase = (self.read_secret)(&format!(
                "Придумайте пароль шифрования (минимум {} символов): ",
                MIN_PASSPHRASE_LEN
            ))?;
            let passphrase = passphrase.trim().to_string();

            if passphrase.chars().count() < MIN_PASSPHRASE_LEN {
                writeln!(
                    self.output,
                    "Пароль слишком короткий (попытка {}/{})",
                    attempt, PASSPHRASE_ATTEMPTS
                )?;
                continue;
            }

            let confirmation = (self.read_secret)("Повторите пароль шифрования: ")?;
            if confirmation.trim() != passphrase {
                writeln!(
                    self.output,
                    "Пароли не совпадают (попытка {}/{})",
                    attempt, PASSPHRASE_ATTEMPTS
                )?;
                continue;
            }

            return Ok(Some(passphrase));
        }

        Ok(None)
    }

    fn read_account(&mut self) -> Result<Option<Account>> {
        let Some(username) = self.prompt_line("Имя пользователя: ")? else {
            return Ok(None);
        };
        if username.is_empty() {
            writeln!(self.output, "Имя пользователя не может быть пустым")?;
            return Ok(None);
        }

        let password = (self.read_secret)("Пароль: ")?;

        // Нечисловые координаты превращаются в 0
        let x = self.prompt_line("Позиция X: ")?.and_then(|v| v.parse().ok()).unwrap_or(0);
        let y = self.prompt_line("Позиция Y: ")?.and_then(|v| v.parse().ok()).unwrap_or(0);

        Ok(Some(Account::new(username, password, x, y)))
    }

    fn list_accounts(&mut self, accounts: &[Account]) -> Result<()> {
        if accounts.is_empty() {
            writeln!(self.output, "Аккаунтов пока нет")?;
            return Ok(());
        }

        for (i, account) in accounts.iter().enumerate() {
            writeln!(
                self.output,
                "{}. {} ({}, {})",
                i + 1,
                account.username,
                account.x,
                account.y
            )?;
        }
        Ok(())
    }

    /// Строка без пробелов по краям; `None` на EOF
    fn prompt_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}
