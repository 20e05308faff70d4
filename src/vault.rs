//! Хранилище паролей аккаунтов.
//!
//! Ключ выводится из пароля шифрования через scrypt, сами секреты хранятся как
//! base64(`nonce || ciphertext`) под AES-256-GCM.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::{rngs::OsRng, TryRngCore};

/// Переменная окружения с паролем шифрования
pub const PASSPHRASE_ENV_VAR: &str = "WIZQL_PASSPHRASE";

/// Минимальная длина пароля шифрования
pub const MIN_PASSPHRASE_LEN: usize = 12;

pub const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

// Параметры scrypt: N = 2^15, r = 8, p = 1
const SCRYPT_LOG_N: u8 = 15;
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum VaultError {
    #[error("Ошибка вывода ключа: {0}")]
    KeyDerivation(String),
    #[error("Ошибка шифрования: {0}")]
    Encryption(String),
    #[error("Ошибка расшифровки: {0}")]
    Decryption(String),
    #[error("Ошибка генерации соли: {0}")]
    Salt(String),
}

/// Генерирует случайную соль для вывода ключа
pub fn generate_salt() -> Result<Vec<u8>, VaultError> {
    let mut salt = vec![0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| VaultError::Salt(e.to_string()))?;
    Ok(salt)
}

pub struct Vault {
    cipher: Aes256Gcm,
}

impl Vault {
    /// Выводит ключ из `passphrase` и `salt`. Вывод дорогой, поэтому один `Vault`
    /// переиспользуется для всех аккаунтов.
    pub fn new(passphrase: &str, salt: &[u8]) -> Result<Self, VaultError> {
        let key = derive_key(passphrase, salt)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;
        Ok(Self { cipher })
    }

    /// Шифрует `plaintext` в base64(`nonce || ciphertext`).
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| VaultError::Encryption(e.to_string()))?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| VaultError::Encryption(e.to_string()))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(ciphertext);
        Ok(BASE64.encode(combined))
    }

    /// Расшифровывает base64(`nonce || ciphertext`) обратно в строку.
    pub fn decrypt(&self, secret: &str) -> Result<String, VaultError> {
        let payload = BASE64
            .decode(secret)
            .map_err(|e| VaultError::Decryption(format!("некорректный base64: {}", e)))?;

        if payload.len() < NONCE_LEN {
            return Err(VaultError::Decryption("шифротекст слишком короткий".to_string()));
        }
        let (nonce_bytes, ciphertext) = payload.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| VaultError::Decryption(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| VaultError::Decryption(e.to_string()))
    }
}

fn derive_key(passphrase: &str, salt: &[u8]) -> Result<[u8; KEY_LEN], VaultError> {
    if salt.is_empty() {
        return Err(VaultError::KeyDerivation("отсутствует соль".to_string()));
    }

    let params = scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN)
        .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;

    let mut key = [0u8; KEY_LEN];
    scrypt::scrypt(passphrase.as_bytes(), salt, &params, &mut key)
        .map_err(|e| VaultError::KeyDerivation(e.to_string()))?;
    Ok(key)
}
