//! Bearer-token signing key configuration.
//!
//! The key is read from `TOKEN_KEY_FILE` (default
//! `/var/run/secrets/token_key`). Debug builds fall back to an ephemeral key
//! when the file is missing. Release builds require the file, and reject
//! `TOKEN_ALLOW_EPHEMERAL=1`.

use std::path::{Path, PathBuf};

use cap_std::{ambient_authority, fs::Dir};
use mockable::Env;
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::outbound::security::{TOKEN_KEY_MIN_LEN, TokenSigningKey};

const TOKEN_KEY_DEFAULT_PATH: &str = "/var/run/secrets/token_key";
pub(crate) const KEY_FILE_ENV: &str = "TOKEN_KEY_FILE";
pub(crate) const ALLOW_EPHEMERAL_ENV: &str = "TOKEN_ALLOW_EPHEMERAL";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";

/// Build mode for key validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate missing keys and emit warnings.
    Debug,
    /// Release builds require a readable key of sufficient length.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use storefront::inbound::http::token_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Errors raised while loading the token signing key.
#[derive(thiserror::Error, Debug)]
pub enum TokenConfigError {
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Reading the key file failed.
    #[error("failed to read token key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The key file is shorter than the HMAC minimum.
    #[error("token key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// Release builds must not sign with an ephemeral key.
    #[error("TOKEN_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Load the signing key according to environment toggles and build mode.
///
/// # Examples
///
/// ```rust
/// use mockable::MockEnv;
/// use storefront::inbound::http::token_config::{BuildMode, token_key_from_env};
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|_| None);
///
/// // Debug builds fall back to an ephemeral key when the file is absent.
/// let key = token_key_from_env(&env, BuildMode::Debug).expect("ephemeral key");
/// assert!(!key.is_empty());
/// ```
pub fn token_key_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<TokenSigningKey, TokenConfigError> {
    let allow_ephemeral = allow_ephemeral_from_env(env, mode)?;
    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| TOKEN_KEY_DEFAULT_PATH.to_owned()),
    );

    match read_key(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if length < TOKEN_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(TokenConfigError::KeyTooShort {
                    path,
                    length,
                    min_len: TOKEN_KEY_MIN_LEN,
                });
            }
            let key = TokenSigningKey::from_bytes(bytes);
            info!(fingerprint = %key.fingerprint(), "token signing key loaded");
            Ok(key)
        }
        Err(error) => {
            if mode.is_debug() || allow_ephemeral {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "using temporary token key (dev only)"
                );
                Ok(TokenSigningKey::generate())
            } else {
                Err(TokenConfigError::KeyRead {
                    path,
                    source: error,
                })
            }
        }
    }
}

fn read_key(path: &Path) -> std::io::Result<Vec<u8>> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "key path has no file name")
    })?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
    directory.read(Path::new(file_name))
}

fn allow_ephemeral_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<bool, TokenConfigError> {
    let Some(value) = env.string(ALLOW_EPHEMERAL_ENV) else {
        return Ok(false);
    };
    match parse_bool(&value) {
        Some(true) if mode.is_debug() => Ok(true),
        Some(true) => Err(TokenConfigError::EphemeralNotAllowed),
        Some(false) => Ok(false),
        None if mode.is_debug() => {
            warn!(value = %value, "invalid TOKEN_ALLOW_EPHEMERAL; defaulting to disabled");
            Ok(false)
        }
        None => Err(TokenConfigError::InvalidEnv {
            name: ALLOW_EPHEMERAL_ENV,
            value,
            expected: BOOL_EXPECTED,
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
