//! Credential adapters: bearer token signing and password hashing.

mod hmac_token_service;
mod pbkdf2_password_hasher;

pub use hmac_token_service::{HmacTokenService, TOKEN_KEY_MIN_LEN, TokenSigningKey};
pub use pbkdf2_password_hasher::{DEFAULT_PBKDF2_ITERATIONS, Pbkdf2PasswordHasher};
