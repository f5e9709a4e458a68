//! PBKDF2-HMAC-SHA256 password hashing.
//!
//! Digests are self-describing: `pbkdf2-sha256$<iterations>$<salt hex>$<hash hex>`,
//! so the iteration count can be raised without invalidating stored digests.

use async_trait::async_trait;
use rand::RngCore;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::domain::ports::{PasswordHasher, PasswordHasherError};
use crate::domain::{PasswordDigest, PlainPassword};

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;
/// Work factor for new digests.
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// `PasswordHasher` running PBKDF2 on the blocking thread pool.
#[derive(Debug, Clone, Copy)]
pub struct Pbkdf2PasswordHasher {
    iterations: u32,
}

impl Default for Pbkdf2PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_PBKDF2_ITERATIONS)
    }
}

impl Pbkdf2PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }
}

struct ParsedDigest {
    iterations: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

fn parse_digest(encoded: &str) -> Result<ParsedDigest, PasswordHasherError> {
    let mut parts = encoded.split('$');
    let (Some(scheme), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(PasswordHasherError::malformed_digest("expected four fields"));
    };
    if scheme != SCHEME {
        return Err(PasswordHasherError::malformed_digest(format!(
            "unsupported scheme '{scheme}'"
        )));
    }
    let iterations = iterations
        .parse::<u32>()
        .ok()
        .filter(|count| *count > 0)
        .ok_or_else(|| PasswordHasherError::malformed_digest("invalid iteration count"))?;
    let salt = hex::decode(salt)
        .map_err(|_| PasswordHasherError::malformed_digest("salt is not hex"))?;
    let hash = hex::decode(hash)
        .map_err(|_| PasswordHasherError::malformed_digest("hash is not hex"))?;
    if hash.is_empty() {
        return Err(PasswordHasherError::malformed_digest("empty hash"));
    }
    Ok(ParsedDigest {
        iterations,
        salt,
        hash,
    })
}

fn derive(password: &[u8], salt: &[u8], iterations: u32, len: usize) -> Zeroizing<Vec<u8>> {
    let mut out = Zeroizing::new(vec![0_u8; len]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut out);
    out
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

async fn run_blocking<T, F>(work: F) -> Result<T, PasswordHasherError>
where
    F: FnOnce() -> Result<T, PasswordHasherError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| PasswordHasherError::hash(format!("hashing task failed: {err}")))?
}

#[async_trait]
impl PasswordHasher for Pbkdf2PasswordHasher {
    async fn hash(&self, password: &PlainPassword) -> Result<PasswordDigest, PasswordHasherError> {
        let secret = Zeroizing::new(password.expose().as_bytes().to_vec());
        let iterations = self.iterations;
        run_blocking(move || {
            let mut salt = [0_u8; SALT_LEN];
            rand::thread_rng().fill_bytes(&mut salt);
            let hash = derive(&secret, &salt, iterations, HASH_LEN);
            Ok(PasswordDigest::new(format!(
                "{SCHEME}${iterations}${}${}",
                hex::encode(salt),
                hex::encode(hash.as_slice())
            )))
        })
        .await
    }

    async fn verify(
        &self,
        password: &PlainPassword,
        digest: &PasswordDigest,
    ) -> Result<bool, PasswordHasherError> {
        let parsed = parse_digest(digest.as_ref())?;
        let secret = Zeroizing::new(password.expose().as_bytes().to_vec());
        run_blocking(move || {
            let candidate = derive(&secret, &parsed.salt, parsed.iterations, parsed.hash.len());
            Ok(constant_time_eq(&candidate, &parsed.hash))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LoginCredentials;
    use rstest::rstest;

    fn password(raw: &str) -> PlainPassword {
        LoginCredentials::try_from_parts("ada@example.com", raw.to_owned())
            .expect("valid credentials")
            .password
    }

    #[tokio::test]
    async fn hashes_verify_and_use_fresh_salts() {
        let hasher = Pbkdf2PasswordHasher::new(1_000);
        let first = hasher.hash(&password("hunter22")).await.expect("hash");
        let second = hasher.hash(&password("hunter22")).await.expect("hash");

        assert_ne!(first, second, "salts must differ between digests");
        assert!(first.as_ref().starts_with("pbkdf2-sha256$1000$"));
        assert!(hasher.verify(&password("hunter22"), &first).await.expect("verify"));
        assert!(!hasher.verify(&password("hunter23"), &first).await.expect("verify"));
    }

    #[tokio::test]
    async fn digests_remember_their_work_factor() {
        let digest = Pbkdf2PasswordHasher::new(500)
            .hash(&password("secret1"))
            .await
            .expect("hash");
        let stronger = Pbkdf2PasswordHasher::new(5_000);
        assert!(stronger.verify(&password("secret1"), &digest).await.expect("verify"));
    }

    #[rstest]
    #[case("")]
    #[case("bcrypt$10$aa$bb")]
    #[case("pbkdf2-sha256$0$aa$bb")]
    #[case("pbkdf2-sha256$10$zz$bb")]
    #[case("pbkdf2-sha256$10$aa$")]
    fn malformed_digests_are_rejected(#[case] encoded: &str) {
        assert!(matches!(
            parse_digest(encoded),
            Err(PasswordHasherError::MalformedDigest { .. })
        ));
    }

    #[rstest]
    fn comparison_requires_equal_length() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
