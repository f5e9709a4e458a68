//! HMAC-SHA256 bearer tokens.
//!
//! A token is `<user_id>.<role>.<expires_unix>.<signature>` where the
//! signature is the hex HMAC of everything before the last dot. Tokens are
//! stateless: revocation is out of scope and expiry is the only lifetime
//! control.

use std::fmt;

use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::ports::{TokenError, TokenService};
use crate::domain::{Identity, IssuedToken, UserId, UserRole};

type HmacSha256 = Hmac<Sha256>;

/// Minimum key length accepted in release builds.
pub const TOKEN_KEY_MIN_LEN: usize = 32;
const FINGERPRINT_BYTES: usize = 8;

/// Secret used to sign bearer tokens. Wiped on drop.
#[derive(Clone)]
pub struct TokenSigningKey(Zeroizing<Vec<u8>>);

impl TokenSigningKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Random key for development runs; tokens do not survive a restart.
    pub fn generate() -> Self {
        let mut bytes = vec![0_u8; TOKEN_KEY_MIN_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::from_bytes(bytes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Truncated SHA-256 of the key, safe to log.
    ///
    /// # Examples
    /// ```
    /// use storefront::outbound::security::TokenSigningKey;
    ///
    /// let fp = TokenSigningKey::from_bytes(vec![7; 32]).fingerprint();
    /// assert_eq!(fp.len(), 16);
    /// ```
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_slice());
        hex::encode(&digest[..FINGERPRINT_BYTES])
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(self.0.as_slice())
            .map_err(|err| TokenError::signing(err.to_string()))
    }
}

impl fmt::Debug for TokenSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenSigningKey({})", self.fingerprint())
    }
}

/// `TokenService` signing with a shared secret.
#[derive(Debug, Clone)]
pub struct HmacTokenService {
    key: TokenSigningKey,
    ttl: Duration,
}

impl HmacTokenService {
    pub fn new(key: TokenSigningKey, ttl: Duration) -> Self {
        Self { key, ttl }
    }

    fn sign(&self, claims: &str) -> Result<String, TokenError> {
        let mut mac = self.key.mac()?;
        mac.update(claims.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

fn malformed(message: &str) -> TokenError {
    TokenError::malformed(message)
}

impl TokenService for HmacTokenService {
    fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now + self.ttl;
        let claims = format!(
            "{}.{}.{}",
            identity.user_id,
            identity.role.as_str(),
            expires_at.timestamp()
        );
        let signature = self.sign(&claims)?;
        Ok(IssuedToken {
            token: format!("{claims}.{signature}"),
            expires_at,
        })
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let (claims, signature) = token
            .rsplit_once('.')
            .ok_or_else(|| malformed("missing signature"))?;
        let signature = hex::decode(signature).map_err(|_| malformed("signature is not hex"))?;

        let mut mac = self.key.mac()?;
        mac.update(claims.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let mut parts = claims.split('.');
        let (Some(user_id), Some(role), Some(expires), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed("expected three claims"));
        };
        let user_id = UserId::new(user_id).map_err(|_| malformed("invalid user id"))?;
        let role: UserRole = role.parse().map_err(|_| malformed("invalid role"))?;
        let expires = expires
            .parse::<i64>()
            .ok()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .ok_or_else(|| malformed("invalid expiry"))?;

        if now >= expires {
            return Err(TokenError::Expired);
        }
        Ok(Identity { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn service() -> HmacTokenService {
        HmacTokenService::new(TokenSigningKey::from_bytes(vec![42; 32]), Duration::hours(24))
    }

    fn identity(role: UserRole) -> Identity {
        Identity {
            user_id: UserId::random(),
            role,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    #[case(UserRole::User)]
    #[case(UserRole::Admin)]
    fn issued_tokens_verify(service: HmacTokenService, #[case] role: UserRole) {
        let who = identity(role);
        let issued = service.issue(&who, now()).expect("issue");
        assert_eq!(issued.expires_at, now() + Duration::hours(24));

        let verified = service.verify(&issued.token, now()).expect("verify");
        assert_eq!(verified, who);
    }

    #[rstest]
    fn tokens_expire_at_the_boundary(service: HmacTokenService) {
        let issued = service.issue(&identity(UserRole::User), now()).expect("issue");
        let at_expiry = now() + Duration::hours(24);
        assert_eq!(
            service.verify(&issued.token, at_expiry),
            Err(TokenError::Expired)
        );
        assert!(service
            .verify(&issued.token, at_expiry - Duration::seconds(1))
            .is_ok());
    }

    #[rstest]
    fn role_escalation_breaks_the_signature(service: HmacTokenService) {
        let issued = service.issue(&identity(UserRole::User), now()).expect("issue");
        let forged = issued.token.replacen(".user.", ".admin.", 1);
        assert_eq!(service.verify(&forged, now()), Err(TokenError::BadSignature));
    }

    #[rstest]
    fn other_keys_are_rejected(service: HmacTokenService) {
        let issued = service.issue(&identity(UserRole::User), now()).expect("issue");
        let other = HmacTokenService::new(TokenSigningKey::from_bytes(vec![1; 32]), Duration::hours(1));
        assert_eq!(other.verify(&issued.token, now()), Err(TokenError::BadSignature));
    }

    #[rstest]
    #[case("")]
    #[case("no-dots-here")]
    #[case("abc.zz")]
    fn garbage_is_malformed(service: HmacTokenService, #[case] token: &str) {
        assert!(matches!(
            service.verify(token, now()),
            Err(TokenError::Malformed { .. })
        ));
    }

    #[rstest]
    fn debug_output_hides_the_key() {
        let key = TokenSigningKey::from_bytes(b"super-secret-signing-key-material".to_vec());
        let rendered = format!("{key:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains(&key.fingerprint()));
    }
}
