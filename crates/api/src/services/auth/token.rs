//! Bearer token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying the user id as the `sub` claim. The
//! signing secret and lifetime come from [`crate::config::ApiConfig`].

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use bazaar_core::UserId;

use super::AuthError;

/// Registered JWT claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id.
    sub: String,
    /// Issued-at, seconds since the epoch.
    iat: i64,
    /// Expiry, seconds since the epoch.
    exp: i64,
}

/// Issues and verifies access tokens.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenSigner {
    /// Create a signer from the shared secret and token lifetime.
    #[must_use]
    pub fn new(secret: &SecretString, ttl_secs: u64) -> Self {
        let secret = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl: Duration::seconds(i64::try_from(ttl_secs).unwrap_or(i64::MAX)),
        }
    }

    /// Issue a token for the given user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenSigning` if the token cannot be encoded.
    pub fn issue(&self, user_id: UserId) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Verify a token and return the user id it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any malformed, expired, or
    /// wrongly-signed token.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;

        let id = data
            .claims
            .sub
            .parse::<i32>()
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(UserId::new(id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signer(ttl_secs: u64) -> TokenSigner {
        TokenSigner::new(&SecretString::from("k9#mQ2$vL7!xR4@nW8%jB3^zD6&pF1*s"), ttl_secs)
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let signer = signer(3600);
        let token = signer.issue(UserId::new(42)).unwrap();
        let user_id = signer.verify(&token).unwrap();
        assert_eq!(user_id, UserId::new(42));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let signer = signer(3600);
        assert!(matches!(
            signer.verify("not-a-token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let signer_a = signer(3600);
        let signer_b =
            TokenSigner::new(&SecretString::from("a8@pT5!wE2#rY9$uI6%oH3^kG7&dS4*f"), 3600);

        let token = signer_a.issue(UserId::new(1)).unwrap();
        assert!(matches!(
            signer_b.verify(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        // jsonwebtoken applies a default 60s leeway; issue well past it.
        let now = Utc::now();
        let claims = Claims {
            sub: "1".to_owned(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
        };
        let signer = signer(3600);
        let token = encode(&Header::default(), &claims, &signer.encoding).unwrap();

        assert!(matches!(
            signer.verify(&token),
            Err(AuthError::InvalidToken)
        ));
    }
}
