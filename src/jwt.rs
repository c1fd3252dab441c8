//! JWT token generation and verification.
//!
//! Access tokens carry the member's authority and are never persisted.
//! Refresh tokens carry no authority claim; the role is re-derived from the
//! member row at reissue time so a stale token cannot smuggle an old role.
//!
//! All `jsonwebtoken` failures are translated into exactly two kinds at this
//! boundary: [`TokenError::Expired`] and [`TokenError::Invalid`].

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::db::Role;

/// Token kind for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Short-lived access token - stateless, carries the authority claim
    Access,
    /// Long-lived refresh token - tracked server-side in the session table
    Refresh,
}

/// Claims carried by access tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (username)
    pub sub: String,
    /// Single authority (role) string
    pub auth: Role,
    /// Token kind
    #[serde(rename = "typ")]
    pub kind: TokenKind,
    /// Issued at (Unix seconds)
    pub iat: u64,
    /// Expiration time (Unix seconds)
    pub exp: u64,
}

/// Claims carried by refresh tokens. No authority claim; the role is
/// re-derived from the member row at reissue time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject (username)
    pub sub: String,
    /// Unique token ID. iat has second resolution, so without this two
    /// refresh tokens minted in the same second would be byte-identical
    /// and session rotation would be a no-op.
    pub jti: String,
    /// Token kind
    #[serde(rename = "typ")]
    pub kind: TokenKind,
    /// Issued at (Unix seconds)
    pub iat: u64,
    /// Expiration time (Unix seconds)
    pub exp: u64,
}

/// Default access token duration: 30 minutes
pub const DEFAULT_ACCESS_TTL_SECS: u64 = 30 * 60;

/// Default refresh token duration: 2 weeks
pub const DEFAULT_REFRESH_TTL_SECS: u64 = 14 * 24 * 60 * 60;

/// Holds the signing secret and the two configured token lifetimes.
/// Immutable after construction; shared read-only across requests.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

/// A signed token together with its expiry timestamp.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The compact JWT string
    pub token: String,
    /// Issued at (Unix seconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: u64,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret and lifetimes.
    pub fn new(secret: &[u8], access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Create a configuration with the default lifetimes.
    pub fn with_default_ttls(secret: &[u8]) -> Self {
        Self::new(
            secret,
            Duration::from_secs(DEFAULT_ACCESS_TTL_SECS),
            Duration::from_secs(DEFAULT_REFRESH_TTL_SECS),
        )
    }

    /// Configured access token lifetime.
    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Configured refresh token lifetime.
    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue an access token carrying the member's authority.
    pub fn issue_access(&self, username: &str, role: Role) -> Result<IssuedToken, TokenError> {
        let now = unix_now()?;
        let exp = now + self.access_ttl.as_secs();

        let claims = AccessClaims {
            sub: username.to_string(),
            auth: role,
            kind: TokenKind::Access,
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| TokenError::Invalid)?;

        Ok(IssuedToken {
            token,
            issued_at: now,
            expires_at: exp,
        })
    }

    /// Issue a refresh token. Carries subject and expiry only.
    pub fn issue_refresh(&self, username: &str) -> Result<IssuedToken, TokenError> {
        let now = unix_now()?;
        let exp = now + self.refresh_ttl.as_secs();

        let claims = RefreshClaims {
            sub: username.to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            kind: TokenKind::Refresh,
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| TokenError::Invalid)?;

        Ok(IssuedToken {
            token,
            issued_at: now,
            expires_at: exp,
        })
    }

    /// Verify and decode an access token.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let claims: AccessClaims = self.decode(token)?;
        if claims.kind != TokenKind::Access {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    /// Verify and decode a refresh token.
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims: RefreshClaims = self.decode(token)?;
        if claims.kind != TokenKind::Refresh {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }

    /// Remaining lifetime of a structurally valid access or refresh token.
    /// Returns None for tokens that are expired or cannot be decoded, in
    /// which case there is nothing left to revoke.
    pub fn remaining_ttl(&self, token: &str) -> Option<Duration> {
        let exp = match self.verify_access(token) {
            Ok(claims) => claims.exp,
            Err(_) => self.verify_refresh(token).ok()?.exp,
        };
        let now = unix_now().ok()?;
        (exp > now).then(|| Duration::from_secs(exp - now))
    }

    fn decode<C: serde::de::DeserializeOwned>(&self, token: &str) -> Result<C, TokenError> {
        if token.is_empty() {
            return Err(TokenError::Invalid);
        }

        // No leeway: expiry comparison is exact server wall-clock time.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        jsonwebtoken::decode::<C>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            })
    }
}

fn unix_now() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|_| TokenError::Invalid)
}

/// The only two failure kinds callers of the codec ever see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Current time is at or past the token's expiry
    Expired,
    /// Signature mismatch, malformed structure, wrong kind, or empty input
    Invalid,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Invalid => write!(f, "Token is invalid"),
        }
    }
}

impl std::error::Error for TokenError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig::with_default_ttls(b"test-secret-key-for-testing")
    }

    #[test]
    fn test_access_token_round_trip() {
        let config = test_config();

        let issued = config.issue_access("yoon1234", Role::Member).unwrap();
        assert_eq!(issued.expires_at, issued.issued_at + DEFAULT_ACCESS_TTL_SECS);

        let claims = config.verify_access(&issued.token).unwrap();
        assert_eq!(claims.sub, "yoon1234");
        assert_eq!(claims.auth, Role::Member);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp, claims.iat + DEFAULT_ACCESS_TTL_SECS);
    }

    #[test]
    fn test_refresh_token_round_trip() {
        let config = test_config();

        let issued = config.issue_refresh("yoon1234").unwrap();
        let claims = config.verify_refresh(&issued.token).unwrap();
        assert_eq!(claims.sub, "yoon1234");
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert_eq!(claims.exp, claims.iat + DEFAULT_REFRESH_TTL_SECS);
    }

    #[test]
    fn test_refresh_token_has_no_authority_claim() {
        let config = test_config();

        let issued = config.issue_refresh("yoon1234").unwrap();

        // Decode the payload segment by hand to check the raw claim set.
        let payload = issued.token.split('.').nth(1).unwrap();
        let decoded = base64_decode_segment(payload);
        let json: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert!(json.get("auth").is_none());
        assert_eq!(json["sub"], "yoon1234");
    }

    fn base64_decode_segment(segment: &str) -> Vec<u8> {
        const ALPHABET: &[u8] =
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
        let mut bits: u64 = 0;
        let mut count = 0;
        let mut out = Vec::new();
        for &b in segment.as_bytes() {
            let v = ALPHABET.iter().position(|&a| a == b).unwrap() as u64;
            bits = (bits << 6) | v;
            count += 6;
            if count >= 8 {
                count -= 8;
                out.push((bits >> count) as u8);
            }
        }
        out
    }

    #[test]
    fn test_refresh_tokens_are_unique_within_one_second() {
        let config = test_config();

        // Same subject, same second: the jti must still make the token
        // values distinct, or replacing a session would keep the old value.
        let first = config.issue_refresh("yoon1234").unwrap();
        let second = config.issue_refresh("yoon1234").unwrap();
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn test_wrong_kind_rejected() {
        let config = test_config();

        let access = config.issue_access("yoon1234", Role::Member).unwrap();
        let refresh = config.issue_refresh("yoon1234").unwrap();

        assert_eq!(
            config.verify_refresh(&access.token),
            Err(TokenError::Invalid)
        );
        assert_eq!(
            config.verify_access(&refresh.token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_admin_role_in_token() {
        let config = test_config();

        let issued = config.issue_access("boss", Role::Admin).unwrap();
        let claims = config.verify_access(&issued.token).unwrap();
        assert_eq!(claims.auth, Role::Admin);
    }

    #[test]
    fn test_malformed_token_is_invalid() {
        let config = test_config();

        assert_eq!(
            config.verify_access("not-a-token"),
            Err(TokenError::Invalid)
        );
        assert_eq!(config.verify_access(""), Err(TokenError::Invalid));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let config1 = JwtConfig::with_default_ttls(b"secret-1");
        let config2 = JwtConfig::with_default_ttls(b"secret-2");

        let issued = config1.issue_access("yoon1234", Role::Member).unwrap();
        assert_eq!(
            config2.verify_access(&issued.token),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn test_expired_token() {
        let secret = b"test-secret";
        let encoding_key = jsonwebtoken::EncodingKey::from_secret(secret);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        // Correctly signed, but exp is in the past.
        let claims = AccessClaims {
            sub: "yoon1234".to_string(),
            auth: Role::Member,
            kind: TokenKind::Access,
            iat: now - 100,
            exp: now - 50,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &encoding_key).unwrap();

        let config = JwtConfig::with_default_ttls(secret);
        assert_eq!(config.verify_access(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_remaining_ttl() {
        let config = test_config();

        let issued = config.issue_access("yoon1234", Role::Member).unwrap();
        let remaining = config.remaining_ttl(&issued.token).unwrap();
        assert!(remaining.as_secs() <= DEFAULT_ACCESS_TTL_SECS);
        assert!(remaining.as_secs() > DEFAULT_ACCESS_TTL_SECS - 5);

        assert!(config.remaining_ttl("garbage").is_none());
    }
}
