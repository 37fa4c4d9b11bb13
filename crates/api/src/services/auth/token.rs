//! Signed access and refresh tokens (HS256).

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use modish_core::{Email, Role, UserId};

use super::Principal;
use super::error::TokenError;
use crate::config::JwtConfig;

const ACCESS_TYPE: &str = "access";
const REFRESH_TYPE: &str = "refresh";

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID as a decimal string.
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub typ: String,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a refresh token. No email or role: those are reloaded
/// from the database when the access token is renewed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    pub typ: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Build the service from the JWT configuration.
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    /// Access token lifetime.
    #[must_use]
    pub const fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Refresh token lifetime.
    #[must_use]
    pub const fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Issue an access token for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encode` if signing fails.
    pub fn issue_access(
        &self,
        user_id: UserId,
        email: &Email,
        role: Role,
    ) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            email: email.as_str().to_owned(),
            role,
            typ: ACCESS_TYPE.to_owned(),
            iat: now,
            exp: now + ttl_secs(self.access_ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encode)
    }

    /// Issue a refresh token for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encode` if signing fails.
    pub fn issue_refresh(&self, user_id: UserId) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            typ: REFRESH_TYPE.to_owned(),
            iat: now,
            exp: now + ttl_secs(self.refresh_ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Encode)
    }

    /// Validate an access token and return the principal it names.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for an expired token, `TokenError::WrongType`
    /// for a refresh token, and `TokenError::Invalid` for anything else that
    /// fails signature or claim validation.
    pub fn verify_access(&self, token: &str) -> Result<Principal, TokenError> {
        let claims = decode::<AccessClaims>(token, &self.decoding_key, &validation())
            .map_err(map_decode_error)?
            .claims;

        if claims.typ != ACCESS_TYPE {
            return Err(TokenError::WrongType);
        }

        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| TokenError::Invalid("subject is not a user id".to_owned()))?;
        let email = Email::parse(&claims.email)
            .map_err(|e| TokenError::Invalid(format!("email claim: {e}")))?;

        Ok(Principal {
            user_id,
            email,
            role: claims.role,
        })
    }

    /// Validate a refresh token and return the user it was issued to.
    ///
    /// # Errors
    ///
    /// Same as [`Self::verify_access`]; an access token is `WrongType`.
    pub fn verify_refresh(&self, token: &str) -> Result<UserId, TokenError> {
        let claims = decode::<RefreshClaims>(token, &self.decoding_key, &validation())
            .map_err(map_decode_error)?
            .claims;

        if claims.typ != REFRESH_TYPE {
            return Err(TokenError::WrongType);
        }

        claims
            .sub
            .parse::<UserId>()
            .map_err(|_| TokenError::Invalid("subject is not a user id".to_owned()))
    }
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> TokenError {
    match err.kind() {
        ErrorKind::ExpiredSignature => TokenError::Expired,
        // Refresh claims lack `email`/`role`, so decoding one as an access token fails here.
        ErrorKind::Json(_) => TokenError::WrongType,
        _ => TokenError::Invalid(err.to_string()),
    }
}

fn ttl_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX / 2)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    const SECRET: &str = "k3Y!q9Zr#4vT8wLp2@xN6mB0cF5hJ7sD";

    fn service() -> TokenService {
        TokenService::new(&JwtConfig {
            secret: SecretString::from(SECRET),
            access_ttl: Duration::from_secs(3600),
            refresh_ttl: Duration::from_secs(604_800),
            cookie_secure: false,
        })
    }

    fn email() -> Email {
        Email::parse("shopper@example.com").unwrap()
    }

    #[test]
    fn test_access_token_round_trip() {
        let tokens = service();
        let token = tokens
            .issue_access(UserId::new(7), &email(), Role::Admin)
            .unwrap();

        let principal = tokens.verify_access(&token).unwrap();
        assert_eq!(principal.user_id, UserId::new(7));
        assert_eq!(principal.email.as_str(), "shopper@example.com");
        assert_eq!(principal.role, Role::Admin);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let tokens = service();
        let refresh = tokens.issue_refresh(UserId::new(7)).unwrap();

        assert_eq!(tokens.verify_refresh(&refresh).unwrap(), UserId::new(7));
        assert!(matches!(
            tokens.verify_access(&refresh),
            Err(TokenError::WrongType)
        ));
    }

    #[test]
    fn test_access_token_is_not_a_refresh_token() {
        let tokens = service();
        let access = tokens
            .issue_access(UserId::new(7), &email(), Role::User)
            .unwrap();

        assert!(matches!(
            tokens.verify_refresh(&access),
            Err(TokenError::WrongType)
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub: "7".to_owned(),
            email: "shopper@example.com".to_owned(),
            role: Role::User,
            typ: ACCESS_TYPE.to_owned(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            service().verify_access(&token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let other = TokenService::new(&JwtConfig {
            secret: SecretString::from("Zz9!Yy8@Xx7#Ww6$Vv5%Uu4^Tt3&Ss2*"),
            access_ttl: Duration::from_secs(3600),
            refresh_ttl: Duration::from_secs(3600),
            cookie_secure: false,
        });
        let token = other
            .issue_access(UserId::new(1), &email(), Role::Admin)
            .unwrap();

        assert!(matches!(
            service().verify_access(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(service().verify_access("not-a-token").is_err());
    }
}
