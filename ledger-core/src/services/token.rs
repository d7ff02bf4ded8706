//! Token service - issues and validates HMAC-signed account tokens

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

/// Claims carried by an account token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub account_number: i64,
    /// Expiry, seconds since the epoch
    pub exp: i64,
    /// Issue time, seconds since the epoch
    pub iat: i64,
}

/// Issues and validates bearer tokens with a shared secret
///
/// Only the HMAC family is accepted on validation; a token signed with any
/// other algorithm is rejected before its signature is looked at.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::Config("token secret cannot be empty".to_string()));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// Issue a token for an account number, valid for the configured ttl
    pub fn issue(&self, account_number: i64) -> Result<String> {
        self.issue_at(account_number, Utc::now())
    }

    /// Issue a token as if it were `now`
    pub fn issue_at(&self, account_number: i64, now: DateTime<Utc>) -> Result<String> {
        let claims = Claims {
            account_number,
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| Error::TokenSigning(e.to_string()))
    }

    /// Verify signature, algorithm family and expiry, returning the claims
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| Error::InvalidToken(e.to_string()))
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", Duration::hours(1)).unwrap()
    }

    #[test]
    fn test_issue_and_validate() {
        let tokens = service();
        let token = tokens.issue(5931).unwrap();
        let claims = tokens.validate(&token).unwrap();
        assert_eq!(claims.account_number, 5931);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_claims_use_camel_case() {
        let json = serde_json::to_value(Claims { account_number: 1, exp: 2, iat: 0 }).unwrap();
        assert_eq!(json["accountNumber"], 1);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = service().issue(1).unwrap();
        let other = TokenService::new("other-secret", Duration::hours(1)).unwrap();
        assert!(matches!(other.validate(&token), Err(Error::InvalidToken(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = service();
        let token = tokens
            .issue_at(1, Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(matches!(tokens.validate(&token), Err(Error::InvalidToken(_))));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(service().validate("not.a.token").is_err());
        assert!(service().validate("").is_err());
    }

    #[test]
    fn test_non_hmac_algorithm_is_rejected() {
        // {"alg":"none","typ":"JWT"} . {"accountNumber":1,"exp":9999999999,"iat":0} . (empty)
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.\
                     eyJhY2NvdW50TnVtYmVyIjoxLCJleHAiOjk5OTk5OTk5OTksImlhdCI6MH0.";
        assert!(matches!(service().validate(token), Err(Error::InvalidToken(_))));
    }

    #[test]
    fn test_empty_secret_is_config_error() {
        assert!(matches!(
            TokenService::new("", Duration::hours(1)),
            Err(Error::Config(_))
        ));
    }
}
