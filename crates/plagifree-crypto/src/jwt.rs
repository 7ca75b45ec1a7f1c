use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use plagifree_core::{PlagiError, PlagiResult};
use serde::{Deserialize, Serialize};

/// Claims carried by a session token. `sub` is the account id.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign an HS256 access token valid for `ttl_hours`.
pub fn create_access_token(account_id: &str, secret: &str, ttl_hours: i64) -> PlagiResult<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = AccessTokenClaims {
        sub: account_id.to_string(),
        iat: now,
        exp: now + ttl_hours * 60 * 60,
    };
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).map_err(|e| PlagiError::Crypto(e.to_string()))
}

pub fn validate_access_token(token: &str, secret: &str) -> PlagiResult<AccessTokenClaims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    decode::<AccessTokenClaims>(token, &key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| PlagiError::Auth(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-jwt-tests";
    const ACCOUNT: &str = "4f1c2b8e-0000-4000-8000-000000000001";

    #[test]
    fn token_carries_account_id() {
        let token = create_access_token(ACCOUNT, SECRET, 168).unwrap();
        let claims = validate_access_token(&token, SECRET).unwrap();
        assert_eq!(claims.sub, ACCOUNT);
    }

    #[test]
    fn wrong_secret_fails() {
        let token = create_access_token(ACCOUNT, SECRET, 168).unwrap();
        assert!(validate_access_token(&token, "some-other-secret").is_err());
    }

    #[test]
    fn expiry_follows_configured_hours() {
        let token = create_access_token(ACCOUNT, SECRET, 168).unwrap();
        let claims = validate_access_token(&token, SECRET).unwrap();
        assert_eq!(claims.exp - claims.iat, 168 * 60 * 60);
    }

    #[test]
    fn expired_token_fails_with_expired_signature() {
        let now = chrono::Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: ACCOUNT.to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let key = EncodingKey::from_secret(SECRET.as_bytes());
        let token = encode(&Header::default(), &claims, &key).unwrap();

        let err = validate_access_token(&token, SECRET).unwrap_err();
        assert!(err.to_string().contains("ExpiredSignature"), "got: {err}");
    }
}
