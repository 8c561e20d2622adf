use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::User;
use crate::error::{AppError, AuthError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,      // User ID
    pub username: String, // Snapshot at issue time
    pub email: String,
    pub iat: i64,         // Issued at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>, // Expiration time, when configured
}

/// Identity carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl TryFrom<Claims> for AuthenticatedUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AuthError::InvalidClaims)?;

        Ok(Self {
            id,
            username: claims.username,
            email: claims.email,
        })
    }
}

/// Issues and verifies HS256 tokens against one process-wide secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: Option<Duration>,
}

impl TokenService {
    pub fn new(secret: &str, expiry_hours: Option<i64>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // `exp` is only present when an expiry is configured; it is still checked when present.
        validation.set_required_spec_claims(&["sub"]);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry: expiry_hours.map(Duration::hours),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: self.expiry.map(|expiry| (now + expiry).timestamp()),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("failed to sign token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        // Header first so structural defects are told apart from bad claims.
        decode_header(token).map_err(|_| AuthError::Malformed)?;

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => AuthError::BadSignature,
                ErrorKind::ExpiredSignature => AuthError::Expired,
                ErrorKind::InvalidToken => AuthError::Malformed,
                _ => AuthError::InvalidClaims,
            }
        })?;

        AuthenticatedUser::try_from(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(id: i64, username: &str) -> User {
        let now = Utc::now();
        User {
            id,
            username: username.to_string(),
            email: format!("{}@x.com", username),
            password_hash: "$2b$04$hash".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn sign(secret: &str, payload: &serde_json::Value) -> String {
        encode(&Header::default(), payload, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_issue_then_verify() {
        let tokens = TokenService::new("test_secret", None);
        let token = tokens.issue(&user(42, "bob")).unwrap();

        let identity = tokens.verify(&token).unwrap();
        assert_eq!(
            identity,
            AuthenticatedUser { id: 42, username: "bob".into(), email: "bob@x.com".into() }
        );
    }

    #[test]
    fn test_no_expiry_claim_unless_configured() {
        let token = TokenService::new("s", None).issue(&user(1, "a")).unwrap();
        let data = decode::<serde_json::Value>(
            &token,
            &DecodingKey::from_secret(b"s"),
            &{
                let mut v = Validation::new(Algorithm::HS256);
                v.set_required_spec_claims::<&str>(&[]);
                v
            },
        )
        .unwrap();
        assert!(data.claims.get("exp").is_none());
        assert_eq!(data.claims["sub"], "1");

        let token = TokenService::new("s", Some(24)).issue(&user(1, "a")).unwrap();
        assert!(TokenService::new("s", Some(24)).verify(&token).is_ok());
    }

    #[test]
    fn test_other_secret_is_bad_signature() {
        let token = TokenService::new("secret-one", None).issue(&user(1, "a")).unwrap();
        let result = TokenService::new("secret-two", None).verify(&token);
        assert_eq!(result, Err(AuthError::BadSignature));
    }

    #[test]
    fn test_other_algorithm_is_rejected() {
        let payload = json!({ "sub": "1", "username": "a", "email": "a@x.com", "iat": 0 });
        let token = encode(
            &Header::new(Algorithm::HS512),
            &payload,
            &EncodingKey::from_secret(b"test_secret"),
        )
        .unwrap();

        let result = TokenService::new("test_secret", None).verify(&token);
        assert_eq!(result, Err(AuthError::BadSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let tokens = TokenService::new("test_secret", None);
        for token in ["", "not-a-token", "a.b", "!!!.???.***"] {
            assert_eq!(tokens.verify(token), Err(AuthError::Malformed), "token {:?}", token);
        }
    }

    #[test]
    fn test_corrupted_token_fails() {
        let tokens = TokenService::new("test_secret", None);
        let token = tokens.issue(&user(7, "eve")).unwrap();

        // Flip one character in the payload segment.
        let dot = token.find('.').unwrap();
        let mut bytes = token.into_bytes();
        let i = dot + 5;
        bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
        let corrupted = String::from_utf8(bytes).unwrap();

        assert!(tokens.verify(&corrupted).is_err());
    }

    #[test]
    fn test_missing_fields_are_invalid_claims() {
        let tokens = TokenService::new("test_secret", None);

        let no_sub = sign("test_secret", &json!({ "username": "a", "email": "a@x.com", "iat": 0 }));
        assert_eq!(tokens.verify(&no_sub), Err(AuthError::InvalidClaims));

        let no_username = sign("test_secret", &json!({ "sub": "1", "email": "a@x.com", "iat": 0 }));
        assert_eq!(tokens.verify(&no_username), Err(AuthError::InvalidClaims));

        let bad_sub = sign(
            "test_secret",
            &json!({ "sub": "bob", "username": "bob", "email": "b@x.com", "iat": 0 }),
        );
        assert_eq!(tokens.verify(&bad_sub), Err(AuthError::InvalidClaims));
    }

    #[test]
    fn test_expired_token() {
        let tokens = TokenService::new("test_secret", Some(1));
        let past = Utc::now().timestamp() - 7200;
        let token = sign(
            "test_secret",
            &json!({ "sub": "1", "username": "a", "email": "a@x.com", "iat": past, "exp": past + 3600 }),
        );
        assert_eq!(tokens.verify(&token), Err(AuthError::Expired));
    }
}
