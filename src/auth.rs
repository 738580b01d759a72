use crate::error::{AppError, AppResult};
use argon2::Argon2;
use axum::{
    async_trait,
    extract::{FromRequest, RequestParts, TypedHeader},
    headers::{authorization::Bearer, Authorization},
};
use jsonwebtoken::{
    errors::Result as JwtResult, DecodingKey, EncodingKey, Header, TokenData, Validation,
};
use password_hash::{
    self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use serde::{Deserialize, Serialize};
use std::{ops::Deref, time::Duration};

/// How long a login stays valid before the client has to authenticate again.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub fn hash_password(password: impl AsRef<[u8]>) -> password_hash::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_ref(), &salt)
        .map(|h| h.to_string())
}

pub fn verify_password(
    password: impl AsRef<[u8]>,
    password_hash: impl AsRef<str>,
) -> password_hash::Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash.as_ref())?;
    Ok(Argon2::default()
        .verify_password(password.as_ref(), &parsed_hash)
        .is_ok())
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

lazy_static::lazy_static! {
    // TODO: use jwt_secret from config instead of env var
    static ref KEYS: Keys = {
        let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
        Keys {
            encoding: EncodingKey::from_base64_secret(&secret).expect("JWT_SECRET is not valid base64"),
            decoding: DecodingKey::from_base64_secret(&secret).expect("JWT_SECRET is not valid base64"),
        }
    };
}

/// Which panel a token grants access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Member,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Club id for admin tokens, member id for member tokens.
    pub sub: i32,
    pub role: Role,
    pub exp: u64,
}

#[allow(unused_must_use)]
pub fn ensure_jwt_secret_is_valid() {
    KEYS.deref();
}

pub fn generate_jwt(sub: i32, role: Role, exp: Duration) -> JwtResult<String> {
    jsonwebtoken::encode(
        &Header::default(),
        &Claims {
            sub,
            role,
            exp: jsonwebtoken::get_current_timestamp() + exp.as_secs(),
        },
        &KEYS.encoding,
    )
}

pub fn validate_jwt(token: &str) -> JwtResult<TokenData<Claims>> {
    jsonwebtoken::decode::<Claims>(token, &KEYS.decoding, &Validation::default())
}

/// Extractor for club-admin endpoints; yields the authenticated club id.
pub struct AdminAuth(pub i32);

/// Extractor for member endpoints; yields the authenticated member id.
pub struct MemberAuth(pub i32);

async fn bearer_claims<B: Send>(req: &mut RequestParts<B>) -> AppResult<Claims> {
    let TypedHeader(Authorization(bearer)) =
        TypedHeader::<Authorization<Bearer>>::from_request(req)
            .await
            .map_err(|_| AppError::auth("missing bearer token"))?;

    let token = validate_jwt(bearer.token())
        .map_err(|_| AppError::auth("invalid or expired session"))?;
    Ok(token.claims)
}

#[async_trait]
impl<B: Send> FromRequest<B> for AdminAuth {
    type Rejection = AppError;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(req).await?;
        match claims.role {
            Role::Admin => Ok(AdminAuth(claims.sub)),
            Role::Member => Err(AppError::auth("club admin session required")),
        }
    }
}

#[async_trait]
impl<B: Send> FromRequest<B> for MemberAuth {
    type Rejection = AppError;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(req).await?;
        match claims.role {
            Role::Member => Ok(MemberAuth(claims.sub)),
            Role::Admin => Err(AppError::auth("member session required")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies_and_rejects() {
        let hash = hash_password("rahulverma08").unwrap();
        assert!(verify_password("rahulverma08", &hash).unwrap());
        assert!(!verify_password("rahulverma09", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("open sesame").unwrap();
        let second = hash_password("open sesame").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("open sesame", &second).unwrap());
    }

    #[test]
    fn jwt_round_trips_subject_and_role() {
        // base64 of "test-secret"; set before KEYS is first touched
        std::env::set_var("JWT_SECRET", "dGVzdC1zZWNyZXQ=");

        let token = generate_jwt(42, Role::Admin, SESSION_TTL).unwrap();
        let data = validate_jwt(&token).unwrap();
        assert_eq!(data.claims.sub, 42);
        assert_eq!(data.claims.role, Role::Admin);

        let token = generate_jwt(7, Role::Member, SESSION_TTL).unwrap();
        let data = validate_jwt(&token).unwrap();
        assert_eq!(data.claims.role, Role::Member);

        assert!(validate_jwt("not-a-token").is_err());
    }
}
