use actix_web::HttpRequest;
use bson::oid::ObjectId;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::{COOKIE_NAME, JWT_SECRET_KEY};

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default)]
    pub staff_access: HashMap<String, bool>,
    #[serde(default)]
    pub admin_roles: Vec<String>,
    pub exp: usize,
}

/// The authenticated requester, as carried by the session cookie.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: ObjectId,
    pub staff_access: HashMap<String, bool>,
    pub admin_roles: Vec<String>,
}

pub fn generate_session_token(claims: &SessionClaims) -> jsonwebtoken::errors::Result<String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(JWT_SECRET_KEY.as_bytes()),
    )
}

fn decode_session_token(token: &str) -> Option<SessionUser> {
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET_KEY.as_bytes()),
        &Validation::default(),
    )
    .ok()?;

    let user_id = ObjectId::parse_str(&data.claims.sub).ok()?;
    Some(SessionUser {
        user_id,
        staff_access: data.claims.staff_access,
        admin_roles: data.claims.admin_roles,
    })
}

/// Extracts the session user from the request cookie. `None` means no
/// authenticated user; authorization predicates fail closed on that.
pub fn session_from_request(req: &HttpRequest) -> Option<SessionUser> {
    let cookie = req.cookie(&COOKIE_NAME)?;
    decode_session_token(cookie.value())
}
