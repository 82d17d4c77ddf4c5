use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;

use crate::domain::{Identity, Role};
use crate::infrastructure::http::api::ApiError;

/// Shared verification context for bearer tokens, injected into the router as
/// an extension.
#[derive(Clone)]
pub struct AuthContext {
    decoding_key: Arc<DecodingKey>,
}

impl AuthContext {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    /// Decodes an HMAC-signed token into a request identity. The front-end
    /// usually signs HS256 but HS384/HS512 are accepted too.
    pub fn decode(&self, token: &str) -> Result<Identity, ApiError> {
        let header = decode_header(token).map_err(|_| ApiError::Unauthorized)?;
        let algorithm = match header.alg {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => header.alg,
            _ => return Err(ApiError::Unauthorized),
        };

        // exp is optional in these tokens; checked manually below when present
        let mut validation = Validation::new(algorithm);
        validation.required_spec_claims = Default::default();
        validation.validate_exp = false;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| ApiError::Unauthorized)?;
        let claims = data.claims;

        if claims.exp.is_some_and(|exp| exp < Utc::now().timestamp()) {
            return Err(ApiError::Unauthorized);
        }

        let subject = claims
            .sub
            .or_else(|| claims.email.clone())
            .unwrap_or_else(|| "user".to_string());

        Ok(Identity {
            subject,
            email: claims.email,
            name: claims.name,
            role: claims.role.unwrap_or(Role::Owner),
            org_id: claims.org_id.unwrap_or(1),
        })
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default, alias = "orgId")]
    org_id: Option<i64>,
    #[serde(default)]
    exp: Option<i64>,
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ApiError::InternalServerError("auth context missing".to_string()))?;

        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let (scheme, token) = header_value.split_once(' ').ok_or(ApiError::Unauthorized)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(ApiError::Unauthorized);
        }

        auth.decode(token.trim())
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    use super::*;

    const SECRET: &str = "test-secret";

    fn token_for(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn decodes_identity_with_defaults() {
        let context = AuthContext::new(SECRET);
        let token = token_for(json!({"email": "alice@acme.test", "name": "Alice"}), SECRET);

        let identity = context.decode(&token).unwrap();
        assert_eq!(identity.subject, "alice@acme.test");
        assert_eq!(identity.role, Role::Owner);
        assert_eq!(identity.org_id, 1);
        assert_eq!(identity.principal_email(), "alice@acme.test");
    }

    #[test]
    fn decodes_explicit_role_and_org() {
        let context = AuthContext::new(SECRET);
        let token = token_for(
            json!({"sub": "u-7", "role": "approver", "orgId": 42}),
            SECRET,
        );

        let identity = context.decode(&token).unwrap();
        assert_eq!(identity.subject, "u-7");
        assert_eq!(identity.role, Role::Approver);
        assert_eq!(identity.org_id, 42);
    }

    #[test]
    fn rejects_wrong_secret() {
        let context = AuthContext::new(SECRET);
        let token = token_for(json!({"sub": "alice"}), "another-secret");

        assert!(matches!(context.decode(&token), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn rejects_expired_token() {
        let context = AuthContext::new(SECRET);
        let token = token_for(json!({"sub": "alice", "exp": 1}), SECRET);

        assert!(matches!(context.decode(&token), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn rejects_unknown_role() {
        let context = AuthContext::new(SECRET);
        let token = token_for(json!({"sub": "alice", "role": "superuser"}), SECRET);

        assert!(matches!(context.decode(&token), Err(ApiError::Unauthorized)));
    }
}
