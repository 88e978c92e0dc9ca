use super::*;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;

const SECRET: &str = "supersecretjwtsecretforunittesting123";
const USER_ID: &str = "123e4567-e89b-12d3-a456-426614174000";

fn token(secret: &str, exp: usize, app_role: Option<&str>) -> String {
    let mut claims = json!({
        "sub": USER_ID,
        "role": "authenticated",
        "aud": "authenticated",
        "email": "cliente@example.com",
        "exp": exp,
    });
    if let Some(role) = app_role {
        claims["app_metadata"] = json!({ "role": role });
    }

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[test]
fn test_validate_supabase_jwt_success() {
    let claims = validate_supabase_jwt(&token(SECRET, 9_999_999_999, None), SECRET)
        .expect("Valid token should pass");
    assert_eq!(claims.sub, USER_ID);
    assert_eq!(claims.email.as_deref(), Some("cliente@example.com"));
    assert_eq!(claims.effective_role(), "authenticated");
}

#[test]
fn test_validate_supabase_jwt_expired() {
    assert!(validate_supabase_jwt(&token(SECRET, 1, None), SECRET).is_err());
}

#[test]
fn test_validate_supabase_jwt_invalid_signature() {
    assert!(validate_supabase_jwt(&token("wrongsecret", 9_999_999_999, None), SECRET).is_err());
}

#[test]
fn test_app_metadata_role_takes_precedence() {
    let claims = validate_supabase_jwt(&token(SECRET, 9_999_999_999, Some("admin")), SECRET)
        .expect("Valid token should pass");
    assert_eq!(claims.effective_role(), ADMIN_ROLE);

    let user = AuthUser {
        user_id: Uuid::parse_str(USER_ID).unwrap(),
        email: None,
        role: claims.effective_role(),
    };
    assert!(user.is_admin());
}
