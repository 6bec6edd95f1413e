use rollbook::config::jwt::JwtConfig;
use rollbook::utils::jwt::{create_access_token, verify_token};
use uuid::Uuid;

fn test_config(expiry: i64) -> JwtConfig {
    JwtConfig {
        secret: "unit-test-secret".to_string(),
        access_token_expiry: expiry,
    }
}

#[test]
fn test_token_roundtrip() {
    let config = test_config(3600);
    let user_id = Uuid::new_v4();
    let roles = vec!["admin".to_string(), "teacher".to_string()];

    let token = create_access_token(user_id, "jdoe", &roles, &config).unwrap();
    let claims = verify_token(&token, &config).unwrap();

    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.username, "jdoe");
    assert_eq!(claims.roles, roles);
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_token_rejects_wrong_secret() {
    let config = test_config(3600);
    let token = create_access_token(Uuid::new_v4(), "jdoe", &[], &config).unwrap();

    let other = JwtConfig {
        secret: "a-different-secret".to_string(),
        access_token_expiry: 3600,
    };
    assert!(verify_token(&token, &other).is_err());
}

#[test]
fn test_token_rejects_garbage() {
    let config = test_config(3600);
    assert!(verify_token("not.a.token", &config).is_err());
}

#[test]
fn test_expired_token_rejected() {
    // Issue a token that expired beyond the default leeway.
    let config = test_config(-120);
    let token = create_access_token(Uuid::new_v4(), "jdoe", &[], &config).unwrap();
    assert!(verify_token(&token, &config).is_err());
}
