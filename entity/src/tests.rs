//! # 实体定义测试

use crate::{StringList, auth_codes, auth_refresh_tokens, auth_tokens, users};
use chrono::{Duration, Utc};
use sea_orm::Set;

#[test]
fn test_access_token_activity_is_strict() {
    let now = Utc::now().naive_utc();
    let token = auth_tokens::Model {
        id: "t1".to_string(),
        application_id: "web".to_string(),
        subject: "42".to_string(),
        refresh_token_id: None,
        audience: StringList::default(),
        scopes: vec!["openid".to_string()].into(),
        expiration: now,
    };

    assert!(!token.is_active_at(now));
    assert!(token.is_active_at(now - Duration::seconds(1)));
}

#[test]
fn test_refresh_token_and_code_expiry() {
    let now = Utc::now().naive_utc();
    let code = auth_codes::Model {
        id: "code".to_string(),
        auth_request_id: "req".to_string(),
        expiration: now + Duration::minutes(5),
    };
    assert!(code.is_valid_at(now));
    assert!(!code.is_valid_at(now + Duration::minutes(6)));

    let refresh = auth_refresh_tokens::Model {
        id: "r1".to_string(),
        subject: "42".to_string(),
        user_id: "42".to_string(),
        application_id: "web".to_string(),
        auth_time: now,
        amr: vec!["pwd".to_string()].into(),
        audience: StringList::default(),
        scopes: StringList::default(),
        expiration: now + Duration::hours(5),
    };
    assert!(refresh.is_active_at(now));
    assert!(refresh.amr.contains("pwd"));
}

#[test]
fn test_user_given_name_prefers_usual_first_name() {
    let now = Utc::now().naive_utc();
    let mut user = users::Model {
        id: 1,
        username: "jdoe".to_string(),
        email: "jdoe@example.com".to_string(),
        first_name: "Jonathan".to_string(),
        last_name: "Doe".to_string(),
        usual_first_name: None,
        usual_full_name: "Jonathan Doe".to_string(),
        picture: None,
        roles: vec!["user".to_string()].into(),
        created_at: now,
        updated_at: now,
    };
    assert_eq!(user.given_name(), "Jonathan");

    user.usual_first_name = Some("John".to_string());
    assert_eq!(user.given_name(), "John");
}

#[test]
fn test_active_model_construction() {
    let token = auth_tokens::ActiveModel {
        id: Set("t2".to_string()),
        application_id: Set("builtin".to_string()),
        ..Default::default()
    };
    assert_eq!(token.id.as_ref(), "t2");
    assert_eq!(token.application_id.as_ref(), "builtin");
}

#[test]
fn test_string_list_serializes_as_plain_array() {
    let list: StringList = vec!["openid".to_string(), "email".to_string()].into();
    let json = serde_json::to_string(&list).unwrap();
    assert_eq!(json, r#"["openid","email"]"#);
}
