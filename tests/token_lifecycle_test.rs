//! # 令牌生命周期集成测试
//!
//! 通过 `OidcStorage` 验证签发、轮换、吊销与会话终止

mod common;

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use tourney_identity::auth::{OidcStorage, TokenExchangeRequest, TokenRequest, TokenType};
use tourney_identity::error::ErrorKind;

fn grant(subject: &str, client: &str) -> TokenRequest {
    TokenRequest::new(subject, client)
        .with_scopes(["openid", "profile", "offline_access"])
        .with_audience([client])
        .with_amr(["intra42"])
}

#[tokio::test]
async fn refresh_token_is_single_use() {
    let ctx = common::setup_context().await;
    let storage = ctx.storage.clone();
    let request = grant("7", "web");

    let first = storage
        .create_access_and_refresh_tokens(&request, None)
        .await
        .unwrap();
    let second = storage
        .create_access_and_refresh_tokens(&request, Some(&first.refresh_token))
        .await
        .unwrap();
    assert_ne!(first.refresh_token, second.refresh_token);

    let replay = storage
        .create_access_and_refresh_tokens(&request, Some(&first.refresh_token))
        .await
        .unwrap_err();
    assert_eq!(replay.kind(), ErrorKind::InvalidRefreshToken);

    // the rotated token still works exactly once
    storage
        .create_access_and_refresh_tokens(&request, Some(&second.refresh_token))
        .await
        .unwrap();
}

#[tokio::test]
async fn rotated_pair_keeps_grant_context() {
    let ctx = common::setup_context().await;
    let storage = ctx.storage.clone();
    let auth_time = Utc::now() - Duration::minutes(30);
    let request = grant("7", "web").with_auth_time(auth_time);

    let first = storage
        .create_access_and_refresh_tokens(&request, None)
        .await
        .unwrap();
    let mut refresh_view = storage
        .token_request_by_refresh_token(&first.refresh_token)
        .await
        .unwrap();
    assert_eq!(refresh_view.amr, vec!["intra42"]);
    assert_eq!(refresh_view.auth_time.timestamp(), auth_time.timestamp());

    refresh_view.set_current_scopes(&["openid", "email"]);
    assert_eq!(refresh_view.scopes, vec!["openid"]);

    let rotated = storage
        .create_access_and_refresh_tokens(&refresh_view.clone().into(), Some(&first.refresh_token))
        .await
        .unwrap();
    let info = storage
        .get_refresh_token_info("web", &rotated.refresh_token)
        .await
        .unwrap();
    assert_eq!(info.user_id, "7");
    assert_eq!(info.token_id, rotated.refresh_token);
}

#[tokio::test]
async fn first_party_access_outlives_third_party() {
    let ctx = common::setup_context().await;
    let storage = ctx.storage.clone();
    let before = Utc::now();

    let third_party = storage
        .create_access_token(&grant("7", "partner-app"))
        .await
        .unwrap();
    let first_party = storage
        .create_access_token(&grant("7", "builtin"))
        .await
        .unwrap();

    assert!(third_party.expiration > before);
    assert!(third_party.expiration <= before + Duration::minutes(6));
    assert!(first_party.expiration > third_party.expiration);
    assert!(first_party.expiration > before + Duration::days(29));
}

#[tokio::test]
async fn revoke_then_access_denied() {
    let ctx = common::setup_context().await;
    let storage = ctx.storage.clone();
    let issued = storage
        .create_access_and_refresh_tokens(&grant("7", "web"), None)
        .await
        .unwrap();

    let foreign = storage
        .revoke_token(&issued.access_token_id, "7", "other")
        .await
        .unwrap_err();
    assert_eq!(foreign.kind(), ErrorKind::InvalidClient);

    storage
        .revoke_token(&issued.access_token_id, "7", "web")
        .await
        .unwrap();
    let again = storage
        .revoke_token(&issued.access_token_id, "7", "web")
        .await
        .unwrap_err();
    assert_eq!(again.kind(), ErrorKind::AccessDenied);

    // the paired refresh token went with it
    let refresh = storage
        .token_request_by_refresh_token(&issued.refresh_token)
        .await
        .unwrap_err();
    assert_eq!(refresh.kind(), ErrorKind::InvalidRefreshToken);
}

#[tokio::test]
async fn terminate_session_removes_every_client() {
    let ctx = common::setup_context().await;
    let storage = ctx.storage.clone();
    let web = storage
        .create_access_and_refresh_tokens(&grant("7", "web"), None)
        .await
        .unwrap();
    let mobile = storage
        .create_access_and_refresh_tokens(&grant("7", "mobile"), None)
        .await
        .unwrap();
    let bystander = storage
        .create_access_and_refresh_tokens(&grant("8", "web"), None)
        .await
        .unwrap();

    storage.terminate_session("7", "web").await.unwrap();

    for token in [&web.refresh_token, &mobile.refresh_token] {
        let err = storage
            .token_request_by_refresh_token(token)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRefreshToken);
    }
    let err = storage
        .set_userinfo_from_token(&mobile.access_token_id, "7", "")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccessDenied);

    storage
        .token_request_by_refresh_token(&bystander.refresh_token)
        .await
        .unwrap();
}

#[tokio::test]
async fn auth_code_redeems_once() {
    let ctx = common::setup_context().await;
    let storage = ctx.storage.clone();

    storage.save_auth_code("request-1", "code-1").await.unwrap();
    assert_eq!(storage.consume_auth_code("code-1").await.unwrap(), "request-1");

    let err = storage.consume_auth_code("code-1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AccessDenied);
}

#[tokio::test]
async fn token_exchange_issues_fresh_pair() {
    let ctx = common::setup_context().await;
    let storage = ctx.storage.clone();
    let user_id = common::insert_user(&ctx.db, "carol", &["user"]).await;

    let mut request =
        TokenExchangeRequest::new("partner-app", user_id.to_string(), TokenType::AccessToken);
    request.scopes = vec!["openid".into(), "email".into()];
    storage
        .validate_token_exchange_request(&mut request)
        .await
        .unwrap();
    assert_eq!(request.requested_token_type, Some(TokenType::RefreshToken));
    storage.create_token_exchange_request(&request).await.unwrap();

    let issued = storage.create_tokens_from_exchange(&request).await.unwrap();
    let refresh = storage
        .token_request_by_refresh_token(&issued.refresh_token)
        .await
        .unwrap();
    assert!(refresh.amr.is_empty());
    assert_eq!(refresh.scopes, vec!["openid", "email"]);

    let info = storage
        .set_userinfo_from_token_exchange_request(&request)
        .await
        .unwrap();
    assert_eq!(info.email.as_deref(), Some("carol@tourney.test"));
    assert!(
        storage
            .get_private_claims_from_token_exchange_request(&request)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn id_token_cannot_become_refresh_token() {
    let ctx = common::setup_context().await;
    let mut request = TokenExchangeRequest::new("partner-app", "7", TokenType::IdToken);
    request.requested_token_type = Some(TokenType::RefreshToken);

    let err = ctx
        .storage
        .validate_token_exchange_request(&mut request)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
}

#[tokio::test]
async fn introspection_reflects_token_state() {
    let ctx = common::setup_context().await;
    let user_id = common::insert_user(&ctx.db, "dave", &["user"]).await;
    let subject = user_id.to_string();
    let issued = ctx
        .storage
        .create_access_token(&grant(&subject, "web"))
        .await
        .unwrap();

    let introspection = ctx
        .storage
        .set_introspection_from_token(&issued.token_id, &subject, "web")
        .await
        .unwrap();
    assert!(introspection.active);
    assert_eq!(introspection.client_id, "web");
    assert_eq!(introspection.userinfo.preferred_username.as_deref(), Some("dave"));
}

#[tokio::test]
async fn key_set_exposes_public_key() {
    let ctx = common::setup_context().await;
    let keys = ctx.storage.key_set();
    assert_eq!(keys.keys.len(), 1);
    assert_eq!(keys.keys[0].kid, ctx.storage.signing_key().key_id());
    ctx.storage.health().await.unwrap();
}
