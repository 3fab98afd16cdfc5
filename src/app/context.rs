//! 应用上下文（DI 容器）
//!
//! 统一持有跨模块共享的服务实例，便于在测试中注入替身实现。

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{
    AesGcmCipher, AuthGate, CredentialStore, FirstPartySessions, IdentityStorage, TokenIssuer,
    TokenRevoker, TtlPolicy, SigningKeyProvider, UserInfoProjector, lock,
};
use crate::config::AppConfig;
use crate::rbac::{Rbac, RbacService};

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub db: Arc<DatabaseConnection>,
    pub gate: Arc<AuthGate>,
    pub storage: Arc<IdentityStorage>,
    pub sessions: Arc<FirstPartySessions>,
    pub userinfo: Arc<UserInfoProjector>,
    pub rbac: RbacService,
}

impl AppContext {
    /// 所有签发与吊销共享同一个写锁实例
    pub fn new(
        config: AppConfig,
        db: Arc<DatabaseConnection>,
        rbac: Arc<Rbac>,
        signing_key: Arc<SigningKeyProvider>,
    ) -> Self {
        let store = CredentialStore::new(db.clone());
        let write_lock = lock::from_mode(config.auth.lock_mode);
        let policy = Arc::new(TtlPolicy::from_config(&config.auth.token));

        let issuer = Arc::new(TokenIssuer::new(store.clone(), policy, write_lock.clone()));
        let revoker = Arc::new(TokenRevoker::new(store.clone(), write_lock));
        let gate = Arc::new(AuthGate::new(
            store.clone(),
            Arc::new(AesGcmCipher::from_secret(&config.auth.crypto_secret)),
        ));
        let sessions = Arc::new(FirstPartySessions::new(
            issuer.clone(),
            revoker.clone(),
            gate.clone(),
            config.auth.builtin_client_id.clone(),
            config.auth.amr.clone(),
        ));
        let storage = Arc::new(IdentityStorage::new(
            store.clone(),
            issuer,
            revoker,
            signing_key,
            Duration::from_secs(config.auth.operation_timeout_secs),
        ));

        Self {
            config: Arc::new(config),
            db,
            gate,
            storage,
            sessions,
            userinfo: Arc::new(UserInfoProjector::new(store.clone())),
            rbac: RbacService::new(rbac, store),
        }
    }
}
