//! # 身份核心
//!
//! 令牌签发、轮换、吊销，以及不透明引用令牌的校验

pub mod cipher;
pub mod exchange;
pub mod gate;
pub mod issuance;
pub mod lock;
pub mod policy;
pub mod revocation;
pub mod scopes;
pub mod session;
pub mod signing;
pub mod storage;
pub mod store;
pub mod types;
pub mod userinfo;

pub use cipher::{AesGcmCipher, ReferenceCipher};
pub use gate::{AuthGate, check_scopes};
pub use issuance::{RefreshTokenInfo, TokenIssuer};
pub use lock::{GlobalWriteLock, PerSubjectWriteLock, WriteGuard, WriteSerializer};
pub use policy::TtlPolicy;
pub use revocation::TokenRevoker;
pub use session::FirstPartySessions;
pub use signing::{Jwk, JwkSet, SigningKeyProvider};
pub use storage::{IdentityStorage, OidcStorage};
pub use store::CredentialStore;
pub use types::{
    IssuedAccessToken, IssuedTokens, RefreshTokenRequest, RequestClaims, TokenExchangeRequest,
    TokenRequest, TokenSet, TokenType,
};
pub use userinfo::{Introspection, UserInfo, UserInfoProjector};
