//! # Entity 模块
//!
//! 身份与访问核心使用的 Sea-ORM 实体定义

pub mod auth_codes;
pub mod auth_refresh_tokens;
pub mod auth_tokens;
pub mod string_list;
pub mod users;

pub use auth_codes::Entity as AuthCodes;
pub use auth_refresh_tokens::Entity as AuthRefreshTokens;
pub use auth_tokens::Entity as AuthTokens;
pub use string_list::StringList;
pub use users::Entity as Users;

#[cfg(test)]
mod tests;
