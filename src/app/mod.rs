//! # 应用装配
//!
//! 将配置、数据库、角色引擎与签名密钥装配为共享上下文

pub mod context;

pub use context::AppContext;
