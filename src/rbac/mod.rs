//! # 角色权限模块
//!
//! YAML 角色定义、继承解析与路由级权限判断

pub mod engine;
pub mod model;
pub mod service;

pub use engine::Rbac;
pub use model::{Permission, RequestPermissions, Role, RoleDocument, WILDCARD, check_permission};
pub use service::RbacService;
