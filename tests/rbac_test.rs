//! # 角色权限集成测试
//!
//! 针对仓库自带的 config/rbac.yaml

mod common;

use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case(&["user"], "/tournaments/42", "GET", true)]
#[case(&["user"], "/tournaments", "GET", true)]
#[case(&["user"], "/tournaments/42", "POST", false)]
#[case(&["user"], "/tournaments/42/matches", "GET", false)]
#[case(&["organizer"], "/tournaments/42/matches", "POST", true)]
#[case(&["organizer"], "/tournaments/42", "DELETE", true)]
#[case(&["organizer"], "/me", "GET", true)]
#[case(&["organizer"], "/roles", "GET", false)]
#[case(&["admin"], "/roles", "GET", true)]
#[case(&["admin"], "/users/3", "PUT", true)]
#[case(&["admin"], "/me/permissions", "GET", true)]
#[case(&["user", "ghost"], "/me", "GET", true)]
#[case(&["ghost"], "/me", "GET", false)]
fn bundled_roles(
    #[case] roles: &[&str],
    #[case] path: &str,
    #[case] method: &str,
    #[case] expected: bool,
) {
    let rbac = common::bundled_rbac();
    assert_eq!(rbac.can(roles, path, method), expected);
}

#[test]
fn role_keys_map_to_names() {
    let rbac = common::bundled_rbac();
    assert_eq!(rbac.role_name_for_key("tourney-admin"), Some("admin"));
    assert_eq!(rbac.role_name_for_key("tourney-user"), Some("user"));
    assert_eq!(rbac.list_roles(), vec!["admin", "organizer", "user"]);
}

#[test]
fn admin_inherits_transitively() {
    let rbac = common::bundled_rbac();
    let admin = rbac.get_permissions(&["admin"]);
    let organizer = rbac.get_permissions(&["organizer"]);
    let user = rbac.get_permissions(&["user"]);
    assert_eq!(user.len(), 4);
    assert_eq!(organizer.len(), 3 + user.len());
    assert_eq!(admin.len(), 2 + organizer.len());
}
