/*!
 * # Role-Based Access Control (RBAC) Module
 *
 * Roles are stored on the user row by name. Each role expands to a fixed
 * permission list that is embedded in the access token at login.
 */

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::warn;
use utoipa::ToSchema;

use super::permissions::consts;

/// User roles known to the platform
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    Display,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    CompanyAdmin,
    BranchManager,
    Customer,
}

impl Role {
    pub fn is_staff(self) -> bool {
        !matches!(self, Role::Customer)
    }

    pub fn description(self) -> &'static str {
        match self {
            Role::SuperAdmin => "Platform operator with full access",
            Role::CompanyAdmin => "Manages every branch of one company",
            Role::BranchManager => "Runs the daily operation of a single branch",
            Role::Customer => "Places and tracks own orders",
        }
    }

    /// Permissions granted to the role.
    pub fn permissions(self) -> Vec<String> {
        match ROLE_PERMISSIONS.get(&self) {
            Some(perms) => perms.iter().map(|p| p.to_string()).collect(),
            None => {
                warn!(role = %self, "Role has no permission set");
                vec![]
            }
        }
    }
}

lazy_static! {
    static ref ROLE_PERMISSIONS: HashMap<Role, Vec<&'static str>> = {
        let mut roles = HashMap::new();

        roles.insert(Role::SuperAdmin, vec!["*"]);

        roles.insert(
            Role::CompanyAdmin,
            vec![
                consts::COMPANIES_READ,
                consts::COMPANIES_UPDATE,
                consts::USERS_MANAGE,
                "branches:*",
                "categories:*",
                "products:*",
                "tables:*",
                "orders:*",
                "franchises:*",
                consts::CUSTOMERS_READ,
                consts::DASHBOARD_READ,
                consts::REPORTS_READ,
                consts::UPLOADS_CREATE,
                consts::ADDRESSES_MANAGE,
            ],
        );

        roles.insert(
            Role::BranchManager,
            vec![
                consts::BRANCHES_READ,
                consts::BRANCHES_UPDATE,
                "categories:*",
                "products:*",
                "tables:*",
                consts::ORDERS_READ,
                consts::ORDERS_CREATE,
                consts::ORDERS_UPDATE,
                consts::ORDERS_CANCEL,
                consts::CUSTOMERS_READ,
                consts::DASHBOARD_READ,
                consts::REPORTS_READ,
                consts::UPLOADS_CREATE,
                consts::ADDRESSES_MANAGE,
            ],
        );

        roles.insert(
            Role::Customer,
            vec![consts::ORDERS_CREATE, consts::ADDRESSES_MANAGE],
        );

        roles
    };
}

/// Check if a granted permission covers a required one.
///
/// `orders:*` covers every `orders:` action and `*` covers everything.
pub fn check_permission(granted: &str, required: &str) -> bool {
    if granted == "*" || granted == required {
        return true;
    }

    match granted.strip_suffix(":*") {
        Some(resource) => required
            .split_once(':')
            .map_or(false, |(required_resource, _)| required_resource == resource),
        None => false,
    }
}

/// All roles with their descriptions, used by the admin views.
pub fn all_roles() -> Vec<(Role, &'static str)> {
    Role::iter().map(|r| (r, r.description())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case("orders:read", "orders:read", true)]
    #[case("orders:*", "orders:cancel", true)]
    #[case("orders:*", "ordersx:read", false)]
    #[case("*", "admin:seed", true)]
    #[case("products:read", "products:update", false)]
    fn permission_matching(#[case] granted: &str, #[case] required: &str, #[case] ok: bool) {
        assert_eq!(check_permission(granted, required), ok);
    }

    #[test]
    fn role_names_round_trip_through_strings() {
        assert_eq!(Role::BranchManager.to_string(), "BRANCH_MANAGER");
        assert_eq!(Role::from_str("COMPANY_ADMIN").unwrap(), Role::CompanyAdmin);
        assert!(Role::from_str("admin").is_err());
    }

    #[test]
    fn customers_cannot_manage_catalog() {
        let perms = Role::Customer.permissions();
        assert!(perms.iter().any(|p| check_permission(p, consts::ORDERS_CREATE)));
        assert!(!perms.iter().any(|p| check_permission(p, consts::PRODUCTS_UPDATE)));
        assert!(!perms.iter().any(|p| check_permission(p, consts::ORDERS_READ)));
    }

    #[test]
    fn every_role_has_permissions() {
        for (role, _) in all_roles() {
            assert!(!role.permissions().is_empty(), "{} has none", role);
        }
    }
}
