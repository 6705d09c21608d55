/*!
 * # Permissions Module
 *
 * Permission strings have the form `resource:action`. Routers guard
 * endpoints with these constants through `AuthRouterExt::with_permission`.
 */

/// Permission actions
pub struct Actions;

impl Actions {
    pub const READ: &'static str = "read";
    pub const CREATE: &'static str = "create";
    pub const UPDATE: &'static str = "update";
    pub const DELETE: &'static str = "delete";
    pub const MANAGE: &'static str = "manage";
    pub const ALL: &'static str = "*";
}

/// Resource types
pub struct Resources;

impl Resources {
    pub const COMPANIES: &'static str = "companies";
    pub const BRANCHES: &'static str = "branches";
    pub const CATEGORIES: &'static str = "categories";
    pub const PRODUCTS: &'static str = "products";
    pub const TABLES: &'static str = "tables";
    pub const ORDERS: &'static str = "orders";
    pub const CUSTOMERS: &'static str = "customers";
    pub const ADDRESSES: &'static str = "addresses";
    pub const USERS: &'static str = "users";
    pub const DASHBOARD: &'static str = "dashboard";
    pub const FRANCHISES: &'static str = "franchises";
    pub const REPORTS: &'static str = "reports";
    pub const UPLOADS: &'static str = "uploads";
    pub const ADMIN: &'static str = "admin";
}

/// Common permission string constants for compile-time safety
pub mod consts {
    // Companies
    pub const COMPANIES_READ: &str = "companies:read";
    pub const COMPANIES_CREATE: &str = "companies:create";
    pub const COMPANIES_UPDATE: &str = "companies:update";
    pub const COMPANIES_DELETE: &str = "companies:delete";

    // Branches
    pub const BRANCHES_READ: &str = "branches:read";
    pub const BRANCHES_CREATE: &str = "branches:create";
    pub const BRANCHES_UPDATE: &str = "branches:update";
    pub const BRANCHES_DELETE: &str = "branches:delete";

    // Menu
    pub const CATEGORIES_READ: &str = "categories:read";
    pub const CATEGORIES_CREATE: &str = "categories:create";
    pub const CATEGORIES_UPDATE: &str = "categories:update";
    pub const CATEGORIES_DELETE: &str = "categories:delete";
    pub const PRODUCTS_READ: &str = "products:read";
    pub const PRODUCTS_CREATE: &str = "products:create";
    pub const PRODUCTS_UPDATE: &str = "products:update";
    pub const PRODUCTS_DELETE: &str = "products:delete";

    // Dine-in tables
    pub const TABLES_READ: &str = "tables:read";
    pub const TABLES_CREATE: &str = "tables:create";
    pub const TABLES_UPDATE: &str = "tables:update";
    pub const TABLES_DELETE: &str = "tables:delete";
    pub const TABLES_COLLECT: &str = "tables:collect";

    // Orders
    pub const ORDERS_READ: &str = "orders:read";
    pub const ORDERS_CREATE: &str = "orders:create";
    pub const ORDERS_UPDATE: &str = "orders:update";
    pub const ORDERS_DELETE: &str = "orders:delete";
    pub const ORDERS_CANCEL: &str = "orders:cancel";

    // People
    pub const CUSTOMERS_READ: &str = "customers:read";
    pub const ADDRESSES_MANAGE: &str = "addresses:manage";
    pub const USERS_MANAGE: &str = "users:manage";

    // Back office
    pub const DASHBOARD_READ: &str = "dashboard:read";
    pub const FRANCHISES_READ: &str = "franchises:read";
    pub const FRANCHISES_UPDATE: &str = "franchises:update";
    pub const REPORTS_READ: &str = "reports:read";
    pub const UPLOADS_CREATE: &str = "uploads:create";
}

/// Format a permission string
pub fn format_permission(resource: &str, action: &str) -> String {
    format!("{}:{}", resource, action)
}
