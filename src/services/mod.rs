// Tenancy
pub mod branches;
pub mod companies;
pub mod users;

// Menu
pub mod categories;
pub mod products;

// Ordering
pub mod customers;
pub mod orders;
pub mod tables;

// Back office
pub mod admin;
pub mod archival;
pub mod dashboard;
pub mod franchises;

// Peripheral
pub mod chatbot;
pub mod uploads;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect};
use uuid::Uuid;

use crate::auth::{AuthUser, Role};
use crate::entities::branch;
use crate::errors::ServiceError;

/// Loads a branch and checks the caller may manage it.
pub(crate) async fn load_branch_for<C: ConnectionTrait>(
    db: &C,
    actor: &AuthUser,
    branch_id: Uuid,
) -> Result<branch::Model, ServiceError> {
    let branch = branch::Entity::find_by_id(branch_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Branch", branch_id))?;

    if !actor.can_access_branch(&branch) {
        return Err(ServiceError::Forbidden(
            "You do not have access to this branch".to_string(),
        ));
    }

    Ok(branch)
}

/// Branch ids the caller may read, `None` meaning unrestricted.
pub(crate) async fn visible_branch_ids<C: ConnectionTrait>(
    db: &C,
    actor: &AuthUser,
) -> Result<Option<Vec<Uuid>>, ServiceError> {
    match actor.role {
        Role::SuperAdmin => Ok(None),
        Role::BranchManager => Ok(Some(actor.branch_id.into_iter().collect())),
        Role::CompanyAdmin => match actor.company_id {
            Some(company_id) => Ok(Some(
                branch::Entity::find()
                    .select_only()
                    .column(branch::Column::Id)
                    .filter(branch::Column::CompanyId.eq(company_id))
                    .into_tuple::<Uuid>()
                    .all(db)
                    .await?,
            )),
            None => Ok(Some(vec![])),
        },
        Role::Customer => Ok(Some(vec![])),
    }
}

/// Page/limit pair clamped to sane bounds.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub const MAX_LIMIT: u64 = 100;

    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Zero-based page index as used by sea-orm paginators
    pub fn index(&self) -> u64 {
        self.page - 1
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

/// Trims a string, mapping blank values to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
