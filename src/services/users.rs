use crate::{
    auth::{hash_password, verify_password, AuthService, AuthUser, Role, TokenResponse},
    entities::{branch, company, user},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateStaffUserRequest {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub phone: Option<String>,
}

/// Public view of a user account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: String,
    pub company_id: Option<Uuid>,
    pub branch_id: Option<Uuid>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserProfile {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            role: model.role,
            company_id: model.company_id,
            branch_id: model.branch_id,
            phone: model.phone,
            is_active: model.is_active,
            last_login_at: model.last_login_at,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub token: TokenResponse,
    pub user: UserProfile,
}

const INVALID_CREDENTIALS: &str = "Invalid email or password";

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Accounts, credentials and staff management
#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    auth: Arc<AuthService>,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>, auth: Arc<AuthService>) -> Self {
        Self { db, auth }
    }

    /// Registers a customer account and signs it in
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterRequest) -> Result<AuthResponse, ServiceError> {
        input.validate()?;
        let email = normalize_email(&input.email);
        self.ensure_email_free(&email).await?;

        let user = self
            .insert_user(
                input.name.trim().to_string(),
                email,
                &input.password,
                Role::Customer,
                None,
                None,
                super::non_blank(input.phone),
            )
            .await?;

        info!(user_id = %user.id, "Customer registered");
        self.respond_with_token(user)
    }

    /// Verifies credentials and issues an access token
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginRequest) -> Result<AuthResponse, ServiceError> {
        input.validate()?;
        let email = normalize_email(&input.email);

        let user = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !user.is_active || !verify_password(&input.password, &user.password_hash) {
            warn!(user_id = %user.id, "Rejected login attempt");
            return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let mut active: user::ActiveModel = user.into();
        active.last_login_at = Set(Some(Utc::now()));
        let user = active.update(&*self.db).await?;

        info!(user_id = %user.id, "User logged in");
        self.respond_with_token(user)
    }

    /// Revokes the presented access token
    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        self.auth.revoke_token(token).await?;
        Ok(())
    }

    #[instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn me(&self, actor: &AuthUser) -> Result<UserProfile, ServiceError> {
        user::Entity::find_by_id(actor.user_id)
            .one(&*self.db)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| ServiceError::not_found("User", actor.user_id))
    }

    /// Creates company or branch staff within the caller's reach
    #[instrument(skip(self, actor, input), fields(role = %input.role))]
    pub async fn create_staff_user(
        &self,
        actor: &AuthUser,
        input: CreateStaffUserRequest,
    ) -> Result<UserProfile, ServiceError> {
        input.validate()?;

        let company_id = match input.role {
            Role::Customer => {
                return Err(ServiceError::BadRequest(
                    "Customers register themselves".to_string(),
                ))
            }
            Role::SuperAdmin => {
                if !actor.is_super_admin() {
                    return Err(ServiceError::Forbidden(
                        "Only super admins can create super admins".to_string(),
                    ));
                }
                None
            }
            Role::CompanyAdmin | Role::BranchManager => {
                let company_id = if actor.is_super_admin() {
                    input.company_id.ok_or_else(|| {
                        ServiceError::ValidationError("company_id is required".to_string())
                    })?
                } else {
                    let own = actor.company_id.ok_or_else(|| {
                        ServiceError::Forbidden("You are not assigned to a company".to_string())
                    })?;
                    if input.company_id.map_or(false, |requested| requested != own) {
                        return Err(ServiceError::Forbidden(
                            "Cannot create users for another company".to_string(),
                        ));
                    }
                    own
                };

                company::Entity::find_by_id(company_id)
                    .one(&*self.db)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("Company", company_id))?;
                Some(company_id)
            }
        };

        let branch_id = if input.role == Role::BranchManager {
            let branch_id = input.branch_id.ok_or_else(|| {
                ServiceError::ValidationError("branch_id is required for branch managers".into())
            })?;
            let branch = branch::Entity::find_by_id(branch_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| ServiceError::not_found("Branch", branch_id))?;
            if Some(branch.company_id) != company_id {
                return Err(ServiceError::ValidationError(
                    "Branch does not belong to the company".to_string(),
                ));
            }
            Some(branch_id)
        } else {
            None
        };

        let email = normalize_email(&input.email);
        self.ensure_email_free(&email).await?;

        let user = self
            .insert_user(
                input.name.trim().to_string(),
                email,
                &input.password,
                input.role,
                company_id,
                branch_id,
                super::non_blank(input.phone),
            )
            .await?;

        info!(user_id = %user.id, created_by = %actor.user_id, "Staff user created");
        Ok(user.into())
    }

    /// Lists users visible to the caller
    #[instrument(skip(self, actor))]
    pub async fn list_users(
        &self,
        actor: &AuthUser,
        company_id: Option<Uuid>,
    ) -> Result<Vec<UserProfile>, ServiceError> {
        let scope = if actor.is_super_admin() {
            company_id
        } else {
            let own = actor.company_id.ok_or_else(|| {
                ServiceError::Forbidden("You are not assigned to a company".to_string())
            })?;
            if company_id.map_or(false, |requested| requested != own) {
                return Err(ServiceError::Forbidden(
                    "Cannot list users of another company".to_string(),
                ));
            }
            Some(own)
        };

        let mut query = user::Entity::find().order_by_asc(user::Column::CreatedAt);
        if let Some(company_id) = scope {
            query = query.filter(user::Column::CompanyId.eq(company_id));
        }

        Ok(query
            .all(&*self.db)
            .await?
            .into_iter()
            .map(UserProfile::from)
            .collect())
    }

    /// Creates the first super admin; a no-op once one exists
    #[instrument(skip(self, password))]
    pub async fn bootstrap_super_admin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserProfile>, ServiceError> {
        let existing = user::Entity::find()
            .filter(user::Column::Role.eq(Role::SuperAdmin.to_string()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Ok(None);
        }

        if password.len() < 8 {
            return Err(ServiceError::ValidationError(
                "Bootstrap admin password must be at least 8 characters".to_string(),
            ));
        }

        let email = normalize_email(email);
        self.ensure_email_free(&email).await?;
        let user = self
            .insert_user(
                "Super Admin".to_string(),
                email,
                password,
                Role::SuperAdmin,
                None,
                None,
                None,
            )
            .await?;

        info!(user_id = %user.id, "Bootstrapped super admin");
        Ok(Some(user.into()))
    }

    async fn ensure_email_free(&self, email: &str) -> Result<(), ServiceError> {
        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_user(
        &self,
        name: String,
        email: String,
        password: &str,
        role: Role,
        company_id: Option<Uuid>,
        branch_id: Option<Uuid>,
        phone: Option<String>,
    ) -> Result<user::Model, ServiceError> {
        let password_hash = hash_password(password)?;

        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            name: Set(name),
            password_hash: Set(password_hash),
            role: Set(role.to_string()),
            company_id: Set(company_id),
            branch_id: Set(branch_id),
            phone: Set(phone),
            is_active: Set(true),
            last_login_at: Set(None),
            ..Default::default()
        };

        Ok(model.insert(&*self.db).await?)
    }

    fn respond_with_token(&self, user: user::Model) -> Result<AuthResponse, ServiceError> {
        let token = self.auth.generate_token(&user)?;
        Ok(AuthResponse {
            token,
            user: user.into(),
        })
    }
}
