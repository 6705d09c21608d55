use crate::{
    auth::{AuthUser, Role},
    entities::franchise_application::{self, ApplicationStatus},
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct FranchiseApplicationRequest {
    pub company_id: Option<Uuid>,
    #[validate(length(min = 2, max = 100))]
    pub applicant_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    #[validate(length(min = 2, max = 100))]
    pub city: String,
    #[validate(length(max = 2000))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewApplicationRequest {
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ApplicationQuery {
    pub status: Option<ApplicationStatus>,
}

/// Franchise enquiries submitted from the public site
#[derive(Clone)]
pub struct FranchiseService {
    db: Arc<DatabaseConnection>,
}

impl FranchiseService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(city = %input.city))]
    pub async fn submit_application(
        &self,
        input: FranchiseApplicationRequest,
    ) -> Result<franchise_application::Model, ServiceError> {
        input.validate()?;

        let application = franchise_application::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(input.company_id),
            applicant_name: Set(input.applicant_name.trim().to_string()),
            email: Set(input.email.trim().to_lowercase()),
            phone: Set(input.phone.trim().to_string()),
            city: Set(input.city.trim().to_string()),
            message: Set(super::non_blank(input.message)),
            status: Set(ApplicationStatus::Pending.to_string()),
            reviewed_by: Set(None),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(application_id = %application.id, "Franchise application received");
        Ok(application)
    }

    /// Super admins see everything; company admins see applications addressed
    /// to their company.
    #[instrument(skip(self, actor))]
    pub async fn list_applications(
        &self,
        actor: &AuthUser,
        query: ApplicationQuery,
    ) -> Result<Vec<franchise_application::Model>, ServiceError> {
        let mut select = franchise_application::Entity::find()
            .order_by_desc(franchise_application::Column::CreatedAt);

        if actor.role != Role::SuperAdmin {
            let company_id = actor.company_id.ok_or_else(|| {
                ServiceError::Forbidden("No company assigned to this account".to_string())
            })?;
            select = select.filter(franchise_application::Column::CompanyId.eq(company_id));
        }
        if let Some(status) = query.status {
            select = select.filter(franchise_application::Column::Status.eq(status.to_string()));
        }

        Ok(select.all(&*self.db).await?)
    }

    #[instrument(skip(self, actor))]
    pub async fn update_status(
        &self,
        actor: &AuthUser,
        application_id: Uuid,
        next: ApplicationStatus,
    ) -> Result<franchise_application::Model, ServiceError> {
        let application = franchise_application::Entity::find_by_id(application_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Franchise application", application_id))?;

        if actor.role != Role::SuperAdmin && application.company_id != actor.company_id {
            return Err(ServiceError::Forbidden(
                "You do not have access to this application".to_string(),
            ));
        }

        let current = ApplicationStatus::from_str(&application.status)
            .map_err(|_| ServiceError::InternalError("Unknown application status".to_string()))?;
        if current != ApplicationStatus::Pending {
            return Err(ServiceError::InvalidStatus(format!(
                "Application was already {}",
                current
            )));
        }
        if next == ApplicationStatus::Pending {
            return Err(ServiceError::InvalidStatus(
                "Applications can only be approved or rejected".to_string(),
            ));
        }

        let mut active: franchise_application::ActiveModel = application.into();
        active.status = Set(next.to_string());
        active.reviewed_by = Set(Some(actor.user_id));
        let updated = active.update(&*self.db).await?;

        info!(%application_id, status = %next, "Franchise application reviewed");
        Ok(updated)
    }
}
