use crate::{
    auth::AuthUser,
    entities::{branch, company},
    errors::ServiceError,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 2, max = 120))]
    pub name: String,
    /// Derived from the name when omitted
    #[validate(length(min = 2, max = 120))]
    pub slug: Option<String>,
    #[validate(length(min = 3, max = 253))]
    pub domain: Option<String>,
    pub logo_url: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 2, max = 120))]
    pub name: Option<String>,
    #[validate(length(min = 3, max = 253))]
    pub domain: Option<String>,
    pub logo_url: Option<String>,
    #[validate(email)]
    pub contact_email: Option<String>,
    pub is_active: Option<bool>,
}

/// Company with its active branches, returned for tenant host resolution
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompanyWithBranches {
    #[schema(value_type = Object)]
    pub company: company::Model,
    #[schema(value_type = Vec<Object>)]
    pub branches: Vec<branch::Model>,
}

/// Lowercases a domain and strips scheme, path and port.
pub fn normalize_domain(raw: &str) -> String {
    let trimmed = raw.trim().to_lowercase();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(&trimmed);
    let host = without_scheme.split('/').next().unwrap_or_default();
    let host = host.split(':').next().unwrap_or_default();
    host.trim_start_matches("www.").trim_end_matches('.').to_string()
}

/// URL friendly identifier derived from a display name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().to_lowercase().chars() {
        let mapped = match ch {
            'ç' => 'c',
            'ğ' => 'g',
            'ı' | 'i' => 'i',
            'ö' => 'o',
            'ş' => 's',
            'ü' => 'u',
            c if c.is_ascii_alphanumeric() => c,
            _ => '-',
        };
        if mapped == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(mapped);
    }
    slug.trim_end_matches('-').to_string()
}

/// Tenant management
#[derive(Clone)]
pub struct CompanyService {
    db: Arc<DatabaseConnection>,
}

impl CompanyService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, actor, input), fields(name = %input.name))]
    pub async fn create_company(
        &self,
        actor: &AuthUser,
        input: CreateCompanyRequest,
    ) -> Result<company::Model, ServiceError> {
        input.validate()?;
        if !actor.is_super_admin() {
            return Err(ServiceError::Forbidden(
                "Only super admins can create companies".to_string(),
            ));
        }

        let domain = super::non_blank(input.domain).map(|d| normalize_domain(&d));
        if let Some(domain) = &domain {
            self.ensure_domain_free(domain, None).await?;
        }

        let slug = slugify(input.slug.as_deref().unwrap_or(&input.name));
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Company slug cannot be empty".to_string(),
            ));
        }
        let slug_taken = company::Entity::find()
            .filter(company::Column::Slug.eq(slug.as_str()))
            .one(&*self.db)
            .await?
            .is_some();
        if slug_taken {
            return Err(ServiceError::Conflict(format!("Slug {} is already in use", slug)));
        }

        let model = company::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name.trim().to_string()),
            slug: Set(slug),
            domain: Set(domain),
            logo_url: Set(super::non_blank(input.logo_url)),
            contact_email: Set(super::non_blank(input.contact_email)),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(company_id = %model.id, "Company created");
        Ok(model)
    }

    #[instrument(skip(self, actor))]
    pub async fn list_companies(
        &self,
        actor: &AuthUser,
    ) -> Result<Vec<company::Model>, ServiceError> {
        let mut query = company::Entity::find().order_by_asc(company::Column::Name);
        if !actor.is_super_admin() {
            match actor.company_id {
                Some(own) => query = query.filter(company::Column::Id.eq(own)),
                None => return Ok(vec![]),
            }
        }
        Ok(query.all(&*self.db).await?)
    }

    #[instrument(skip(self, actor))]
    pub async fn get_company(
        &self,
        actor: &AuthUser,
        company_id: Uuid,
    ) -> Result<company::Model, ServiceError> {
        let company = self.find(company_id).await?;
        if !actor.can_access_company(company.id) {
            return Err(ServiceError::Forbidden(
                "You do not have access to this company".to_string(),
            ));
        }
        Ok(company)
    }

    #[instrument(skip(self, actor, input))]
    pub async fn update_company(
        &self,
        actor: &AuthUser,
        company_id: Uuid,
        input: UpdateCompanyRequest,
    ) -> Result<company::Model, ServiceError> {
        input.validate()?;
        let company = self.get_company(actor, company_id).await?;

        let mut active: company::ActiveModel = company.into();
        if let Some(name) = input.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(raw) = input.domain {
            let domain = super::non_blank(Some(raw)).map(|d| normalize_domain(&d));
            if let Some(domain) = &domain {
                self.ensure_domain_free(domain, Some(company_id)).await?;
            }
            active.domain = Set(domain);
        }
        if let Some(logo_url) = input.logo_url {
            active.logo_url = Set(super::non_blank(Some(logo_url)));
        }
        if let Some(contact_email) = input.contact_email {
            active.contact_email = Set(super::non_blank(Some(contact_email)));
        }
        if let Some(is_active) = input.is_active {
            if !actor.is_super_admin() {
                return Err(ServiceError::Forbidden(
                    "Only super admins can change company activation".to_string(),
                ));
            }
            active.is_active = Set(is_active);
        }

        let updated = active.update(&*self.db).await?;
        info!(company_id = %updated.id, "Company updated");
        Ok(updated)
    }

    #[instrument(skip(self, actor))]
    pub async fn delete_company(
        &self,
        actor: &AuthUser,
        company_id: Uuid,
    ) -> Result<(), ServiceError> {
        if !actor.is_super_admin() {
            return Err(ServiceError::Forbidden(
                "Only super admins can delete companies".to_string(),
            ));
        }
        let company = self.find(company_id).await?;

        let branch_count = branch::Entity::find()
            .filter(branch::Column::CompanyId.eq(company.id))
            .count(&*self.db)
            .await?;
        if branch_count > 0 {
            return Err(ServiceError::Conflict(format!(
                "Company still has {} branch(es)",
                branch_count
            )));
        }

        company::Entity::delete_by_id(company.id)
            .exec(&*self.db)
            .await?;
        info!(company_id = %company_id, "Company deleted");
        Ok(())
    }

    /// Resolves a tenant from the host a front-end is served on
    #[instrument(skip(self))]
    pub async fn resolve_by_domain(&self, domain: &str) -> Result<CompanyWithBranches, ServiceError> {
        let domain = normalize_domain(domain);
        let company = company::Entity::find()
            .filter(company::Column::Domain.eq(domain.as_str()))
            .filter(company::Column::IsActive.eq(true))
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Company with domain", &domain))?;

        let branches = branch::Entity::find()
            .filter(branch::Column::CompanyId.eq(company.id))
            .filter(branch::Column::IsActive.eq(true))
            .order_by_asc(branch::Column::Name)
            .all(&*self.db)
            .await?;

        Ok(CompanyWithBranches { company, branches })
    }

    async fn find(&self, company_id: Uuid) -> Result<company::Model, ServiceError> {
        company::Entity::find_by_id(company_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Company", company_id))
    }

    async fn ensure_domain_free(
        &self,
        domain: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut query = company::Entity::find().filter(company::Column::Domain.eq(domain));
        if let Some(id) = exclude {
            query = query.filter(company::Column::Id.ne(id));
        }
        if query.one(&*self.db).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Domain {} is already used by another company",
                domain
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Lezzet.com.tr", "lezzet.com.tr")]
    #[case("https://www.lezzet.com.tr/menu", "lezzet.com.tr")]
    #[case("http://order.lezzet.com:8080", "order.lezzet.com")]
    fn domains_are_normalized(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_domain(raw), expected);
    }

    #[rstest]
    #[case("Köfteci Şükrü", "kofteci-sukru")]
    #[case("  Burger & Co.  ", "burger-co")]
    #[case("Çiğ Köfte 2", "cig-kofte-2")]
    fn slugs_are_ascii(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(slugify(name), expected);
    }
}
