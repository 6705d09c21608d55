use crate::{
    backup::{BackupManager, BackupReport},
    db::{self, TableCount},
    entities::{branch, category, company, product, restaurant_table, restaurant_table::TableStatus},
    errors::ServiceError,
    services::{archival::ArchivalService, tables::generate_qr_code},
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEMO_DOMAIN: &str = "demo.restoran.local";

const DEMO_MENU: &[(&str, &[(&str, Decimal)])] = &[
    (
        "Başlangıçlar",
        &[("Mercimek Çorbası", dec!(85.00)), ("Humus", dec!(110.00))],
    ),
    (
        "Ana Yemekler",
        &[
            ("Adana Kebap", dec!(420.00)),
            ("Izgara Köfte", dec!(360.00)),
            ("Tavuk Şiş", dec!(320.00)),
        ],
    ),
    (
        "İçecekler",
        &[("Ayran", dec!(40.00)), ("Türk Kahvesi", dec!(75.00))],
    ),
];

const DEMO_TABLES: i32 = 6;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DatabaseStatus {
    pub connected: bool,
    pub latency_ms: f64,
    pub backend: String,
    pub tables: Vec<TableCount>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeedReport {
    /// False when the demo company already existed
    pub created: bool,
    pub company_id: Uuid,
    pub branch_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ArchivalReport {
    pub archived: u64,
}

/// Maintenance operations reserved for super admins
#[derive(Clone)]
pub struct AdminService {
    db: Arc<DatabaseConnection>,
    archival: Arc<ArchivalService>,
    backups: Arc<BackupManager>,
}

impl AdminService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        archival: Arc<ArchivalService>,
        backups: Arc<BackupManager>,
    ) -> Self {
        Self {
            db,
            archival,
            backups,
        }
    }

    #[instrument(skip(self))]
    pub async fn database_status(&self) -> Result<DatabaseStatus, ServiceError> {
        let latency = db::check_connection(&self.db).await?;
        let tables = db::table_counts(&self.db).await?;
        Ok(DatabaseStatus {
            connected: true,
            latency_ms: latency.as_secs_f64() * 1000.0,
            backend: format!("{:?}", self.db.get_database_backend()),
            tables,
        })
    }

    /// Creates a demo tenant with a menu and tables; a no-op once it exists.
    #[instrument(skip(self))]
    pub async fn seed_demo_data(&self) -> Result<SeedReport, ServiceError> {
        if let Some(existing) = company::Entity::find()
            .filter(company::Column::Domain.eq(DEMO_DOMAIN))
            .one(&*self.db)
            .await?
        {
            let branch_ids = branch::Entity::find()
                .filter(branch::Column::CompanyId.eq(existing.id))
                .all(&*self.db)
                .await?
                .into_iter()
                .map(|b| b.id)
                .collect();
            return Ok(SeedReport {
                created: false,
                company_id: existing.id,
                branch_ids,
            });
        }

        let txn = self.db.begin().await?;

        let company = company::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Demo Restoran".to_string()),
            slug: Set("demo-restoran".to_string()),
            domain: Set(Some(DEMO_DOMAIN.to_string())),
            logo_url: Set(None),
            contact_email: Set(Some("info@demo.restoran.local".to_string())),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let branch = branch::ActiveModel {
            id: Set(Uuid::new_v4()),
            company_id: Set(company.id),
            name: Set("Kadıköy".to_string()),
            address: Set("Caferağa Mah. Moda Cad. No:1 Kadıköy/İstanbul".to_string()),
            phone: Set(Some("+90 216 000 00 00".to_string())),
            opening_hours: Set(Some("10:00 - 23:00".to_string())),
            delivery_enabled: Set(true),
            table_ordering_enabled: Set(true),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for (position, (category_name, products)) in DEMO_MENU.iter().enumerate() {
            let category = category::ActiveModel {
                id: Set(Uuid::new_v4()),
                branch_id: Set(branch.id),
                name: Set(category_name.to_string()),
                description: Set(None),
                sort_order: Set(position as i32),
                is_active: Set(true),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            for (index, (name, price)) in products.iter().enumerate() {
                product::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    branch_id: Set(branch.id),
                    category_id: Set(category.id),
                    name: Set(name.to_string()),
                    description: Set(None),
                    price: Set(*price),
                    image_url: Set(None),
                    is_available: Set(true),
                    sort_order: Set(index as i32),
                    ..Default::default()
                }
                .insert(&txn)
                .await?;
            }
        }

        for number in 1..=DEMO_TABLES {
            restaurant_table::ActiveModel {
                id: Set(Uuid::new_v4()),
                branch_id: Set(branch.id),
                table_number: Set(number),
                qr_code: Set(generate_qr_code()),
                capacity: Set(4),
                status: Set(TableStatus::Available.to_string()),
                is_active: Set(true),
                opened_at: Set(None),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        info!(company_id = %company.id, branch_id = %branch.id, "Demo data seeded");
        Ok(SeedReport {
            created: true,
            company_id: company.id,
            branch_ids: vec![branch.id],
        })
    }

    pub async fn run_archival_now(&self) -> Result<ArchivalReport, ServiceError> {
        let archived = self.archival.archive_stale_orders(Utc::now()).await?;
        Ok(ArchivalReport { archived })
    }

    pub async fn run_backup_now(&self) -> Result<BackupReport, ServiceError> {
        Ok(self.backups.run_backup(Utc::now()).await?)
    }
}
