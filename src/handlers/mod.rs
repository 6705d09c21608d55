pub mod admin;
pub mod auth;
pub mod branches;
pub mod catalog;
pub mod chat;
pub mod common;
pub mod companies;
pub mod customers;
pub mod dashboard;
pub mod franchises;
pub mod orders;
pub mod reports;
pub mod tables;
pub mod uploads;

use crate::auth::AuthService;
use crate::backup::BackupManager;
use crate::cache::{CacheBackend, InMemoryCache};
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    admin::AdminService, archival::ArchivalService, branches::BranchService,
    categories::CategoryService, chatbot::ChatbotService, companies::CompanyService,
    customers::CustomerService, dashboard::DashboardService, franchises::FranchiseService,
    orders::OrderService, products::ProductService, tables::TableService,
    uploads::UploadService, users::UserService,
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<UserService>,
    pub companies: Arc<CompanyService>,
    pub branches: Arc<BranchService>,
    pub categories: Arc<CategoryService>,
    pub products: Arc<ProductService>,
    pub tables: Arc<TableService>,
    pub orders: Arc<OrderService>,
    pub customers: Arc<CustomerService>,
    pub dashboard: Arc<DashboardService>,
    pub franchises: Arc<FranchiseService>,
    pub archival: Arc<ArchivalService>,
    pub chatbot: Arc<ChatbotService>,
    pub uploads: Arc<UploadService>,
    pub admin: Arc<AdminService>,
    pub backups: Arc<BackupManager>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        config: &AppConfig,
        event_sender: Arc<EventSender>,
        auth_service: Arc<AuthService>,
    ) -> Self {
        let cache: Arc<dyn CacheBackend> = Arc::new(InMemoryCache::new());

        let branches = Arc::new(BranchService::new(
            db.clone(),
            cache.clone(),
            config.menu_cache_ttl(),
            config.default_currency.clone(),
        ));
        let archival = Arc::new(ArchivalService::new(
            db.clone(),
            event_sender.clone(),
            config.archive_after_hours,
        ));
        let backups = Arc::new(BackupManager::new(
            config.database_url.clone(),
            config.backup_dir.clone(),
            config.backup_retention,
        ));

        Self {
            users: Arc::new(UserService::new(db.clone(), auth_service)),
            companies: Arc::new(CompanyService::new(db.clone())),
            categories: Arc::new(CategoryService::new(db.clone(), cache.clone())),
            products: Arc::new(ProductService::new(db.clone(), cache)),
            tables: Arc::new(TableService::new(
                db.clone(),
                branches.clone(),
                event_sender.clone(),
            )),
            orders: Arc::new(OrderService::new(db.clone(), event_sender)),
            customers: Arc::new(CustomerService::new(db.clone())),
            dashboard: Arc::new(DashboardService::new(db.clone())),
            franchises: Arc::new(FranchiseService::new(db.clone())),
            chatbot: Arc::new(ChatbotService::new(db.clone())),
            uploads: Arc::new(UploadService::new(
                config.upload_path(),
                config.max_upload_bytes,
            )),
            admin: Arc::new(AdminService::new(db, archival.clone(), backups.clone())),
            branches,
            archival,
            backups,
        }
    }
}
