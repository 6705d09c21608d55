use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_addresses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    /// Label chosen by the user, e.g. "Ev" or "Is"
    pub title: String,
    pub address_line: String,
    pub district: Option<String>,
    pub city: String,
    pub notes: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// Single line used as the delivery address of an order.
    pub fn formatted(&self) -> String {
        let mut parts = vec![self.address_line.clone()];
        if let Some(district) = self.district.as_ref().filter(|d| !d.is_empty()) {
            parts.push(district.clone());
        }
        parts.push(self.city.clone());
        let mut line = parts.join(", ");
        if let Some(notes) = self.notes.as_ref().filter(|n| !n.is_empty()) {
            line.push_str(&format!(" ({})", notes));
        }
        line
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if insert && self.created_at.is_not_set() {
            self.created_at = Set(Utc::now());
        }
        Ok(self)
    }
}
