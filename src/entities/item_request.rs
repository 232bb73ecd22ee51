use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Header of a raw material request.
///
/// `approved` and `declined` are mutually exclusive set-once flags; both
/// null means the request is still pending. `material_given` is set once,
/// only after approval, by `sanction`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub requested_by: Uuid,
    pub requested_to: Uuid,
    pub is_process_request: bool,
    pub service_process_id: Option<Uuid>,
    pub approved: Option<bool>,
    pub declined: Option<bool>,
    pub material_given: bool,
    pub remarks: Option<String>,
    pub processed_by: Option<Uuid>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::item_request_line::Entity")]
    Lines,
}

impl Related<super::item_request_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
