use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Warehouse stock counter row for one sub-item.
///
/// Owned by the warehouse system; this core only ever increments one of
/// the two counters when a unit finishes the pipeline successfully:
/// `quantity` for repaired (`SERVICE`) units, `new_stock` for `NEW` units.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "warehouse_stocks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub warehouse: String,
    pub sub_item: String,
    pub quantity: i32,
    pub new_stock: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
