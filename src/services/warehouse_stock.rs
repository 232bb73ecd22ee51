use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    entities::{
        service_process::ItemType,
        warehouse_stock::{self, Entity as WarehouseStock},
    },
    errors::ServiceError,
};

/// Applies the warehouse side effect of a successful pipeline completion:
/// +1 on the counter keyed by item type against the sub-item's warehouse
/// row. Invoked inside the finalizing transaction so the counter bump and
/// the completion commit or roll back together.
#[derive(Debug, Clone, Copy, Default)]
pub struct WarehouseStockApplier;

impl WarehouseStockApplier {
    pub fn new() -> Self {
        Self
    }

    /// Counter column name for an item type: repaired units land on
    /// `quantity`, newly manufactured units on `new_stock`.
    pub fn counter_name(item_type: ItemType) -> &'static str {
        match item_type {
            ItemType::Service => "quantity",
            ItemType::New => "new_stock",
        }
    }

    #[instrument(skip(self, db))]
    pub async fn apply_completion_increment<C: ConnectionTrait>(
        &self,
        db: &C,
        sub_item: &str,
        item_type: ItemType,
    ) -> Result<(), ServiceError> {
        let now = Utc::now();

        let mut update = WarehouseStock::update_many();
        update = match item_type {
            ItemType::Service => update.col_expr(
                warehouse_stock::Column::Quantity,
                Expr::col(warehouse_stock::Column::Quantity).add(1),
            ),
            ItemType::New => update.col_expr(
                warehouse_stock::Column::NewStock,
                Expr::col(warehouse_stock::Column::NewStock).add(1),
            ),
        };

        let result = update
            .col_expr(warehouse_stock::Column::UpdatedAt, Expr::value(now))
            .filter(warehouse_stock::Column::SubItem.eq(sub_item))
            .exec(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if result.rows_affected == 0 {
            // First completed unit of this sub-item: seed the warehouse row.
            let (quantity, new_stock) = match item_type {
                ItemType::Service => (1, 0),
                ItemType::New => (0, 1),
            };
            warehouse_stock::ActiveModel {
                id: Set(Uuid::new_v4()),
                warehouse: Set("MAIN".to_string()),
                sub_item: Set(sub_item.to_string()),
                quantity: Set(quantity),
                new_stock: Set(new_stock),
                updated_at: Set(now),
            }
            .insert(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        }

        info!(
            sub_item,
            counter = Self::counter_name(item_type),
            "Warehouse stock incremented"
        );

        Ok(())
    }

    /// Current warehouse row for a sub-item, if any.
    pub async fn find_by_sub_item<C: ConnectionTrait>(
        &self,
        db: &C,
        sub_item: &str,
    ) -> Result<Option<warehouse_stock::Model>, ServiceError> {
        WarehouseStock::find()
            .filter(warehouse_stock::Column::SubItem.eq(sub_item))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
