use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use tracing::instrument;

use crate::{
    entities::{
        failure_redirect::{self, Entity as FailureRedirect},
        service_process::ItemType,
        stage_flow::{self, Entity as StageFlow},
    },
    errors::ServiceError,
};

/// Pure, read-only stage routing lookups.
///
/// Both resolvers are keyed by product *name*: units can be registered
/// before the product catalog entry is fully linked, so a missing name
/// surfaces as `NotFound` rather than silently ending the pipeline.
/// Callers pass whatever connection they are on, so lookups made inside a
/// transaction see the routing rows that transaction sees.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageResolver;

impl StageResolver {
    pub fn new() -> Self {
        Self
    }

    /// Next stage for (product, item type, current stage), or `None` when
    /// the product is configured but this stage has no successor.
    #[instrument(skip(self, db))]
    pub async fn next_stage<C: ConnectionTrait>(
        &self,
        db: &C,
        product: &str,
        item_type: ItemType,
        current_stage: &str,
    ) -> Result<Option<String>, ServiceError> {
        let rows = StageFlow::find()
            .filter(stage_flow::Column::Product.eq(product))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if rows.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "Product {} has no stage flow configuration",
                product
            )));
        }

        Ok(rows
            .into_iter()
            .find(|row| row.item_type == item_type && row.current_stage == current_stage)
            .map(|row| row.next_stage))
    }

    /// Redirect stage for (product, item type, failure reason), or `None`
    /// when no redirect row matches the reason.
    #[instrument(skip(self, db))]
    pub async fn redirect_stage<C: ConnectionTrait>(
        &self,
        db: &C,
        product: &str,
        item_type: ItemType,
        failure_reason: &str,
    ) -> Result<Option<String>, ServiceError> {
        let rows = FailureRedirect::find()
            .filter(failure_redirect::Column::Product.eq(product))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if rows.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "Product {} has no failure redirect configuration",
                product
            )));
        }

        Ok(rows
            .into_iter()
            .find(|row| row.item_type == item_type && row.failure_reason == failure_reason)
            .map(|row| row.redirect_stage))
    }
}
