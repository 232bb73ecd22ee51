use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        item_request::{self, Entity as ItemRequest},
        item_request_line::{self, Entity as ItemRequestLine},
        item_usage,
        raw_material::{self, Entity as RawMaterial},
        user_item_stock::{self, Entity as UserItemStock},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::RoleDirectory,
};

/// Role that may be asked to hand out raw materials.
pub const STORE_ROLE: &str = "Store";

/// One material line of a request or consumption.
#[derive(Debug, Clone)]
pub struct MaterialLine {
    pub raw_material_id: Uuid,
    pub quantity: Decimal,
    pub unit: String,
}

/// Verdict on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum RequestAction {
    Approve,
    Decline,
}

/// Raw material ledger: global stock, per-employee held stock, and the
/// request → approve → sanction → consume lifecycle.
///
/// Stock sufficiency is checked softly at request time (visible stock
/// only, no reservation) and strictly at sanction time; when several
/// approved requests compete for the same stock, the first sanction wins.
#[derive(Clone)]
pub struct MaterialLedgerService {
    db: Arc<DbPool>,
    roles: Arc<dyn RoleDirectory>,
    event_sender: Option<EventSender>,
}

impl MaterialLedgerService {
    pub fn new(
        db: Arc<DbPool>,
        roles: Arc<dyn RoleDirectory>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            roles,
            event_sender,
        }
    }

    /// Files a material request from an employee to a store keeper.
    #[instrument(skip(self, lines))]
    pub async fn request(
        &self,
        requested_by: Uuid,
        requested_to: Uuid,
        lines: Vec<MaterialLine>,
        is_process_request: bool,
        service_process_id: Option<Uuid>,
    ) -> Result<item_request::Model, ServiceError> {
        validate_lines(&lines)?;

        let keeper_role = self.roles.role_name(requested_to).await?;
        if keeper_role.as_deref() != Some(STORE_ROLE) {
            return Err(ServiceError::Unauthorized(format!(
                "employee {} does not hold the {} role",
                requested_to, STORE_ROLE
            )));
        }

        let db = &*self.db;

        // Soft availability check against currently visible stock. Nothing
        // is reserved here; the hard check happens at sanction.
        for line in &lines {
            let material = RawMaterial::find_by_id(line.raw_material_id)
                .one(db)
                .await
                .map_err(ServiceError::DatabaseError)?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!(
                        "Raw material {} not found",
                        line.raw_material_id
                    ))
                })?;
            if material.stock < line.quantity {
                return Err(ServiceError::InsufficientStock(format!(
                    "{}: requested {}, visible stock {}",
                    material.name, line.quantity, material.stock
                )));
            }
        }

        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;
        let now = Utc::now();

        let request = item_request::ActiveModel {
            id: Set(Uuid::new_v4()),
            requested_by: Set(requested_by),
            requested_to: Set(requested_to),
            is_process_request: Set(is_process_request),
            service_process_id: Set(service_process_id),
            approved: Set(None),
            declined: Set(None),
            material_given: Set(false),
            remarks: Set(None),
            processed_by: Set(None),
            processed_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::DatabaseError)?;

        for line in &lines {
            item_request_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                item_request_id: Set(request.id),
                raw_material_id: Set(line.raw_material_id),
                quantity: Set(line.quantity),
                unit: Set(line.unit.clone()),
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(request_id = %request.id, %requested_by, lines = lines.len(), "Material request filed");

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::MaterialRequestCreated {
                    request_id: request.id,
                    requested_by,
                    line_count: lines.len(),
                })
                .await;
        }

        Ok(request)
    }

    /// Approves or declines a pending request. The flags are set once and
    /// are mutually exclusive; a decline must carry remarks.
    #[instrument(skip(self))]
    pub async fn approve_or_decline(
        &self,
        request_id: Uuid,
        action: RequestAction,
        processed_by: Uuid,
        remarks: Option<String>,
    ) -> Result<item_request::Model, ServiceError> {
        if action == RequestAction::Decline
            && remarks.as_deref().map_or(true, |r| r.trim().is_empty())
        {
            return Err(ServiceError::ValidationError(
                "declining a request requires remarks".to_string(),
            ));
        }

        let db = &*self.db;
        let request = ItemRequest::find_by_id(request_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Request {} not found", request_id)))?;

        if request.approved.is_some() || request.declined.is_some() {
            return Err(ServiceError::AlreadyProcessed(format!(
                "request {} has already been processed",
                request_id
            )));
        }

        let now = Utc::now();
        let (approved, declined) = match action {
            RequestAction::Approve => (Some(true), None::<bool>),
            RequestAction::Decline => (None, Some(true)),
        };

        // Set-once guard: only flips while both flags are still unset.
        let result = ItemRequest::update_many()
            .col_expr(item_request::Column::Approved, Expr::value(approved))
            .col_expr(item_request::Column::Declined, Expr::value(declined))
            .col_expr(item_request::Column::ProcessedBy, Expr::value(Some(processed_by)))
            .col_expr(item_request::Column::ProcessedAt, Expr::value(Some(now)))
            .col_expr(item_request::Column::Remarks, Expr::value(remarks))
            .col_expr(item_request::Column::UpdatedAt, Expr::value(now))
            .filter(item_request::Column::Id.eq(request_id))
            .filter(item_request::Column::Approved.is_null())
            .filter(item_request::Column::Declined.is_null())
            .exec(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::AlreadyProcessed(format!(
                "request {} was concurrently processed",
                request_id
            )));
        }

        if let Some(sender) = &self.event_sender {
            let event = match action {
                RequestAction::Approve => Event::MaterialRequestApproved {
                    request_id,
                    processed_by,
                },
                RequestAction::Decline => Event::MaterialRequestDeclined {
                    request_id,
                    processed_by,
                },
            };
            sender.send_or_log(event).await;
        }

        self.reload_request(request_id).await
    }

    /// Hands out the materials of an approved request: decrements global
    /// stock and credits the requester's held stock, all lines or none.
    #[instrument(skip(self))]
    pub async fn sanction(&self, request_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let request = ItemRequest::find_by_id(request_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Request {} not found", request_id)))?;

        if request.declined == Some(true) {
            return Err(ServiceError::InvalidState(format!(
                "request {} was declined",
                request_id
            )));
        }
        if request.approved != Some(true) {
            return Err(ServiceError::InvalidState(format!(
                "request {} is not approved",
                request_id
            )));
        }
        if request.material_given {
            return Err(ServiceError::AlreadyProcessed(format!(
                "materials for request {} were already given",
                request_id
            )));
        }

        let now = Utc::now();

        // Set-once guard on material_given; a second sanction of the same
        // request fails here before any stock moves.
        let flagged = ItemRequest::update_many()
            .col_expr(item_request::Column::MaterialGiven, Expr::value(true))
            .col_expr(item_request::Column::UpdatedAt, Expr::value(now))
            .filter(item_request::Column::Id.eq(request_id))
            .filter(item_request::Column::Approved.eq(true))
            .filter(item_request::Column::MaterialGiven.eq(false))
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if flagged.rows_affected == 0 {
            return Err(ServiceError::AlreadyProcessed(format!(
                "materials for request {} were already given",
                request_id
            )));
        }

        let lines = ItemRequestLine::find()
            .filter(item_request_line::Column::ItemRequestId.eq(request_id))
            .all(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        for line in &lines {
            debit_global_stock(&txn, line.raw_material_id, line.quantity, now).await?;
            credit_user_stock(&txn, request.requested_by, line.raw_material_id, line.quantity, now)
                .await?;
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(%request_id, employee_id = %request.requested_by, "Materials sanctioned");

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::MaterialsSanctioned {
                    request_id,
                    employee_id: request.requested_by,
                })
                .await;
        }

        Ok(())
    }

    /// Consumes held materials against a process, appending usage ledger
    /// rows. All lines or none; held stock never goes negative.
    #[instrument(skip(self, lines))]
    pub async fn consume(
        &self,
        process_id: Uuid,
        employee_id: Uuid,
        lines: Vec<MaterialLine>,
    ) -> Result<(), ServiceError> {
        validate_lines(&lines)?;

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let now = Utc::now();
        let mut total = Decimal::ZERO;

        for line in &lines {
            debit_user_stock(&txn, employee_id, line.raw_material_id, line.quantity).await?;

            item_usage::ActiveModel {
                id: Set(Uuid::new_v4()),
                service_process_id: Set(process_id),
                employee_id: Set(employee_id),
                raw_material_id: Set(line.raw_material_id),
                quantity_used: Set(line.quantity),
                created_at: Set(now),
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

            total += line.quantity;
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(%process_id, %employee_id, %total, "Materials consumed");

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::MaterialsConsumed {
                    process_id,
                    employee_id,
                    total_quantity: total,
                })
                .await;
        }

        Ok(())
    }

    /// Pending requests waiting on a store keeper, oldest first.
    pub async fn pending_requests_for(
        &self,
        store_keeper_id: Uuid,
    ) -> Result<Vec<item_request::Model>, ServiceError> {
        let db = &*self.db;
        ItemRequest::find()
            .filter(item_request::Column::RequestedTo.eq(store_keeper_id))
            .filter(item_request::Column::Approved.is_null())
            .filter(item_request::Column::Declined.is_null())
            .order_by_asc(item_request::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// All stock currently held by an employee.
    pub async fn held_stock(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<user_item_stock::Model>, ServiceError> {
        let db = &*self.db;
        UserItemStock::find()
            .filter(user_item_stock::Column::EmployeeId.eq(employee_id))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    async fn reload_request(&self, request_id: Uuid) -> Result<item_request::Model, ServiceError> {
        let db = &*self.db;
        ItemRequest::find_by_id(request_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("request {} vanished after update", request_id))
            })
    }
}

fn validate_lines(lines: &[MaterialLine]) -> Result<(), ServiceError> {
    if lines.is_empty() {
        return Err(ServiceError::ValidationError(
            "at least one material line is required".to_string(),
        ));
    }
    for line in lines {
        if line.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(format!(
                "quantity for material {} must be positive",
                line.raw_material_id
            )));
        }
    }
    Ok(())
}

/// Decrements global stock, guarded so stock never goes negative.
async fn debit_global_stock<C: ConnectionTrait>(
    db: &C,
    raw_material_id: Uuid,
    quantity: Decimal,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    let result = RawMaterial::update_many()
        .col_expr(
            raw_material::Column::Stock,
            Expr::col(raw_material::Column::Stock).sub(quantity),
        )
        .col_expr(raw_material::Column::UpdatedAt, Expr::value(now))
        .filter(raw_material::Column::Id.eq(raw_material_id))
        .filter(raw_material::Column::Stock.gte(quantity))
        .exec(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

    if result.rows_affected == 0 {
        let material = RawMaterial::find_by_id(raw_material_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Raw material {} not found", raw_material_id))
            })?;
        return Err(ServiceError::InsufficientStock(format!(
            "{}: requested {}, live stock {}",
            material.name, quantity, material.stock
        )));
    }

    Ok(())
}

/// Creates or increments an employee's held stock row.
pub(crate) async fn credit_user_stock<C: ConnectionTrait>(
    db: &C,
    employee_id: Uuid,
    raw_material_id: Uuid,
    quantity: Decimal,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    let updated = UserItemStock::update_many()
        .col_expr(
            user_item_stock::Column::Quantity,
            Expr::col(user_item_stock::Column::Quantity).add(quantity),
        )
        .col_expr(user_item_stock::Column::UpdatedAt, Expr::value(now))
        .filter(user_item_stock::Column::EmployeeId.eq(employee_id))
        .filter(user_item_stock::Column::RawMaterialId.eq(raw_material_id))
        .exec(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

    if updated.rows_affected == 0 {
        user_item_stock::ActiveModel {
            employee_id: Set(employee_id),
            raw_material_id: Set(raw_material_id),
            quantity: Set(quantity),
            updated_at: Set(now),
        }
        .insert(db)
        .await
        .map_err(ServiceError::DatabaseError)?;
    }

    Ok(())
}

/// Decrements an employee's held stock, guarded against going negative.
async fn debit_user_stock<C: ConnectionTrait>(
    db: &C,
    employee_id: Uuid,
    raw_material_id: Uuid,
    quantity: Decimal,
) -> Result<(), ServiceError> {
    let now = Utc::now();
    let result = UserItemStock::update_many()
        .col_expr(
            user_item_stock::Column::Quantity,
            Expr::col(user_item_stock::Column::Quantity).sub(quantity),
        )
        .col_expr(user_item_stock::Column::UpdatedAt, Expr::value(now))
        .filter(user_item_stock::Column::EmployeeId.eq(employee_id))
        .filter(user_item_stock::Column::RawMaterialId.eq(raw_material_id))
        .filter(user_item_stock::Column::Quantity.gte(quantity))
        .exec(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

    if result.rows_affected == 0 {
        let held = UserItemStock::find_by_id((employee_id, raw_material_id))
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        return match held {
            None => Err(ServiceError::NotFound(format!(
                "employee {} holds no stock of material {}",
                employee_id, raw_material_id
            ))),
            Some(row) => Err(ServiceError::InsufficientPersonalStock(format!(
                "employee {} holds {} of material {}, needs {}",
                employee_id, row.quantity, raw_material_id, quantity
            ))),
        };
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn lines_must_be_non_empty_and_positive() {
        assert!(validate_lines(&[]).is_err());

        let bad = vec![MaterialLine {
            raw_material_id: Uuid::new_v4(),
            quantity: dec!(0),
            unit: "pcs".to_string(),
        }];
        assert!(validate_lines(&bad).is_err());

        let good = vec![MaterialLine {
            raw_material_id: Uuid::new_v4(),
            quantity: dec!(2.5),
            unit: "kg".to_string(),
        }];
        assert!(validate_lines(&good).is_ok());
    }
}
