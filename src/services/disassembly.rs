use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        disassemble_recovery, disassemble_recovery_line,
        service_process::{self, Entity as ServiceProcess, FinalStatus, ProcessStatus},
        stage_activity::ActivityStatus,
        DisassembleStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        material_ledger::{credit_user_stock, MaterialLine},
        process_lifecycle::{close_activity, current_activity, StageOutcome},
    },
};

/// One-time reclamation of reusable parts from a rejected unit.
///
/// The session is addressed by the capability token minted when the unit
/// was redirected into the disassemble stage. The token is compared by
/// exact match and cleared atomically on first successful use, so a
/// resubmission fails `InvalidSession`.
#[derive(Clone)]
pub struct DisassemblyService {
    db: Arc<DbPool>,
    event_sender: Option<EventSender>,
}

impl DisassemblyService {
    pub fn new(db: Arc<DbPool>, event_sender: Option<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// Submits the recovery session: credits the receiving employee with
    /// every reclaimed material, closes the disassembler's activity, and
    /// finalizes the process as rejected. One transaction, one shot.
    #[instrument(skip(self, reusable_items, remarks))]
    pub async fn submit(
        &self,
        process_id: Uuid,
        session_id: &str,
        disassembled_by: Uuid,
        received_by: Uuid,
        reusable_items: Vec<MaterialLine>,
        remarks: Option<String>,
    ) -> Result<disassemble_recovery::Model, ServiceError> {
        for item in &reusable_items {
            if item.quantity <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(format!(
                    "reclaimed quantity for material {} must be positive",
                    item.raw_material_id
                )));
            }
        }

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let process = ServiceProcess::find_by_id(process_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Process {} not found", process_id)))?;

        if process.disassemble_session_id.as_deref() != Some(session_id) {
            return Err(ServiceError::InvalidSession(format!(
                "session token does not match process {}",
                process_id
            )));
        }
        if !process.is_disassemble_pending {
            return Err(ServiceError::InvalidState(format!(
                "process {} has no pending disassembly",
                process_id
            )));
        }

        let activity = current_activity(&txn, process_id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("Process {} has no current activity", process_id))
        })?;
        if activity.employee_id != Some(disassembled_by) {
            return Err(ServiceError::Unauthorized(format!(
                "activity {} is not assigned to employee {}",
                activity.id, disassembled_by
            )));
        }
        if activity.status != ActivityStatus::InProgress {
            return Err(ServiceError::InvalidState(format!(
                "activity {} is not in progress",
                activity.id
            )));
        }

        let now = Utc::now();

        for item in &reusable_items {
            credit_user_stock(&txn, received_by, item.raw_material_id, item.quantity, now).await?;
        }

        let recovery = disassemble_recovery::ActiveModel {
            id: Set(Uuid::new_v4()),
            service_process_id: Set(process_id),
            disassembled_by: Set(disassembled_by),
            received_by: Set(received_by),
            remarks: Set(remarks),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::DatabaseError)?;

        for item in &reusable_items {
            disassemble_recovery_line::ActiveModel {
                id: Set(Uuid::new_v4()),
                disassemble_recovery_id: Set(recovery.id),
                raw_material_id: Set(item.raw_material_id),
                quantity: Set(item.quantity),
                unit: Set(item.unit.clone()),
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;
        }

        close_activity(&txn, &activity, StageOutcome::Completed, None, None, now).await?;

        // Finalize and burn the token in one conditional update; a racing
        // submit with the same token loses here and rolls back.
        let finalized = ServiceProcess::update_many()
            .col_expr(
                service_process::Column::Status,
                Expr::value(ProcessStatus::Completed),
            )
            .col_expr(
                service_process::Column::FinalStatus,
                Expr::value(Some(FinalStatus::Rejected)),
            )
            .col_expr(service_process::Column::IsClosed, Expr::value(true))
            .col_expr(service_process::Column::IsRepaired, Expr::value(Some(false)))
            .col_expr(
                service_process::Column::DisassembleStatus,
                Expr::value(Some(DisassembleStatus::Completed)),
            )
            .col_expr(
                service_process::Column::IsDisassemblePending,
                Expr::value(false),
            )
            .col_expr(
                service_process::Column::DisassembleSessionId,
                Expr::value(Option::<String>::None),
            )
            .col_expr(service_process::Column::UpdatedAt, Expr::value(now))
            .filter(service_process::Column::Id.eq(process_id))
            .filter(service_process::Column::IsDisassemblePending.eq(true))
            .filter(service_process::Column::DisassembleSessionId.eq(session_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if finalized.rows_affected == 0 {
            return Err(ServiceError::InvalidSession(format!(
                "session token for process {} was concurrently consumed",
                process_id
            )));
        }

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(
            %process_id,
            %disassembled_by,
            %received_by,
            reclaimed = reusable_items.len(),
            "Disassembly recovery submitted"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::DisassembleRecoverySubmitted {
                    process_id,
                    disassembled_by,
                    received_by,
                    reclaimed_lines: reusable_items.len(),
                })
                .await;
            sender
                .send_or_log(Event::ProcessCompleted {
                    process_id,
                    final_status: FinalStatus::Rejected.as_str().to_string(),
                    repaired: Some(false),
                })
                .await;
        }

        Ok(recovery)
    }
}
