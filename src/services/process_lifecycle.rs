use chrono::{DateTime, Utc};
use rand::RngCore;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::PipelineConfig,
    db::DbPool,
    entities::{
        service_process::{self, Entity as ServiceProcess, FinalStatus, ItemType, ProcessStatus},
        stage_activity::{self, ActivityStatus, Entity as StageActivity},
        DisassembleStatus,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::{stage_resolver::StageResolver, warehouse_stock::WarehouseStockApplier},
};

/// Outcome reported for the current stage activity when its work finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum StageOutcome {
    Completed,
    Failed,
    Rejected,
    Skipped,
}

impl StageOutcome {
    fn activity_status(self) -> ActivityStatus {
        match self {
            StageOutcome::Completed => ActivityStatus::Completed,
            StageOutcome::Failed => ActivityStatus::Failed,
            StageOutcome::Rejected => ActivityStatus::Rejected,
            StageOutcome::Skipped => ActivityStatus::Skipped,
        }
    }
}

/// Input for registering one physical unit into the pipeline.
#[derive(Debug, Clone)]
pub struct CreateProcessInput {
    pub product: String,
    pub item: String,
    pub sub_item: String,
    pub serial_number: String,
    pub quantity: i32,
    pub employee_role: String,
    pub created_by: Uuid,
}

/// Aggregate root for the pipeline: creates units, orchestrates stage
/// transitions and failure redirects, and finalizes completion.
#[derive(Clone)]
pub struct ProcessLifecycleService {
    db: Arc<DbPool>,
    pipeline: PipelineConfig,
    resolver: StageResolver,
    warehouse: WarehouseStockApplier,
    event_sender: Option<EventSender>,
}

impl ProcessLifecycleService {
    pub fn new(db: Arc<DbPool>, pipeline: PipelineConfig, event_sender: Option<EventSender>) -> Self {
        Self {
            db,
            pipeline,
            resolver: StageResolver::new(),
            warehouse: WarehouseStockApplier::new(),
            event_sender,
        }
    }

    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    /// Registers a unit and opens its first stage activity.
    ///
    /// The caller's role picks the item type and initial stage from the
    /// intake configuration; an unmapped role fails before anything is
    /// written. At most one unit per (product, item, sub-item, serial) may
    /// be created per calendar day.
    #[instrument(skip(self, input), fields(product = %input.product, serial = %input.serial_number))]
    pub async fn create(
        &self,
        input: CreateProcessInput,
    ) -> Result<service_process::Model, ServiceError> {
        if input.product.trim().is_empty()
            || input.item.trim().is_empty()
            || input.sub_item.trim().is_empty()
            || input.serial_number.trim().is_empty()
        {
            return Err(ServiceError::ValidationError(
                "product, item, sub_item and serial_number must not be empty".to_string(),
            ));
        }
        if input.quantity < 1 {
            return Err(ServiceError::ValidationError(format!(
                "quantity must be at least 1, got {}",
                input.quantity
            )));
        }

        let mapping = self
            .pipeline
            .intake_role(&input.employee_role)
            .ok_or_else(|| ServiceError::UnknownRole(input.employee_role.clone()))?;
        let item_type = ItemType::parse(&mapping.item_type).ok_or_else(|| {
            ServiceError::ConfigError(format!(
                "intake role {} maps to invalid item type {}",
                input.employee_role, mapping.item_type
            ))
        })?;
        let initial_stage = mapping.initial_stage.clone();

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let today_start = start_of_today();
        let duplicate = ServiceProcess::find()
            .filter(service_process::Column::Product.eq(input.product.as_str()))
            .filter(service_process::Column::Item.eq(input.item.as_str()))
            .filter(service_process::Column::SubItem.eq(input.sub_item.as_str()))
            .filter(service_process::Column::SerialNumber.eq(input.serial_number.as_str()))
            .filter(service_process::Column::CreatedAt.gte(today_start))
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if duplicate.is_some() {
            return Err(ServiceError::DuplicateProcess(format!(
                "unit {}/{} serial {} was already registered today",
                input.item, input.sub_item, input.serial_number
            )));
        }

        let now = Utc::now();
        let process = service_process::ActiveModel {
            id: Set(Uuid::new_v4()),
            product: Set(input.product.clone()),
            item: Set(input.item.clone()),
            sub_item: Set(input.sub_item.clone()),
            serial_number: Set(input.serial_number.clone()),
            quantity: Set(input.quantity),
            item_type: Set(item_type),
            current_stage: Set(initial_stage.clone()),
            initial_stage: Set(initial_stage.clone()),
            restarted_from_stage: Set(None),
            status: Set(ProcessStatus::InProgress),
            final_status: Set(None),
            is_closed: Set(false),
            is_repaired: Set(None),
            is_disassemble_pending: Set(false),
            disassemble_session_id: Set(None),
            disassemble_status: Set(None),
            created_by: Set(input.created_by),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = process.insert(&txn).await.map_err(ServiceError::DatabaseError)?;

        open_activity(&txn, created.id, &initial_stage, now).await?;

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(
            process_id = %created.id,
            item_type = item_type.as_str(),
            stage = %initial_stage,
            "Service process created"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::ProcessCreated {
                    process_id: created.id,
                    product: created.product.clone(),
                    item_type: item_type.as_str().to_string(),
                    initial_stage,
                })
                .await;
        }

        Ok(created)
    }

    /// Resolves the outcome of the current stage activity: closes it, then
    /// finalizes, redirects, or advances the process. The whole resolution
    /// is one transaction; a failure leaves the activity open.
    #[instrument(skip(self))]
    pub async fn resolve_stage_outcome(
        &self,
        process_id: Uuid,
        outcome: StageOutcome,
        failure_reason: Option<String>,
        remarks: Option<String>,
    ) -> Result<service_process::Model, ServiceError> {
        if outcome == StageOutcome::Failed && failure_reason.is_none() {
            return Err(ServiceError::ValidationError(
                "a failure reason is required for a FAILED outcome".to_string(),
            ));
        }

        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let process = ServiceProcess::find_by_id(process_id)
            .one(&txn)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Process {} not found", process_id)))?;

        if process.is_closed || process.status == ProcessStatus::Completed {
            return Err(ServiceError::InvalidState(format!(
                "process {} is already completed",
                process_id
            )));
        }

        let activity = current_activity(&txn, process_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Process {} has no current activity", process_id))
            })?;

        let now = Utc::now();
        close_activity(&txn, &activity, outcome, failure_reason.as_deref(), remarks, now).await?;

        let at_terminal = process.current_stage == self.pipeline.terminal_stage;
        let resolved = if at_terminal {
            match outcome {
                StageOutcome::Completed => self.finalize(&txn, &process, now).await?,
                StageOutcome::Rejected => {
                    // The rejection redirect always resolves under the
                    // literal reason "REJECTED", whatever the caller sent.
                    self.redirect(&txn, &process, "REJECTED", now).await?
                }
                StageOutcome::Failed => {
                    let reason = failure_reason.as_deref().unwrap_or_default();
                    self.redirect(&txn, &process, reason, now).await?
                }
                StageOutcome::Skipped => {
                    return Err(ServiceError::InvalidState(format!(
                        "stage {} cannot be skipped",
                        process.current_stage
                    )));
                }
            }
        } else {
            match outcome {
                StageOutcome::Completed | StageOutcome::Skipped => {
                    let next = self
                        .resolver
                        .next_stage(&txn, &process.product, process.item_type, &process.current_stage)
                        .await?;
                    match next {
                        Some(next_stage) => self.advance(&txn, &process, next_stage, now).await?,
                        // A stage without a successor ends the flow the same
                        // way a successful terminal stage does.
                        None => self.finalize(&txn, &process, now).await?,
                    }
                }
                StageOutcome::Failed | StageOutcome::Rejected => {
                    return Err(ServiceError::InvalidState(format!(
                        "outcome {} is only resolved at the {} stage",
                        outcome, self.pipeline.terminal_stage
                    )));
                }
            }
        };

        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        self.emit_resolution_events(&process, &resolved, outcome, failure_reason)
            .await;

        Ok(resolved)
    }

    /// Fetches a process together with its full activity history, newest
    /// activity last.
    pub async fn get_with_history(
        &self,
        process_id: Uuid,
    ) -> Result<Option<(service_process::Model, Vec<stage_activity::Model>)>, ServiceError> {
        let db = &*self.db;
        let Some(process) = ServiceProcess::find_by_id(process_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
        else {
            return Ok(None);
        };

        let history = StageActivity::find()
            .filter(stage_activity::Column::ServiceProcessId.eq(process_id))
            .order_by_asc(stage_activity::Column::CreatedAt)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok(Some((process, history)))
    }

    /// Lists processes by status with pagination, newest first.
    pub async fn list_by_status(
        &self,
        status: ProcessStatus,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<service_process::Model>, u64), ServiceError> {
        if page == 0 || page_size == 0 {
            return Err(ServiceError::ValidationError(
                "page and page_size must be positive".to_string(),
            ));
        }
        let db = &*self.db;
        let filter = service_process::Column::Status.eq(status);

        let total = ServiceProcess::find()
            .filter(filter.clone())
            .count(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        let processes = ServiceProcess::find()
            .filter(filter)
            .order_by_desc(service_process::Column::CreatedAt)
            .offset((page - 1) * page_size)
            .limit(page_size)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        Ok((processes, total))
    }

    /// Terminal success: close the process and bump the warehouse counter
    /// for the sub-item, all inside the caller's transaction.
    async fn finalize(
        &self,
        txn: &DatabaseTransaction,
        process: &service_process::Model,
        now: DateTime<Utc>,
    ) -> Result<service_process::Model, ServiceError> {
        let mut active: service_process::ActiveModel = process.clone().into();
        active.status = Set(ProcessStatus::Completed);
        active.final_status = Set(Some(FinalStatus::Success));
        active.is_closed = Set(true);
        active.is_repaired = Set(Some(process.item_type == ItemType::Service));
        active.updated_at = Set(now);
        let updated = active.update(txn).await.map_err(ServiceError::DatabaseError)?;

        self.warehouse
            .apply_completion_increment(txn, &process.sub_item, process.item_type)
            .await?;

        Ok(updated)
    }

    /// Failure redirect: route the unit to the configured stage and open a
    /// fresh activity there. Redirecting into the disassemble stage mints
    /// the one-time recovery session token.
    async fn redirect(
        &self,
        txn: &DatabaseTransaction,
        process: &service_process::Model,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<service_process::Model, ServiceError> {
        let target = self
            .resolver
            .redirect_stage(txn, &process.product, process.item_type, reason)
            .await?
            .ok_or_else(|| {
                ServiceError::RedirectNotConfigured(format!(
                    "no redirect for product {} ({}) reason {}",
                    process.product,
                    process.item_type.as_str(),
                    reason
                ))
            })?;

        let mut active: service_process::ActiveModel = process.clone().into();
        if target == self.pipeline.disassemble_stage {
            active.disassemble_session_id = Set(Some(mint_session_token()));
            active.is_disassemble_pending = Set(true);
            active.disassemble_status = Set(Some(DisassembleStatus::Pending));
        }
        active.status = Set(ProcessStatus::Redirected);
        active.restarted_from_stage = Set(Some(process.current_stage.clone()));
        active.current_stage = Set(target.clone());
        active.updated_at = Set(now);
        let updated = active.update(txn).await.map_err(ServiceError::DatabaseError)?;

        open_activity(txn, process.id, &target, now).await?;

        warn!(
            process_id = %process.id,
            from = %process.current_stage,
            to = %target,
            reason,
            "Process redirected after failure"
        );

        Ok(updated)
    }

    /// Normal advance to the configured next stage.
    async fn advance(
        &self,
        txn: &DatabaseTransaction,
        process: &service_process::Model,
        next_stage: String,
        now: DateTime<Utc>,
    ) -> Result<service_process::Model, ServiceError> {
        let mut active: service_process::ActiveModel = process.clone().into();
        active.current_stage = Set(next_stage.clone());
        active.status = Set(ProcessStatus::InProgress);
        active.updated_at = Set(now);
        let updated = active.update(txn).await.map_err(ServiceError::DatabaseError)?;

        open_activity(txn, process.id, &next_stage, now).await?;

        Ok(updated)
    }

    async fn emit_resolution_events(
        &self,
        before: &service_process::Model,
        after: &service_process::Model,
        outcome: StageOutcome,
        failure_reason: Option<String>,
    ) {
        let Some(sender) = &self.event_sender else {
            return;
        };

        match after.status {
            ProcessStatus::Completed => {
                sender
                    .send_or_log(Event::ProcessCompleted {
                        process_id: after.id,
                        final_status: after
                            .final_status
                            .map(|s| s.as_str().to_string())
                            .unwrap_or_default(),
                        repaired: after.is_repaired,
                    })
                    .await;
                sender
                    .send_or_log(Event::WarehouseStockIncremented {
                        sub_item: after.sub_item.clone(),
                        counter: WarehouseStockApplier::counter_name(after.item_type).to_string(),
                    })
                    .await;
            }
            ProcessStatus::Redirected => {
                let reason = match outcome {
                    StageOutcome::Rejected => "REJECTED".to_string(),
                    _ => failure_reason.unwrap_or_default(),
                };
                sender
                    .send_or_log(Event::ProcessRedirected {
                        process_id: after.id,
                        from_stage: before.current_stage.clone(),
                        to_stage: after.current_stage.clone(),
                        failure_reason: reason,
                    })
                    .await;
            }
            ProcessStatus::InProgress => {
                sender
                    .send_or_log(Event::StageAdvanced {
                        process_id: after.id,
                        from_stage: before.current_stage.clone(),
                        to_stage: after.current_stage.clone(),
                    })
                    .await;
            }
        }
    }
}

/// The current activity of a process, if the process is still open.
pub(crate) async fn current_activity<C: ConnectionTrait>(
    db: &C,
    process_id: Uuid,
) -> Result<Option<stage_activity::Model>, ServiceError> {
    StageActivity::find()
        .filter(stage_activity::Column::ServiceProcessId.eq(process_id))
        .filter(stage_activity::Column::IsCurrent.eq(true))
        .one(db)
        .await
        .map_err(ServiceError::DatabaseError)
}

/// Opens the PENDING current activity for a stage.
pub(crate) async fn open_activity<C: ConnectionTrait>(
    db: &C,
    process_id: Uuid,
    stage: &str,
    now: DateTime<Utc>,
) -> Result<stage_activity::Model, ServiceError> {
    stage_activity::ActiveModel {
        id: Set(Uuid::new_v4()),
        service_process_id: Set(process_id),
        stage: Set(stage.to_string()),
        status: Set(ActivityStatus::Pending),
        employee_id: Set(None),
        is_current: Set(true),
        failure_reason: Set(None),
        remarks: Set(None),
        accepted_at: Set(None),
        started_at: Set(None),
        completed_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(ServiceError::DatabaseError)
}

/// Closes an activity with a terminal status. Guarded on `is_current` so a
/// concurrent resolution of the same activity loses cleanly.
pub(crate) async fn close_activity<C: ConnectionTrait>(
    db: &C,
    activity: &stage_activity::Model,
    outcome: StageOutcome,
    failure_reason: Option<&str>,
    remarks: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), ServiceError> {
    let status = outcome.activity_status();
    // Reasons are only recorded for failure outcomes.
    let reason = match outcome {
        StageOutcome::Failed | StageOutcome::Rejected => failure_reason.map(str::to_string),
        _ => None,
    };

    let result = StageActivity::update_many()
        .col_expr(stage_activity::Column::Status, Expr::value(status))
        .col_expr(stage_activity::Column::IsCurrent, Expr::value(false))
        .col_expr(stage_activity::Column::FailureReason, Expr::value(reason))
        .col_expr(stage_activity::Column::Remarks, Expr::value(remarks))
        .col_expr(stage_activity::Column::CompletedAt, Expr::value(Some(now)))
        .col_expr(stage_activity::Column::UpdatedAt, Expr::value(now))
        .filter(stage_activity::Column::Id.eq(activity.id))
        .filter(stage_activity::Column::IsCurrent.eq(true))
        .exec(db)
        .await
        .map_err(ServiceError::DatabaseError)?;

    if result.rows_affected == 0 {
        return Err(ServiceError::InvalidState(format!(
            "activity {} was concurrently resolved",
            activity.id
        )));
    }

    Ok(())
}

/// Start of the current UTC day, for the per-day duplicate guard.
fn start_of_today() -> DateTime<Utc> {
    Utc::now()
        .date_naive()
        .and_time(chrono::NaiveTime::MIN)
        .and_utc()
}

/// High-entropy single-use capability token for a disassembly session.
fn mint_session_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_tokens_are_unique_and_hex() {
        let a = mint_session_token();
        let b = mint_session_token();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn outcome_maps_to_activity_status() {
        assert_eq!(
            StageOutcome::Completed.activity_status(),
            ActivityStatus::Completed
        );
        assert_eq!(StageOutcome::Failed.activity_status(), ActivityStatus::Failed);
        assert_eq!(
            StageOutcome::Rejected.activity_status(),
            ActivityStatus::Rejected
        );
        assert_eq!(StageOutcome::Skipped.activity_status(), ActivityStatus::Skipped);
    }
}
