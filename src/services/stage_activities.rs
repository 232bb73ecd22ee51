use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::{
        service_process::{self, Entity as ServiceProcess, ProcessStatus},
        stage_activity::{self, ActivityStatus, Entity as StageActivity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::process_lifecycle::{current_activity, ProcessLifecycleService, StageOutcome},
};

/// Manages accept/start/complete on a process's current stage activity.
///
/// Acceptance is the contended operation: two employees may race for the
/// same pending activity, and the conditional update guarantees exactly
/// one wins while the other sees `AlreadyAssigned`.
#[derive(Clone)]
pub struct StageActivityService {
    db: Arc<DbPool>,
    lifecycle: Arc<ProcessLifecycleService>,
    event_sender: Option<EventSender>,
}

impl StageActivityService {
    pub fn new(
        db: Arc<DbPool>,
        lifecycle: Arc<ProcessLifecycleService>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            lifecycle,
            event_sender,
        }
    }

    /// Claims the current pending activity for an employee.
    #[instrument(skip(self))]
    pub async fn accept(
        &self,
        process_id: Uuid,
        employee_id: Uuid,
    ) -> Result<stage_activity::Model, ServiceError> {
        let db = &*self.db;

        let process = ServiceProcess::find_by_id(process_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| ServiceError::NotFound(format!("Process {} not found", process_id)))?;

        if process.is_closed || process.status == ProcessStatus::Completed {
            return Err(ServiceError::InvalidState(format!(
                "process {} is already completed",
                process_id
            )));
        }

        let activity = current_activity(db, process_id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("Process {} has no current activity", process_id))
        })?;

        if let Some(owner) = activity.employee_id {
            return Err(ServiceError::AlreadyAssigned(format!(
                "activity {} is already assigned to employee {}",
                activity.id, owner
            )));
        }
        if activity.status != ActivityStatus::Pending {
            return Err(ServiceError::InvalidState(format!(
                "activity {} is not pending acceptance",
                activity.id
            )));
        }

        // Conditional claim: only succeeds while the activity is still
        // unassigned and pending, so one of two racing callers loses.
        let now = Utc::now();
        let result = StageActivity::update_many()
            .col_expr(stage_activity::Column::EmployeeId, Expr::value(Some(employee_id)))
            .col_expr(
                stage_activity::Column::Status,
                Expr::value(ActivityStatus::InProgress),
            )
            .col_expr(stage_activity::Column::AcceptedAt, Expr::value(Some(now)))
            .col_expr(stage_activity::Column::UpdatedAt, Expr::value(now))
            .filter(stage_activity::Column::Id.eq(activity.id))
            .filter(stage_activity::Column::Status.eq(ActivityStatus::Pending))
            .filter(stage_activity::Column::EmployeeId.is_null())
            .exec(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::AlreadyAssigned(format!(
                "activity {} was claimed by another employee",
                activity.id
            )));
        }

        info!(
            %process_id,
            activity_id = %activity.id,
            %employee_id,
            stage = %activity.stage,
            "Stage activity accepted"
        );

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::StageAccepted {
                    process_id,
                    activity_id: activity.id,
                    employee_id,
                    stage: activity.stage.clone(),
                })
                .await;
        }

        self.reload(activity.id).await
    }

    /// Marks the accepted activity as actually started.
    #[instrument(skip(self))]
    pub async fn start(
        &self,
        process_id: Uuid,
        employee_id: Uuid,
    ) -> Result<stage_activity::Model, ServiceError> {
        let db = &*self.db;

        let activity = self.owned_current_activity(process_id, employee_id).await?;

        if activity.status != ActivityStatus::InProgress || activity.started_at.is_some() {
            return Err(ServiceError::InvalidState(format!(
                "activity {} cannot be started in its current state",
                activity.id
            )));
        }

        let now = Utc::now();
        let result = StageActivity::update_many()
            .col_expr(stage_activity::Column::StartedAt, Expr::value(Some(now)))
            .col_expr(stage_activity::Column::UpdatedAt, Expr::value(now))
            .filter(stage_activity::Column::Id.eq(activity.id))
            .filter(stage_activity::Column::Status.eq(ActivityStatus::InProgress))
            .filter(stage_activity::Column::StartedAt.is_null())
            .exec(db)
            .await
            .map_err(ServiceError::DatabaseError)?;

        if result.rows_affected == 0 {
            return Err(ServiceError::InvalidState(format!(
                "activity {} was already started",
                activity.id
            )));
        }

        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::StageStarted {
                    process_id,
                    activity_id: activity.id,
                    employee_id,
                    started_at: now,
                })
                .await;
        }

        self.reload(activity.id).await
    }

    /// Completes the caller's in-progress activity and resolves the stage
    /// outcome through the process lifecycle.
    #[instrument(skip(self))]
    pub async fn complete(
        &self,
        process_id: Uuid,
        employee_id: Uuid,
        outcome: StageOutcome,
        failure_reason: Option<String>,
        remarks: Option<String>,
    ) -> Result<service_process::Model, ServiceError> {
        let activity = self.owned_current_activity(process_id, employee_id).await?;

        if activity.status != ActivityStatus::InProgress {
            return Err(ServiceError::InvalidState(format!(
                "activity {} is not in progress",
                activity.id
            )));
        }

        self.lifecycle
            .resolve_stage_outcome(process_id, outcome, failure_reason, remarks)
            .await
    }

    /// Activities currently assigned to an employee, across processes.
    pub async fn list_assigned_to(
        &self,
        employee_id: Uuid,
    ) -> Result<Vec<stage_activity::Model>, ServiceError> {
        let db = &*self.db;
        StageActivity::find()
            .filter(stage_activity::Column::EmployeeId.eq(employee_id))
            .filter(stage_activity::Column::IsCurrent.eq(true))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    async fn owned_current_activity(
        &self,
        process_id: Uuid,
        employee_id: Uuid,
    ) -> Result<stage_activity::Model, ServiceError> {
        let db = &*self.db;
        let activity = current_activity(db, process_id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("Process {} has no current activity", process_id))
        })?;

        if activity.employee_id != Some(employee_id) {
            return Err(ServiceError::Unauthorized(format!(
                "activity {} is not assigned to employee {}",
                activity.id, employee_id
            )));
        }

        Ok(activity)
    }

    async fn reload(&self, activity_id: Uuid) -> Result<stage_activity::Model, ServiceError> {
        let db = &*self.db;
        StageActivity::find_by_id(activity_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("activity {} vanished after update", activity_id))
            })
    }
}
