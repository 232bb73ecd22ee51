use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ActivityStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "FAILED")]
    Failed,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "SKIPPED")]
    Skipped,
}

/// One employee's unit of work at one stage of one process.
///
/// Rows are append-only history: once an activity is closed
/// (`is_current = false`, terminal status, `completed_at` set) it is never
/// rewritten. At most one row per process has `is_current = true`, and the
/// transition from it to its successor happens in a single transaction.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stage_activities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_process_id: Uuid,
    pub stage: String,
    pub status: ActivityStatus,
    pub employee_id: Option<Uuid>,
    pub is_current: bool,
    pub failure_reason: Option<String>,
    pub remarks: Option<String>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service_process::Entity",
        from = "Column::ServiceProcessId",
        to = "super::service_process::Column::Id"
    )]
    ServiceProcess,
}

impl Related<super::service_process::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceProcess.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
