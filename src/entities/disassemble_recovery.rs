use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record of one completed disassembly recovery session. Created exactly
/// once per valid session token; the reclaimed materials live on
/// [`super::disassemble_recovery_line`].
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "disassemble_recoveries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub service_process_id: Uuid,
    pub disassembled_by: Uuid,
    pub received_by: Uuid,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service_process::Entity",
        from = "Column::ServiceProcessId",
        to = "super::service_process::Column::Id"
    )]
    ServiceProcess,
    #[sea_orm(has_many = "super::disassemble_recovery_line::Entity")]
    Lines,
}

impl Related<super::service_process::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceProcess.def()
    }
}

impl Related<super::disassemble_recovery_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
