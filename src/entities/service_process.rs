use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classification of a unit: newly manufactured or under repair. Selects
/// which stage flow and failure redirect rows apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ItemType {
    #[sea_orm(string_value = "NEW")]
    New,
    #[sea_orm(string_value = "SERVICE")]
    Service,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::New => "NEW",
            ItemType::Service => "SERVICE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "NEW" => Some(ItemType::New),
            "SERVICE" => Some(ItemType::Service),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ProcessStatus {
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "REDIRECTED")]
    Redirected,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum FinalStatus {
    #[sea_orm(string_value = "SUCCESS")]
    Success,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

impl FinalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalStatus::Success => "SUCCESS",
            FinalStatus::Rejected => "REJECTED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum DisassembleStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
}

/// One physical unit's pipeline instance.
///
/// `is_closed` is true iff `status == Completed` and `final_status` is set;
/// both are only ever written together inside the finalizing transaction.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_processes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub product: String,
    pub item: String,
    pub sub_item: String,
    pub serial_number: String,
    pub quantity: i32,
    pub item_type: ItemType,
    pub current_stage: String,
    pub initial_stage: String,
    pub restarted_from_stage: Option<String>,
    pub status: ProcessStatus,
    pub final_status: Option<FinalStatus>,
    pub is_closed: bool,
    pub is_repaired: Option<bool>,
    pub is_disassemble_pending: bool,
    pub disassemble_session_id: Option<String>,
    pub disassemble_status: Option<DisassembleStatus>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stage_activity::Entity")]
    StageActivities,
}

impl Related<super::stage_activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StageActivities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
