use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{config::PipelineConfig, db::DbPool, errors::ServiceError, events::EventSender};

pub mod disassembly;
pub mod material_ledger;
pub mod process_lifecycle;
pub mod stage_activities;
pub mod stage_resolver;
pub mod warehouse_stock;

pub use disassembly::DisassemblyService;
pub use material_ledger::{MaterialLedgerService, MaterialLine, RequestAction, STORE_ROLE};
pub use process_lifecycle::{CreateProcessInput, ProcessLifecycleService, StageOutcome};
pub use stage_activities::StageActivityService;
pub use stage_resolver::StageResolver;
pub use warehouse_stock::WarehouseStockApplier;

/// Identity/role collaborator: resolves an employee id to a role name.
///
/// The surrounding system authenticates callers and owns the employee
/// directory; this core only asks it one question.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn role_name(&self, employee_id: Uuid) -> Result<Option<String>, ServiceError>;
}

/// In-memory role directory for tests and embedded deployments.
#[derive(Debug, Default)]
pub struct InMemoryRoleDirectory {
    roles: RwLock<HashMap<Uuid, String>>,
}

impl InMemoryRoleDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn assign(&self, employee_id: Uuid, role: impl Into<String>) {
        self.roles.write().await.insert(employee_id, role.into());
    }
}

#[async_trait]
impl RoleDirectory for InMemoryRoleDirectory {
    async fn role_name(&self, employee_id: Uuid) -> Result<Option<String>, ServiceError> {
        Ok(self.roles.read().await.get(&employee_id).cloned())
    }
}

/// The wired-up service set the surrounding system talks to.
#[derive(Clone)]
pub struct AppServices {
    pub process_lifecycle: Arc<ProcessLifecycleService>,
    pub stage_activities: Arc<StageActivityService>,
    pub material_ledger: Arc<MaterialLedgerService>,
    pub disassembly: Arc<DisassemblyService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        pipeline: PipelineConfig,
        roles: Arc<dyn RoleDirectory>,
        event_sender: Option<EventSender>,
    ) -> Self {
        let process_lifecycle = Arc::new(ProcessLifecycleService::new(
            db.clone(),
            pipeline,
            event_sender.clone(),
        ));
        let stage_activities = Arc::new(StageActivityService::new(
            db.clone(),
            process_lifecycle.clone(),
            event_sender.clone(),
        ));
        let material_ledger = Arc::new(MaterialLedgerService::new(
            db.clone(),
            roles,
            event_sender.clone(),
        ));
        let disassembly = Arc::new(DisassemblyService::new(db, event_sender));

        Self {
            process_lifecycle,
            stage_activities,
            material_ledger,
            disassembly,
        }
    }
}
