#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use servicetrack_api::{
    config::AppConfig,
    db::{self, DbConfig},
    entities::{
        raw_material, stage_flow, failure_redirect, user_item_stock, warehouse_stock, ItemType,
    },
    events::{self, EventSender},
    services::InMemoryRoleDirectory,
    AppState,
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Helper harness for spinning up application state backed by an
/// in-memory SQLite database.
pub struct TestApp {
    pub state: AppState,
    pub roles: Arc<InMemoryRoleDirectory>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        servicetrack_api::logging::try_init_for_tests();

        // A single pooled connection keeps the in-memory database alive
        // and shared for the lifetime of the test.
        let db_cfg = DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        let pool = db::establish_connection_with_config(&db_cfg)
            .await
            .expect("failed to create test database");

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let cfg = AppConfig::new("sqlite::memory:".to_string(), "test".to_string());
        let roles = Arc::new(InMemoryRoleDirectory::new());

        let state = AppState::new(db_arc, cfg, roles.clone(), event_sender);

        Self {
            state,
            roles,
            _event_task: event_task,
        }
    }

    /// Registers an employee with a role in the in-memory directory.
    pub async fn seed_employee(&self, role: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.roles.assign(id, role).await;
        id
    }

    pub async fn seed_material(&self, name: &str, stock: Decimal, unit: &str) -> raw_material::Model {
        let now = Utc::now();
        raw_material::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            stock: Set(stock),
            unit: Set(unit.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed raw material")
    }

    pub async fn seed_stage_flow(
        &self,
        product: &str,
        item_type: ItemType,
        current_stage: &str,
        next_stage: &str,
    ) {
        stage_flow::ActiveModel {
            id: Set(Uuid::new_v4()),
            product: Set(product.to_string()),
            item_type: Set(item_type),
            current_stage: Set(current_stage.to_string()),
            next_stage: Set(next_stage.to_string()),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed stage flow");
    }

    pub async fn seed_failure_redirect(
        &self,
        product: &str,
        item_type: ItemType,
        failure_reason: &str,
        redirect_stage: &str,
    ) {
        failure_redirect::ActiveModel {
            id: Set(Uuid::new_v4()),
            product: Set(product.to_string()),
            item_type: Set(item_type),
            failure_reason: Set(failure_reason.to_string()),
            redirect_stage: Set(redirect_stage.to_string()),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed failure redirect");
    }

    pub async fn material_stock(&self, material_id: Uuid) -> Decimal {
        raw_material::Entity::find_by_id(material_id)
            .one(self.state.db.as_ref())
            .await
            .expect("query raw material")
            .expect("raw material exists")
            .stock
    }

    pub async fn held_quantity(&self, employee_id: Uuid, material_id: Uuid) -> Option<Decimal> {
        user_item_stock::Entity::find_by_id((employee_id, material_id))
            .one(self.state.db.as_ref())
            .await
            .expect("query user item stock")
            .map(|row| row.quantity)
    }

    pub async fn warehouse_row(&self, sub_item: &str) -> Option<warehouse_stock::Model> {
        warehouse_stock::Entity::find()
            .filter(warehouse_stock::Column::SubItem.eq(sub_item))
            .one(self.state.db.as_ref())
            .await
            .expect("query warehouse stock")
    }
}
