//! Integration tests for the process lifecycle: unit intake, stage
//! advancement, terminal completion, and failure redirects.

mod common;

use assert_matches::assert_matches;
use common::TestApp;
use servicetrack_api::{
    entities::{ActivityStatus, DisassembleStatus, FinalStatus, ItemType, ProcessStatus},
    errors::ServiceError,
    services::{CreateProcessInput, StageOutcome},
};
use uuid::Uuid;

const PRODUCT: &str = "SOLAR PUMP SET";
const ITEM: &str = "PUMP";
const SUB_ITEM: &str = "PUMP 5HP DC";

fn intake(serial: &str, role: &str) -> CreateProcessInput {
    CreateProcessInput {
        product: PRODUCT.to_string(),
        item: ITEM.to_string(),
        sub_item: SUB_ITEM.to_string(),
        serial_number: serial.to_string(),
        quantity: 1,
        employee_role: role.to_string(),
        created_by: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn create_resolves_item_type_and_stage_from_role() {
    let app = TestApp::new().await;
    let lifecycle = app.state.services.process_lifecycle.clone();

    let process = lifecycle.create(intake("SN001", "Disassemble")).await.unwrap();
    assert_eq!(process.item_type, ItemType::Service);
    assert_eq!(process.current_stage, "Disassemble");
    assert_eq!(process.initial_stage, "Disassemble");
    assert_eq!(process.status, ProcessStatus::InProgress);
    assert!(!process.is_closed);

    let (_, history) = lifecycle.get_with_history(process.id).await.unwrap().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, ActivityStatus::Pending);
    assert!(history[0].is_current);
    assert!(history[0].employee_id.is_none());

    let new_unit = lifecycle.create(intake("SN002", "MPC Work")).await.unwrap();
    assert_eq!(new_unit.item_type, ItemType::New);
    assert_eq!(new_unit.current_stage, "MPC Work");
}

#[tokio::test]
async fn create_rejects_unknown_role() {
    let app = TestApp::new().await;
    let result = app
        .state
        .services
        .process_lifecycle
        .create(intake("SN001", "Painter"))
        .await;
    assert_matches!(result, Err(ServiceError::UnknownRole(_)));
}

#[tokio::test]
async fn same_unit_cannot_be_registered_twice_in_one_day() {
    let app = TestApp::new().await;
    let lifecycle = app.state.services.process_lifecycle.clone();

    lifecycle.create(intake("SN001", "Disassemble")).await.unwrap();
    let second = lifecycle.create(intake("SN001", "Disassemble")).await;
    assert_matches!(second, Err(ServiceError::DuplicateProcess(_)));

    // A different serial is a different unit.
    lifecycle.create(intake("SN002", "Disassemble")).await.unwrap();
}

/// Scenario A: Disassemble → Testing → successful completion, with the
/// warehouse "quantity" counter incremented for the repaired sub-item.
#[tokio::test]
async fn service_unit_completes_through_testing() {
    let app = TestApp::new().await;
    app.seed_stage_flow(PRODUCT, ItemType::Service, "Disassemble", "Testing")
        .await;

    let lifecycle = app.state.services.process_lifecycle.clone();
    let activities = app.state.services.stage_activities.clone();
    let employee = app.seed_employee("Technician").await;

    let process = lifecycle.create(intake("SN001", "Disassemble")).await.unwrap();

    let accepted = activities.accept(process.id, employee).await.unwrap();
    assert_eq!(accepted.status, ActivityStatus::InProgress);
    assert_eq!(accepted.employee_id, Some(employee));

    let started = activities.start(process.id, employee).await.unwrap();
    assert!(started.started_at.is_some());

    let advanced = activities
        .complete(process.id, employee, StageOutcome::Completed, None, None)
        .await
        .unwrap();
    assert_eq!(advanced.current_stage, "Testing");
    assert_eq!(advanced.status, ProcessStatus::InProgress);

    // The tester picks the unit up at Testing and passes it.
    let tester = app.seed_employee("Technician").await;
    activities.accept(process.id, tester).await.unwrap();
    activities.start(process.id, tester).await.unwrap();
    let done = activities
        .complete(process.id, tester, StageOutcome::Completed, None, None)
        .await
        .unwrap();

    assert_eq!(done.status, ProcessStatus::Completed);
    assert_eq!(done.final_status, Some(FinalStatus::Success));
    assert!(done.is_closed);
    assert_eq!(done.is_repaired, Some(true));

    let warehouse = app.warehouse_row(SUB_ITEM).await.unwrap();
    assert_eq!(warehouse.quantity, 1);
    assert_eq!(warehouse.new_stock, 0);

    // Once completed, no activity remains current.
    let (_, history) = lifecycle.get_with_history(process.id).await.unwrap().unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|a| !a.is_current));
}

#[tokio::test]
async fn new_unit_completion_increments_new_stock_counter() {
    let app = TestApp::new().await;
    // MPC Work is the only stage for this product; no successor means the
    // flow ends there exactly like a successful terminal stage.
    app.seed_stage_flow(PRODUCT, ItemType::New, "Final Assembly", "Testing")
        .await;

    let activities = app.state.services.stage_activities.clone();
    let employee = app.seed_employee("Technician").await;

    let process = app
        .state
        .services
        .process_lifecycle
        .create(intake("SN010", "MPC Work"))
        .await
        .unwrap();

    activities.accept(process.id, employee).await.unwrap();
    activities.start(process.id, employee).await.unwrap();
    let done = activities
        .complete(process.id, employee, StageOutcome::Completed, None, None)
        .await
        .unwrap();

    assert_eq!(done.status, ProcessStatus::Completed);
    assert_eq!(done.final_status, Some(FinalStatus::Success));
    assert_eq!(done.is_repaired, Some(false));

    let warehouse = app.warehouse_row(SUB_ITEM).await.unwrap();
    assert_eq!(warehouse.new_stock, 1);
    assert_eq!(warehouse.quantity, 0);
}

/// Scenario B: rejection at Testing redirects to Disassemble and mints the
/// one-time recovery session.
#[tokio::test]
async fn rejection_at_testing_redirects_to_disassemble() {
    let app = TestApp::new().await;
    app.seed_stage_flow(PRODUCT, ItemType::Service, "Disassemble", "Testing")
        .await;
    app.seed_failure_redirect(PRODUCT, ItemType::Service, "REJECTED", "Disassemble")
        .await;

    let lifecycle = app.state.services.process_lifecycle.clone();
    let activities = app.state.services.stage_activities.clone();
    let employee = app.seed_employee("Technician").await;

    let process = lifecycle.create(intake("SN001", "Disassemble")).await.unwrap();
    activities.accept(process.id, employee).await.unwrap();
    activities.start(process.id, employee).await.unwrap();
    activities
        .complete(process.id, employee, StageOutcome::Completed, None, None)
        .await
        .unwrap();

    let tester = app.seed_employee("Technician").await;
    activities.accept(process.id, tester).await.unwrap();
    activities.start(process.id, tester).await.unwrap();
    let redirected = activities
        .complete(process.id, tester, StageOutcome::Rejected, None, None)
        .await
        .unwrap();

    assert_eq!(redirected.status, ProcessStatus::Redirected);
    assert_eq!(redirected.current_stage, "Disassemble");
    assert_eq!(redirected.restarted_from_stage, Some("Testing".to_string()));
    assert!(redirected.is_disassemble_pending);
    assert_eq!(redirected.disassemble_status, Some(DisassembleStatus::Pending));
    let token = redirected.disassemble_session_id.expect("session token minted");
    assert_eq!(token.len(), 32);

    // A fresh pending activity is open at the redirect stage.
    let (_, history) = lifecycle.get_with_history(process.id).await.unwrap().unwrap();
    let current: Vec<_> = history.iter().filter(|a| a.is_current).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].stage, "Disassemble");
    assert_eq!(current[0].status, ActivityStatus::Pending);

    // No warehouse movement for a rejected unit.
    assert!(app.warehouse_row(SUB_ITEM).await.is_none());
}

#[tokio::test]
async fn failure_with_configured_reason_redirects_with_that_reason() {
    let app = TestApp::new().await;
    app.seed_stage_flow(PRODUCT, ItemType::Service, "Disassemble", "Testing")
        .await;
    app.seed_failure_redirect(PRODUCT, ItemType::Service, "WINDING FAULT", "Disassemble")
        .await;

    let activities = app.state.services.stage_activities.clone();
    let lifecycle = app.state.services.process_lifecycle.clone();
    let employee = app.seed_employee("Technician").await;

    let process = lifecycle.create(intake("SN001", "Disassemble")).await.unwrap();
    activities.accept(process.id, employee).await.unwrap();
    activities.start(process.id, employee).await.unwrap();
    activities
        .complete(process.id, employee, StageOutcome::Completed, None, None)
        .await
        .unwrap();

    let tester = app.seed_employee("Technician").await;
    activities.accept(process.id, tester).await.unwrap();
    activities.start(process.id, tester).await.unwrap();
    let redirected = activities
        .complete(
            process.id,
            tester,
            StageOutcome::Failed,
            Some("WINDING FAULT".to_string()),
            Some("stator shorted".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(redirected.status, ProcessStatus::Redirected);
    assert_eq!(redirected.current_stage, "Disassemble");

    let (_, history) = lifecycle.get_with_history(process.id).await.unwrap().unwrap();
    let failed = history
        .iter()
        .find(|a| a.status == ActivityStatus::Failed)
        .expect("failed activity recorded");
    assert_eq!(failed.failure_reason, Some("WINDING FAULT".to_string()));
    assert_eq!(failed.remarks, Some("stator shorted".to_string()));
}

#[tokio::test]
async fn failure_with_unconfigured_reason_aborts_whole_resolution() {
    let app = TestApp::new().await;
    app.seed_stage_flow(PRODUCT, ItemType::Service, "Disassemble", "Testing")
        .await;
    app.seed_failure_redirect(PRODUCT, ItemType::Service, "REJECTED", "Disassemble")
        .await;

    let activities = app.state.services.stage_activities.clone();
    let lifecycle = app.state.services.process_lifecycle.clone();
    let employee = app.seed_employee("Technician").await;

    let process = lifecycle.create(intake("SN001", "Disassemble")).await.unwrap();
    activities.accept(process.id, employee).await.unwrap();
    activities.start(process.id, employee).await.unwrap();
    activities
        .complete(process.id, employee, StageOutcome::Completed, None, None)
        .await
        .unwrap();

    let tester = app.seed_employee("Technician").await;
    activities.accept(process.id, tester).await.unwrap();
    activities.start(process.id, tester).await.unwrap();
    let result = activities
        .complete(
            process.id,
            tester,
            StageOutcome::Failed,
            Some("UNMAPPED REASON".to_string()),
            None,
        )
        .await;
    assert_matches!(result, Err(ServiceError::RedirectNotConfigured(_)));

    // The aborted transaction left the testing activity open.
    let (reloaded, history) = lifecycle.get_with_history(process.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, ProcessStatus::InProgress);
    assert_eq!(reloaded.current_stage, "Testing");
    let current: Vec<_> = history.iter().filter(|a| a.is_current).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].status, ActivityStatus::InProgress);
}

#[tokio::test]
async fn failed_outcome_requires_a_reason() {
    let app = TestApp::new().await;
    let lifecycle = app.state.services.process_lifecycle.clone();

    let process = lifecycle.create(intake("SN001", "Disassemble")).await.unwrap();
    let result = lifecycle
        .resolve_stage_outcome(process.id, StageOutcome::Failed, None, None)
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn resolving_unknown_product_flow_fails_not_found() {
    let app = TestApp::new().await;
    let activities = app.state.services.stage_activities.clone();
    let employee = app.seed_employee("Technician").await;

    // No stage flow rows seeded for this product at all.
    let process = app
        .state
        .services
        .process_lifecycle
        .create(intake("SN001", "Disassemble"))
        .await
        .unwrap();
    activities.accept(process.id, employee).await.unwrap();
    activities.start(process.id, employee).await.unwrap();
    let result = activities
        .complete(process.id, employee, StageOutcome::Completed, None, None)
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn at_most_one_current_activity_throughout_the_pipeline() {
    let app = TestApp::new().await;
    app.seed_stage_flow(PRODUCT, ItemType::Service, "Disassemble", "Winding")
        .await;
    app.seed_stage_flow(PRODUCT, ItemType::Service, "Winding", "Testing")
        .await;

    let lifecycle = app.state.services.process_lifecycle.clone();
    let activities = app.state.services.stage_activities.clone();
    let process = lifecycle.create(intake("SN001", "Disassemble")).await.unwrap();

    for _ in 0..2 {
        let employee = app.seed_employee("Technician").await;
        activities.accept(process.id, employee).await.unwrap();
        activities.start(process.id, employee).await.unwrap();
        activities
            .complete(process.id, employee, StageOutcome::Completed, None, None)
            .await
            .unwrap();

        let (_, history) = lifecycle.get_with_history(process.id).await.unwrap().unwrap();
        assert!(history.iter().filter(|a| a.is_current).count() <= 1);
    }

    let (reloaded, _) = lifecycle.get_with_history(process.id).await.unwrap().unwrap();
    assert_eq!(reloaded.current_stage, "Testing");
}

#[tokio::test]
async fn skipped_stage_advances_like_completed() {
    let app = TestApp::new().await;
    app.seed_stage_flow(PRODUCT, ItemType::Service, "Disassemble", "Testing")
        .await;

    let lifecycle = app.state.services.process_lifecycle.clone();
    let activities = app.state.services.stage_activities.clone();
    let employee = app.seed_employee("Technician").await;

    let process = lifecycle.create(intake("SN001", "Disassemble")).await.unwrap();
    activities.accept(process.id, employee).await.unwrap();
    activities.start(process.id, employee).await.unwrap();
    let advanced = activities
        .complete(process.id, employee, StageOutcome::Skipped, None, None)
        .await
        .unwrap();

    assert_eq!(advanced.current_stage, "Testing");

    let (_, history) = lifecycle.get_with_history(process.id).await.unwrap().unwrap();
    let skipped = history
        .iter()
        .find(|a| a.status == ActivityStatus::Skipped)
        .expect("skipped activity recorded");
    assert!(skipped.failure_reason.is_none());
}
