//! Integration tests for stage activity acceptance, ownership, and the
//! accept race guarantee.

mod common;

use assert_matches::assert_matches;
use common::TestApp;
use servicetrack_api::{
    entities::{ActivityStatus, ItemType},
    errors::ServiceError,
    services::{CreateProcessInput, StageOutcome},
};
use uuid::Uuid;

const PRODUCT: &str = "SOLAR PUMP SET";

fn intake(serial: &str) -> CreateProcessInput {
    CreateProcessInput {
        product: PRODUCT.to_string(),
        item: "PUMP".to_string(),
        sub_item: "PUMP 5HP DC".to_string(),
        serial_number: serial.to_string(),
        quantity: 1,
        employee_role: "Disassemble".to_string(),
        created_by: Uuid::new_v4(),
    }
}

#[tokio::test]
async fn two_racing_accepts_produce_exactly_one_winner() {
    let app = TestApp::new().await;
    let activities = app.state.services.stage_activities.clone();
    let process = app
        .state
        .services
        .process_lifecycle
        .create(intake("SN001"))
        .await
        .unwrap();

    let e1 = Uuid::new_v4();
    let e2 = Uuid::new_v4();

    let (r1, r2) = tokio::join!(
        activities.accept(process.id, e1),
        activities.accept(process.id, e2),
    );

    let winners = [&r1, &r2].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one accept must win");

    let loser = if r1.is_ok() { r2 } else { r1 };
    assert_matches!(loser, Err(ServiceError::AlreadyAssigned(_)));

    let winner = app
        .state
        .services
        .process_lifecycle
        .get_with_history(process.id)
        .await
        .unwrap()
        .unwrap()
        .1
        .into_iter()
        .find(|a| a.is_current)
        .unwrap();
    assert_eq!(winner.status, ActivityStatus::InProgress);
    assert!(winner.employee_id == Some(e1) || winner.employee_id == Some(e2));
}

#[tokio::test]
async fn accept_after_assignment_reports_already_assigned() {
    let app = TestApp::new().await;
    let activities = app.state.services.stage_activities.clone();
    let process = app
        .state
        .services
        .process_lifecycle
        .create(intake("SN001"))
        .await
        .unwrap();

    let e1 = Uuid::new_v4();
    activities.accept(process.id, e1).await.unwrap();

    let second = activities.accept(process.id, Uuid::new_v4()).await;
    assert_matches!(second, Err(ServiceError::AlreadyAssigned(_)));
}

#[tokio::test]
async fn accept_on_missing_process_reports_not_found() {
    let app = TestApp::new().await;
    let result = app
        .state
        .services
        .stage_activities
        .accept(Uuid::new_v4(), Uuid::new_v4())
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn accept_on_completed_process_reports_invalid_state() {
    let app = TestApp::new().await;
    app.seed_stage_flow(PRODUCT, ItemType::Service, "Disassemble", "Testing")
        .await;
    let activities = app.state.services.stage_activities.clone();

    let process = app
        .state
        .services
        .process_lifecycle
        .create(intake("SN001"))
        .await
        .unwrap();

    // Drive to completion.
    for _ in 0..2 {
        let employee = Uuid::new_v4();
        activities.accept(process.id, employee).await.unwrap();
        activities.start(process.id, employee).await.unwrap();
        activities
            .complete(process.id, employee, StageOutcome::Completed, None, None)
            .await
            .unwrap();
    }

    let result = activities.accept(process.id, Uuid::new_v4()).await;
    assert_matches!(result, Err(ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn start_requires_ownership() {
    let app = TestApp::new().await;
    let activities = app.state.services.stage_activities.clone();
    let process = app
        .state
        .services
        .process_lifecycle
        .create(intake("SN001"))
        .await
        .unwrap();

    let owner = Uuid::new_v4();
    activities.accept(process.id, owner).await.unwrap();

    let stranger = activities.start(process.id, Uuid::new_v4()).await;
    assert_matches!(stranger, Err(ServiceError::Unauthorized(_)));

    activities.start(process.id, owner).await.unwrap();
}

#[tokio::test]
async fn start_before_accept_reports_unauthorized() {
    let app = TestApp::new().await;
    let activities = app.state.services.stage_activities.clone();
    let process = app
        .state
        .services
        .process_lifecycle
        .create(intake("SN001"))
        .await
        .unwrap();

    // Activity is still pending and unassigned.
    let result = activities.start(process.id, Uuid::new_v4()).await;
    assert_matches!(result, Err(ServiceError::Unauthorized(_)));
}

#[tokio::test]
async fn double_start_reports_invalid_state() {
    let app = TestApp::new().await;
    let activities = app.state.services.stage_activities.clone();
    let process = app
        .state
        .services
        .process_lifecycle
        .create(intake("SN001"))
        .await
        .unwrap();

    let owner = Uuid::new_v4();
    activities.accept(process.id, owner).await.unwrap();
    activities.start(process.id, owner).await.unwrap();

    let again = activities.start(process.id, owner).await;
    assert_matches!(again, Err(ServiceError::InvalidState(_)));
}

#[tokio::test]
async fn complete_requires_ownership_and_progress() {
    let app = TestApp::new().await;
    app.seed_stage_flow(PRODUCT, ItemType::Service, "Disassemble", "Testing")
        .await;
    let activities = app.state.services.stage_activities.clone();
    let process = app
        .state
        .services
        .process_lifecycle
        .create(intake("SN001"))
        .await
        .unwrap();

    let owner = Uuid::new_v4();
    activities.accept(process.id, owner).await.unwrap();

    let stranger = activities
        .complete(process.id, Uuid::new_v4(), StageOutcome::Completed, None, None)
        .await;
    assert_matches!(stranger, Err(ServiceError::Unauthorized(_)));

    // The owner can complete without an explicit start; acceptance put the
    // activity in progress.
    activities
        .complete(process.id, owner, StageOutcome::Completed, None, None)
        .await
        .unwrap();
}
