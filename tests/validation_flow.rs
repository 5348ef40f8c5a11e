//! Supervisor review: approve closes the order, reject sends it back.

mod common;

use assert_matches::assert_matches;

use common::{entry, full_entries, new_work_order, test_env, TestEnv};
use inspecao_backend::common::error::AppError;
use inspecao_backend::db::InspectionStore;
use inspecao_backend::models::checklist::ItemResult;
use inspecao_backend::models::intake::ServiceRequestStatus;
use inspecao_backend::models::validation::{ValidationFilter, ValidationRequest, ValidationStatus, Verdict};
use inspecao_backend::models::work_order::{WorkOrder, WorkOrderStatus};
use inspecao_backend::services::checklist_service::InspectionContext;

async fn completed_order(env: &TestEnv, number: &str) -> (WorkOrder, ValidationRequest) {
    let order = env.seed_work_order(number).await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");
    env.state
        .checklist_service
        .submit_final(&ctx, &full_entries(ItemResult::Conforming))
        .await
        .unwrap();
    let validation = env
        .store
        .find_validation_for_work_order(order.id)
        .await
        .unwrap()
        .unwrap();
    (order, validation)
}

// ---------------------------------------------------------------------------
// Approve
// ---------------------------------------------------------------------------

#[tokio::test]
async fn approve_closes_order_and_concludes_service_request() {
    let env = test_env();
    let (order, validation) = completed_order(&env, "OS-2024-009").await;

    let approved = env
        .state
        .validation_service
        .approve(validation.id, "supervisor-7", Some(" Tudo conforme. ".into()))
        .await
        .unwrap();

    assert_eq!(approved.status, ValidationStatus::Approved);
    assert_eq!(approved.verdict, Some(Verdict::Fit));
    assert_eq!(approved.reviewer_id.as_deref(), Some("supervisor-7"));
    assert_eq!(approved.comment.as_deref(), Some("Tudo conforme."));
    assert!(approved.reviewed_at.is_some());

    let stored = env.store.get_work_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, WorkOrderStatus::Closed);
    assert!(stored.completed_at.is_some());

    let request = env
        .store
        .get_service_request(stored.client_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.status, ServiceRequestStatus::Concluded);
}

#[tokio::test]
async fn closed_order_submit_is_a_no_op() {
    let env = test_env();
    let (order, validation) = completed_order(&env, "OS-2024-030").await;
    env.state.validation_service.approve(validation.id, "supervisor-7", None).await.unwrap();

    let ctx = InspectionContext::new(order.id, "tecnico-1");
    let outcome = env
        .state
        .checklist_service
        .submit_final(&ctx, &full_entries(ItemResult::Conforming))
        .await
        .unwrap();

    assert_eq!(outcome.saved, 0);
    assert_eq!(outcome.status, Some(WorkOrderStatus::Closed));
}

// ---------------------------------------------------------------------------
// Reject
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reject_reopens_order_for_correction() {
    let env = test_env();
    let (order, validation) = completed_order(&env, "OS-2024-031").await;

    let rejected = env
        .state
        .validation_service
        .reject(validation.id, "supervisor-7", Some("Foto do abrigo ilegível".into()))
        .await
        .unwrap();

    assert_eq!(rejected.status, ValidationStatus::Rejected);
    assert_eq!(rejected.verdict, Some(Verdict::Unfit));

    let stored = env.store.get_work_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, WorkOrderStatus::InProgress);
    assert_eq!(stored.completed_at, None);

    // o técnico pode corrigir
    let ctx = InspectionContext::new(order.id, "tecnico-1");
    let outcome = env
        .state
        .checklist_service
        .save_draft(&ctx, &[entry("1.1", ItemResult::NonConforming)])
        .await
        .unwrap();
    assert_eq!(outcome.status, Some(WorkOrderStatus::Completed));
}

#[tokio::test]
async fn recompleting_after_reject_reuses_the_same_request() {
    let env = test_env();
    let (order, validation) = completed_order(&env, "OS-2024-032").await;
    env.state.validation_service.reject(validation.id, "supervisor-7", None).await.unwrap();

    let ctx = InspectionContext::new(order.id, "tecnico-1");
    env.state
        .checklist_service
        .submit_final(&ctx, &full_entries(ItemResult::Conforming))
        .await
        .unwrap();

    let all = env
        .store
        .list_validation_requests(&ValidationFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, validation.id);
    assert_eq!(all[0].status, ValidationStatus::Pending);
    assert_eq!(all[0].verdict, None);
    assert_eq!(all[0].comment, None);
}

// ---------------------------------------------------------------------------
// Guards
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reviewing_twice_is_rejected() {
    let env = test_env();
    let (_, validation) = completed_order(&env, "OS-2024-033").await;
    let service = &env.state.validation_service;

    service.approve(validation.id, "supervisor-7", None).await.unwrap();

    assert_matches!(
        service.approve(validation.id, "supervisor-8", None).await,
        Err(AppError::ValidationAlreadyReviewed)
    );
    assert_matches!(
        service.reject(validation.id, "supervisor-8", None).await,
        Err(AppError::ValidationAlreadyReviewed)
    );
    assert_matches!(
        service.assign_reviewer(validation.id, "supervisor-8").await,
        Err(AppError::ValidationAlreadyReviewed)
    );
}

#[tokio::test]
async fn failed_approval_leaves_request_pending_and_can_be_retried() {
    let env = test_env();
    let (order, validation) = completed_order(&env, "OS-2024-034").await;

    env.store.set_fail_writes(true);
    assert_matches!(
        env.state.validation_service.approve(validation.id, "supervisor-7", None).await,
        Err(AppError::StorageUnavailable(_))
    );
    env.store.set_fail_writes(false);

    let current = env.store.get_validation_request(validation.id).await.unwrap().unwrap();
    assert_eq!(current.status, ValidationStatus::Pending);
    assert_eq!(current.verdict, None);
    let stored = env.store.get_work_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, WorkOrderStatus::Completed);

    let approved = env
        .state
        .validation_service
        .approve(validation.id, "supervisor-7", None)
        .await
        .unwrap();
    assert_eq!(approved.status, ValidationStatus::Approved);
    let stored = env.store.get_work_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, WorkOrderStatus::Closed);
    let request = env.store.get_service_request(stored.client_id.unwrap()).await.unwrap().unwrap();
    assert_eq!(request.status, ServiceRequestStatus::Concluded);
}

#[tokio::test]
async fn approval_failing_on_the_service_request_rolls_back_the_review() {
    let env = test_env();
    // OS ligada a um pedido que não existe: a última escrita do parecer falha
    let order = env
        .store
        .create_work_order(&new_work_order("OS-2024-035", Some(uuid::Uuid::new_v4()), None))
        .await
        .unwrap();
    let ctx = InspectionContext::new(order.id, "tecnico-1");
    env.state
        .checklist_service
        .submit_final(&ctx, &full_entries(ItemResult::Conforming))
        .await
        .unwrap();
    let validation = env.store.find_validation_for_work_order(order.id).await.unwrap().unwrap();

    assert_matches!(
        env.state.validation_service.approve(validation.id, "supervisor-7", None).await,
        Err(AppError::ResourceNotFound(_))
    );

    let current = env.store.get_validation_request(validation.id).await.unwrap().unwrap();
    assert_eq!(current.status, ValidationStatus::Pending);
    assert_eq!(current.reviewer_id, None);
    let stored = env.store.get_work_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, WorkOrderStatus::Completed);

    // a rejeição não toca no pedido e segue possível
    let rejected = env.state.validation_service.reject(validation.id, "supervisor-7", None).await.unwrap();
    assert_eq!(rejected.status, ValidationStatus::Rejected);
    let stored = env.store.get_work_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, WorkOrderStatus::InProgress);
}

#[tokio::test]
async fn unknown_validation_is_not_found() {
    let env = test_env();
    assert_matches!(
        env.state.validation_service.approve(uuid::Uuid::new_v4(), "s", None).await,
        Err(AppError::ResourceNotFound(_))
    );
}

#[tokio::test]
async fn reviewer_can_be_assigned_while_pending() {
    let env = test_env();
    let (_, validation) = completed_order(&env, "OS-2024-034").await;

    let assigned = env
        .state
        .validation_service
        .assign_reviewer(validation.id, "supervisor-9")
        .await
        .unwrap();

    assert_eq!(assigned.reviewer_id.as_deref(), Some("supervisor-9"));
    assert_eq!(assigned.status, ValidationStatus::Pending);
}

#[tokio::test]
async fn list_filters_by_status() {
    let env = test_env();
    let (_, first) = completed_order(&env, "OS-2024-035").await;
    completed_order(&env, "OS-2024-036").await;
    env.state.validation_service.approve(first.id, "supervisor-7", None).await.unwrap();

    let service = &env.state.validation_service;
    let pending = service
        .list(&ValidationFilter { status: Some(ValidationStatus::Pending) })
        .await
        .unwrap();
    let approved = service
        .list(&ValidationFilter { status: Some(ValidationStatus::Approved) })
        .await
        .unwrap();

    assert_eq!(pending.len(), 1);
    assert_eq!(approved.len(), 1);
    assert_eq!(approved[0].id, first.id);
}
