//! Checklist lifecycle against the in-memory store.

mod common;

use assert_matches::assert_matches;
use chrono::Utc;

use common::{entry, full_entries, test_env};
use inspecao_backend::common::error::AppError;
use inspecao_backend::db::InspectionStore;
use inspecao_backend::models::checklist::{ItemResult, PhotoAttachment, PhotoMetadata};
use inspecao_backend::models::validation::{ValidationFilter, ValidationStatus};
use inspecao_backend::models::work_order::WorkOrderStatus;
use inspecao_backend::services::checklist_service::InspectionContext;

// ---------------------------------------------------------------------------
// Derived status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_saved_item_moves_order_to_in_progress() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-009").await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");

    let outcome = env
        .state
        .checklist_service
        .save_draft(&ctx, &[entry("1.1", ItemResult::Conforming)])
        .await
        .unwrap();

    assert_eq!(outcome.saved, 1);
    assert_eq!(outcome.persisted, 1);
    assert_eq!(outcome.status, Some(WorkOrderStatus::InProgress));
    assert_eq!(outcome.completed_at, None);

    let stored = env.store.get_work_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, WorkOrderStatus::InProgress);
}

#[tokio::test]
async fn partial_counts_stay_in_progress() {
    let env = test_env();
    let all = full_entries(ItemResult::Conforming);

    for k in [1usize, 10, 53] {
        let order = env.seed_work_order(&format!("OS-K-{k}")).await;
        let ctx = InspectionContext::new(order.id, "tecnico-1");

        let outcome = env.state.checklist_service.save_draft(&ctx, &all[..k]).await.unwrap();

        assert_eq!(outcome.persisted, k as i64);
        assert_eq!(outcome.status, Some(WorkOrderStatus::InProgress), "k = {k}");
    }
}

#[tokio::test]
async fn all_items_complete_the_order_and_open_one_validation() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-010").await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");

    let outcome = env
        .state
        .checklist_service
        .save_draft(&ctx, &full_entries(ItemResult::Conforming))
        .await
        .unwrap();

    assert_eq!(outcome.persisted, 54);
    assert_eq!(outcome.status, Some(WorkOrderStatus::Completed));
    assert!(outcome.completed_at.is_some());

    let validations = env
        .store
        .list_validation_requests(&ValidationFilter::default())
        .await
        .unwrap();
    assert_eq!(validations.len(), 1);
    assert_eq!(validations[0].work_order_id, order.id);
    assert_eq!(validations[0].status, ValidationStatus::Pending);
}

#[tokio::test]
async fn saving_in_two_halves_completes_on_the_second() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-011").await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");
    let all = full_entries(ItemResult::NotApplicable);

    let first = env.state.checklist_service.save_draft(&ctx, &all[..27]).await.unwrap();
    assert_eq!(first.status, Some(WorkOrderStatus::InProgress));

    let second = env.state.checklist_service.save_draft(&ctx, &all[27..]).await.unwrap();
    assert_eq!(second.persisted, 54);
    assert_eq!(second.status, Some(WorkOrderStatus::Completed));
}

// ---------------------------------------------------------------------------
// Upsert semantics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resaving_an_item_keeps_one_row_with_last_value() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-012").await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");
    let service = &env.state.checklist_service;

    service.save_draft(&ctx, &[entry("3.1", ItemResult::Conforming)]).await.unwrap();

    let mut corrected = entry("3.1", ItemResult::NonConforming);
    corrected.observation = Some("  registro sem identificação ".into());
    let outcome = service.save_draft(&ctx, &[corrected]).await.unwrap();

    assert_eq!(outcome.persisted, 1);
    let rows = service.list_results(order.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].result, ItemResult::NonConforming);
    assert_eq!(rows[0].observation.as_deref(), Some("registro sem identificação"));
}

#[tokio::test]
async fn rows_take_category_and_description_from_catalog() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-013").await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");
    let service = &env.state.checklist_service;

    service.save_draft(&ctx, &[entry("1.1", ItemResult::Conforming)]).await.unwrap();

    let rows = service.list_results(order.id).await.unwrap();
    let item = service.catalog().get("1.1").unwrap();
    assert_eq!(rows[0].category, item.category);
    assert_eq!(rows[0].description, item.text);
}

#[tokio::test]
async fn observation_is_dropped_for_conforming_items() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-014").await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");

    let mut e = entry("2.1", ItemResult::Conforming);
    e.observation = Some("não deveria ficar".into());
    env.state.checklist_service.save_draft(&ctx, &[e]).await.unwrap();

    let rows = env.state.checklist_service.list_results(order.id).await.unwrap();
    assert_eq!(rows[0].observation, None);
}

#[tokio::test]
async fn results_are_listed_in_numeric_item_order() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-015").await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");
    let all = full_entries(ItemResult::Conforming);

    // ordem invertida na gravação
    let reversed: Vec<_> = all.iter().rev().take(20).cloned().collect();
    env.state.checklist_service.save_draft(&ctx, &reversed).await.unwrap();

    let rows = env.state.checklist_service.list_results(order.id).await.unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r.item_id.as_str()).collect();
    let mut expected = ids.clone();
    expected.sort_by(|a, b| inspecao_backend::models::checklist::compare_item_ids(a, b));
    assert_eq!(ids, expected);
}

// ---------------------------------------------------------------------------
// Rejections without writes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_item_is_rejected_before_any_write() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-016").await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");

    let result = env
        .state
        .checklist_service
        .save_draft(&ctx, &[entry("1.1", ItemResult::Conforming), entry("99.9", ItemResult::Conforming)])
        .await;

    assert_matches!(result, Err(AppError::UnknownChecklistItem(id)) if id == "99.9");
    assert_eq!(env.store.count_checklist_items(order.id).await.unwrap(), 0);
}

#[tokio::test]
async fn blank_entries_do_not_touch_storage() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-017").await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");

    let mut blank = entry("4.1", ItemResult::Unset);
    blank.observation = Some("   ".into());
    let outcome = env.state.checklist_service.save_draft(&ctx, &[blank]).await.unwrap();

    assert_eq!(outcome.saved, 0);
    assert_eq!(outcome.status, None);
    let stored = env.store.get_work_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, WorkOrderStatus::Pending);
}

#[tokio::test]
async fn photo_only_entry_counts_as_answered() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-018").await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");

    let mut e = entry("1.2", ItemResult::Unset);
    e.photo = Some(PhotoAttachment {
        photo_ref: "https://fotos.exemplo.com/1.jpg".into(),
        metadata: PhotoMetadata {
            captured_at: Utc::now(),
            latitude: Some(-23.55),
            longitude: Some(-46.63),
            accuracy: Some(12.0),
            filename: Some("1.jpg".into()),
        },
    });
    let outcome = env.state.checklist_service.save_draft(&ctx, &[e]).await.unwrap();

    assert_eq!(outcome.saved, 1);
    assert_eq!(outcome.status, Some(WorkOrderStatus::InProgress));
}

#[tokio::test]
async fn submit_with_missing_required_items_writes_nothing() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-019").await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");
    let mut entries = full_entries(ItemResult::Conforming);
    entries.truncate(50);

    let result = env.state.checklist_service.submit_final(&ctx, &entries).await;

    assert_matches!(result, Err(AppError::MissingRequiredItems { missing: 4 }));
    assert_eq!(env.store.count_checklist_items(order.id).await.unwrap(), 0);
    let stored = env.store.get_work_order(order.id).await.unwrap().unwrap();
    assert_eq!(stored.status, WorkOrderStatus::Pending);
    assert!(env
        .store
        .find_validation_for_work_order(order.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn unset_results_count_as_missing_on_submit() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-020").await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");
    let mut entries = full_entries(ItemResult::Conforming);
    entries[0].result = ItemResult::Unset;
    entries[0].observation = Some("só observação".into());

    let result = env.state.checklist_service.submit_final(&ctx, &entries).await;
    assert_matches!(result, Err(AppError::MissingRequiredItems { missing: 1 }));
}

// ---------------------------------------------------------------------------
// Submit / locking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_submits_keep_a_single_validation_request() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-021").await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");
    let entries = full_entries(ItemResult::Conforming);

    let first = env.state.checklist_service.submit_final(&ctx, &entries).await.unwrap();
    assert_eq!(first.status, Some(WorkOrderStatus::Completed));
    let stamp = first.completed_at;

    let second = env.state.checklist_service.submit_final(&ctx, &entries).await.unwrap();
    assert_eq!(second.saved, 0);
    assert_eq!(second.status, Some(WorkOrderStatus::Completed));
    assert_eq!(second.completed_at, stamp);

    let validations = env
        .store
        .list_validation_requests(&ValidationFilter::default())
        .await
        .unwrap();
    assert_eq!(validations.len(), 1);
}

#[tokio::test]
async fn completed_order_rejects_new_drafts() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-022").await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");
    env.state
        .checklist_service
        .submit_final(&ctx, &full_entries(ItemResult::Conforming))
        .await
        .unwrap();

    let result = env
        .state
        .checklist_service
        .save_draft(&ctx, &[entry("1.1", ItemResult::NonConforming)])
        .await;

    assert_matches!(result, Err(AppError::WorkOrderLocked(WorkOrderStatus::Completed)));
}

#[tokio::test]
async fn cancelled_order_is_locked() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-023").await;
    env.state.work_order_service.cancel(order.id).await.unwrap();
    let ctx = InspectionContext::new(order.id, "tecnico-1");

    let draft = env
        .state
        .checklist_service
        .save_draft(&ctx, &[entry("1.1", ItemResult::Conforming)])
        .await;
    assert_matches!(draft, Err(AppError::WorkOrderLocked(WorkOrderStatus::Cancelled)));

    let submit = env
        .state
        .checklist_service
        .submit_final(&ctx, &full_entries(ItemResult::Conforming))
        .await;
    assert_matches!(submit, Err(AppError::WorkOrderLocked(WorkOrderStatus::Cancelled)));
}

#[tokio::test]
async fn missing_work_order_is_not_found() {
    let env = test_env();
    let ctx = InspectionContext::new(uuid::Uuid::new_v4(), "tecnico-1");

    let result = env
        .state
        .checklist_service
        .save_draft(&ctx, &[entry("1.1", ItemResult::Conforming)])
        .await;
    assert_matches!(result, Err(AppError::ResourceNotFound(_)));
}

// ---------------------------------------------------------------------------
// Resume
// ---------------------------------------------------------------------------

#[tokio::test]
async fn draft_is_restored_only_while_in_progress() {
    let env = test_env();
    let order = env.seed_work_order("OS-2024-024").await;
    let ctx = InspectionContext::new(order.id, "tecnico-1");
    let service = &env.state.checklist_service;

    assert_eq!(service.load_in_progress(order.id).await.unwrap(), Default::default());

    let mut e = entry("5.1", ItemResult::NonConforming);
    e.observation = Some("mangueira vencida".into());
    service.save_draft(&ctx, &[e, entry("6.1", ItemResult::Conforming)]).await.unwrap();

    let draft = service.load_in_progress(order.id).await.unwrap();
    assert_eq!(draft.results.len(), 2);
    assert_eq!(draft.results.get("5.1"), Some(&ItemResult::NonConforming));
    assert_eq!(draft.observations.get("5.1").map(String::as_str), Some("mangueira vencida"));
    assert!(draft.photos.is_empty());
}
