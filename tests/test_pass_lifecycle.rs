mod helpers;

use gatepass::api::middleware::ApiError;
use gatepass::models::{CreatePassRequest, PassStatus, Role};
use gatepass::services::{NotifyTarget, PassService};
use helpers::pass_helpers::{seed_pass, seed_pass_created_at, stamp};
use helpers::recording::{settled_pushes, wait_for_pushes, FailingNotifier, RecordingNotifier};
use helpers::test_db::setup_test_db;
use helpers::users::{create_linked_family, create_user};
use std::sync::Arc;
use tokio_test::assert_ok;

fn outing_request(user_id: &str) -> CreatePassRequest {
    CreatePassRequest {
        user_id: Some(user_id.to_string()),
        pass_type: Some("outing".to_string()),
        purpose: Some("market trip".to_string()),
        valid_from: Some(stamp(-10)),
        valid_to: Some(stamp(120)),
    }
}

#[tokio::test]
async fn test_student_pass_starts_pending() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let (student, _parent) = create_linked_family(&db).await;

    let created = assert_ok!(service.create_pass(outing_request(&student.id)).await);

    assert_eq!(created.pass.status, PassStatus::Pending);
    assert_eq!(created.pass.user_id, student.id);
    assert_eq!(created.pass.barcode.len(), 32);
    assert_eq!(created.pass.version, 0);
    assert!(created.pass.exit_time.is_none());
    assert!(created.pass.entry_time.is_none());
    assert_eq!(created.student_name.as_deref(), Some(student.name.as_str()));
}

#[tokio::test]
async fn test_staff_pass_is_self_approved() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let warden = create_user(&db, "Vikram Warden", Role::Warden).await;

    let created = service.create_pass(outing_request(&warden.id)).await.unwrap();
    assert_eq!(created.pass.status, PassStatus::Active);
}

#[tokio::test]
async fn test_create_rejects_missing_fields() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let (student, _parent) = create_linked_family(&db).await;

    let mut request = outing_request(&student.id);
    request.pass_type = None;
    let result = service.create_pass(request).await;
    assert!(matches!(result.unwrap_err(), ApiError::Validation(_)));

    let mut request = outing_request(&student.id);
    request.valid_to = Some("   ".to_string());
    let result = service.create_pass(request).await;
    assert!(matches!(result.unwrap_err(), ApiError::Validation(_)));
}

#[tokio::test]
async fn test_create_rejects_inverted_validity_window() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let (student, _parent) = create_linked_family(&db).await;

    let mut request = outing_request(&student.id);
    request.valid_from = Some(stamp(120));
    request.valid_to = Some(stamp(-10));

    let result = service.create_pass(request).await;
    assert!(matches!(result.unwrap_err(), ApiError::Validation(_)));
}

#[tokio::test]
async fn test_create_for_unknown_user_fails() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());

    let result = service.create_pass(outing_request("no-such-user")).await;
    assert!(matches!(result.unwrap_err(), ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_create_notifies_parent_and_warden_channel() {
    let db = setup_test_db().await;
    let recorder = RecordingNotifier::new();
    let service = PassService::new(db.clone(), recorder.clone());
    let (student, parent) = create_linked_family(&db).await;

    let created = service.create_pass(outing_request(&student.id)).await.unwrap();

    let sent = wait_for_pushes(&recorder, 2).await;
    assert!(sent
        .iter()
        .any(|p| p.target == NotifyTarget::Parent(parent.id.clone())));
    assert!(sent.iter().any(|p| p.target == NotifyTarget::WardenAlerts));
    for push in &sent {
        assert_eq!(push.data["type"], "pass_request");
        assert_eq!(push.data["pass_id"], created.pass.id.as_str());
    }
}

#[tokio::test]
async fn test_create_succeeds_when_delivery_fails() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), Arc::new(FailingNotifier));
    let (student, _parent) = create_linked_family(&db).await;

    let created = assert_ok!(service.create_pass(outing_request(&student.id)).await);
    assert!(db.get_pass_by_id(&created.pass.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_parent_approval() {
    let db = setup_test_db().await;
    let recorder = RecordingNotifier::new();
    let service = PassService::new(db.clone(), recorder.clone());
    let (student, parent) = create_linked_family(&db).await;
    let pass = seed_pass(&db, &student, PassStatus::Pending, -10, 120).await;

    let approved = service.approve_by_parent(&pass.id, &parent.id).await.unwrap();
    assert_eq!(approved.pass.status, PassStatus::ApprovedParent);

    // Student and warden channel both hear about it
    let sent = wait_for_pushes(&recorder, 2).await;
    assert!(sent.iter().any(|p| p.target == NotifyTarget::User(student.id.clone())));
    assert!(sent.iter().any(|p| p.target == NotifyTarget::WardenAlerts));
}

#[tokio::test]
async fn test_parent_approval_rejects_unlinked_caller() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let (student, _parent) = create_linked_family(&db).await;
    let stranger = create_user(&db, "Other Parent", Role::Parent).await;
    let pass = seed_pass(&db, &student, PassStatus::Pending, -10, 120).await;

    let result = service.approve_by_parent(&pass.id, &stranger.id).await;
    assert!(matches!(result.unwrap_err(), ApiError::Forbidden(_)));

    // Authorization failures must not touch the record
    let stored = db.get_pass_by_id(&pass.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PassStatus::Pending);
    assert_eq!(stored.version, 0);
}

#[tokio::test]
async fn test_parent_approval_rejects_unlinked_caller_in_any_status() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let (student, _parent) = create_linked_family(&db).await;
    let stranger = create_user(&db, "Other Parent", Role::Parent).await;

    for status in [PassStatus::ApprovedWarden, PassStatus::Rejected, PassStatus::Exited] {
        let pass = seed_pass(&db, &student, status, -10, 120).await;
        let result = service.approve_by_parent(&pass.id, &stranger.id).await;
        assert!(matches!(result.unwrap_err(), ApiError::Forbidden(_)));
    }
}

#[tokio::test]
async fn test_parent_approval_unknown_pass_or_caller() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let (student, parent) = create_linked_family(&db).await;
    let pass = seed_pass(&db, &student, PassStatus::Pending, -10, 120).await;

    let result = service.approve_by_parent("missing", &parent.id).await;
    assert!(matches!(result.unwrap_err(), ApiError::NotFound(_)));

    let result = service.approve_by_parent(&pass.id, "missing").await;
    assert!(matches!(result.unwrap_err(), ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_warden_approval_paths() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let (student, parent) = create_linked_family(&db).await;

    // Straight from pending
    let pass = seed_pass(&db, &student, PassStatus::Pending, -10, 120).await;
    let approved = service.approve_by_warden(&pass.id).await.unwrap();
    assert_eq!(approved.pass.status, PassStatus::ApprovedWarden);

    // After the parent signed off
    let pass = seed_pass(&db, &student, PassStatus::Pending, -10, 120).await;
    service.approve_by_parent(&pass.id, &parent.id).await.unwrap();
    let approved = service.approve_by_warden(&pass.id).await.unwrap();
    assert_eq!(approved.pass.status, PassStatus::ApprovedWarden);
}

#[tokio::test]
async fn test_approval_from_terminal_status_is_invalid() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let (student, _parent) = create_linked_family(&db).await;
    let pass = seed_pass(&db, &student, PassStatus::Rejected, -10, 120).await;

    let result = service.approve_by_warden(&pass.id).await;
    assert!(matches!(
        result.unwrap_err(),
        ApiError::InvalidState(PassStatus::Rejected)
    ));
}

#[tokio::test]
async fn test_reject_requires_reason() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let (student, _parent) = create_linked_family(&db).await;
    let pass = seed_pass(&db, &student, PassStatus::Pending, -10, 120).await;

    let result = service.reject_pass(&pass.id, None).await;
    assert!(matches!(result.unwrap_err(), ApiError::Validation(_)));

    let result = service.reject_pass(&pass.id, Some("   ".to_string())).await;
    assert!(matches!(result.unwrap_err(), ApiError::Validation(_)));

    let stored = db.get_pass_by_id(&pass.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PassStatus::Pending);
}

#[tokio::test]
async fn test_reject_stores_reason_verbatim() {
    let db = setup_test_db().await;
    let recorder = RecordingNotifier::new();
    let service = PassService::new(db.clone(), recorder.clone());
    let (student, _parent) = create_linked_family(&db).await;
    let pass = seed_pass(&db, &student, PassStatus::Pending, -10, 120).await;

    let reason = "  curfew starts at 18:00 ".to_string();
    let rejected = service.reject_pass(&pass.id, Some(reason.clone())).await.unwrap();

    assert_eq!(rejected.pass.status, PassStatus::Rejected);
    assert_eq!(rejected.pass.rejection_reason.as_deref(), Some(reason.as_str()));

    let sent = wait_for_pushes(&recorder, 1).await;
    assert_eq!(sent[0].target, NotifyTarget::User(student.id.clone()));
    assert_eq!(sent[0].data["reason"], reason.as_str());
}

#[tokio::test]
async fn test_reject_from_approved_warden_is_invalid() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let (student, _parent) = create_linked_family(&db).await;
    let pass = seed_pass(&db, &student, PassStatus::ApprovedWarden, -10, 120).await;

    let result = service.reject_pass(&pass.id, Some("too late".to_string())).await;
    assert!(matches!(
        result.unwrap_err(),
        ApiError::InvalidState(PassStatus::ApprovedWarden)
    ));
}

#[tokio::test]
async fn test_pending_list_for_warden() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let (student, _parent) = create_linked_family(&db).await;

    let older = seed_pass_created_at(&db, &student, PassStatus::Pending, -10, 120, -30).await;
    let newer = seed_pass_created_at(&db, &student, PassStatus::ApprovedParent, -10, 120, -5).await;
    seed_pass(&db, &student, PassStatus::Rejected, -10, 120).await;
    seed_pass(&db, &student, PassStatus::ApprovedWarden, -10, 120).await;

    let pending = service.list_pending_for_warden().await.unwrap();
    assert_eq!(pending.len(), 2);
    // Newest first
    assert_eq!(pending[0].pass.id, newer.id);
    assert_eq!(pending[1].pass.id, older.id);
    assert_eq!(
        pending[0].student_name.as_deref(),
        Some(student.name.as_str())
    );
}

#[tokio::test]
async fn test_pending_list_for_parent_filters_type_and_status() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let (student, parent) = create_linked_family(&db).await;

    let outing = seed_pass(&db, &student, PassStatus::Pending, -10, 120).await;
    seed_pass(&db, &student, PassStatus::ApprovedParent, -10, 120).await;

    // A non-outing pass never reaches the parent queue
    let medical = seed_pass(&db, &student, PassStatus::Pending, -10, 120).await;
    sqlx::query("UPDATE passes SET pass_type = 'medical' WHERE id = ?")
        .bind(&medical.id)
        .execute(db.pool())
        .await
        .unwrap();

    let pending = service.list_pending_for_parent(&parent.id).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].pass.id, outing.id);
}

#[tokio::test]
async fn test_pending_list_for_parent_without_children_is_empty() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let lonely = create_user(&db, "Childless Parent", Role::Parent).await;

    let pending = service.list_pending_for_parent(&lonely.id).await.unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
async fn test_history_excludes_pending_and_respects_limit() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let (student, _parent) = create_linked_family(&db).await;

    seed_pass(&db, &student, PassStatus::Pending, -10, 120).await;
    seed_pass_created_at(&db, &student, PassStatus::Rejected, -10, 120, -20).await;
    seed_pass_created_at(&db, &student, PassStatus::ApprovedWarden, -10, 120, -10).await;
    let newest = seed_pass_created_at(&db, &student, PassStatus::Entered, -10, 120, -1).await;

    let history = service.list_history_for_warden(None).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|p| p.pass.status != PassStatus::Pending));

    let capped = service.list_history_for_warden(Some(2)).await.unwrap();
    assert_eq!(capped.len(), 2);
    assert_eq!(capped[0].pass.id, newest.id);
}

#[tokio::test]
async fn test_passes_for_user_newest_first() {
    let db = setup_test_db().await;
    let service = PassService::new(db.clone(), RecordingNotifier::new());
    let (student, _parent) = create_linked_family(&db).await;
    let other = create_user(&db, "Other Student", Role::Student).await;

    seed_pass_created_at(&db, &student, PassStatus::Pending, -10, 120, -15).await;
    let newest = seed_pass_created_at(&db, &student, PassStatus::Rejected, -10, 120, -2).await;
    seed_pass(&db, &other, PassStatus::Pending, -10, 120).await;

    let passes = service.list_passes_for_user(&student.id).await.unwrap();
    assert_eq!(passes.len(), 2);
    assert_eq!(passes[0].id, newest.id);
}

#[tokio::test]
async fn test_notifications_settle_without_leaking_across_operations() {
    let db = setup_test_db().await;
    let recorder = RecordingNotifier::new();
    let service = PassService::new(db.clone(), recorder.clone());
    let warden = create_user(&db, "Vikram Warden", Role::Warden).await;

    // Staff pass with no linked parent: only the warden broadcast fires.
    service.create_pass(outing_request(&warden.id)).await.unwrap();
    let sent = settled_pushes(&recorder).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].target, NotifyTarget::WardenAlerts);
}
