mod common;

use chrono::Utc;
use join_status::{JoinStatus, RequestToJoinStatus, StreamVisibility};
use std::sync::Arc;
use uuid::Uuid;

use common::{past_stream, upcoming_stream, MockStreamStore, MAX_BULK_IDS};
use membership_service::error::AppError;
use membership_service::services::StreamAttendanceService;

fn service(store: &MockStreamStore) -> StreamAttendanceService {
    StreamAttendanceService::new(Arc::new(store.clone()), MAX_BULK_IDS)
}

#[tokio::test]
async fn test_no_row_uses_visibility_default() {
    let store = MockStreamStore::new();
    let private = upcoming_stream(StreamVisibility::Private);
    let public = upcoming_stream(StreamVisibility::Public);
    store.add_stream(private.clone());
    store.add_stream(public.clone());
    let svc = service(&store);
    let viewer = Uuid::new_v4();

    let info = svc.attendance_info(private.id, viewer, Utc::now()).await.unwrap();
    assert_eq!(info.join_status, Some(JoinStatus::NotJoinedPrivate));
    assert_eq!(info.request_to_join_status, None);
    assert!(!info.is_attending);

    let info = svc.attendance_info(public.id, viewer, Utc::now()).await.unwrap();
    assert_eq!(info.join_status, Some(JoinStatus::NotJoinedPublic));
}

#[tokio::test]
async fn test_unknown_stream_is_not_found() {
    let store = MockStreamStore::new();
    let svc = service(&store);
    let err = svc
        .attendance_info(Uuid::new_v4(), Uuid::new_v4(), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StreamNotFound(_)));
}

#[tokio::test]
async fn test_public_request_is_approved_and_counted() {
    let store = MockStreamStore::new();
    let stream = upcoming_stream(StreamVisibility::Public);
    store.add_stream(stream.clone());
    let svc = service(&store);
    let member = Uuid::new_v4();

    let info = svc.request_to_join(stream.id, member, Utc::now()).await.unwrap();
    assert_eq!(info.request_to_join_status, Some(RequestToJoinStatus::Approved));
    assert_eq!(info.join_status, Some(JoinStatus::JoinedStream));
    assert!(info.is_attending);
    assert_eq!(store.total_attendees(stream.id), 1);

    // Asking again changes nothing
    let again = svc.request_to_join(stream.id, member, Utc::now()).await.unwrap();
    assert_eq!(again, info);
    assert_eq!(store.total_attendees(stream.id), 1);
}

#[tokio::test]
async fn test_protected_request_waits_for_organizer() {
    let store = MockStreamStore::new();
    let stream = upcoming_stream(StreamVisibility::Protected);
    store.add_stream(stream.clone());
    let svc = service(&store);
    let member = Uuid::new_v4();

    let info = svc.request_to_join(stream.id, member, Utc::now()).await.unwrap();
    assert_eq!(info.request_to_join_status, Some(RequestToJoinStatus::Pending));
    assert_eq!(info.join_status, Some(JoinStatus::Pending));
    assert_eq!(store.total_attendees(stream.id), 0);
    assert!(!svc
        .can_view_access_link(stream.id, member, Utc::now())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_bulk_approve_then_disapprove_moves_counter() {
    let store = MockStreamStore::new();
    let stream = upcoming_stream(StreamVisibility::Private);
    store.add_stream(stream.clone());
    let svc = service(&store);

    let members: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    for member in &members {
        svc.request_to_join(stream.id, *member, Utc::now()).await.unwrap();
    }
    let attendee_ids: Vec<Uuid> = members
        .iter()
        .map(|m| store.attendee(stream.id, *m).unwrap().id)
        .collect();

    let updated = svc
        .approve_attendees(stream.id, stream.organizer_id, &attendee_ids)
        .await
        .unwrap();
    assert_eq!(updated, 3);
    assert_eq!(store.total_attendees(stream.id), 3);

    // Re-approving is a no-op for the counter
    let updated = svc
        .approve_attendees(stream.id, stream.organizer_id, &attendee_ids)
        .await
        .unwrap();
    assert_eq!(updated, 0);
    assert_eq!(store.total_attendees(stream.id), 3);

    let updated = svc
        .disapprove_attendees(stream.id, stream.organizer_id, &attendee_ids[..1])
        .await
        .unwrap();
    assert_eq!(updated, 1);
    assert_eq!(store.total_attendees(stream.id), 2);

    let info = svc
        .attendance_info(stream.id, members[0], Utc::now())
        .await
        .unwrap();
    assert_eq!(info.join_status, Some(JoinStatus::NotJoinedPrivate));
}

#[tokio::test]
async fn test_only_organizer_moderates() {
    let store = MockStreamStore::new();
    let stream = upcoming_stream(StreamVisibility::Private);
    store.add_stream(stream.clone());
    let svc = service(&store);

    let err = svc
        .approve_attendees(stream.id, Uuid::new_v4(), &[Uuid::new_v4()])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotOrganizer));

    let err = svc
        .add_attendee(stream.id, Uuid::new_v4(), Uuid::new_v4(), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotOrganizer));
}

#[tokio::test]
async fn test_bulk_size_limits() {
    let store = MockStreamStore::new();
    let stream = upcoming_stream(StreamVisibility::Private);
    store.add_stream(stream.clone());
    let svc = StreamAttendanceService::new(Arc::new(store.clone()), 2);

    let err = svc
        .approve_attendees(stream.id, stream.organizer_id, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    let err = svc
        .mark_speakers(stream.id, stream.organizer_id, &ids, true)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_organizer_add_approves_pending_request() {
    let store = MockStreamStore::new();
    let stream = upcoming_stream(StreamVisibility::Confidential);
    store.add_stream(stream.clone());
    let svc = service(&store);
    let member = Uuid::new_v4();

    svc.request_to_join(stream.id, member, Utc::now()).await.unwrap();
    let info = svc
        .add_attendee(stream.id, stream.organizer_id, member, Utc::now())
        .await
        .unwrap();
    assert_eq!(info.join_status, Some(JoinStatus::JoinedStream));
    assert_eq!(store.total_attendees(stream.id), 1);
    assert!(svc
        .can_view_access_link(stream.id, member, Utc::now())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_not_attending_hides_link_until_attending_again() {
    let store = MockStreamStore::new();
    let stream = upcoming_stream(StreamVisibility::Public);
    store.add_stream(stream.clone());
    let svc = service(&store);
    let member = Uuid::new_v4();

    svc.request_to_join(stream.id, member, Utc::now()).await.unwrap();
    let info = svc
        .set_attending(stream.id, member, false, Utc::now())
        .await
        .unwrap();
    assert_eq!(info.join_status, Some(JoinStatus::NotAttendingStream));
    assert!(!info.grants_access());

    let info = svc
        .set_attending(stream.id, member, true, Utc::now())
        .await
        .unwrap();
    assert_eq!(info.join_status, Some(JoinStatus::JoinedStream));
}

#[tokio::test]
async fn test_set_attending_without_row_is_not_found() {
    let store = MockStreamStore::new();
    let stream = upcoming_stream(StreamVisibility::Public);
    store.add_stream(stream.clone());
    let svc = service(&store);

    let err = svc
        .set_attending(stream.id, Uuid::new_v4(), true, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AttendeeNotFound { .. }));
}

#[tokio::test]
async fn test_past_stream_reports_attended() {
    let store = MockStreamStore::new();
    let stream = past_stream(StreamVisibility::Public);
    store.add_stream(stream.clone());
    let svc = service(&store);
    let member = Uuid::new_v4();

    let info = svc.request_to_join(stream.id, member, Utc::now()).await.unwrap();
    assert_eq!(info.join_status, Some(JoinStatus::Attended));
    assert!(info.grants_access());
}

#[tokio::test]
async fn test_speaker_flags() {
    let store = MockStreamStore::new();
    let stream = upcoming_stream(StreamVisibility::Public);
    store.add_stream(stream.clone());
    let svc = service(&store);
    let member = Uuid::new_v4();

    svc.request_to_join(stream.id, member, Utc::now()).await.unwrap();
    let attendee_id = store.attendee(stream.id, member).unwrap().id;

    let updated = svc
        .mark_speakers(stream.id, stream.organizer_id, &[attendee_id], true)
        .await
        .unwrap();
    assert_eq!(updated, 1);

    let info = svc.attendance_info(stream.id, member, Utc::now()).await.unwrap();
    assert!(info.is_a_speaker);
}

#[tokio::test]
async fn test_organizer_always_sees_link() {
    let store = MockStreamStore::new();
    let stream = upcoming_stream(StreamVisibility::Private);
    store.add_stream(stream.clone());
    let svc = service(&store);

    assert!(svc
        .can_view_access_link(stream.id, stream.organizer_id, Utc::now())
        .await
        .unwrap());
}

#[tokio::test]
async fn test_organizer_add_marks_attending_again() {
    let store = MockStreamStore::new();
    let stream = upcoming_stream(StreamVisibility::Private);
    store.add_stream(stream.clone());
    let svc = service(&store);
    let member = Uuid::new_v4();

    svc.request_to_join(stream.id, member, Utc::now()).await.unwrap();
    svc.set_attending(stream.id, member, false, Utc::now())
        .await
        .unwrap();

    let info = svc
        .add_attendee(stream.id, stream.organizer_id, member, Utc::now())
        .await
        .unwrap();
    assert_eq!(info.join_status, Some(JoinStatus::JoinedStream));
    assert!(info.is_attending);
    assert!(store.attendee(stream.id, member).unwrap().is_attending);
    assert_eq!(store.total_attendees(stream.id), 1);

    // Adding an already approved attendee does not count them twice
    svc.add_attendee(stream.id, stream.organizer_id, member, Utc::now())
        .await
        .unwrap();
    assert_eq!(store.total_attendees(stream.id), 1);
}

#[tokio::test]
async fn test_organizer_add_without_request() {
    let store = MockStreamStore::new();
    let stream = upcoming_stream(StreamVisibility::Protected);
    store.add_stream(stream.clone());
    let svc = service(&store);
    let member = Uuid::new_v4();

    let info = svc
        .add_attendee(stream.id, stream.organizer_id, member, Utc::now())
        .await
        .unwrap();
    assert_eq!(info.request_to_join_status, Some(RequestToJoinStatus::Approved));
    assert_eq!(info.join_status, Some(JoinStatus::JoinedStream));
    assert_eq!(store.total_attendees(stream.id), 1);
}
