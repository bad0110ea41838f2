mod common;

use chrono::{Duration, Utc};
use common::{seed_booking, seed_confirmed_booking, seed_room, test_app, MockGateway};
use hortencia::application::rooms::{RoomUpdate, WalkInOccupant};
use hortencia::domain::booking::BookingStatus;
use hortencia::domain::ports::BookingStore;
use hortencia::domain::room::RoomStatus;
use hortencia::error::HotelError;

#[tokio::test]
async fn test_assign_occupies_room_and_advances_booking() {
    let app = test_app(MockGateway::default());
    let room = seed_room(&app.rooms, "101").await;
    let booking = seed_confirmed_booking(&app.booking_store).await;

    let assigned = app.rooms.assign_to_booking(room.id, booking.id).await.unwrap();

    assert_eq!(assigned.status, RoomStatus::Occupied);
    assert_eq!(assigned.current_booking, Some(booking.id));
    assert_eq!(assigned.occupant_name.as_deref(), Some("Guest Example"));
    assert_eq!(assigned.occupant_email.as_deref(), Some("guest@example.com"));
    assert_eq!(assigned.check_in_date, Some(booking.check_in));
    assert_eq!(assigned.check_out_date, Some(booking.check_out));

    let stored = app.booking_store.get(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Assigned);
}

#[tokio::test]
async fn test_assign_rejects_occupied_room() {
    let app = test_app(MockGateway::default());
    let room = seed_room(&app.rooms, "101").await;
    let first = seed_confirmed_booking(&app.booking_store).await;
    let second = seed_confirmed_booking(&app.booking_store).await;

    app.rooms.assign_to_booking(room.id, first.id).await.unwrap();

    let result = app.rooms.assign_to_booking(room.id, second.id).await;
    assert!(matches!(result, Err(HotelError::RoomInUse(_))));

    // The losing booking is untouched.
    let stored = app.booking_store.get(second.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_assign_rejects_room_under_maintenance() {
    let app = test_app(MockGateway::default());
    let room = seed_room(&app.rooms, "101").await;
    app.rooms
        .update(
            room.id,
            RoomUpdate {
                status: Some(RoomStatus::Maintenance),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let booking = seed_confirmed_booking(&app.booking_store).await;

    let result = app.rooms.assign_to_booking(room.id, booking.id).await;
    assert!(matches!(result, Err(HotelError::Validation(_))));

    // No state change on either side.
    let stored_room = app.rooms.get(room.id).await.unwrap();
    assert_eq!(stored_room.status, RoomStatus::Maintenance);
    assert_eq!(stored_room.current_booking, None);
    let stored_booking = app.booking_store.get(booking.id).await.unwrap().unwrap();
    assert_eq!(stored_booking.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_one_booking_never_holds_two_rooms() {
    let app = test_app(MockGateway::default());
    let first = seed_room(&app.rooms, "101").await;
    let second = seed_room(&app.rooms, "102").await;
    let booking = seed_confirmed_booking(&app.booking_store).await;

    app.rooms.assign_to_booking(first.id, booking.id).await.unwrap();

    let result = app.rooms.assign_to_booking(second.id, booking.id).await;
    match result {
        Err(HotelError::DuplicateAssignment { room_number, .. }) => {
            assert_eq!(room_number, "101");
        }
        other => panic!("expected DuplicateAssignment, got {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_assignment_of_one_booking_wins_once() {
    let app = std::sync::Arc::new(test_app(MockGateway::default()));
    let first = seed_room(&app.rooms, "101").await;
    let second = seed_room(&app.rooms, "102").await;
    let booking = seed_confirmed_booking(&app.booking_store).await;

    let a = {
        let app = app.clone();
        let booking_id = booking.id;
        tokio::spawn(async move { app.rooms.assign_to_booking(first.id, booking_id).await })
    };
    let b = {
        let app = app.clone();
        let booking_id = booking.id;
        tokio::spawn(async move { app.rooms.assign_to_booking(second.id, booking_id).await })
    };

    let outcomes = [a.await.unwrap(), b.await.unwrap()];
    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(HotelError::DuplicateAssignment { .. }))));
}

#[tokio::test]
async fn test_assign_rejects_past_checkout() {
    let app = test_app(MockGateway::default());
    let room = seed_room(&app.rooms, "101").await;
    let booking = seed_booking(
        &app.booking_store,
        BookingStatus::Confirmed,
        Utc::now() - Duration::days(5),
        Utc::now() - Duration::days(3),
    )
    .await;

    let result = app.rooms.assign_to_booking(room.id, booking.id).await;
    assert!(matches!(result, Err(HotelError::StaleBooking)));

    let stored = app.rooms.get(room.id).await.unwrap();
    assert_eq!(stored.status, RoomStatus::Available);
}

#[tokio::test]
async fn test_assign_rejects_cancelled_booking() {
    let app = test_app(MockGateway::default());
    let room = seed_room(&app.rooms, "101").await;
    let booking = seed_booking(
        &app.booking_store,
        BookingStatus::Cancelled,
        Utc::now() + Duration::days(1),
        Utc::now() + Duration::days(3),
    )
    .await;

    let result = app.rooms.assign_to_booking(room.id, booking.id).await;
    assert!(matches!(result, Err(HotelError::Validation(_))));
}

#[tokio::test]
async fn test_unassign_completes_booking_and_clears_room() {
    let app = test_app(MockGateway::default());
    let room = seed_room(&app.rooms, "101").await;
    let booking = seed_confirmed_booking(&app.booking_store).await;
    app.rooms.assign_to_booking(room.id, booking.id).await.unwrap();

    let released = app.rooms.unassign(room.id).await.unwrap();

    assert_eq!(released.status, RoomStatus::Available);
    assert_eq!(released.current_booking, None);
    assert_eq!(released.occupant_name, None);
    assert_eq!(released.check_in_date, None);

    let stored = app.booking_store.get(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Completed);
}

#[tokio::test]
async fn test_unassign_walk_in_touches_no_booking() {
    let app = test_app(MockGateway::default());
    let room = seed_room(&app.rooms, "101").await;
    let bystander = seed_confirmed_booking(&app.booking_store).await;

    app.rooms
        .assign_manual(
            room.id,
            WalkInOccupant {
                name: "Walk In".to_string(),
                email: None,
                phone: None,
                check_in: None,
                check_out: None,
            },
        )
        .await
        .unwrap();

    let assigned = app.rooms.get(room.id).await.unwrap();
    assert_eq!(assigned.status, RoomStatus::Occupied);
    assert_eq!(assigned.current_booking, None);
    assert_eq!(assigned.occupant_name.as_deref(), Some("Walk In"));

    app.rooms.unassign(room.id).await.unwrap();

    let stored = app.booking_store.get(bystander.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn test_unassign_requires_occupied_room() {
    let app = test_app(MockGateway::default());
    let room = seed_room(&app.rooms, "101").await;

    let result = app.rooms.unassign(room.id).await;
    assert!(matches!(result, Err(HotelError::Validation(_))));
}

#[tokio::test]
async fn test_delete_refuses_occupied_room() {
    let app = test_app(MockGateway::default());
    let room = seed_room(&app.rooms, "101").await;
    let booking = seed_confirmed_booking(&app.booking_store).await;
    app.rooms.assign_to_booking(room.id, booking.id).await.unwrap();

    let result = app.rooms.delete(room.id).await;
    assert!(matches!(result, Err(HotelError::RoomInUse(_))));

    app.rooms.unassign(room.id).await.unwrap();
    app.rooms.delete(room.id).await.unwrap();
}

#[tokio::test]
async fn test_released_booking_slot_can_be_reused() {
    let app = test_app(MockGateway::default());
    let first = seed_room(&app.rooms, "101").await;
    let second = seed_room(&app.rooms, "102").await;
    let booking = seed_confirmed_booking(&app.booking_store).await;

    app.rooms.assign_to_booking(first.id, booking.id).await.unwrap();
    app.rooms.unassign(first.id).await.unwrap();

    // The booking completed at checkout, so a fresh assignment is refused
    // by the lifecycle, not by the room index.
    let result = app.rooms.assign_to_booking(second.id, booking.id).await;
    assert!(matches!(result, Err(HotelError::Validation(_))));
}
