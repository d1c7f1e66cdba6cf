use async_trait::async_trait;
use charter_bus_booking::{
    models::{
        booking::{BookingStatus, LegSelection, PaymentStatus},
        cancellation::{CancellationReason, CancellationScope},
        journey::Leg,
        payment::PaymentMethod,
    },
    services::cancellation_service::CancellationDetails,
    utils::error::AppError,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use test_context::{test_context, AsyncTestContext};

mod common {
    pub mod test_utils;
}
use common::test_utils::{adult_male, book_adult, TestDb, TestServices, Trip};
use ctor::dtor;

struct CancellationServiceContext {
    services: Option<TestServices>,
}

#[dtor]
fn cleanup() {
    if let Err(e) = TestDb::cleanup_database_sync() {
        eprintln!("Failed to cleanup test database: {}", e);
    }
}

#[async_trait]
impl AsyncTestContext for CancellationServiceContext {
    async fn setup() -> Self {
        CancellationServiceContext {
            services: TestServices::connect().await,
        }
    }

    async fn teardown(self) {
        if let Some(services) = self.services {
            services.pool.close().await;
        }
    }
}

fn cancelled_by(name: &str, reason: CancellationReason) -> CancellationDetails {
    CancellationDetails {
        reason,
        notes: Some("called the helpline".to_string()),
        cancelled_by: Some(name.to_string()),
    }
}

async fn seated_booking(services: &TestServices, name: &str, trip: &Trip, seat: &str) -> i32 {
    let created = book_adult(services, name, trip).await;
    for leg in [Leg::Onward, Leg::Return] {
        services
            .bookings
            .assign_seat(created.booking_id, leg, trip.bus_for(leg), seat)
            .await
            .unwrap();
    }
    created.booking_id
}

#[test_context(CancellationServiceContext)]
#[tokio::test]
async fn test_cancel_onward_leg_keeps_return(ctx: &mut CancellationServiceContext) {
    let test_name = "test_cancel_onward_leg_keeps_return";
    let services = services_or_skip!(ctx, test_name);
    let trip = Trip::create(&services.pool, 42).await.unwrap();
    let booking_id = seated_booking(services, "Onward Cancel", &trip, "12").await;

    let cancellation_id = services
        .cancellations
        .cancel_leg(booking_id, Leg::Onward, cancelled_by("desk-1", CancellationReason::TravelPlanChanged))
        .await
        .unwrap();

    let booking = services.bookings.get_booking(booking_id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Active);
    assert_eq!(booking.onward_journey_id, None);
    assert_eq!(booking.onward_bus_id, None);
    assert_eq!(booking.onward_seat_number, None);
    assert_eq!(booking.onward_price, Decimal::ZERO);
    assert_eq!(booking.return_journey_id, Some(trip.return_journey));
    assert_eq!(booking.return_seat_number, Some(12));
    assert_eq!(booking.return_price, Decimal::from(290));
    assert_eq!(booking.total_price, Decimal::from(290));

    let audit = services.cancellations.list_cancellations(booking_id).await.unwrap();
    assert_eq!(audit.cancellations.len(), 1);
    let row = &audit.cancellations[0];
    test_println!(test_name, "audit row {:?}", row);
    assert_eq!(row.id, cancellation_id);
    assert_eq!(row.journey_type, CancellationScope::Onward);
    assert_eq!(row.original_onward_seat, Some(12));
    assert_eq!(row.original_onward_bus_id, Some(trip.onward_bus));
    assert_eq!(row.original_return_seat, None);
    assert_eq!(row.cancelled_by.as_deref(), Some("desk-1"));
    assert_eq!(row.reason, CancellationReason::TravelPlanChanged);

    // the onward seat is free for someone else now
    let other = book_adult(services, "Next In Line", &trip).await;
    services
        .bookings
        .assign_seat(other.booking_id, Leg::Onward, trip.onward_bus, "12")
        .await
        .unwrap();
}

#[test_context(CancellationServiceContext)]
#[tokio::test]
async fn test_cancelling_both_legs_one_by_one(ctx: &mut CancellationServiceContext) {
    let test_name = "test_cancelling_both_legs_one_by_one";
    let services = services_or_skip!(ctx, test_name);
    let trip = Trip::create(&services.pool, 42).await.unwrap();
    let booking_id = seated_booking(services, "Two Steps", &trip, "7").await;

    for leg in [Leg::Return, Leg::Onward] {
        services
            .cancellations
            .cancel_leg(booking_id, leg, CancellationDetails::default())
            .await
            .unwrap();
    }

    let booking = services.bookings.get_booking(booking_id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);

    let audit = services.cancellations.list_cancellations(booking_id).await.unwrap();
    let scopes: Vec<_> = audit.cancellations.iter().map(|c| c.journey_type).collect();
    assert_eq!(scopes, vec![CancellationScope::Return, CancellationScope::Onward]);

    let again = services
        .cancellations
        .cancel_leg(booking_id, Leg::Onward, CancellationDetails::default())
        .await;
    assert!(matches!(again, Err(AppError::Unprocessable(_))));
}

#[test_context(CancellationServiceContext)]
#[tokio::test]
async fn test_cancel_only_leg_keeps_charge_and_payments(ctx: &mut CancellationServiceContext) {
    let test_name = "test_cancel_only_leg_keeps_charge_and_payments";
    let services = services_or_skip!(ctx, test_name);
    let trip = Trip::create(&services.pool, 42).await.unwrap();

    let onward_only = LegSelection {
        onward_journey_id: Some(trip.onward_journey),
        ..LegSelection::default()
    };
    let created = services
        .bookings
        .register_walk_in(adult_male("One Way"), onward_only)
        .await
        .unwrap();
    services
        .bookings
        .assign_seat(created.booking_id, Leg::Onward, trip.onward_bus, "3")
        .await
        .unwrap();
    services
        .payments
        .record_payment(created.booking_id, Decimal::from(200), PaymentMethod::Cash, "volunteer-1", None)
        .await
        .unwrap();

    services
        .cancellations
        .cancel_leg(created.booking_id, Leg::Onward, cancelled_by("desk-2", CancellationReason::Other))
        .await
        .unwrap();

    let booking = services.bookings.get_booking(created.booking_id).await.unwrap();
    test_println!(test_name, "archived booking {:?}", booking);
    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert_eq!(booking.onward_journey_id, None);
    assert_eq!(booking.onward_bus_id, None);
    assert_eq!(booking.onward_seat_number, None);
    assert_eq!(booking.onward_price, Decimal::from(550));
    assert_eq!(booking.total_price, Decimal::from(550));
    assert_eq!(booking.payment_status, PaymentStatus::Partial);

    // one audit row for the only leg
    let audit = services.cancellations.list_cancellations(created.booking_id).await.unwrap();
    assert_eq!(audit.cancellations.len(), 1);
    assert_eq!(audit.cancellations[0].journey_type, CancellationScope::Onward);
}

#[test_context(CancellationServiceContext)]
#[tokio::test]
async fn test_cancel_same_leg_twice(ctx: &mut CancellationServiceContext) {
    let test_name = "test_cancel_same_leg_twice";
    let services = services_or_skip!(ctx, test_name);
    let trip = Trip::create(&services.pool, 42).await.unwrap();
    let booking_id = seated_booking(services, "Twice Cancelled", &trip, "9").await;

    services
        .cancellations
        .cancel_leg(booking_id, Leg::Return, CancellationDetails::default())
        .await
        .unwrap();
    let result = services
        .cancellations
        .cancel_leg(booking_id, Leg::Return, CancellationDetails::default())
        .await;

    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[test_context(CancellationServiceContext)]
#[tokio::test]
async fn test_full_cancellation_with_refund(ctx: &mut CancellationServiceContext) {
    let test_name = "test_full_cancellation_with_refund";
    let services = services_or_skip!(ctx, test_name);
    let trip = Trip::create(&services.pool, 42).await.unwrap();
    let booking_id = seated_booking(services, "Full Refund", &trip, "21").await;

    services
        .payments
        .record_payment(booking_id, Decimal::from(500), PaymentMethod::Cash, "volunteer-1", None)
        .await
        .unwrap();

    let too_much = services
        .cancellations
        .cancel_booking(booking_id, Decimal::from(600), CancellationDetails::default())
        .await;
    assert!(matches!(too_much, Err(AppError::ValidationError(_))));

    let cancellation_id = services
        .cancellations
        .cancel_booking(
            booking_id,
            Decimal::from(400),
            cancelled_by("desk-2", CancellationReason::MedicalEmergency),
        )
        .await
        .unwrap();

    let booking = services.bookings.get_booking(booking_id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert_eq!(booking.onward_seat_number, None);
    assert_eq!(booking.return_seat_number, None);
    assert_eq!(booking.total_price, Decimal::from(840));

    let row = services.cancellations.get_cancellation(cancellation_id).await.unwrap();
    assert_eq!(row.journey_type, CancellationScope::Both);
    assert_eq!(row.original_onward_seat, Some(21));
    assert_eq!(row.original_return_seat, Some(21));
    assert_eq!(row.original_amount_paid, Decimal::from(500));
    assert_eq!(row.refund_amount, Decimal::from(400));
    assert!(!row.refund_processed);

    let refund_date = NaiveDate::from_ymd_opt(2030, 4, 1).unwrap();
    let processed = services
        .cancellations
        .process_refund(cancellation_id, Some(refund_date))
        .await
        .unwrap();
    test_println!(test_name, "refund processed on {:?}", processed.refund_date);
    assert!(processed.refund_processed);
    assert_eq!(processed.refund_date, Some(refund_date));

    let twice = services.cancellations.process_refund(cancellation_id, None).await;
    assert!(matches!(twice, Err(AppError::Unprocessable(_))));

    let custom = services
        .bookings
        .set_custom_amount(booking_id, Decimal::from(100), "coordinator")
        .await;
    assert!(matches!(custom, Err(AppError::Unprocessable(_))));

    // both seats are released
    let map = services.seats.seat_map(trip.return_bus, Leg::Return).await.unwrap();
    assert!(!map.occupied_seats.contains_key(&21));
}

#[test_context(CancellationServiceContext)]
#[tokio::test]
async fn test_cancel_missing_booking(ctx: &mut CancellationServiceContext) {
    let test_name = "test_cancel_missing_booking";
    let services = services_or_skip!(ctx, test_name);

    let result = services
        .cancellations
        .cancel_booking(999_999, Decimal::ZERO, CancellationDetails::default())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let refund = services.cancellations.process_refund(999_999, None).await;
    assert!(matches!(refund, Err(AppError::NotFound(_))));
}
