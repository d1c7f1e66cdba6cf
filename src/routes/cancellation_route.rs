use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use rust_decimal::Decimal;
use validator::Validate;

use crate::models::cancellation::{
    CancelBookingRequest, CancelLegRequest, CancellationListResponse, CancellationResponse,
    RefundRequest, SeatCancellation,
};
use crate::services::cancellation_service::{CancellationDetails, CancellationService};
use crate::utils::error::AppError;
use crate::utils::jwt::AuthenticatedUser;

/// Cancel one leg of a booking
#[openapi(tag = "Cancellations")]
#[post("/bookings/<booking_id>/cancel-leg", format = "json", data = "<request>")]
pub async fn cancel_leg(
    booking_id: i32,
    request: Json<CancelLegRequest>,
    auth: AuthenticatedUser,
    cancellation_service: &State<CancellationService>,
) -> Result<Json<CancellationResponse>, AppError> {
    let request = request.into_inner();
    request.validate()?;
    let leg = request.leg;
    let details = CancellationDetails {
        reason: request.reason,
        notes: request.notes,
        cancelled_by: Some(auth.username),
    };

    let cancellation_id = cancellation_service
        .cancel_leg(booking_id, leg, details)
        .await?;
    Ok(Json(CancellationResponse {
        cancellation_id,
        message: format!("{leg} journey cancelled"),
    }))
}

/// Cancel the whole booking and record the agreed refund
#[openapi(tag = "Cancellations")]
#[post("/bookings/<booking_id>/cancel", format = "json", data = "<request>")]
pub async fn cancel_booking(
    booking_id: i32,
    request: Json<CancelBookingRequest>,
    auth: AuthenticatedUser,
    cancellation_service: &State<CancellationService>,
) -> Result<Json<CancellationResponse>, AppError> {
    let request = request.into_inner();
    request.validate()?;
    let refund_amount = request.refund_amount.unwrap_or(Decimal::ZERO);
    let details = CancellationDetails {
        reason: request.reason,
        notes: request.notes,
        cancelled_by: Some(auth.username),
    };

    let cancellation_id = cancellation_service
        .cancel_booking(booking_id, refund_amount, details)
        .await?;
    Ok(Json(CancellationResponse {
        cancellation_id,
        message: "Booking cancelled".to_string(),
    }))
}

#[openapi(tag = "Cancellations")]
#[post("/cancellations/<cancellation_id>/refund", format = "json", data = "<request>")]
pub async fn process_refund(
    cancellation_id: i32,
    request: Json<RefundRequest>,
    _auth: AuthenticatedUser,
    cancellation_service: &State<CancellationService>,
) -> Result<Json<SeatCancellation>, AppError> {
    let cancellation = cancellation_service
        .process_refund(cancellation_id, request.refund_date)
        .await?;
    Ok(Json(cancellation))
}

/// Audit trail for a booking
#[openapi(tag = "Cancellations")]
#[get("/bookings/<booking_id>/cancellations")]
pub async fn list_cancellations(
    booking_id: i32,
    _auth: AuthenticatedUser,
    cancellation_service: &State<CancellationService>,
) -> Result<Json<CancellationListResponse>, AppError> {
    Ok(Json(cancellation_service.list_cancellations(booking_id).await?))
}
