use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::models::payment::{
    Payment, PaymentListResponse, PaymentRecordedResponse, PaymentRequest, ReceiptDateCorrection,
};
use crate::services::payment_service::PaymentService;
use crate::utils::error::AppError;
use crate::utils::jwt::AuthenticatedUser;

/// Record money collected against a booking
#[openapi(tag = "Payments")]
#[post("/bookings/<booking_id>/payments", format = "json", data = "<request>")]
pub async fn record_payment(
    booking_id: i32,
    request: Json<PaymentRequest>,
    auth: AuthenticatedUser,
    payment_service: &State<PaymentService>,
) -> Result<Json<PaymentRecordedResponse>, AppError> {
    let request = request.into_inner();
    let response = payment_service
        .record_payment(
            booking_id,
            request.amount,
            request.payment_method,
            &auth.username,
            request.payment_received_date,
        )
        .await?;
    Ok(Json(response))
}

#[openapi(tag = "Payments")]
#[get("/bookings/<booking_id>/payments")]
pub async fn list_payments(
    booking_id: i32,
    _auth: AuthenticatedUser,
    payment_service: &State<PaymentService>,
) -> Result<Json<PaymentListResponse>, AppError> {
    Ok(Json(payment_service.list_payments(booking_id).await?))
}

/// Fix the date a payment actually reached the treasurer
#[openapi(tag = "Payments")]
#[put("/payments/<payment_id>/received-date", format = "json", data = "<request>")]
pub async fn correct_receipt_date(
    payment_id: i32,
    request: Json<ReceiptDateCorrection>,
    _auth: AuthenticatedUser,
    payment_service: &State<PaymentService>,
) -> Result<Json<Payment>, AppError> {
    let payment = payment_service
        .correct_receipt_date(payment_id, request.payment_received_date)
        .await?;
    Ok(Json(payment))
}
