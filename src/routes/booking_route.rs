use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use validator::Validate;

use super::{parse_date, parse_label};
use crate::models::booking::{
    Booking, BookingCreatedResponse, BookingFilter, BookingListResponse, CreateBookingRequest,
    CustomAmountRequest, LegSelection, SeatAssignmentRequest, WalkInRegistrationRequest,
};
use crate::models::journey::{BusManifestResponse, Leg, SeatMapResponse};
use crate::services::booking_service::BookingService;
use crate::services::seat_service::SeatService;
use crate::utils::error::AppError;
use crate::utils::jwt::AuthenticatedUser;

/// Create a booking for a registered passenger
#[openapi(tag = "Bookings")]
#[post("/bookings", format = "json", data = "<request>")]
pub async fn create_booking(
    request: Json<CreateBookingRequest>,
    _auth: AuthenticatedUser,
    booking_service: &State<BookingService>,
) -> Result<Json<BookingCreatedResponse>, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let legs = LegSelection::from(&request);
    let response = booking_service
        .create_booking(request.passenger_id, legs, request.remarks)
        .await?;
    Ok(Json(response))
}

/// Register a passenger and book in one step
#[openapi(tag = "Bookings")]
#[post("/bookings/walk-in", format = "json", data = "<request>")]
pub async fn register_walk_in(
    request: Json<WalkInRegistrationRequest>,
    _auth: AuthenticatedUser,
    booking_service: &State<BookingService>,
) -> Result<Json<BookingCreatedResponse>, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let response = booking_service
        .register_walk_in(request.passenger, request.legs)
        .await?;
    Ok(Json(response))
}

#[openapi(tag = "Bookings")]
#[get("/bookings/<booking_id>")]
pub async fn get_booking(
    booking_id: i32,
    _auth: AuthenticatedUser,
    booking_service: &State<BookingService>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(booking_service.get_booking(booking_id).await?))
}

/// List bookings by leg, travel date and lifecycle status
#[openapi(tag = "Bookings")]
#[get("/bookings?<leg>&<date>&<status>")]
pub async fn list_bookings(
    leg: Option<String>,
    date: Option<String>,
    status: Option<String>,
    _auth: AuthenticatedUser,
    booking_service: &State<BookingService>,
) -> Result<Json<BookingListResponse>, AppError> {
    let filter = BookingFilter {
        leg: parse_label("leg", leg)?,
        date: parse_date("date", date)?,
        status: parse_label("status", status)?,
    };
    Ok(Json(booking_service.list_bookings(filter).await?))
}

/// Assign a bus seat for one leg
#[openapi(tag = "Bookings")]
#[put("/bookings/<booking_id>/seat", format = "json", data = "<request>")]
pub async fn assign_seat(
    booking_id: i32,
    request: Json<SeatAssignmentRequest>,
    _auth: AuthenticatedUser,
    booking_service: &State<BookingService>,
) -> Result<Json<Booking>, AppError> {
    let (leg, bus_id, seat_number) = request.into_inner().into_parts()?;
    let booking = booking_service
        .assign_seat(booking_id, leg, bus_id, &seat_number)
        .await?;
    Ok(Json(booking))
}

/// Override the amount the passenger owes
#[openapi(tag = "Bookings")]
#[put("/bookings/<booking_id>/custom-amount", format = "json", data = "<request>")]
pub async fn set_custom_amount(
    booking_id: i32,
    request: Json<CustomAmountRequest>,
    auth: AuthenticatedUser,
    booking_service: &State<BookingService>,
) -> Result<Json<Booking>, AppError> {
    let booking = booking_service
        .set_custom_amount(booking_id, request.amount, &auth.username)
        .await?;
    Ok(Json(booking))
}

#[openapi(tag = "Bookings")]
#[post("/bookings/<booking_id>/complete")]
pub async fn complete_booking(
    booking_id: i32,
    _auth: AuthenticatedUser,
    booking_service: &State<BookingService>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(booking_service.complete_booking(booking_id).await?))
}

/// Occupied and free seats on a bus for one leg
#[openapi(tag = "Seats")]
#[get("/buses/<bus_id>/seats?<leg>")]
pub async fn get_seat_map(
    bus_id: i32,
    leg: String,
    _auth: AuthenticatedUser,
    seat_service: &State<SeatService>,
) -> Result<Json<SeatMapResponse>, AppError> {
    let leg = parse_label::<Leg>("leg", Some(leg))?
        .ok_or_else(|| AppError::BadRequest("leg is required".into()))?;
    Ok(Json(seat_service.seat_map(bus_id, leg).await?))
}

/// Passengers riding a bus on either leg
#[openapi(tag = "Seats")]
#[get("/buses/<bus_id>/passengers")]
pub async fn get_passenger_list(
    bus_id: i32,
    _auth: AuthenticatedUser,
    seat_service: &State<SeatService>,
) -> Result<Json<BusManifestResponse>, AppError> {
    Ok(Json(seat_service.passenger_list(bus_id).await?))
}
