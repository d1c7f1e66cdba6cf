use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use validator::Validate;

use crate::models::passenger::{Passenger, PassengerRegistrationRequest, VerificationUpdateRequest};
use crate::services::passenger_service::PassengerService;
use crate::utils::error::AppError;
use crate::utils::jwt::AuthenticatedUser;

/// Register a passenger
#[openapi(tag = "Passengers")]
#[post("/passengers", format = "json", data = "<request>")]
pub async fn register_passenger(
    request: Json<PassengerRegistrationRequest>,
    _auth: AuthenticatedUser,
    passenger_service: &State<PassengerService>,
) -> Result<Json<Passenger>, AppError> {
    let request = request.into_inner();
    request.validate()?;
    Ok(Json(passenger_service.register_passenger(request).await?))
}

#[openapi(tag = "Passengers")]
#[get("/passengers/<passenger_id>")]
pub async fn get_passenger(
    passenger_id: i32,
    _auth: AuthenticatedUser,
    passenger_service: &State<PassengerService>,
) -> Result<Json<Passenger>, AppError> {
    Ok(Json(passenger_service.get_passenger(passenger_id).await?))
}

/// Record the Aadhar check outcome
#[openapi(tag = "Passengers")]
#[put("/passengers/<passenger_id>/verification", format = "json", data = "<request>")]
pub async fn verify_passenger(
    passenger_id: i32,
    request: Json<VerificationUpdateRequest>,
    _auth: AuthenticatedUser,
    passenger_service: &State<PassengerService>,
) -> Result<Json<Passenger>, AppError> {
    let request = request.into_inner();
    request.validate()?;
    let passenger = passenger_service
        .verify_passenger(passenger_id, request.status, request.notes)
        .await?;
    Ok(Json(passenger))
}
