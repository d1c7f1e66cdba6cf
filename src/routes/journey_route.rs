use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use super::{parse_date, parse_label};
use crate::models::journey::{
    BusListResponse, BusSearchQuery, JourneyListResponse, PricingTableResponse,
};
use crate::services::journey_service::JourneyService;
use crate::services::pricing_service::PricingService;
use crate::utils::error::AppError;
use crate::utils::jwt::AuthenticatedUser;

#[openapi(tag = "Journeys")]
#[get("/journeys?<leg>&<active_only>")]
pub async fn list_journeys(
    leg: Option<String>,
    active_only: Option<bool>,
    _auth: AuthenticatedUser,
    journey_service: &State<JourneyService>,
) -> Result<Json<JourneyListResponse>, AppError> {
    let journeys = journey_service
        .list_journeys(parse_label("leg", leg)?, active_only.unwrap_or(true))
        .await?;
    Ok(Json(journeys))
}

/// Search buses by journey, direction or travel date
#[openapi(tag = "Journeys")]
#[get("/buses?<journey_id>&<leg>&<date>")]
pub async fn list_buses(
    journey_id: Option<i32>,
    leg: Option<String>,
    date: Option<String>,
    _auth: AuthenticatedUser,
    journey_service: &State<JourneyService>,
) -> Result<Json<BusListResponse>, AppError> {
    let query = BusSearchQuery {
        journey_id,
        journey_type: parse_label("leg", leg)?,
        journey_date: parse_date("date", date)?,
    };
    Ok(Json(journey_service.list_buses(query).await?))
}

/// Configured fares per leg and age category
#[openapi(tag = "Journeys")]
#[get("/pricing?<leg>")]
pub async fn get_pricing_table(
    leg: Option<String>,
    _auth: AuthenticatedUser,
    pricing_service: &State<PricingService>,
) -> Result<Json<PricingTableResponse>, AppError> {
    let table = pricing_service.pricing_table(parse_label("leg", leg)?).await?;
    Ok(Json(table))
}
