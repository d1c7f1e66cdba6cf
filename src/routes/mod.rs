use std::str::FromStr;

use chrono::NaiveDate;

use crate::utils::error::AppError;

pub mod booking_route;
pub mod cancellation_route;
pub mod journey_route;
pub mod passenger_route;
pub mod payment_route;

// Query strings arrive as text; labels and dates are checked here so a typo
// comes back as 400 instead of silently matching nothing.
fn parse_label<T: FromStr>(field: &str, raw: Option<String>) -> Result<Option<T>, AppError> {
    raw.map(|value| {
        value
            .parse::<T>()
            .map_err(|_| AppError::BadRequest(format!("Invalid {field}: {value}")))
    })
    .transpose()
}

fn parse_date(field: &str, raw: Option<String>) -> Result<Option<NaiveDate>, AppError> {
    raw.map(|value| {
        NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .map_err(|_| AppError::BadRequest(format!("Invalid {field} format")))
    })
    .transpose()
}
