use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumString};

use super::booking::PaymentStatus;
use super::passenger::AgeCriteria;

/// One direction of travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Display, EnumString)]
pub enum Leg {
    #[serde(rename = "ONWARD")]
    #[strum(serialize = "ONWARD")]
    Onward,
    #[serde(rename = "RETURN")]
    #[strum(serialize = "RETURN")]
    Return,
}

impl Leg {
    pub fn other(self) -> Leg {
        match self {
            Leg::Onward => Leg::Return,
            Leg::Return => Leg::Onward,
        }
    }
}

text_column!(Leg);

#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct Journey {
    pub id: i32,
    pub journey_type: Leg,
    pub journey_date: NaiveDate,
    pub is_active: bool,
}

// Rate table row, keyed by (journey_type, age_criteria)
#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct JourneyPricing {
    pub id: i32,
    pub journey_type: Leg,
    pub age_criteria: AgeCriteria,
    pub amount: Decimal,
    pub is_active: bool,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct Bus {
    pub id: i32,
    pub bus_number: String,
    pub capacity: i32,
    pub route_name: String,
    pub journey_id: Option<i32>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct PickupPoint {
    pub id: i32,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Default)]
pub struct BusSearchQuery {
    pub journey_id: Option<i32>,
    pub journey_type: Option<Leg>,
    pub journey_date: Option<NaiveDate>,
}

// Single bus in BusListResponse, with the journey it runs on
#[derive(Debug, Serialize, JsonSchema, sqlx::FromRow)]
pub struct BusDetail {
    pub id: i32,
    pub bus_number: String,
    pub capacity: i32,
    pub route_name: String,
    pub journey_id: Option<i32>,
    pub journey_type: Option<Leg>,
    pub journey_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct BusListResponse {
    pub buses: Vec<BusDetail>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct JourneyListResponse {
    pub journeys: Vec<Journey>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PricingTableResponse {
    pub rates: Vec<JourneyPricing>,
}

#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct SeatOccupant {
    pub booking_id: i32,
    pub passenger_name: String,
    pub passenger_age: i32,
    pub age_criteria: AgeCriteria,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct SeatMapResponse {
    pub bus_id: i32,
    pub bus_number: String,
    pub leg: Leg,
    pub capacity: i32,
    pub occupied_seats: BTreeMap<i32, SeatOccupant>,
    pub available_seats: i32,
}

/// A passenger riding a bus on one leg.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ManifestEntry {
    pub booking_id: i32,
    pub passenger_name: String,
    pub mobile_no: String,
    pub age: i32,
    pub age_criteria: AgeCriteria,
    pub leg: Leg,
    pub seat_number: Option<i32>,
    pub leg_price: Decimal,
    pub custom_amount: Option<Decimal>,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct BusManifestResponse {
    pub bus: Bus,
    pub passengers: Vec<ManifestEntry>,
    pub total_passengers: usize,
}
