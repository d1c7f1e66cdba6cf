use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use validator::Validate;

use super::journey::Leg;
use super::passenger::PassengerRegistrationRequest;
use crate::utils::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString)]
pub enum BookingStatus {
    Active,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString)]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

text_column!(BookingStatus, PaymentStatus);

/// Column names holding one leg's allocation in the `booking` table.
pub struct LegColumns {
    pub journey: &'static str,
    pub bus: &'static str,
    pub seat: &'static str,
    pub price: &'static str,
}

impl Leg {
    pub fn booking_columns(self) -> LegColumns {
        match self {
            Leg::Onward => LegColumns {
                journey: "onward_journey_id",
                bus: "onward_bus_id",
                seat: "onward_seat_number",
                price: "onward_price",
            },
            Leg::Return => LegColumns {
                journey: "return_journey_id",
                bus: "return_bus_id",
                seat: "return_seat_number",
                price: "return_price",
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegAllocation {
    pub journey_id: Option<i32>,
    pub bus_id: Option<i32>,
    pub seat_number: Option<i32>,
    pub price: Decimal,
}

impl LegAllocation {
    pub fn is_populated(&self) -> bool {
        self.journey_id.is_some() || self.bus_id.is_some() || self.seat_number.is_some()
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct Booking {
    pub id: i32,
    pub passenger_id: i32,
    pub pickup_point_id: Option<i32>,
    pub onward_journey_id: Option<i32>,
    pub return_journey_id: Option<i32>,
    pub onward_bus_id: Option<i32>,
    pub return_bus_id: Option<i32>,
    pub onward_seat_number: Option<i32>,
    pub return_seat_number: Option<i32>,
    pub onward_price: Decimal,
    pub return_price: Decimal,
    pub total_price: Decimal,
    pub custom_amount: Option<Decimal>,
    pub amount_updated_by: Option<String>,
    pub amount_updated_at: Option<NaiveDateTime>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub remarks: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Booking {
    pub fn leg(&self, leg: Leg) -> LegAllocation {
        match leg {
            Leg::Onward => LegAllocation {
                journey_id: self.onward_journey_id,
                bus_id: self.onward_bus_id,
                seat_number: self.onward_seat_number,
                price: self.onward_price,
            },
            Leg::Return => LegAllocation {
                journey_id: self.return_journey_id,
                bus_id: self.return_bus_id,
                seat_number: self.return_seat_number,
                price: self.return_price,
            },
        }
    }

    pub fn set_leg(&mut self, leg: Leg, allocation: LegAllocation) {
        match leg {
            Leg::Onward => {
                self.onward_journey_id = allocation.journey_id;
                self.onward_bus_id = allocation.bus_id;
                self.onward_seat_number = allocation.seat_number;
                self.onward_price = allocation.price;
            }
            Leg::Return => {
                self.return_journey_id = allocation.journey_id;
                self.return_bus_id = allocation.bus_id;
                self.return_seat_number = allocation.seat_number;
                self.return_price = allocation.price;
            }
        }
        self.recompute_total();
    }

    /// Vacates one leg entirely. The other leg is left as it is.
    pub fn clear_leg(&mut self, leg: Leg) {
        self.set_leg(leg, LegAllocation::default());
    }

    /// Drops journey, bus and seat of both legs. Prices stay as the archived charge.
    pub fn release_allocations(&mut self) {
        for leg in [Leg::Onward, Leg::Return] {
            let price = self.leg(leg).price;
            self.set_leg(
                leg,
                LegAllocation {
                    price,
                    ..LegAllocation::default()
                },
            );
        }
    }

    /// Vacates one leg. Once no leg is left the booking is archived as
    /// Cancelled with its prices kept, the same end state as a full release.
    pub fn vacate_leg(&mut self, leg: Leg) {
        if self.leg(leg.other()).is_populated() {
            self.clear_leg(leg);
        } else {
            self.release_allocations();
            self.status = BookingStatus::Cancelled;
        }
    }

    pub fn recompute_total(&mut self) {
        self.total_price = self.onward_price + self.return_price;
    }

    // The custom amount, when set, is what the passenger owes
    pub fn final_amount(&self) -> Decimal {
        self.custom_amount.unwrap_or(self.total_price)
    }

    pub fn ensure_active(&self) -> AppResult<()> {
        if self.status != BookingStatus::Active {
            return Err(AppError::Unprocessable(format!(
                "Booking {} is {}",
                self.id, self.status
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct CreateBookingRequest {
    pub passenger_id: i32,
    pub onward_journey_id: Option<i32>,
    pub return_journey_id: Option<i32>,
    pub pickup_point_id: Option<i32>,
    #[validate(length(max = 500))]
    pub remarks: Option<String>,
}

// Legs picked for a new booking
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct LegSelection {
    pub onward_journey_id: Option<i32>,
    pub return_journey_id: Option<i32>,
    pub pickup_point_id: Option<i32>,
}

impl LegSelection {
    pub fn journey_for(&self, leg: Leg) -> Option<i32> {
        match leg {
            Leg::Onward => self.onward_journey_id,
            Leg::Return => self.return_journey_id,
        }
    }
}

impl From<&CreateBookingRequest> for LegSelection {
    fn from(request: &CreateBookingRequest) -> Self {
        LegSelection {
            onward_journey_id: request.onward_journey_id,
            return_journey_id: request.return_journey_id,
            pickup_point_id: request.pickup_point_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct WalkInRegistrationRequest {
    #[validate(nested)]
    pub passenger: PassengerRegistrationRequest,
    pub legs: LegSelection,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct BookingCreatedResponse {
    pub booking_id: i32,
    pub passenger_id: i32,
    pub onward_price: Decimal,
    pub return_price: Decimal,
    pub total_price: Decimal,
}

/// Seat request as it arrives from the client. Bus and seat travel together.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SeatAssignmentRequest {
    pub leg: Leg,
    pub bus_id: Option<i32>,
    pub seat_number: Option<String>,
}

impl SeatAssignmentRequest {
    pub fn into_parts(self) -> AppResult<(Leg, i32, String)> {
        let seat = self.seat_number.filter(|s| !s.trim().is_empty());
        match (self.bus_id, seat) {
            (Some(bus_id), Some(seat)) => Ok((self.leg, bus_id, seat)),
            (None, Some(_)) => Err(AppError::ValidationError(
                "Bus assignment is required when assigning a seat".into(),
            )),
            (Some(_), None) => Err(AppError::ValidationError(
                "Seat number is required when assigning a bus".into(),
            )),
            (None, None) => Err(AppError::ValidationError(
                "Bus and seat number are required".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CustomAmountRequest {
    pub amount: Decimal,
}

#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub leg: Option<Leg>,
    pub date: Option<NaiveDate>,
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
}
