use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use validator::Validate;

use super::booking::Booking;
use super::journey::Leg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, Display, EnumString)]
pub enum CancellationReason {
    #[default]
    #[serde(rename = "Passenger Request")]
    #[strum(serialize = "Passenger Request")]
    PassengerRequest,
    #[serde(rename = "Medical Emergency")]
    #[strum(serialize = "Medical Emergency")]
    MedicalEmergency,
    #[serde(rename = "Travel Plan Changed")]
    #[strum(serialize = "Travel Plan Changed")]
    TravelPlanChanged,
    Other,
}

/// Which legs a cancellation vacated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString)]
pub enum CancellationScope {
    #[serde(rename = "ONWARD")]
    #[strum(serialize = "ONWARD")]
    Onward,
    #[serde(rename = "RETURN")]
    #[strum(serialize = "RETURN")]
    Return,
    #[serde(rename = "BOTH")]
    #[strum(serialize = "BOTH")]
    Both,
}

impl CancellationScope {
    pub fn covers(self, leg: Leg) -> bool {
        match self {
            CancellationScope::Both => true,
            CancellationScope::Onward => leg == Leg::Onward,
            CancellationScope::Return => leg == Leg::Return,
        }
    }
}

impl From<Leg> for CancellationScope {
    fn from(leg: Leg) -> Self {
        match leg {
            Leg::Onward => CancellationScope::Onward,
            Leg::Return => CancellationScope::Return,
        }
    }
}

text_column!(CancellationReason, CancellationScope);

/// Audit row. Only `refund_processed` and `refund_date` change after insert.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct SeatCancellation {
    pub id: i32,
    pub booking_id: i32,
    pub cancelled_by: Option<String>,
    pub cancellation_date: NaiveDateTime,
    pub reason: CancellationReason,
    pub journey_type: CancellationScope,
    pub original_onward_seat: Option<i32>,
    pub original_return_seat: Option<i32>,
    pub original_onward_bus_id: Option<i32>,
    pub original_return_bus_id: Option<i32>,
    pub original_amount_paid: Decimal,
    pub refund_amount: Decimal,
    pub refund_processed: bool,
    pub refund_date: Option<NaiveDate>,
    pub notes: String,
}

/// Pre-cancellation state of the legs being vacated.
#[derive(Debug, Clone, PartialEq)]
pub struct CancellationSnapshot {
    pub scope: CancellationScope,
    pub onward_seat: Option<i32>,
    pub return_seat: Option<i32>,
    pub onward_bus_id: Option<i32>,
    pub return_bus_id: Option<i32>,
    pub amount_paid: Decimal,
}

impl CancellationSnapshot {
    // Must run before any leg field is cleared
    pub fn capture(booking: &Booking, scope: CancellationScope, amount_paid: Decimal) -> Self {
        let onward = booking.leg(Leg::Onward);
        let ret = booking.leg(Leg::Return);
        let keep = |leg: Leg, value: Option<i32>| value.filter(|_| scope.covers(leg));

        CancellationSnapshot {
            scope,
            onward_seat: keep(Leg::Onward, onward.seat_number),
            return_seat: keep(Leg::Return, ret.seat_number),
            onward_bus_id: keep(Leg::Onward, onward.bus_id),
            return_bus_id: keep(Leg::Return, ret.bus_id),
            amount_paid,
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct CancelLegRequest {
    pub leg: Leg,
    #[serde(default)]
    pub reason: CancellationReason,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct CancelBookingRequest {
    #[serde(default)]
    pub reason: CancellationReason,
    pub refund_amount: Option<Decimal>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RefundRequest {
    pub refund_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CancellationResponse {
    pub cancellation_id: i32,
    pub message: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CancellationListResponse {
    pub cancellations: Vec<SeatCancellation>,
}
