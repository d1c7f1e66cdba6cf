use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sqlx::{MySqlConnection, MySqlPool};

use crate::models::booking::PaymentStatus;
use crate::models::journey::{
    Bus, BusManifestResponse, Leg, ManifestEntry, SeatMapResponse, SeatOccupant,
};
use crate::models::passenger::AgeCriteria;
use crate::utils::error::{AppError, AppResult};

/// Parses a seat number typed by a volunteer. Malformed input is a validation
/// error, never a conflict.
pub fn parse_seat_number(raw: &str, capacity: i32) -> AppResult<i32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(
            "Seat number must not be empty".into(),
        ));
    }

    let seat: i32 = trimmed.parse().map_err(|_| {
        AppError::ValidationError(format!("Seat number must be a valid number, got '{trimmed}'"))
    })?;

    if seat < 1 || seat > capacity {
        return Err(AppError::ValidationError(format!(
            "Seat number must be between 1 and {capacity}"
        )));
    }

    Ok(seat)
}

#[derive(Debug, sqlx::FromRow)]
struct OccupiedSeat {
    seat_number: i32,
    #[sqlx(flatten)]
    occupant: SeatOccupant,
}

#[derive(Debug, sqlx::FromRow)]
struct ManifestRow {
    booking_id: i32,
    passenger_name: String,
    mobile_no: String,
    age: i32,
    age_criteria: AgeCriteria,
    seat_number: Option<i32>,
    leg_price: Decimal,
    custom_amount: Option<Decimal>,
    payment_status: PaymentStatus,
}

impl ManifestRow {
    fn into_entry(self, leg: Leg) -> ManifestEntry {
        ManifestEntry {
            booking_id: self.booking_id,
            passenger_name: self.passenger_name,
            mobile_no: self.mobile_no,
            age: self.age,
            age_criteria: self.age_criteria,
            leg,
            seat_number: self.seat_number,
            leg_price: self.leg_price,
            custom_amount: self.custom_amount,
            payment_status: self.payment_status,
        }
    }
}

#[derive(Clone)]
pub struct SeatService {
    pool: MySqlPool,
}

impl SeatService {
    pub fn new(pool: MySqlPool) -> Self {
        SeatService { pool }
    }

    /// Locks the bus row for the rest of the transaction. Every seat write on a
    /// bus goes through here first, so conflict checks on one bus are serialized.
    pub async fn lock_bus(&self, conn: &mut MySqlConnection, bus_id: i32) -> AppResult<Bus> {
        sqlx::query_as::<_, Bus>(
            r#"
            SELECT id, bus_number, capacity, route_name, journey_id
            FROM bus
            WHERE id = ?
            FOR UPDATE
            "#,
        )
        .bind(bus_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bus {bus_id} not found")))
    }

    /// Validates the seat against the bus and checks no other Active booking holds
    /// it on the same leg. Returns the parsed seat number.
    pub async fn check_conflict(
        &self,
        conn: &mut MySqlConnection,
        bus: &Bus,
        leg: Leg,
        seat_number: &str,
        excluding_booking_id: Option<i32>,
    ) -> AppResult<i32> {
        let seat = parse_seat_number(seat_number, bus.capacity)?;
        let columns = leg.booking_columns();

        let holder: Option<i32> = sqlx::query_scalar(&format!(
            r#"
            SELECT id
            FROM booking
            WHERE status = 'Active'
            AND {bus_col} = ?
            AND {seat_col} = ?
            AND (? IS NULL OR id <> ?)
            LIMIT 1
            "#,
            bus_col = columns.bus,
            seat_col = columns.seat,
        ))
        .bind(bus.id)
        .bind(seat)
        .bind(excluding_booking_id)
        .bind(excluding_booking_id)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(holder) = holder {
            tracing::warn!(bus_id = bus.id, %leg, seat, holder, "seat already taken");
            return Err(AppError::Conflict(format!(
                "Seat {seat} is already assigned on bus {} for the {leg} journey",
                bus.bus_number
            )));
        }

        Ok(seat)
    }

    async fn fetch_bus(&self, bus_id: i32) -> AppResult<Bus> {
        sqlx::query_as::<_, Bus>(
            r#"
            SELECT id, bus_number, capacity, route_name, journey_id
            FROM bus
            WHERE id = ?
            "#,
        )
        .bind(bus_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Bus {bus_id} not found")))
    }

    pub async fn seat_map(&self, bus_id: i32, leg: Leg) -> AppResult<SeatMapResponse> {
        let bus = self.fetch_bus(bus_id).await?;

        let columns = leg.booking_columns();
        let rows = sqlx::query_as::<_, OccupiedSeat>(&format!(
            r#"
            SELECT
                b.{seat_col} AS seat_number,
                b.id AS booking_id,
                p.name AS passenger_name,
                p.age AS passenger_age,
                p.age_criteria
            FROM booking b
            INNER JOIN passenger p ON b.passenger_id = p.id
            WHERE b.status = 'Active'
            AND b.{bus_col} = ?
            AND b.{seat_col} IS NOT NULL
            ORDER BY b.{seat_col}
            "#,
            bus_col = columns.bus,
            seat_col = columns.seat,
        ))
        .bind(bus.id)
        .fetch_all(&self.pool)
        .await?;

        let occupied_seats: BTreeMap<i32, SeatOccupant> = rows
            .into_iter()
            .map(|row| (row.seat_number, row.occupant))
            .collect();

        Ok(SeatMapResponse {
            bus_id: bus.id,
            available_seats: bus.capacity - occupied_seats.len() as i32,
            bus_number: bus.bus_number,
            leg,
            capacity: bus.capacity,
            occupied_seats,
        })
    }

    /// Active bookings riding this bus on either leg, onward riders first,
    /// seated passengers in seat order before unseated ones.
    pub async fn passenger_list(&self, bus_id: i32) -> AppResult<BusManifestResponse> {
        let bus = self.fetch_bus(bus_id).await?;

        let mut passengers = Vec::new();
        for leg in [Leg::Onward, Leg::Return] {
            let columns = leg.booking_columns();
            let rows = sqlx::query_as::<_, ManifestRow>(&format!(
                r#"
                SELECT
                    b.id AS booking_id,
                    p.name AS passenger_name,
                    p.mobile_no,
                    p.age,
                    p.age_criteria,
                    b.{seat_col} AS seat_number,
                    b.{price_col} AS leg_price,
                    b.custom_amount,
                    b.payment_status
                FROM booking b
                INNER JOIN passenger p ON b.passenger_id = p.id
                WHERE b.status = 'Active'
                AND b.{bus_col} = ?
                ORDER BY b.{seat_col} IS NULL, b.{seat_col}, b.id
                "#,
                bus_col = columns.bus,
                seat_col = columns.seat,
                price_col = columns.price,
            ))
            .bind(bus.id)
            .fetch_all(&self.pool)
            .await?;

            passengers.extend(rows.into_iter().map(|row| row.into_entry(leg)));
        }

        tracing::debug!(bus_id = bus.id, riders = passengers.len(), "built passenger list");
        Ok(BusManifestResponse {
            total_passengers: passengers.len(),
            bus,
            passengers,
        })
    }
}
