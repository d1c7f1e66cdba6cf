use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlConnection, MySqlPool, QueryBuilder};

use crate::models::booking::{
    Booking, BookingCreatedResponse, BookingFilter, BookingListResponse, BookingStatus,
    LegAllocation, LegSelection,
};
use crate::models::journey::{Bus, Leg};
use crate::models::passenger::{AgeCriteria, PassengerRegistrationRequest};
use crate::services::journey_service::fetch_journey;
use crate::services::passenger_service::{insert_passenger, passenger_tier};
use crate::services::payment_service::{reconcile, validate_amount, PaymentService};
use crate::services::pricing_service::PricingService;
use crate::services::seat_service::SeatService;
use crate::utils::error::{AppError, AppResult};

pub(crate) const BOOKING_COLUMNS: &str = "id, passenger_id, pickup_point_id, \
    onward_journey_id, return_journey_id, onward_bus_id, return_bus_id, \
    onward_seat_number, return_seat_number, onward_price, return_price, total_price, \
    custom_amount, amount_updated_by, amount_updated_at, status, payment_status, remarks, \
    created_at, updated_at";

/// Reads a booking and holds its row lock until the transaction ends.
pub(crate) async fn lock_booking(conn: &mut MySqlConnection, booking_id: i32) -> AppResult<Booking> {
    sqlx::query_as::<_, Booking>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM booking WHERE id = ? FOR UPDATE"
    ))
    .bind(booking_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Booking {booking_id} not found")))
}

// Writes both legs, the total and the lifecycle status in one statement
async fn store_allocation(conn: &mut MySqlConnection, booking: &Booking) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE booking
        SET onward_journey_id = ?, onward_bus_id = ?, onward_seat_number = ?, onward_price = ?,
            return_journey_id = ?, return_bus_id = ?, return_seat_number = ?, return_price = ?,
            total_price = ?, status = ?
        WHERE id = ?
        "#,
    )
    .bind(booking.onward_journey_id)
    .bind(booking.onward_bus_id)
    .bind(booking.onward_seat_number)
    .bind(booking.onward_price)
    .bind(booking.return_journey_id)
    .bind(booking.return_bus_id)
    .bind(booking.return_seat_number)
    .bind(booking.return_price)
    .bind(booking.total_price)
    .bind(booking.status)
    .bind(booking.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[derive(Clone)]
pub struct BookingService {
    pool: MySqlPool,
    pricing: PricingService,
    seats: SeatService,
    payments: PaymentService,
}

impl BookingService {
    pub fn new(pool: MySqlPool, pricing: PricingService) -> Self {
        BookingService {
            seats: SeatService::new(pool.clone()),
            payments: PaymentService::new(pool.clone()),
            pricing,
            pool,
        }
    }

    pub async fn create_booking(
        &self,
        passenger_id: i32,
        legs: LegSelection,
        remarks: Option<String>,
    ) -> AppResult<BookingCreatedResponse> {
        let mut tx = self.pool.begin().await?;

        let tier = passenger_tier(&mut *tx, passenger_id).await?;
        let response = self
            .insert_booking(&mut *tx, passenger_id, tier, &legs, remarks.as_deref())
            .await?;

        tx.commit().await?;
        Ok(response)
    }

    /// On-the-spot registration: passenger and priced booking in one transaction.
    pub async fn register_walk_in(
        &self,
        passenger: PassengerRegistrationRequest,
        legs: LegSelection,
    ) -> AppResult<BookingCreatedResponse> {
        let mut tx = self.pool.begin().await?;

        let (passenger_id, tier) = insert_passenger(&mut *tx, &passenger).await?;
        let response = self
            .insert_booking(&mut *tx, passenger_id, tier, &legs, Some("On-the-spot registration"))
            .await?;

        tx.commit().await?;
        Ok(response)
    }

    async fn insert_booking(
        &self,
        conn: &mut MySqlConnection,
        passenger_id: i32,
        tier: AgeCriteria,
        legs: &LegSelection,
        remarks: Option<&str>,
    ) -> AppResult<BookingCreatedResponse> {
        if legs.onward_journey_id.is_none() && legs.return_journey_id.is_none() {
            return Err(AppError::ValidationError(
                "At least one journey must be selected".into(),
            ));
        }

        let mut prices = [Decimal::ZERO; 2];
        for (slot, leg) in [Leg::Onward, Leg::Return].into_iter().enumerate() {
            let Some(journey_id) = legs.journey_for(leg) else {
                continue;
            };
            let journey = fetch_journey(&mut *conn, journey_id).await?;
            if journey.journey_type != leg {
                return Err(AppError::ValidationError(format!(
                    "Journey {journey_id} is a {} journey, not {leg}",
                    journey.journey_type
                )));
            }
            if !journey.is_active {
                return Err(AppError::Unprocessable(format!(
                    "Journey {journey_id} is not open for booking"
                )));
            }
            prices[slot] = self.pricing.resolve_price(&mut *conn, leg, tier).await?;
        }
        let [onward_price, return_price] = prices;
        let total_price = onward_price + return_price;

        if let Some(pickup_point_id) = legs.pickup_point_id {
            let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM pickup_point WHERE id = ?")
                .bind(pickup_point_id)
                .fetch_optional(&mut *conn)
                .await?;
            if exists.is_none() {
                return Err(AppError::NotFound(format!(
                    "Pickup point {pickup_point_id} not found"
                )));
            }
        }

        let result = sqlx::query(
            r#"
            INSERT INTO booking
            (passenger_id, pickup_point_id, onward_journey_id, return_journey_id,
                onward_price, return_price, total_price, payment_status, remarks)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(passenger_id)
        .bind(legs.pickup_point_id)
        .bind(legs.onward_journey_id)
        .bind(legs.return_journey_id)
        .bind(onward_price)
        .bind(return_price)
        .bind(total_price)
        .bind(reconcile(total_price, Decimal::ZERO))
        .bind(remarks.unwrap_or_default())
        .execute(&mut *conn)
        .await?;

        let booking_id = result.last_insert_id() as i32;
        tracing::info!(booking_id, passenger_id, %tier, %total_price, "booking created");

        Ok(BookingCreatedResponse {
            booking_id,
            passenger_id,
            onward_price,
            return_price,
            total_price,
        })
    }

    /// Puts a passenger on a seat for one leg. Conflict check, price resolution and
    /// the write share one transaction; the bus row lock serializes concurrent
    /// assignments on the same bus.
    pub async fn assign_seat(
        &self,
        booking_id: i32,
        leg: Leg,
        bus_id: i32,
        seat_number: &str,
    ) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        let bus = self.seats.lock_bus(&mut *tx, bus_id).await?;
        let mut booking = lock_booking(&mut *tx, booking_id).await?;
        booking.ensure_active()?;

        let current = booking.leg(leg);
        let journey_id = self
            .journey_for_assignment(&mut *tx, &bus, leg, current.journey_id)
            .await?;
        let seat = self
            .seats
            .check_conflict(&mut *tx, &bus, leg, seat_number, Some(booking.id))
            .await?;

        // a leg price, once set, is never recomputed
        let price = if current.price.is_zero() {
            let tier = passenger_tier(&mut *tx, booking.passenger_id).await?;
            self.pricing.resolve_price(&mut *tx, leg, tier).await?
        } else {
            current.price
        };

        booking.set_leg(
            leg,
            LegAllocation {
                journey_id: Some(journey_id),
                bus_id: Some(bus.id),
                seat_number: Some(seat),
                price,
            },
        );
        store_allocation(&mut *tx, &booking).await?;
        self.payments.refresh_status(&mut *tx, &mut booking).await?;

        tx.commit().await?;

        tracing::info!(booking_id, bus_id, %leg, seat, %price, "seat assigned");
        Ok(booking)
    }

    // The bus decides the journey when it is bound to one; otherwise the leg
    // must already have a journey selected.
    async fn journey_for_assignment(
        &self,
        conn: &mut MySqlConnection,
        bus: &Bus,
        leg: Leg,
        selected: Option<i32>,
    ) -> AppResult<i32> {
        let Some(bus_journey_id) = bus.journey_id else {
            return selected.ok_or_else(|| {
                AppError::ValidationError(format!(
                    "Select a {leg} journey before assigning a seat on bus {}",
                    bus.bus_number
                ))
            });
        };

        let journey = fetch_journey(&mut *conn, bus_journey_id).await?;
        if journey.journey_type != leg {
            return Err(AppError::ValidationError(format!(
                "Bus {} runs the {} journey, not {leg}",
                bus.bus_number, journey.journey_type
            )));
        }
        if let Some(selected) = selected {
            if selected != bus_journey_id {
                return Err(AppError::ValidationError(format!(
                    "Bus {} does not run on the selected {leg} journey",
                    bus.bus_number
                )));
            }
        }

        Ok(bus_journey_id)
    }

    /// Overrides the amount owed. Leg prices are left alone.
    pub async fn set_custom_amount(
        &self,
        booking_id: i32,
        amount: Decimal,
        updated_by: &str,
    ) -> AppResult<Booking> {
        let amount = validate_amount(amount)?;

        let mut tx = self.pool.begin().await?;

        let mut booking = lock_booking(&mut *tx, booking_id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Err(AppError::Unprocessable(format!(
                "Booking {booking_id} is cancelled"
            )));
        }

        let now = Utc::now().naive_utc();
        sqlx::query(
            r#"
            UPDATE booking
            SET custom_amount = ?, amount_updated_by = ?, amount_updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(amount)
        .bind(updated_by)
        .bind(now)
        .bind(booking_id)
        .execute(&mut *tx)
        .await?;

        booking.custom_amount = Some(amount);
        booking.amount_updated_by = Some(updated_by.to_string());
        booking.amount_updated_at = Some(now);
        self.payments.refresh_status(&mut *tx, &mut booking).await?;

        tx.commit().await?;

        tracing::info!(booking_id, %amount, updated_by, "custom amount set");
        Ok(booking)
    }

    /// Active -> Completed, once the event is over.
    pub async fn complete_booking(&self, booking_id: i32) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        let mut booking = lock_booking(&mut *tx, booking_id).await?;
        booking.ensure_active()?;
        booking.status = BookingStatus::Completed;
        store_allocation(&mut *tx, &booking).await?;

        tx.commit().await?;

        tracing::info!(booking_id, "booking completed");
        Ok(booking)
    }

    /// Clears one leg inside the caller's cancellation transaction. A booking
    /// left with no leg at all becomes Cancelled and keeps its charge.
    pub(crate) async fn vacate_leg(
        &self,
        conn: &mut MySqlConnection,
        booking: &mut Booking,
        leg: Leg,
    ) -> AppResult<()> {
        booking.vacate_leg(leg);
        store_allocation(&mut *conn, booking).await?;
        self.payments.refresh_status(&mut *conn, booking).await?;
        Ok(())
    }

    /// Clears both legs inside the caller's cancellation transaction and archives
    /// the booking as Cancelled.
    pub(crate) async fn release_booking(
        &self,
        conn: &mut MySqlConnection,
        booking: &mut Booking,
    ) -> AppResult<()> {
        booking.release_allocations();
        booking.status = BookingStatus::Cancelled;
        store_allocation(&mut *conn, booking).await?;
        self.payments.refresh_status(&mut *conn, booking).await?;
        Ok(())
    }

    pub async fn get_booking(&self, booking_id: i32) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM booking WHERE id = ?"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {booking_id} not found")))
    }

    pub async fn list_bookings(&self, filter: BookingFilter) -> AppResult<BookingListResponse> {
        let mut query: QueryBuilder<MySql> =
            QueryBuilder::new(format!("SELECT {BOOKING_COLUMNS} FROM booking WHERE 1 = 1"));

        if let Some(leg) = filter.leg {
            query.push(format!(" AND {} IS NOT NULL", leg.booking_columns().journey));
        }

        if let Some(date) = filter.date {
            let legs = match filter.leg {
                Some(leg) => vec![leg],
                None => vec![Leg::Onward, Leg::Return],
            };
            query.push(" AND (");
            for (i, leg) in legs.into_iter().enumerate() {
                if i > 0 {
                    query.push(" OR ");
                }
                query.push(format!(
                    "{} IN (SELECT id FROM journey WHERE journey_date = ",
                    leg.booking_columns().journey
                ));
                query.push_bind(date);
                query.push(")");
            }
            query.push(")");
        }

        if let Some(status) = filter.status {
            query.push(" AND status = ");
            query.push_bind(status);
        }

        query.push(" ORDER BY created_at DESC, id DESC");

        let bookings = query
            .build_query_as::<Booking>()
            .fetch_all(&self.pool)
            .await?;

        Ok(BookingListResponse { bookings })
    }
}
