use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{MySqlConnection, MySqlPool};

use crate::models::cancellation::{
    CancellationListResponse, CancellationReason, CancellationScope, CancellationSnapshot,
    SeatCancellation,
};
use crate::models::journey::Leg;
use crate::services::booking_service::{lock_booking, BookingService};
use crate::services::payment_service::{validate_amount, PaymentService};
use crate::utils::error::{AppError, AppResult};

const CANCELLATION_COLUMNS: &str = "id, booking_id, cancelled_by, cancellation_date, reason, \
    journey_type, original_onward_seat, original_return_seat, original_onward_bus_id, \
    original_return_bus_id, original_amount_paid, refund_amount, refund_processed, refund_date, \
    notes";

/// Who cancelled, why, and what was agreed to refund.
#[derive(Debug, Clone, Default)]
pub struct CancellationDetails {
    pub reason: CancellationReason,
    pub notes: Option<String>,
    pub cancelled_by: Option<String>,
}

async fn insert_audit(
    conn: &mut MySqlConnection,
    booking_id: i32,
    snapshot: &CancellationSnapshot,
    details: &CancellationDetails,
    refund_amount: Decimal,
) -> AppResult<i32> {
    let result = sqlx::query(
        r#"
        INSERT INTO seat_cancellation
        (booking_id, cancelled_by, reason, journey_type, original_onward_seat,
            original_return_seat, original_onward_bus_id, original_return_bus_id,
            original_amount_paid, refund_amount, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(booking_id)
    .bind(details.cancelled_by.as_deref())
    .bind(details.reason)
    .bind(snapshot.scope)
    .bind(snapshot.onward_seat)
    .bind(snapshot.return_seat)
    .bind(snapshot.onward_bus_id)
    .bind(snapshot.return_bus_id)
    .bind(snapshot.amount_paid)
    .bind(refund_amount)
    .bind(details.notes.as_deref().unwrap_or_default())
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_id() as i32)
}

#[derive(Clone)]
pub struct CancellationService {
    pool: MySqlPool,
    bookings: BookingService,
    payments: PaymentService,
}

impl CancellationService {
    pub fn new(pool: MySqlPool, bookings: BookingService) -> Self {
        CancellationService {
            payments: PaymentService::new(pool.clone()),
            bookings,
            pool,
        }
    }

    /// Cancels a single leg. The booking stays Active while the other leg holds
    /// a journey.
    pub async fn cancel_leg(
        &self,
        booking_id: i32,
        leg: Leg,
        details: CancellationDetails,
    ) -> AppResult<i32> {
        let mut tx = self.pool.begin().await?;

        let mut booking = lock_booking(&mut *tx, booking_id).await?;
        booking.ensure_active()?;
        if !booking.leg(leg).is_populated() {
            return Err(AppError::ValidationError(format!(
                "Booking {booking_id} has no {leg} journey to cancel"
            )));
        }

        let amount_paid = self.payments.total_paid(&mut *tx, booking_id).await?;
        let snapshot = CancellationSnapshot::capture(&booking, leg.into(), amount_paid);
        let cancellation_id =
            insert_audit(&mut *tx, booking_id, &snapshot, &details, Decimal::ZERO).await?;

        self.bookings.vacate_leg(&mut *tx, &mut booking, leg).await?;

        tx.commit().await?;

        tracing::info!(
            booking_id,
            cancellation_id,
            %leg,
            status = %booking.status,
            reason = %details.reason,
            "leg cancelled"
        );
        Ok(cancellation_id)
    }

    /// Cancels the whole booking. One audit row covers both legs.
    pub async fn cancel_booking(
        &self,
        booking_id: i32,
        refund_amount: Decimal,
        details: CancellationDetails,
    ) -> AppResult<i32> {
        let refund_amount = validate_amount(refund_amount)?;

        let mut tx = self.pool.begin().await?;

        let mut booking = lock_booking(&mut *tx, booking_id).await?;
        booking.ensure_active()?;

        let amount_paid = self.payments.total_paid(&mut *tx, booking_id).await?;
        if refund_amount > amount_paid {
            return Err(AppError::ValidationError(format!(
                "Refund of {refund_amount} exceeds the {amount_paid} paid"
            )));
        }

        let snapshot = CancellationSnapshot::capture(&booking, CancellationScope::Both, amount_paid);
        let cancellation_id =
            insert_audit(&mut *tx, booking_id, &snapshot, &details, refund_amount).await?;

        self.bookings.release_booking(&mut *tx, &mut booking).await?;

        tx.commit().await?;

        tracing::info!(
            booking_id,
            cancellation_id,
            %refund_amount,
            reason = %details.reason,
            "booking cancelled"
        );
        Ok(cancellation_id)
    }

    /// Marks the refund as paid out. Refund fields are the only mutable part of
    /// an audit row.
    pub async fn process_refund(
        &self,
        cancellation_id: i32,
        refund_date: Option<NaiveDate>,
    ) -> AppResult<SeatCancellation> {
        let mut tx = self.pool.begin().await?;

        let processed: Option<bool> = sqlx::query_scalar(
            "SELECT refund_processed FROM seat_cancellation WHERE id = ? FOR UPDATE",
        )
        .bind(cancellation_id)
        .fetch_optional(&mut *tx)
        .await?;

        match processed {
            None => {
                return Err(AppError::NotFound(format!(
                    "Cancellation {cancellation_id} not found"
                )))
            }
            Some(true) => {
                return Err(AppError::Unprocessable(format!(
                    "Refund for cancellation {cancellation_id} was already processed"
                )))
            }
            Some(false) => {}
        }

        let refund_date = refund_date.unwrap_or_else(|| Utc::now().date_naive());
        sqlx::query(
            r#"
            UPDATE seat_cancellation
            SET refund_processed = TRUE, refund_date = ?
            WHERE id = ?
            "#,
        )
        .bind(refund_date)
        .bind(cancellation_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(cancellation_id, %refund_date, "refund processed");
        self.get_cancellation(cancellation_id).await
    }

    pub async fn get_cancellation(&self, cancellation_id: i32) -> AppResult<SeatCancellation> {
        sqlx::query_as::<_, SeatCancellation>(&format!(
            "SELECT {CANCELLATION_COLUMNS} FROM seat_cancellation WHERE id = ?"
        ))
        .bind(cancellation_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Cancellation {cancellation_id} not found")))
    }

    pub async fn list_cancellations(&self, booking_id: i32) -> AppResult<CancellationListResponse> {
        let cancellations = sqlx::query_as::<_, SeatCancellation>(&format!(
            "SELECT {CANCELLATION_COLUMNS} FROM seat_cancellation \
             WHERE booking_id = ? ORDER BY cancellation_date, id"
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(CancellationListResponse { cancellations })
    }
}
