use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{MySqlConnection, MySqlPool};

use crate::models::booking::{Booking, BookingStatus, PaymentStatus};
use crate::models::payment::{
    Payment, PaymentListResponse, PaymentMethod, PaymentRecordedResponse,
};
use crate::services::booking_service::lock_booking;
use crate::utils::error::{AppError, AppResult};

/// Payment status as a pure function of what is owed and what was paid.
pub fn reconcile(final_amount: Decimal, total_paid: Decimal) -> PaymentStatus {
    if total_paid >= final_amount {
        PaymentStatus::Paid
    } else if total_paid > Decimal::ZERO {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Pending
    }
}

/// Largest value a DECIMAL(10, 2) column holds.
fn max_amount() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Rejects negative amounts, amounts finer than paise and amounts too large to store.
pub fn validate_amount(amount: Decimal) -> AppResult<Decimal> {
    let limit = max_amount();
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::ValidationError(
            "Amount must not be below zero".into(),
        ));
    }
    if amount > limit {
        return Err(AppError::ValidationError(format!(
            "Amount must not exceed {limit}"
        )));
    }
    if amount.round_dp(2) != amount {
        return Err(AppError::ValidationError(
            "Amount must have at most two decimal places".into(),
        ));
    }
    Ok(amount)
}

#[derive(Clone)]
pub struct PaymentService {
    pool: MySqlPool,
}

impl PaymentService {
    pub fn new(pool: MySqlPool) -> Self {
        PaymentService { pool }
    }

    pub async fn total_paid(&self, conn: &mut MySqlConnection, booking_id: i32) -> AppResult<Decimal> {
        let total: Decimal = sqlx::query_scalar(
            r#"SELECT COALESCE(SUM(amount), 0) FROM payment WHERE booking_id = ?"#,
        )
        .bind(booking_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(total)
    }

    /// Recomputes and writes the payment status. The caller must hold the booking
    /// row lock so concurrent payments cannot interleave between read and write.
    pub async fn refresh_status(
        &self,
        conn: &mut MySqlConnection,
        booking: &mut Booking,
    ) -> AppResult<Decimal> {
        let total_paid = self.total_paid(&mut *conn, booking.id).await?;
        let status = reconcile(booking.final_amount(), total_paid);

        if status != booking.payment_status {
            sqlx::query(r#"UPDATE booking SET payment_status = ? WHERE id = ?"#)
                .bind(status)
                .bind(booking.id)
                .execute(&mut *conn)
                .await?;
            tracing::info!(
                booking_id = booking.id,
                from = %booking.payment_status,
                to = %status,
                "payment status changed"
            );
            booking.payment_status = status;
        }

        Ok(total_paid)
    }

    pub async fn record_payment(
        &self,
        booking_id: i32,
        amount: Decimal,
        method: PaymentMethod,
        collected_by: &str,
        received_on: Option<NaiveDate>,
    ) -> AppResult<PaymentRecordedResponse> {
        let amount = validate_amount(amount)?;

        let mut tx = self.pool.begin().await?;

        let mut booking = lock_booking(&mut *tx, booking_id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Err(AppError::Unprocessable(format!(
                "Booking {booking_id} is cancelled, payments cannot be recorded"
            )));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO payment (booking_id, amount, payment_method, collected_by, payment_received_date)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(booking_id)
        .bind(amount)
        .bind(method)
        .bind(collected_by)
        .bind(received_on)
        .execute(&mut *tx)
        .await?;

        let payment_id = result.last_insert_id() as i32;
        let total_paid = self.refresh_status(&mut *tx, &mut booking).await?;

        tx.commit().await?;

        tracing::info!(booking_id, payment_id, %amount, %method, %total_paid, "payment recorded");

        Ok(PaymentRecordedResponse {
            payment_id,
            total_paid,
            final_amount: booking.final_amount(),
            payment_status: booking.payment_status,
        })
    }

    pub async fn list_payments(&self, booking_id: i32) -> AppResult<PaymentListResponse> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, booking_id, amount, payment_method, collected_by, payment_date,
                payment_received_date
            FROM payment
            WHERE booking_id = ?
            ORDER BY payment_date, id
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;

        let total_paid = payments.iter().map(|p| p.amount).sum();
        Ok(PaymentListResponse {
            payments,
            total_paid,
        })
    }

    /// The receipt date is the only field of a payment that may change.
    pub async fn correct_receipt_date(&self, payment_id: i32, received_on: NaiveDate) -> AppResult<Payment> {
        let result = sqlx::query(r#"UPDATE payment SET payment_received_date = ? WHERE id = ?"#)
            .bind(received_on)
            .bind(payment_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            // MySQL reports zero rows when the value is unchanged, so check existence
            let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM payment WHERE id = ?")
                .bind(payment_id)
                .fetch_optional(&self.pool)
                .await?;
            if exists.is_none() {
                return Err(AppError::NotFound(format!("Payment {payment_id} not found")));
            }
        }

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            SELECT id, booking_id, amount, payment_method, collected_by, payment_date,
                payment_received_date
            FROM payment
            WHERE id = ?
            "#,
        )
        .bind(payment_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(payment)
    }
}
