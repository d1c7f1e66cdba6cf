use sqlx::{MySqlConnection, MySqlPool};
use validator::Validate;

use crate::models::passenger::{
    normalize_aadhar, AgeCriteria, Passenger, PassengerRegistrationRequest, VerificationStatus,
};
use crate::utils::error::{AppError, AppResult};

const PASSENGER_COLUMNS: &str = "id, name, gender, age, age_criteria, category, mobile_no, \
    aadhar_number, aadhar_required, verification_status, verification_notes, related_to, \
    relationship, created_at";

/// Inserts a passenger with the tier and document requirement derived from
/// gender and age. Returns the new id and tier.
pub(crate) async fn insert_passenger(
    conn: &mut MySqlConnection,
    request: &PassengerRegistrationRequest,
) -> AppResult<(i32, AgeCriteria)> {
    request.validate()?;

    let tier = AgeCriteria::derive(request.gender, request.age);
    let aadhar_required = tier.requires_document();

    let aadhar_number = match request.aadhar_number.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => normalize_aadhar(raw)?,
        _ => String::new(),
    };
    if aadhar_required && aadhar_number.is_empty() {
        return Err(AppError::ValidationError(format!(
            "Aadhar number is required for the {tier} category"
        )));
    }

    if let Some(relative) = request.related_to {
        let exists: Option<i32> = sqlx::query_scalar("SELECT id FROM passenger WHERE id = ?")
            .bind(relative)
            .fetch_optional(&mut *conn)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound(format!("Passenger {relative} not found")));
        }
    }

    let result = sqlx::query(
        r#"
        INSERT INTO passenger
        (name, gender, age, age_criteria, category, mobile_no, aadhar_number,
            aadhar_required, verification_status, related_to, relationship)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(request.name.trim())
    .bind(request.gender)
    .bind(request.age)
    .bind(tier)
    .bind(request.category)
    .bind(request.mobile_no.as_deref().unwrap_or_default().trim())
    .bind(aadhar_number)
    .bind(aadhar_required)
    .bind(VerificationStatus::initial_for(tier))
    .bind(request.related_to)
    .bind(request.relationship.as_deref().unwrap_or_default())
    .execute(&mut *conn)
    .await?;

    let passenger_id = result.last_insert_id() as i32;
    tracing::info!(passenger_id, %tier, aadhar_required, "passenger registered");

    Ok((passenger_id, tier))
}

pub(crate) async fn passenger_tier(conn: &mut MySqlConnection, passenger_id: i32) -> AppResult<AgeCriteria> {
    sqlx::query_scalar("SELECT age_criteria FROM passenger WHERE id = ?")
        .bind(passenger_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Passenger {passenger_id} not found")))
}

#[derive(Clone)]
pub struct PassengerService {
    pool: MySqlPool,
}

impl PassengerService {
    pub fn new(pool: MySqlPool) -> Self {
        PassengerService { pool }
    }

    pub async fn register_passenger(&self, request: PassengerRegistrationRequest) -> AppResult<Passenger> {
        let mut conn = self.pool.acquire().await?;
        let (passenger_id, _) = insert_passenger(&mut *conn, &request).await?;
        drop(conn);

        self.get_passenger(passenger_id).await
    }

    pub async fn get_passenger(&self, passenger_id: i32) -> AppResult<Passenger> {
        sqlx::query_as::<_, Passenger>(&format!(
            "SELECT {PASSENGER_COLUMNS} FROM passenger WHERE id = ?"
        ))
        .bind(passenger_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Passenger {passenger_id} not found")))
    }

    /// Records the outcome of a document check. Only tiers that need a document
    /// can move away from "Not Required".
    pub async fn verify_passenger(
        &self,
        passenger_id: i32,
        status: VerificationStatus,
        notes: Option<String>,
    ) -> AppResult<Passenger> {
        let passenger = self.get_passenger(passenger_id).await?;

        if !passenger.aadhar_required && status != VerificationStatus::NotRequired {
            return Err(AppError::Unprocessable(format!(
                "Passenger {passenger_id} ({}) does not need document verification",
                passenger.age_criteria
            )));
        }
        if passenger.aadhar_required && status == VerificationStatus::NotRequired {
            return Err(AppError::Unprocessable(format!(
                "Passenger {passenger_id} ({}) requires document verification",
                passenger.age_criteria
            )));
        }

        sqlx::query(
            r#"
            UPDATE passenger
            SET verification_status = ?, verification_notes = ?
            WHERE id = ?
            "#,
        )
        .bind(status)
        .bind(notes.unwrap_or_default())
        .bind(passenger_id)
        .execute(&self.pool)
        .await?;

        tracing::info!(passenger_id, %status, "passenger verification updated");
        self.get_passenger(passenger_id).await
    }
}
