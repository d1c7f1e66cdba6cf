use sqlx::{MySqlConnection, MySqlPool};

use crate::models::journey::{
    BusDetail, BusListResponse, BusSearchQuery, Journey, JourneyListResponse, Leg,
};
use crate::utils::error::{AppError, AppResult};

pub(crate) async fn fetch_journey(conn: &mut MySqlConnection, journey_id: i32) -> AppResult<Journey> {
    sqlx::query_as::<_, Journey>(
        r#"
        SELECT id, journey_type, journey_date, is_active
        FROM journey
        WHERE id = ?
        "#,
    )
    .bind(journey_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Journey {journey_id} not found")))
}

#[derive(Clone)]
pub struct JourneyService {
    pool: MySqlPool,
}

impl JourneyService {
    pub fn new(pool: MySqlPool) -> Self {
        JourneyService { pool }
    }

    // List journeys, optionally by direction
    pub async fn list_journeys(
        &self,
        journey_type: Option<Leg>,
        active_only: bool,
    ) -> AppResult<JourneyListResponse> {
        let journeys = sqlx::query_as::<_, Journey>(
            r#"
            SELECT id, journey_type, journey_date, is_active
            FROM journey
            WHERE (? IS NULL OR journey_type = ?)
            AND (? = FALSE OR is_active = TRUE)
            ORDER BY journey_date, journey_type
            "#,
        )
        .bind(journey_type)
        .bind(journey_type)
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        Ok(JourneyListResponse { journeys })
    }

    // Search buses by journey, direction or travel date
    pub async fn list_buses(&self, query: BusSearchQuery) -> AppResult<BusListResponse> {
        let buses = sqlx::query_as::<_, BusDetail>(
            r#"
            SELECT
                b.id,
                b.bus_number,
                b.capacity,
                b.route_name,
                b.journey_id,
                j.journey_type,
                j.journey_date
            FROM bus b
            LEFT JOIN journey j ON b.journey_id = j.id
            WHERE (? IS NULL OR b.journey_id = ?)
            AND (? IS NULL OR j.journey_type = ?)
            AND (? IS NULL OR j.journey_date = ?)
            ORDER BY j.journey_date, b.bus_number
            "#,
        )
        .bind(query.journey_id)
        .bind(query.journey_id)
        .bind(query.journey_type)
        .bind(query.journey_type)
        .bind(query.journey_date)
        .bind(query.journey_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(BusListResponse { buses })
    }
}
