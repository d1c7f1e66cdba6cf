use rust_decimal::Decimal;
use sqlx::{MySqlConnection, MySqlPool};

use crate::config::FallbackLadder;
use crate::models::journey::{JourneyPricing, Leg, PricingTableResponse};
use crate::models::passenger::AgeCriteria;
use crate::utils::error::AppResult;

/// Fare used when the rate table has no active row for a tier.
pub fn fallback_price(ladder: &FallbackLadder, tier: AgeCriteria) -> Decimal {
    match tier {
        AgeCriteria::MaleChild | AgeCriteria::FemaleChild => ladder.child,
        AgeCriteria::MaleSenior | AgeCriteria::FemaleAdult => ladder.concession,
        AgeCriteria::SuperSenior => ladder.super_senior,
        AgeCriteria::MaleAdult => ladder.adult,
    }
}

#[derive(Clone)]
pub struct PricingService {
    pool: MySqlPool,
    ladder: FallbackLadder,
}

impl PricingService {
    pub fn new(pool: MySqlPool, ladder: FallbackLadder) -> Self {
        PricingService { pool, ladder }
    }

    /// Looks up the active rate for (leg, tier), falling back to the fixed ladder.
    /// Runs on the caller's connection so it joins the caller's transaction.
    pub async fn resolve_price(
        &self,
        conn: &mut MySqlConnection,
        leg: Leg,
        tier: AgeCriteria,
    ) -> AppResult<Decimal> {
        let rate: Option<Decimal> = sqlx::query_scalar(
            r#"
            SELECT amount
            FROM journey_pricing
            WHERE journey_type = ? AND age_criteria = ? AND is_active = TRUE
            "#,
        )
        .bind(leg)
        .bind(tier)
        .fetch_optional(&mut *conn)
        .await?;

        match rate {
            Some(amount) => Ok(amount),
            None => {
                let amount = fallback_price(&self.ladder, tier);
                tracing::debug!(%leg, %tier, %amount, "no active rate, using fallback fare");
                Ok(amount)
            }
        }
    }

    pub async fn quote(&self, leg: Leg, tier: AgeCriteria) -> AppResult<Decimal> {
        let mut conn = self.pool.acquire().await?;
        self.resolve_price(&mut *conn, leg, tier).await
    }

    pub async fn pricing_table(&self, leg: Option<Leg>) -> AppResult<PricingTableResponse> {
        let rates = sqlx::query_as::<_, JourneyPricing>(
            r#"
            SELECT id, journey_type, age_criteria, amount, is_active
            FROM journey_pricing
            WHERE is_active = TRUE AND (? IS NULL OR journey_type = ?)
            ORDER BY journey_type, age_criteria
            "#,
        )
        .bind(leg)
        .bind(leg)
        .fetch_all(&self.pool)
        .await?;

        Ok(PricingTableResponse { rates })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_tier_falls_back_to_290() {
        let ladder = FallbackLadder::default();
        assert_eq!(
            fallback_price(&ladder, AgeCriteria::MaleChild),
            Decimal::new(29000, 2)
        );
        assert_eq!(
            fallback_price(&ladder, AgeCriteria::FemaleChild),
            Decimal::from(290)
        );
    }

    #[test]
    fn every_tier_has_a_fallback() {
        let ladder = FallbackLadder::default();
        let expected = [
            (AgeCriteria::MaleChild, 290),
            (AgeCriteria::FemaleChild, 290),
            (AgeCriteria::MaleAdult, 550),
            (AgeCriteria::MaleSenior, 290),
            (AgeCriteria::FemaleAdult, 290),
            (AgeCriteria::SuperSenior, 0),
        ];
        for (tier, amount) in expected {
            assert_eq!(fallback_price(&ladder, tier), Decimal::from(amount), "{tier}");
        }
    }

    #[test]
    fn fallback_is_deterministic() {
        let ladder = FallbackLadder::default();
        let first = fallback_price(&ladder, AgeCriteria::MaleAdult);
        let second = fallback_price(&ladder, AgeCriteria::MaleAdult);
        assert_eq!(first, second);
    }

    #[test]
    fn ladder_comes_from_configuration() {
        let ladder = FallbackLadder {
            adult: Decimal::from(600),
            ..FallbackLadder::default()
        };
        assert_eq!(
            fallback_price(&ladder, AgeCriteria::MaleAdult),
            Decimal::from(600)
        );
    }
}
