use chrono::NaiveDateTime;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use validator::Validate;

use crate::utils::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString)]
pub enum Gender {
    #[serde(rename = "M")]
    #[strum(serialize = "M")]
    Male,
    #[serde(rename = "F")]
    #[strum(serialize = "F")]
    Female,
}

/// Demographic tier, derived from gender and age. Drives the fare lookup and
/// whether an identity document has to be verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Display, EnumString)]
pub enum AgeCriteria {
    #[serde(rename = "M-12 & Below")]
    #[strum(serialize = "M-12 & Below")]
    MaleChild,
    #[serde(rename = "F-12 & Below")]
    #[strum(serialize = "F-12 & Below")]
    FemaleChild,
    #[serde(rename = "M-Above 12 & Below 65")]
    #[strum(serialize = "M-Above 12 & Below 65")]
    MaleAdult,
    #[serde(rename = "M-65 & Above")]
    #[strum(serialize = "M-65 & Above")]
    MaleSenior,
    #[serde(rename = "F-Above 12 & Below 75")]
    #[strum(serialize = "F-Above 12 & Below 75")]
    FemaleAdult,
    #[serde(rename = "M&F-75 & Above")]
    #[strum(serialize = "M&F-75 & Above")]
    SuperSenior,
}

impl AgeCriteria {
    pub fn derive(gender: Gender, age: i32) -> Self {
        match gender {
            Gender::Male if age <= 12 => AgeCriteria::MaleChild,
            Gender::Male if age >= 75 => AgeCriteria::SuperSenior,
            Gender::Male if age >= 65 => AgeCriteria::MaleSenior,
            Gender::Male => AgeCriteria::MaleAdult,
            Gender::Female if age <= 12 => AgeCriteria::FemaleChild,
            Gender::Female if age >= 75 => AgeCriteria::SuperSenior,
            Gender::Female => AgeCriteria::FemaleAdult,
        }
    }

    // Concession tiers for the elderly need an identity document on file
    pub fn requires_document(self) -> bool {
        matches!(self, AgeCriteria::MaleSenior | AgeCriteria::SuperSenior)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString)]
pub enum Category {
    Satsang,
    Sewadal,
    #[serde(rename = "Bal Sewadal")]
    #[strum(serialize = "Bal Sewadal")]
    BalSewadal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display, EnumString)]
pub enum VerificationStatus {
    #[serde(rename = "Not Required")]
    #[strum(serialize = "Not Required")]
    NotRequired,
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn initial_for(tier: AgeCriteria) -> Self {
        if tier.requires_document() {
            VerificationStatus::Pending
        } else {
            VerificationStatus::NotRequired
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, JsonSchema)]
pub struct Passenger {
    pub id: i32,
    pub name: String,
    pub gender: Gender,
    pub age: i32,
    pub age_criteria: AgeCriteria,
    pub category: Category,
    pub mobile_no: String,
    pub aadhar_number: String,
    pub aadhar_required: bool,
    pub verification_status: VerificationStatus,
    pub verification_notes: String,
    pub related_to: Option<i32>,
    pub relationship: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct PassengerRegistrationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub gender: Gender,
    #[validate(range(min = 0, max = 120))]
    pub age: i32,
    pub category: Category,
    #[validate(length(max = 15))]
    pub mobile_no: Option<String>,
    pub aadhar_number: Option<String>,
    pub related_to: Option<i32>,
    #[validate(length(max = 50))]
    pub relationship: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema, Validate)]
pub struct VerificationUpdateRequest {
    pub status: VerificationStatus,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Strips spaces and hyphens and checks the 12 digit Aadhar format.
pub fn normalize_aadhar(raw: &str) -> AppResult<String> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();

    if cleaned.len() != 12 || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::ValidationError(
            "Aadhar number must be exactly 12 digits".into(),
        ));
    }
    if cleaned == "000000000000" || cleaned == "123456789012" {
        return Err(AppError::ValidationError("Invalid Aadhar number".into()));
    }

    Ok(cleaned)
}

text_column!(Gender, AgeCriteria, Category, VerificationStatus);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn male_tiers_follow_age_boundaries() {
        assert_eq!(AgeCriteria::derive(Gender::Male, 12), AgeCriteria::MaleChild);
        assert_eq!(AgeCriteria::derive(Gender::Male, 13), AgeCriteria::MaleAdult);
        assert_eq!(AgeCriteria::derive(Gender::Male, 64), AgeCriteria::MaleAdult);
        assert_eq!(AgeCriteria::derive(Gender::Male, 65), AgeCriteria::MaleSenior);
        assert_eq!(AgeCriteria::derive(Gender::Male, 75), AgeCriteria::SuperSenior);
    }

    #[test]
    fn female_tiers_have_no_senior_band_below_75() {
        assert_eq!(AgeCriteria::derive(Gender::Female, 0), AgeCriteria::FemaleChild);
        assert_eq!(AgeCriteria::derive(Gender::Female, 70), AgeCriteria::FemaleAdult);
        assert_eq!(AgeCriteria::derive(Gender::Female, 90), AgeCriteria::SuperSenior);
    }

    #[test]
    fn tier_labels_match_stored_values() {
        assert_eq!(AgeCriteria::MaleChild.to_string(), "M-12 & Below");
        assert_eq!(
            "F-Above 12 & Below 75".parse::<AgeCriteria>().unwrap(),
            AgeCriteria::FemaleAdult
        );
    }

    #[test]
    fn only_elderly_tiers_need_documents() {
        assert!(AgeCriteria::MaleSenior.requires_document());
        assert!(AgeCriteria::SuperSenior.requires_document());
        assert!(!AgeCriteria::FemaleAdult.requires_document());
        assert_eq!(
            VerificationStatus::initial_for(AgeCriteria::MaleChild),
            VerificationStatus::NotRequired
        );
        assert_eq!(
            VerificationStatus::initial_for(AgeCriteria::SuperSenior),
            VerificationStatus::Pending
        );
    }

    #[test]
    fn aadhar_is_normalized_and_checked() {
        assert_eq!(normalize_aadhar("4321 8765-2109").unwrap(), "432187652109");
        assert!(normalize_aadhar("12345").is_err());
        assert!(normalize_aadhar("1234567890ab").is_err());
        assert!(normalize_aadhar("1234-5678-9012").is_err());
    }
}
